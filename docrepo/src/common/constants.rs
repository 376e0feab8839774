// doc constants
pub const DOC_ID: &str = "_id";
pub const DEFAULT_ID_ATTRIBUTE: &str = "id";
pub const FIELD_SEPARATOR: &str = ".";

// query operators
pub const OP_AND: &str = "$and";
pub const OP_OR: &str = "$or";
pub const OP_NOR: &str = "$nor";
pub const OP_EQ: &str = "$eq";
pub const OP_NE: &str = "$ne";
pub const OP_GT: &str = "$gt";
pub const OP_GTE: &str = "$gte";
pub const OP_LT: &str = "$lt";
pub const OP_LTE: &str = "$lte";
pub const OP_IN: &str = "$in";
pub const OP_NIN: &str = "$nin";
pub const OP_EXISTS: &str = "$exists";
pub const OP_REGEX: &str = "$regex";
pub const OP_OPTIONS: &str = "$options";

// update operators
pub const OP_SET: &str = "$set";
pub const OP_UNSET: &str = "$unset";
pub const OP_INC: &str = "$inc";

// pipeline stages
pub const STAGE_MATCH: &str = "$match";
pub const STAGE_SORT: &str = "$sort";
pub const STAGE_SKIP: &str = "$skip";
pub const STAGE_LIMIT: &str = "$limit";
pub const STAGE_PROJECT: &str = "$project";
pub const STAGE_COUNT: &str = "$count";
