use crate::collection::Document;
use crate::common::{SortOrder, SortSpec};

/// Options for controlling find operations.
///
/// `FindOptions` carries the sort, skip, limit and projection forwarded to
/// the store with a query. It supports method chaining.
///
/// # Examples
///
/// ```rust,ignore
/// use docrepo::collection::{order_by, FindOptions};
/// use docrepo::common::SortOrder;
///
/// let options = FindOptions::new()
///     .sort_by("age", SortOrder::Descending)
///     .skip(10)
///     .limit(20);
///
/// let options = order_by("name", SortOrder::Ascending);
/// let options = skip_by(5);
/// let options = limit_to(100);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub(crate) sort: Option<SortSpec>,
    pub(crate) skip: Option<u64>,
    pub(crate) limit: Option<u64>,
    pub(crate) projection: Option<Document>,
}

/// Creates `FindOptions` with sorting by a field.
pub fn order_by(field_name: &str, sort_order: SortOrder) -> FindOptions {
    FindOptions::new().sort_by(field_name, sort_order)
}

/// Creates `FindOptions` that skips a number of results.
pub fn skip_by(skip: u64) -> FindOptions {
    FindOptions::new().skip(skip)
}

/// Creates `FindOptions` that limits the number of results.
pub fn limit_to(limit: u64) -> FindOptions {
    FindOptions::new().limit(limit)
}

impl FindOptions {
    /// Creates a new `FindOptions` with default settings.
    pub fn new() -> FindOptions {
        FindOptions {
            sort: None,
            skip: None,
            limit: None,
            projection: None,
        }
    }

    pub fn skip(mut self, skip: u64) -> FindOptions {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> FindOptions {
        self.limit = Some(limit);
        self
    }

    /// Appends a sort key after the ones already present.
    pub fn sort_by(mut self, field_name: &str, sort_order: SortOrder) -> FindOptions {
        let sort = self.sort.take().unwrap_or_default();
        self.sort = Some(sort.add_sorted_field(field_name, sort_order));
        self
    }

    /// Replaces the sort specification.
    pub fn sort(mut self, sort: SortSpec) -> FindOptions {
        self.sort = Some(sort);
        self
    }

    /// Sets an inclusion (`{field: 1}`) or exclusion (`{field: 0}`)
    /// projection.
    pub fn projection(mut self, projection: Document) -> FindOptions {
        self.projection = Some(projection);
        self
    }

    pub fn sort_spec(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn skip_count(&self) -> Option<u64> {
        self.skip
    }

    pub fn limit_count(&self) -> Option<u64> {
        self.limit
    }

    pub fn projection_doc(&self) -> Option<&Document> {
        self.projection.as_ref()
    }
}
