use crate::common::FIELD_SEPARATOR;
use crate::errors::{ErrorKind, RepoError, RepoResult};
use std::collections::HashSet;

/// How a model keeps its identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdRepr {
    /// As a store-native [ObjectId](crate::collection::ObjectId).
    Native,
    /// As the 24 character hexadecimal text form.
    Text,
}

/// Shape of a declared field, as far as mapping cares.
///
/// Only fields that can contain embedded entities need more than
/// [FieldKind::Scalar]; the mapper walks those to translate nested
/// identifiers.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Scalar,
    /// An embedded entity with its own schema.
    Embedded(fn() -> &'static Schema),
    /// An ordered sequence of the inner kind.
    Sequence(Box<FieldKind>),
    /// A string keyed map of the inner kind.
    Mapping(Box<FieldKind>),
}

impl FieldKind {
    /// Returns `true` when values of this kind may hold embedded entities.
    pub fn has_embedded(&self) -> bool {
        match self {
            FieldKind::Scalar => false,
            FieldKind::Embedded(_) => true,
            FieldKind::Sequence(inner) | FieldKind::Mapping(inner) => inner.has_embedded(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    name: String,
    kind: FieldKind,
    required: bool,
}

impl FieldDef {
    pub fn new(name: &str, kind: FieldKind, required: bool) -> Self {
        FieldDef {
            name: name.to_string(),
            kind,
            required,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// The identifier attribute of a type.
#[derive(Debug, Clone)]
pub struct IdField {
    attribute: String,
    repr: IdRepr,
    required: bool,
}

impl IdField {
    pub fn new(attribute: &str, repr: IdRepr, required: bool) -> Self {
        IdField {
            attribute: attribute.to_string(),
            repr,
            required,
        }
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn repr(&self) -> IdRepr {
        self.repr
    }

    /// `false` when the attribute is an `Option` and a model may exist
    /// before it is persisted.
    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Descriptor of a mapped type: its declared fields, their nesting and the
/// identifier attribute.
///
/// The `Entity` derive builds one `Schema` per type, once. Repositories
/// validate the schema of their model when they are created.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: Vec<FieldDef>,
    id: Option<IdField>,
}

impl Schema {
    pub fn new(name: &str, fields: Vec<FieldDef>, id: Option<IdField>) -> Self {
        Schema {
            name: name.to_string(),
            fields,
            id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn id(&self) -> Option<&IdField> {
        self.id.as_ref()
    }

    /// Required fields other than the identifier attribute, in declaration
    /// order.
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDef> {
        let id_attribute = self.id.as_ref().map(|id| id.attribute.as_str());
        self.fields
            .iter()
            .filter(move |field| field.required && Some(field.name.as_str()) != id_attribute)
    }

    /// Checks field names and the identifier declaration of this schema and
    /// of every schema reachable from it.
    pub fn validate(&self) -> RepoResult<()> {
        let mut visited = HashSet::new();
        self.validate_inner(&mut visited)
    }

    fn validate_inner(&self, visited: &mut HashSet<*const Schema>) -> RepoResult<()> {
        if !visited.insert(self as *const Schema) {
            return Ok(());
        }

        let mut names = HashSet::new();
        for field in &self.fields {
            let name = field.name.as_str();
            if name.is_empty() || name.contains(FIELD_SEPARATOR) || name.starts_with('$') {
                log::error!("Invalid field name '{}' in {}", name, self.name);
                return Err(RepoError::new(
                    &format!("Invalid field name '{}' in {}", name, self.name),
                    ErrorKind::InvalidConfiguration,
                ));
            }

            if !names.insert(name) {
                log::error!("Duplicate field name '{}' in {}", name, self.name);
                return Err(RepoError::new(
                    &format!("Duplicate field name '{}' in {}", name, self.name),
                    ErrorKind::InvalidConfiguration,
                ));
            }
        }

        if let Some(id) = &self.id {
            if !names.contains(id.attribute.as_str()) {
                log::error!("Identifier attribute '{}' is not a field of {}", id.attribute, self.name);
                return Err(RepoError::new(
                    &format!("Identifier attribute '{}' is not a field of {}", id.attribute, self.name),
                    ErrorKind::InvalidConfiguration,
                ));
            }
        }

        for field in &self.fields {
            validate_kind(&field.kind, visited)?;
        }
        Ok(())
    }
}

fn validate_kind(kind: &FieldKind, visited: &mut HashSet<*const Schema>) -> RepoResult<()> {
    match kind {
        FieldKind::Scalar => Ok(()),
        FieldKind::Embedded(schema) => schema().validate_inner(visited),
        FieldKind::Sequence(inner) | FieldKind::Mapping(inner) => validate_kind(inner, visited),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    fn bar_schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new(
                "Bar",
                vec![
                    FieldDef::new("apple", FieldKind::Scalar, true),
                    FieldDef::new("banana", FieldKind::Scalar, false),
                ],
                None,
            )
        })
    }

    fn node_schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new(
                "Node",
                vec![
                    FieldDef::new("id", FieldKind::Scalar, false),
                    FieldDef::new("children", FieldKind::Sequence(Box::new(FieldKind::Embedded(node_schema))), true),
                ],
                Some(IdField::new("id", IdRepr::Native, false)),
            )
        })
    }

    #[test]
    fn test_valid_schema() {
        let schema = Schema::new(
            "Foo",
            vec![
                FieldDef::new("id", FieldKind::Scalar, false),
                FieldDef::new("bars", FieldKind::Sequence(Box::new(FieldKind::Embedded(bar_schema))), true),
            ],
            Some(IdField::new("id", IdRepr::Native, false)),
        );
        assert!(schema.validate().is_ok());
        assert!(schema.field("bars").map(|f| f.kind().has_embedded()).unwrap_or(false));
        let required: Vec<&str> = schema.required_fields().map(|f| f.name()).collect();
        assert_eq!(required, vec!["bars"]);
    }

    #[test]
    fn test_recursive_schema_validates() {
        assert!(node_schema().validate().is_ok());
    }

    #[test]
    fn test_duplicate_field_is_rejected() {
        let schema = Schema::new(
            "Foo",
            vec![
                FieldDef::new("a", FieldKind::Scalar, true),
                FieldDef::new("a", FieldKind::Scalar, true),
            ],
            None,
        );
        assert_eq!(schema.validate().unwrap_err().kind(), &ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_dotted_field_is_rejected() {
        let schema = Schema::new("Foo", vec![FieldDef::new("a.b", FieldKind::Scalar, true)], None);
        assert_eq!(schema.validate().unwrap_err().kind(), &ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_undeclared_id_attribute_is_rejected() {
        let schema = Schema::new(
            "Foo",
            vec![FieldDef::new("name", FieldKind::Scalar, true)],
            Some(IdField::new("id", IdRepr::Text, true)),
        );
        assert_eq!(schema.validate().unwrap_err().kind(), &ErrorKind::InvalidConfiguration);
    }
}
