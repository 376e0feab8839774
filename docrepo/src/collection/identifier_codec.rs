use crate::collection::ObjectId;
use crate::common::Value;
use crate::errors::{ErrorKind, RepoError, RepoResult};

/// Converts identifiers between their external text form and the
/// store-native [ObjectId].
pub struct IdentifierCodec;

impl IdentifierCodec {
    pub fn encode(id: &ObjectId) -> String {
        id.to_hex()
    }

    /// Decodes the external form, failing with
    /// [ErrorKind::MalformedIdentifier] for anything but 24 hex characters.
    pub fn decode(text: &str) -> RepoResult<ObjectId> {
        ObjectId::parse_str(text)
    }

    /// Reads a native identifier out of a document value.
    ///
    /// Accepts a native value first and falls back to decoding a string.
    pub fn from_value(value: &Value) -> RepoResult<ObjectId> {
        match value {
            Value::ObjectId(id) => Ok(*id),
            Value::String(text) => IdentifierCodec::decode(text),
            other => {
                log::error!("Value {} cannot be used as an identifier", other);
                Err(RepoError::new(
                    &format!("Value of type {} cannot be used as an identifier", other.type_name()),
                    ErrorKind::MalformedIdentifier,
                ))
            }
        }
    }
}

/// An identifier supplied by a caller, in either native or textual form.
///
/// Lookups by identifier accept anything convertible into an `IdLookup`:
///
/// ```rust,ignore
/// repo.find_one_by_id(object_id)?;
/// repo.find_one_by_id("611827f2878b88b49ebb69fc")?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum IdLookup {
    Native(ObjectId),
    Text(String),
}

impl IdLookup {
    pub fn resolve(&self) -> RepoResult<ObjectId> {
        match self {
            IdLookup::Native(id) => Ok(*id),
            IdLookup::Text(text) => IdentifierCodec::decode(text),
        }
    }
}

impl From<ObjectId> for IdLookup {
    fn from(value: ObjectId) -> Self {
        IdLookup::Native(value)
    }
}

impl From<&ObjectId> for IdLookup {
    fn from(value: &ObjectId) -> Self {
        IdLookup::Native(*value)
    }
}

impl From<String> for IdLookup {
    fn from(value: String) -> Self {
        IdLookup::Text(value)
    }
}

impl From<&String> for IdLookup {
    fn from(value: &String) -> Self {
        IdLookup::Text(value.clone())
    }
}

impl From<&str> for IdLookup {
    fn from(value: &str) -> Self {
        IdLookup::Text(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode_is_identity() {
        for _ in 0..100 {
            let id = ObjectId::new();
            assert_eq!(IdentifierCodec::decode(&IdentifierCodec::encode(&id)).unwrap(), id);
        }
    }

    #[test]
    fn decode_rejects_malformed_text() {
        let err = IdentifierCodec::decode("not-an-id").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::MalformedIdentifier);
    }

    #[test]
    fn from_value_accepts_native_and_text() {
        let id = ObjectId::new();
        assert_eq!(IdentifierCodec::from_value(&Value::ObjectId(id)).unwrap(), id);
        assert_eq!(IdentifierCodec::from_value(&Value::String(id.to_hex())).unwrap(), id);
    }

    #[test]
    fn from_value_rejects_other_types() {
        let err = IdentifierCodec::from_value(&Value::I32(5)).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::MalformedIdentifier);
    }

    #[test]
    fn lookup_resolves_both_forms() {
        let id = ObjectId::new();
        assert_eq!(IdLookup::from(id).resolve().unwrap(), id);
        assert_eq!(IdLookup::from(id.to_hex()).resolve().unwrap(), id);
        assert_eq!(IdLookup::from("bad").resolve().unwrap_err().kind(), &ErrorKind::MalformedIdentifier);
    }
}
