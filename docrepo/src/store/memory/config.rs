use crate::common::DOC_ID;

/// Configuration for a [MemoryStore](super::MemoryStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStoreConfig {
    identity_key: String,
}

impl MemoryStoreConfig {
    pub fn new() -> MemoryStoreConfig {
        MemoryStoreConfig {
            identity_key: DOC_ID.to_string(),
        }
    }

    /// Sets the document key that holds the identity value.
    pub fn identity_key(mut self, identity_key: &str) -> MemoryStoreConfig {
        self.identity_key = identity_key.to_string();
        self
    }

    pub fn get_identity_key(&self) -> &str {
        &self.identity_key
    }
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        MemoryStoreConfig::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_identity_key() {
        assert_eq!(MemoryStoreConfig::default().get_identity_key(), "_id");
        assert_eq!(MemoryStoreConfig::new().identity_key("key").get_identity_key(), "key");
    }
}
