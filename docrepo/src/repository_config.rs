//! Configuration of a repository.

use crate::common::DOC_ID;
use crate::errors::{ErrorKind, RepoError, RepoResult};

/// Where a repository keeps its documents.
///
/// # Examples
///
/// ```rust,ignore
/// use docrepo::repository_config::RepositoryConfig;
///
/// let config = RepositoryConfig::new("spams").identity_key("_id");
/// let repository = Repository::<Spam, _>::new(store, config)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    collection_name: String,
    identity_key: String,
}

impl RepositoryConfig {
    pub fn new(collection_name: &str) -> RepositoryConfig {
        RepositoryConfig {
            collection_name: collection_name.to_string(),
            identity_key: DOC_ID.to_string(),
        }
    }

    /// Sets the document key holding the identifier. Defaults to `_id`.
    pub fn identity_key(mut self, identity_key: &str) -> RepositoryConfig {
        self.identity_key = identity_key.to_string();
        self
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn get_identity_key(&self) -> &str {
        &self.identity_key
    }

    /// Checks the collection name and the identity key.
    ///
    /// # Errors
    ///
    /// Returns [ErrorKind::InvalidConfiguration] if either is empty, if the
    /// collection name contains a space or a `$`, or if the identity key is
    /// a path.
    pub fn validate(&self) -> RepoResult<()> {
        let name = self.collection_name.as_str();
        if name.is_empty() {
            log::error!("Collection name cannot be empty");
            return Err(RepoError::new(
                "Collection name cannot be empty",
                ErrorKind::InvalidConfiguration,
            ));
        }

        if name.contains(' ') || name.contains('$') {
            log::error!("Collection name '{}' contains an invalid character", name);
            return Err(RepoError::new(
                &format!("Collection name '{}' contains an invalid character", name),
                ErrorKind::InvalidConfiguration,
            ));
        }

        let key = self.identity_key.as_str();
        if key.is_empty() || key.contains('.') || key.starts_with('$') {
            log::error!("Invalid identity key '{}'", key);
            return Err(RepoError::new(
                &format!("Invalid identity key '{}'", key),
                ErrorKind::InvalidConfiguration,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RepositoryConfig::new("spams");
        assert_eq!(config.collection_name(), "spams");
        assert_eq!(config.get_identity_key(), "_id");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_configurations() {
        for config in vec![
            RepositoryConfig::new(""),
            RepositoryConfig::new("my spams"),
            RepositoryConfig::new("$spams"),
            RepositoryConfig::new("spams").identity_key(""),
            RepositoryConfig::new("spams").identity_key("a.b"),
            RepositoryConfig::new("spams").identity_key("$id"),
        ] {
            let err = config.validate().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidConfiguration, "{:?}", config);
        }
    }
}
