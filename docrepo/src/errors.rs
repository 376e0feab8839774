use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for repository operations
///
/// Each kind describes a category of failure so callers can tell a bad
/// identifier from a bad cursor or a failure reported by the store.
///
/// # Examples
///
/// ```rust,ignore
/// use docrepo::errors::{ErrorKind, RepoError, RepoResult};
///
/// fn example() -> RepoResult<()> {
///     Err(RepoError::new("Invalid cursor", ErrorKind::InvalidCursor))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// A textual identifier could not be decoded to its native form
    MalformedIdentifier,
    /// A document could not be converted to the requested type
    MappingError,
    /// A pagination cursor could not be decoded or does not match the sort
    InvalidCursor,

    /// The operation is not valid with the supplied arguments
    InvalidOperation,
    /// Repository or schema configuration is invalid
    InvalidConfiguration,

    /// A document with the same identifier already exists
    DuplicateKey,
    /// Error reported by the backing store
    StoreError,

    /// Error encoding or decoding data
    EncodingError,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::MalformedIdentifier => write!(f, "Malformed identifier"),
            ErrorKind::MappingError => write!(f, "Mapping error"),
            ErrorKind::InvalidCursor => write!(f, "Invalid cursor"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::InvalidConfiguration => write!(f, "Invalid configuration"),
            ErrorKind::DuplicateKey => write!(f, "Duplicate key"),
            ErrorKind::StoreError => write!(f, "Store error"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Error type of the repository layer.
///
/// A `RepoError` carries a message, an [ErrorKind], an optional cause and,
/// for mapping failures, the dotted path of the offending field. The path is
/// built up while the error travels out of nested structures, so an error
/// raised for `count` inside `foo` reports `foo.count`.
///
/// # Examples
///
/// ```rust,ignore
/// use docrepo::errors::{ErrorKind, RepoError};
///
/// let err = RepoError::missing_field("count").within("foo");
/// assert_eq!(err.kind(), &ErrorKind::MappingError);
/// assert_eq!(err.field(), Some("foo.count"));
/// ```
#[derive(Clone)]
pub struct RepoError {
    message: String,
    error_kind: ErrorKind,
    field: Option<String>,
    cause: Option<Box<RepoError>>,
    backtrace: Arc<Backtrace>,
}

impl RepoError {
    /// Creates a new `RepoError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        RepoError {
            message: message.to_string(),
            error_kind,
            field: None,
            cause: None,
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    /// Creates a new `RepoError` with a cause error.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: RepoError) -> Self {
        RepoError {
            message: message.to_string(),
            error_kind,
            field: None,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    /// Creates a [ErrorKind::MappingError] for the given field.
    pub fn mapping(field: &str, message: &str) -> Self {
        let mut error = RepoError::new(message, ErrorKind::MappingError);
        error.field = Some(field.to_string());
        error
    }

    /// Creates a [ErrorKind::MappingError] reporting a missing required field.
    pub fn missing_field(field: &str) -> Self {
        RepoError::mapping(field, "Missing required field")
    }

    /// Prefixes the field path of this error with `parent`.
    ///
    /// Errors without a field path get `parent` as their path when they are
    /// mapping errors; other kinds are returned untouched.
    pub fn within(mut self, parent: &str) -> Self {
        if self.error_kind != ErrorKind::MappingError {
            return self;
        }

        self.field = match self.field.take() {
            Some(field) => Some(format!("{}.{}", parent, field)),
            None => Some(parent.to_string()),
        };
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    /// Dotted path of the field a mapping error refers to.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn cause(&self) -> Option<&RepoError> {
        self.cause.as_deref()
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{} '{}'", self.message, field),
            None => write!(f, "{}", self.message),
        }
    }
}

impl Debug for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self, cause),
            None => write!(f, "{}\n{:?}", self, self.backtrace),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_error_new_creates_error() {
        let error = RepoError::new("An error occurred", ErrorKind::StoreError);
        assert_eq!(error.message(), "An error occurred");
        assert_eq!(error.kind(), &ErrorKind::StoreError);
        assert!(error.cause().is_none());
        assert!(error.field().is_none());
    }

    #[test]
    fn repo_error_new_with_cause_chains_source() {
        let cause = RepoError::new("Store down", ErrorKind::StoreError);
        let error = RepoError::new_with_cause("Save failed", ErrorKind::InternalError, cause);
        assert_eq!(error.cause().map(|c| c.message()), Some("Store down"));
        assert!(error.source().is_some());
    }

    #[test]
    fn missing_field_names_the_field() {
        let error = RepoError::missing_field("count");
        assert_eq!(error.kind(), &ErrorKind::MappingError);
        assert_eq!(error.field(), Some("count"));
        assert_eq!(error.to_string(), "Missing required field 'count'");
    }

    #[test]
    fn within_builds_nested_paths() {
        let error = RepoError::missing_field("apple").within("0").within("bars");
        assert_eq!(error.field(), Some("bars.0.apple"));
    }

    #[test]
    fn within_sets_path_on_bare_mapping_error() {
        let error = RepoError::new("Expected string", ErrorKind::MappingError).within("name");
        assert_eq!(error.field(), Some("name"));
    }

    #[test]
    fn within_ignores_other_kinds() {
        let error = RepoError::new("Bad cursor", ErrorKind::InvalidCursor).within("foo");
        assert!(error.field().is_none());
    }

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::InvalidCursor.to_string(), "Invalid cursor");
        assert_eq!(ErrorKind::MalformedIdentifier.to_string(), "Malformed identifier");
    }
}
