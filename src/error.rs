//! Custom error types for lrweb

use std::sync::Arc;
use thiserror::Error;

/// Main error type for lrweb operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The request never completed, or its body could not be read or decoded
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status
    #[error("{status}: {body}")]
    Status { status: u16, body: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Query cache error: {0}")]
    Cache(String),

    /// One failure delivered to every waiter of a de-duplicated query
    #[error(transparent)]
    Shared(Arc<Error>),
}

impl Error {
    /// HTTP status carried by this error, if the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            Error::Shared(inner) => inner.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<Arc<Error>> for Error {
    fn from(err: Arc<Error>) -> Self {
        Error::Shared(err)
    }
}

/// Result type alias for lrweb
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = Error::Status {
            status: 404,
            body: r#"{"detail":"Project not found"}"#.to_string(),
        };
        assert_eq!(err.to_string(), r#"404: {"detail":"Project not found"}"#);
        assert!(err.is_not_found());
    }

    #[test]
    fn test_shared_error_is_transparent() {
        let inner = Arc::new(Error::Status {
            status: 500,
            body: "boom".to_string(),
        });
        let err = Error::from(inner);
        assert_eq!(err.to_string(), "500: boom");
        assert_eq!(err.status(), Some(500));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_non_http_errors_have_no_status() {
        let err = Error::Config("bad".to_string());
        assert_eq!(err.status(), None);
    }
}
