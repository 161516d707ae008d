//! Error types for gator.

use thiserror::Error;

/// Failure while retrieving or decoding a remote feed.
///
/// None of these are retried within a polling cycle; the next scheduled
/// poll is the only remedy.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Host unreachable, timeout, broken connection or cancelled request.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP error: {0}")]
    HttpStatus(u16),

    /// The body is not a well-formed RSS 2.0 document.
    #[error("failed to parse feed: {0}")]
    Parse(String),

    /// The body exceeds the configured maximum size.
    #[error("feed too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    /// The feed URL is malformed or points somewhere we refuse to fetch.
    #[error("invalid feed URL: {0}")]
    InvalidUrl(String),
}

/// Common error type for gator.
#[derive(Error, Debug)]
pub enum GatorError {
    /// Persistence-layer fault.
    ///
    /// Database errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// A post with this URL is already stored.
    #[error("post already exists: {0}")]
    DuplicateUrl(String),

    /// There is no feed to poll.
    #[error("no feeds available to fetch")]
    NoFeedsAvailable,

    /// Remote feed could not be fetched or parsed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad arguments or other user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Session file could not be read or written.
    #[error("session error: {0}")]
    Session(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GatorError {
    /// Whether the error was caused by what the user typed.
    pub fn is_user_error(&self) -> bool {
        matches!(self, GatorError::Validation(_) | GatorError::NotFound(_))
    }
}

// Conversion from sqlx errors
impl From<sqlx::Error> for GatorError {
    fn from(e: sqlx::Error) -> Self {
        GatorError::Database(e.to_string())
    }
}

/// Result type alias for gator operations.
pub type Result<T> = std::result::Result<T, GatorError>;
