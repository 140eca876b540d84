//! Error types for tspurge

use std::fmt;

/// Result type alias for tspurge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for tspurge
#[derive(Debug)]
pub enum Error {
    /// Missing or invalid operator input, raised before any store contact
    Usage(String),
    /// The UID catalog has no entry for this metric name
    MetricNotFound { name: String },
    /// The UID catalog returned an identifier of the wrong width
    InvalidUid {
        name: String,
        expected: usize,
        actual: usize,
    },
    /// A row key too short to carry a base-hour timestamp
    MalformedRowKey { len: usize, needed: usize },
    /// Store collaborator failure
    Transport(String),
    /// HTTP errors from the REST gateway
    Http(reqwest::Error),
    /// A purge stopped part way through
    PurgeAborted {
        metric: String,
        processed: u64,
        source: Box<Error>,
    },
    /// Operator declined at the confirmation prompt
    UserAborted,
    /// IO errors
    Io(std::io::Error),
    /// Serialization errors
    Serialization(String),
    /// Configuration errors
    Config(String),
}

impl Error {
    /// True for failures raised at the store boundary.
    pub fn is_transport(&self) -> bool {
        match self {
            Error::Transport(_) | Error::Http(_) => true,
            Error::PurgeAborted { source, .. } => source.is_transport(),
            _ => false,
        }
    }

    /// Process exit code for this error.
    ///
    /// `2` usage, `3` unknown metric, `4` declined by the operator,
    /// `1` everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(_) | Error::Config(_) => 2,
            Error::MetricNotFound { .. } => 3,
            Error::UserAborted => 4,
            _ => 1,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Io(e) => Some(e),
            Error::PurgeAborted { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Usage(msg) => write!(f, "Usage error: {}", msg),
            Error::MetricNotFound { name } => write!(f, "Could not find ID for metric {}", name),
            Error::InvalidUid {
                name,
                expected,
                actual,
            } => write!(
                f,
                "Invalid UID for metric {}: expected {} bytes, got {}",
                name, expected, actual
            ),
            Error::MalformedRowKey { len, needed } => write!(
                f,
                "Malformed row key: {} bytes, need at least {}",
                len, needed
            ),
            Error::Transport(msg) => write!(f, "Transport error: {}", msg),
            Error::Http(e) => write!(f, "HTTP error: {}", e),
            Error::PurgeAborted {
                metric,
                processed,
                source,
            } => write!(
                f,
                "Purge of {} aborted after {} rows: {}",
                metric, processed, source
            ),
            Error::UserAborted => write!(f, "Purge declined by operator"),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::Serialization(e.to_string())
    }
}
