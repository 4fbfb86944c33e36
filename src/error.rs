//! Error types for model-audit operations.
//!
//! Fetch-layer failures are classified into a small set of kinds so callers
//! can distinguish a missing remote resource from a transient transport
//! problem or a malformed metadata response. Metric failures never surface
//! here; the evaluation engine contains them.

use thiserror::Error;

/// How many bytes of a response body are kept when reporting an HTTP error.
const BODY_SNIPPET_LEN: usize = 200;

/// Errors produced by the fetch layer and the command handlers.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The URL host or path shape is not recognized as a supported provider.
    #[error("unsupported artifact location: {url}")]
    UnsupportedLocation { url: String },

    /// The remote resource, ref, or file does not exist.
    #[error("resource or ref does not exist: {url}")]
    NotFound { url: String },

    /// A non-2xx response (other than 404) after retries were exhausted.
    #[error("HTTP {status} from {url}: {snippet}")]
    Http { url: String, status: u16, snippet: String },

    /// A transport-level failure after retries were exhausted.
    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A remote response had an unexpected shape.
    #[error("unexpected response shape from {url}: {message}")]
    Schema { url: String, message: String },

    /// A local filesystem operation failed.
    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// A glob pattern failed to compile.
    #[error("invalid glob pattern `{pattern}`: {message}")]
    Pattern { pattern: String, message: String },

    /// The HTTP client could not be constructed.
    #[error("failed to initialize HTTP client: {message}")]
    ClientInit { message: String },

    /// An internal configuration invariant was violated.
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// One or more input lines failed to evaluate.
    #[error("{failed} input line(s) could not be evaluated")]
    Evaluation { failed: usize },
}

impl Error {
    pub fn unsupported(url: impl Into<String>) -> Self {
        Self::UnsupportedLocation { url: url.into() }
    }

    pub fn not_found(url: impl Into<String>) -> Self {
        Self::NotFound { url: url.into() }
    }

    /// Build an HTTP error, keeping only a short prefix of the response body.
    pub fn http(url: impl Into<String>, status: u16, body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body);
        let snippet = text.chars().take(BODY_SNIPPET_LEN).collect();
        Self::Http {
            url: url.into(),
            status,
            snippet,
        }
    }

    pub fn network(url: impl Into<String>, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Network {
            url: url.into(),
            source: source.into(),
        }
    }

    pub fn schema(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Short stable identifier for the error kind, used in diagnostic details.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedLocation { .. } => "unsupported_location",
            Self::NotFound { .. } => "not_found",
            Self::Http { .. } => "http_error",
            Self::Network { .. } => "network_error",
            Self::Schema { .. } => "schema_error",
            Self::Io { .. } => "io_error",
            Self::Pattern { .. } => "pattern_error",
            Self::ClientInit { .. } => "client_init",
            Self::Invariant(_) => "invariant",
            Self::Evaluation { .. } => "evaluation",
        }
    }
}
