use thiserror::Error;

/// Shared error taxonomy for connector seams.
///
/// The retry interceptor and the processing pipeline dispatch on the
/// error kind rather than matching response-body strings, so every
/// variant is explicit about whether it is worth retrying.
#[derive(Error, Debug, Clone)]
pub enum ConnectorError {
    /// Connection-level failure (DNS, TCP, TLS).
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The request did not complete within its deadline.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Non-success HTTP status surfaced to the caller.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Credential acquisition or refresh failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The item is not eligible for ingestion (disallowed MIME type,
    /// oversized content, missing required fields). Never retried.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Malformed payload from a collaborator.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Anything else that failed without a more precise shape.
    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl ConnectorError {
    /// Whether a retry of the same request can reasonably succeed.
    ///
    /// Covers transient transport failures and the throttle/outage
    /// status codes (429, 502, 503, 504).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connect(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => matches!(status, 429 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// Whether the error invalidates the whole scan cycle rather than
    /// a single item or container.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

pub type Result<T> = std::result::Result<T, ConnectorError>;
