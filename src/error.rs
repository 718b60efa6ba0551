//! Error types for salesforce-oauth2.
//!
//! Error messages are designed to avoid exposing sensitive credential data.

/// Result type alias for salesforce-oauth2 operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for salesforce-oauth2 operations.
///
/// Error messages are sanitized to prevent accidental credential exposure.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }
}

/// The kind of error that occurred.
///
/// The four network-facing classes map directly onto what can go wrong in a
/// token exchange: the transport failed, the body was not JSON, Salesforce
/// reported an error, or the identity signature did not check out.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Transport-level failure (connection, DNS, TLS). Not retried.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Response body was not valid JSON.
    #[error("JSON error: {0}")]
    Json(String),

    /// Error reported by Salesforce in the response payload.
    ///
    /// The full payload is attached for caller inspection
    /// (`error_description` and any extra fields Salesforce includes).
    #[error("OAuth error: {error} - {description}")]
    Api {
        error: String,
        description: String,
        payload: serde_json::Value,
    },

    /// The payload's `signature` field did not match the HMAC-SHA256 of
    /// `id` + `issued_at` keyed by the client secret.
    ///
    /// Distinct from [`ErrorKind::Api`]: Salesforce did not report a failure;
    /// the response failed local verification, which indicates tampering or a
    /// client-secret mismatch.
    #[error("response signature verification failed")]
    SignatureMismatch,

    /// Query-string encoding failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Sanitize the error message to avoid exposing URLs with tokens
        let message = err.to_string();
        let sanitized = if message.contains("token=") || message.contains("client_secret") {
            "HTTP request failed (details redacted for security)".to_string()
        } else {
            message
        };
        Error::with_source(ErrorKind::Http(sanitized), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<serde_urlencoded::ser::Error> for Error {
    fn from(err: serde_urlencoded::ser::Error) -> Self {
        Error::with_source(ErrorKind::Serialization(err.to_string()), err)
    }
}
