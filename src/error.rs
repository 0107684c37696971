//! Error types for feed-rattler
//!
//! Three kinds of failure can end an operation:
//! - structural/compatibility errors, when a payload or its markup does not have
//!   the expected shape ([`Error::Compat`])
//! - transport errors, covering everything between building the request URL and
//!   decoding the response body ([`Error::Url`] with a [`TransportError`] cause)
//! - media download errors, raised while fetching gallery images
//!   ([`Error::MediaDownload`])
//!
//! None of them are retried inside the crate.

use thiserror::Error;

/// Result type alias for feed-rattler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for feed-rattler
#[derive(Debug, Error)]
pub enum Error {
    /// Extracted data did not match the expected shape
    ///
    /// Most likely the remote service changed its internal interfaces, or the
    /// extractor has a bug.
    #[error("API compatibility error: {message}")]
    Compat {
        /// Human-readable description of the mismatch
        message: String,
        /// Identifier of the record being extracted, when it was already known
        record_id: Option<u64>,
    },

    /// Fetching or decoding data from the remote server failed
    #[error("{message} ({url}): {source}")]
    Url {
        /// What the client was doing when the failure happened
        message: String,
        /// The URL of the failed request
        url: String,
        /// Underlying transport failure
        #[source]
        source: TransportError,
    },

    /// Downloading an embedded media item failed
    #[error("{message} ({url}): {source}")]
    MediaDownload {
        /// What the downloader was doing when the failure happened
        message: String,
        /// The URL of the media item
        url: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },
}

/// Transport-level failures wrapped by [`Error::Url`]
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request URL could not be built
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The request could not be sent or no response arrived
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The server answered with a non-success status code
    #[error("HTTP {code}")]
    Status {
        /// The HTTP status code returned by the server
        code: u16,
    },

    /// The response body could not be read
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    /// A body labelled as deflate was not a valid zlib stream
    #[error("corrupt zlib stream: {0}")]
    Decompress(#[source] std::io::Error),

    /// The response body was not valid JSON
    #[error("failed to decode JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl Error {
    /// Create a structural error that is not yet tied to a record
    pub fn compat(message: impl Into<String>) -> Self {
        Error::Compat {
            message: message.into(),
            record_id: None,
        }
    }

    /// Create a structural error for a known record
    pub fn compat_for(message: impl Into<String>, record_id: u64) -> Self {
        Error::Compat {
            message: message.into(),
            record_id: Some(record_id),
        }
    }

    /// Create a transport error for the given URL
    pub fn url(
        message: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<TransportError>,
    ) -> Self {
        Error::Url {
            message: message.into(),
            url: url.into(),
            source: source.into(),
        }
    }

    /// Attach a record id to a structural error that does not carry one yet
    ///
    /// Other error kinds are returned unchanged.
    pub fn with_record_id(self, id: u64) -> Self {
        match self {
            Error::Compat {
                message,
                record_id: None,
            } => Error::Compat {
                message,
                record_id: Some(id),
            },
            other => other,
        }
    }

    /// Record id associated with a structural error, if known
    pub fn record_id(&self) -> Option<u64> {
        match self {
            Error::Compat { record_id, .. } => *record_id,
            _ => None,
        }
    }

    /// URL associated with a transport or media download error
    pub fn request_url(&self) -> Option<&str> {
        match self {
            Error::Url { url, .. } | Error::MediaDownload { url, .. } => Some(url),
            _ => None,
        }
    }

    /// HTTP status code, when the server rejected the request
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Url {
                source: TransportError::Status { code },
                ..
            } => Some(*code),
            Error::MediaDownload { source, .. } => source.status_code(),
            _ => None,
        }
    }
}
