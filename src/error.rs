//! Error types for pagestream
//!
//! This module provides the error taxonomy for the export pipeline:
//! - Stage-specific error types (fetch, pagination, parse, sink)
//! - A top-level [`Error`] that every stage converts into
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes
//!
//! Propagation policy: the first error in any stage halts the whole
//! pipeline. Bytes already emitted to the client stay emitted; the response
//! simply terminates. There is no automatic retry of failed fetches.

use crate::types::PageNumber;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for pagestream operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pagestream
///
/// This is the primary error type used throughout the library. Each variant
/// includes contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Fetching a page from the remote API failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// A page's control data was missing or unusable
    #[error("malformed page: {0}")]
    MalformedPage(#[from] MalformedPageError),

    /// The data path contained invalid JSON
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Writing to the downstream sink failed
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },

    /// HTTP client error outside the scope of a single page (e.g., client construction)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServer(String),
}

/// Network or HTTP failure while fetching a single page
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the response headers never arrived
    #[error("request for page {page} failed: {source}")]
    Request {
        /// The page whose fetch failed
        page: PageNumber,
        /// The underlying transport error
        source: reqwest::Error,
    },

    /// The remote API answered with a non-success status
    #[error("page {page} returned HTTP {status}")]
    Status {
        /// The page whose fetch failed
        page: PageNumber,
        /// The non-success status returned by the remote API
        status: reqwest::StatusCode,
    },

    /// The response body stream failed after headers were received
    #[error("page {page} body failed mid-stream: {source}")]
    Body {
        /// The page whose body stream failed
        page: PageNumber,
        /// The underlying transport error
        source: reqwest::Error,
    },
}

impl FetchError {
    /// The page this error is scoped to
    pub fn page(&self) -> PageNumber {
        match self {
            FetchError::Request { page, .. }
            | FetchError::Status { page, .. }
            | FetchError::Body { page, .. } => *page,
        }
    }
}

/// A page's control stream did not carry usable pagination metadata
#[derive(Debug, Error)]
pub enum MalformedPageError {
    /// The control stream ended without the total-page-count field
    #[error("page {page} control stream ended without a total-page-count field")]
    MissingTotalPages {
        /// The page whose control stream was exhausted
        page: PageNumber,
    },

    /// The total-page-count field held something other than a non-negative integer
    #[error("page {page} carries an invalid total-page count: {value}")]
    InvalidTotalPages {
        /// The page whose control stream was scanned
        page: PageNumber,
        /// The raw value found under the total-page-count field
        value: String,
    },
}

/// Invalid JSON encountered on the data path
#[derive(Debug, Error)]
pub enum ParseError {
    /// A structural violation in the JSON byte stream
    #[error("invalid JSON at byte {offset}: {message}")]
    Syntax {
        /// Absolute byte offset into the concatenated stream
        offset: u64,
        /// What the scanner expected or found
        message: String,
    },

    /// The stream ended inside an unterminated document
    #[error("unexpected end of JSON input at byte {offset}")]
    UnexpectedEof {
        /// Absolute byte offset at which input ended
        offset: u64,
    },

    /// A framed record element could not be materialized
    #[error("record element is not valid JSON: {message}")]
    InvalidElement {
        /// The deserializer's diagnostic
        message: String,
    },

    /// A record array element was not a JSON object
    #[error("record element is not a JSON object: {snippet}")]
    NotAnObject {
        /// The first bytes of the offending element
        snippet: String,
    },
}

/// Downstream write failure or client disconnect
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink went away (client disconnected) while rows were being written
    #[error("sink closed before the export completed")]
    Closed,

    /// The sink rejected a write for a reason other than closure
    #[error("failed to write to sink: {0}")]
    Write(#[source] std::io::Error),
}

impl SinkError {
    /// Classify an I/O error from the sink.
    ///
    /// Disconnect-shaped errors map to [`SinkError::Closed`]; everything else
    /// is carried verbatim.
    pub fn from_io(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected => SinkError::Closed,
            _ => SinkError::Write(e),
        }
    }
}

/// API error response format
///
/// Returned by API endpoints when an error occurs before streaming starts.
/// It follows a standard format with machine-readable error codes,
/// human-readable messages, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "fetch_error",
///     "message": "fetch error: page 2 returned HTTP 502 Bad Gateway",
///     "details": {
///       "page": 2
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "fetch_error", "config_error")
    ///
    /// Clients can use this for programmatic error handling.
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let message = error.to_string();
        let details = match &error {
            Error::Fetch(e) => Some(serde_json::json!({ "page": e.page().get() })),
            Error::MalformedPage(
                MalformedPageError::MissingTotalPages { page }
                | MalformedPageError::InvalidTotalPages { page, .. },
            ) => Some(serde_json::json!({ "page": page.get() })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({ "key": key })),
            _ => None,
        };
        Self {
            error: ErrorDetail {
                code: error.error_code().to_string(),
                message,
                details,
            },
        }
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,

            // 502 Bad Gateway - the remote paged API misbehaved
            Error::Fetch(_) => 502,
            Error::MalformedPage(_) => 502,
            Error::Parse(_) => 502,
            Error::Network(_) => 502,

            // 500 Internal Server Error - Server-side issues
            Error::Sink(_) => 500,
            Error::Io(_) => 500,
            Error::ApiServer(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Fetch(_) => "fetch_error",
            Error::MalformedPage(_) => "malformed_page",
            Error::Parse(_) => "parse_error",
            Error::Sink(_) => "sink_error",
            Error::Config { .. } => "config_error",
            Error::Network(_) => "network_error",
            Error::Io(_) => "io_error",
            Error::ApiServer(_) => "api_server_error",
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_page_display() {
        let e = MalformedPageError::MissingTotalPages {
            page: PageNumber::new(3),
        };
        assert_eq!(
            e.to_string(),
            "page 3 control stream ended without a total-page-count field"
        );

        let e = MalformedPageError::InvalidTotalPages {
            page: PageNumber::new(1),
            value: "\"two\"".to_string(),
        };
        assert!(e.to_string().contains("invalid total-page count"));
        assert!(e.to_string().contains("\"two\""));
    }

    #[test]
    fn test_parse_error_display_carries_offset() {
        let e = ParseError::Syntax {
            offset: 17,
            message: "unexpected byte ':'".to_string(),
        };
        assert!(e.to_string().contains("byte 17"));

        let e = ParseError::UnexpectedEof { offset: 4 };
        assert_eq!(e.to_string(), "unexpected end of JSON input at byte 4");
    }

    #[test]
    fn test_sink_error_from_io_classifies_disconnects() {
        let closed = SinkError::from_io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "pipe gone",
        ));
        assert!(matches!(closed, SinkError::Closed));

        let write = SinkError::from_io(std::io::Error::other("disk full"));
        assert!(matches!(write, SinkError::Write(_)));
    }

    #[test]
    fn test_status_codes() {
        let config = Error::Config {
            message: "bad value".to_string(),
            key: Some("base_url".to_string()),
        };
        assert_eq!(config.status_code(), 400);
        assert_eq!(config.error_code(), "config_error");

        let malformed = Error::MalformedPage(MalformedPageError::MissingTotalPages {
            page: PageNumber::FIRST,
        });
        assert_eq!(malformed.status_code(), 502);
        assert_eq!(malformed.error_code(), "malformed_page");

        let sink = Error::Sink(SinkError::Closed);
        assert_eq!(sink.status_code(), 500);
        assert_eq!(sink.error_code(), "sink_error");
    }

    #[test]
    fn test_api_error_carries_page_details() {
        let error = Error::MalformedPage(MalformedPageError::MissingTotalPages {
            page: PageNumber::new(2),
        });
        let api_error: ApiError = error.into();

        assert_eq!(api_error.error.code, "malformed_page");
        assert!(api_error.error.message.contains("page 2"));
        assert_eq!(api_error.error.details.unwrap()["page"], 2);
    }

    #[test]
    fn test_api_error_carries_config_key() {
        let error = Error::Config {
            message: "invalid base_url".to_string(),
            key: Some("base_url".to_string()),
        };
        let api_error: ApiError = error.into();

        assert_eq!(api_error.error.code, "config_error");
        assert_eq!(api_error.error.details.unwrap()["key"], "base_url");
    }

    #[test]
    fn test_error_from_stage_errors() {
        let e: Error = ParseError::UnexpectedEof { offset: 0 }.into();
        assert!(matches!(e, Error::Parse(_)));

        let e: Error = SinkError::Closed.into();
        assert!(matches!(e, Error::Sink(_)));
    }
}
