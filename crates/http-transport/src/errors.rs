//! Error type for the HTTP transport adapter.
//!
//! Every variant reaches callers wrapped in [`dispatch::TransportError`]; use
//! [`dispatch::TransportError::downcast_ref`] to recover it.

use std::path::PathBuf;

use dispatch::Method;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpTransportError {
    /// The underlying client could not be constructed from the settings.
    ///
    /// Produced by: `ReqwestTransport::new`.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection, TLS, timeout, or protocol failure.
    ///
    /// Produced by: sending the request or reading the response body.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a 4xx or 5xx status while error statuses are
    /// treated as failures.
    ///
    /// Produced by: status check after the body is read; disabled per request
    /// by the `http_errors` option.
    #[error("HTTP {status} returned by {uri}")]
    Status {
        /// Full request URI.
        uri: String,
        /// HTTP status code.
        status: u16,
        /// Start of the response body, for diagnostics.
        body: String,
    },

    /// A request or part header name or value is not valid HTTP.
    ///
    /// Produced by: header conversion before the request is sent.
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader {
        /// Header name as given by the caller.
        name: String,
        /// Why the name or value was rejected.
        reason: String,
    },

    /// A recognised request option has a value of the wrong type or range.
    ///
    /// Produced by: `timeout` and `http_errors` option parsing.
    #[error("Invalid option '{key}': {reason}")]
    InvalidOption {
        /// Option key.
        key: String,
        /// What was expected and what was found.
        reason: String,
    },

    /// An attached file could not be read while building a multipart body.
    #[error("Cannot read attachment {}: {source}", .path.display())]
    Attachment {
        /// Path the attachment was opened from.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The method has no HTTP verb (RPC).
    #[error("Method {0} cannot be sent over HTTP")]
    UnsupportedMethod(Method),
}
