//! Error type for the SOAP transport adapter.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SoapError {
    /// The underlying HTTP client could not be constructed.
    ///
    /// Produced by: `SoapTransport::new`.
    #[error("Failed to build SOAP HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection, TLS, timeout, or protocol failure.
    ///
    /// Produced by: posting the envelope or reading the response body.
    #[error("SOAP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a SOAP fault.
    ///
    /// Produced by: response parsing, whatever the HTTP status.
    #[error("SOAP fault {code}: {message}")]
    Fault {
        /// `faultcode` text, e.g. `SOAP-ENV:Server`.
        code: String,
        /// `faultstring` text.
        message: String,
        /// Text of the `detail` element, when present.
        detail: Option<String>,
    },

    /// An error status without a fault in the body.
    #[error("HTTP {status} returned by {endpoint}")]
    Status {
        /// Endpoint URL the envelope was posted to.
        endpoint: String,
        /// HTTP status code.
        status: u16,
    },

    /// Well-formed XML that is not a usable SOAP response.
    ///
    /// Produced by: response parsing when the envelope, body, or operation
    /// response element is missing.
    #[error("Malformed SOAP response: {reason}")]
    MalformedResponse {
        /// Which part of the envelope was missing or unexpected.
        reason: String,
    },

    /// The response body is not well-formed XML.
    ///
    /// Produced by: the XML reader during response parsing.
    #[error("Invalid XML in SOAP response: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An operation or parameter name that is not a valid XML element name.
    ///
    /// Produced by: envelope construction.
    #[error("Invalid XML name '{name}'")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// The envelope could not be written.
    ///
    /// Produced by: envelope construction.
    #[error("Failed to write SOAP envelope: {0}")]
    Envelope(#[from] std::fmt::Error),

    /// A caller header name or value is not valid HTTP.
    ///
    /// Produced by: header conversion before the envelope is posted.
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader {
        /// Header name as given by the caller.
        name: String,
        /// Why the name or value was rejected.
        reason: String,
    },
}

impl SoapError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }
}
