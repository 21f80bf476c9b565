//! Error types for the WebProxy dispatch core.
//!
//! [`ProxyError`] covers every condition the core itself can raise while
//! building, routing, or decoding a call. Failures raised by a transport are
//! carried unchanged inside [`ProxyError::Transport`]; the core never
//! reinterprets or retries them.
//!
//! Adapter crates (`http-transport`, `soap-transport`, `document`) define their
//! own error enums and hand them over through [`TransportError::new`].

use std::path::PathBuf;

use thiserror::Error;

use crate::{BodyType, Method};

// ---------------------------------------------------------------------------
// Transport failures
// ---------------------------------------------------------------------------

/// A failure raised by an external transport (network error, protocol error,
/// RPC fault).
///
/// The adapter's own error value is kept as-is; use [`TransportError::downcast_ref`]
/// to inspect it.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct TransportError(Box<dyn std::error::Error + Send + Sync>);

impl TransportError {
    /// Wraps an adapter error without altering it.
    pub fn new(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(error))
    }

    /// Returns the adapter error if it is of type `E`.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }
}

// ---------------------------------------------------------------------------
// Core errors
// ---------------------------------------------------------------------------

/// Errors surfaced by the dispatch core.
///
/// None of these are caught or retried internally. When a dispatch fails, any
/// state already attached to the endpoint is undefined.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The service type was never registered, or its capability has no route
    /// to a client.
    ///
    /// Produced by: [`crate::Registry::service`], [`crate::Registry::client_for`].
    #[error("Unknown service: {service}")]
    UnknownService {
        /// Type name of the service, or the unrouted capability.
        service: String,
    },

    /// No transport is registered for the client kind a capability routes to.
    ///
    /// Produced by: [`crate::Registry::client`].
    #[error("Unknown client: {client}")]
    UnknownClient {
        /// The client kind that could not be built.
        client: String,
    },

    /// The method is outside the verb set, outside the endpoint's whitelist,
    /// or not RPC on the RPC dispatch path.
    #[error("Unsupported method: {method}")]
    UnsupportedMethod {
        /// The rejected verb as supplied by the caller.
        method: String,
    },

    /// The request body type was already fixed to an encoding that conflicts
    /// with the one being requested (e.g. files after a JSON body).
    #[error("Request body type mismatch: body is {current}, cannot switch to {requested}")]
    RequestBodyTypeMismatch {
        /// Body type already fixed on the request.
        current: BodyType,
        /// Body type the offending call needed.
        requested: BodyType,
    },

    /// The response body could not be decoded into the endpoint variant's
    /// expected shape.
    #[error("Failed to decode response for {endpoint}: {reason}")]
    DecodeFailure {
        /// Type name of the endpoint being decoded.
        endpoint: String,
        /// What went wrong.
        reason: String,
    },

    /// An attachment file could not be opened.
    #[error("Cannot open attachment '{}'", .path.display())]
    Attachment {
        /// Path the caller asked to attach.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A document selector could not be parsed by the document query engine.
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector {
        /// The selector as supplied.
        selector: String,
        /// Parser message.
        reason: String,
    },

    /// The proxy configuration is invalid or incomplete.
    ///
    /// Produced at load time, or when a webpage endpoint is dispatched on a
    /// proxy with no document parser.
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },

    /// The transport failed; the adapter error is carried unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ProxyError {
    pub(crate) fn unsupported(method: Method) -> Self {
        Self::UnsupportedMethod {
            method: method.to_string(),
        }
    }

    pub(crate) fn decode<E: ?Sized>(reason: impl Into<String>) -> Self {
        Self::DecodeFailure {
            endpoint: std::any::type_name::<E>().to_string(),
            reason: reason.into(),
        }
    }
}
