//! Port traits for the external collaborators.
//!
//! The core defines *what* it needs from a transport or a document query
//! engine; the adapter crates define *how*:
//!
//! | Port | Adapter crate |
//! |------|---------------|
//! | [`HttpTransport`] | `http-transport` (reqwest) |
//! | [`RpcTransport`] | `soap-transport` (SOAP 1.1 over reqwest) |
//! | [`DocumentParser`] | `document` (scraper) |
//!
//! Tests substitute fakes for any of them without touching registry internals.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::{Fields, Headers, Method, ProxyError, TransportError, TransportOptions};

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// The result of one HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub headers: Headers,
    pub body: String,
}

/// Executes HTTP calls.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Performs `method` against `uri`.
    ///
    /// `options.body` is `None` for GET and DELETE. Connection and protocol
    /// failures are returned as [`TransportError`].
    async fn execute(
        &self,
        method: Method,
        uri: &str,
        options: TransportOptions,
    ) -> Result<HttpReply, TransportError>;
}

// ---------------------------------------------------------------------------
// RPC
// ---------------------------------------------------------------------------

/// The result of one RPC call.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcReply {
    /// The operation's return value.
    pub result: Value,
    /// The raw response as received (e.g. the SOAP envelope).
    pub raw_response: String,
}

/// Executes RPC (SOAP) calls.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Calls `operation` on the service described by `service_uri`.
    ///
    /// Faults and connection failures are returned as [`TransportError`].
    async fn call(
        &self,
        service_uri: &str,
        operation: &str,
        parameters: &Fields,
        headers: &Headers,
    ) -> Result<RpcReply, TransportError>;
}

// ---------------------------------------------------------------------------
// Document query
// ---------------------------------------------------------------------------

/// What a selector matched in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryMatch {
    /// Text content of the first match, untrimmed.
    pub text: Option<String>,
    /// Attributes of the first match.
    pub attributes: BTreeMap<String, String>,
    /// Number of elements matched.
    pub match_count: usize,
}

/// A parsed document that answers selector queries.
pub trait QueryableDocument {
    /// Applies `selector`. Fails with [`ProxyError::InvalidSelector`] if the
    /// selector cannot be parsed.
    fn query(&self, selector: &str) -> Result<QueryMatch, ProxyError>;
}

/// Turns a raw body into a [`QueryableDocument`].
pub trait DocumentParser: Send + Sync {
    fn parse(&self, raw_body: &str) -> Result<Box<dyn QueryableDocument>, ProxyError>;
}
