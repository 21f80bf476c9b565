//! Response holder: the transport-native result paired with its raw body.

use serde_json::Value;

use crate::{Headers, Timestamp};

/// What the transport returned, before any endpoint decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeResponse {
    /// An HTTP exchange.
    Http { status: u16, headers: Headers },
    /// An RPC call. `method_result` is the operation's return value.
    Rpc { method_result: Value },
}

/// A transport result plus the raw body string extracted from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    native: NativeResponse,
    body: String,
    received_at: Timestamp,
}

impl Response {
    pub fn new(native: NativeResponse, body: impl Into<String>) -> Self {
        Self {
            native,
            body: body.into(),
            received_at: Timestamp::now(),
        }
    }

    pub fn native(&self) -> &NativeResponse {
        &self.native
    }

    /// The raw body: HTTP payload, or the raw RPC response envelope.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn received_at(&self) -> Timestamp {
        self.received_at
    }

    /// HTTP status code, `None` for RPC responses.
    pub fn status(&self) -> Option<u16> {
        match self.native {
            NativeResponse::Http { status, .. } => Some(status),
            NativeResponse::Rpc { .. } => None,
        }
    }

    /// Response headers, `None` for RPC responses.
    pub fn headers(&self) -> Option<&Headers> {
        match &self.native {
            NativeResponse::Http { headers, .. } => Some(headers),
            NativeResponse::Rpc { .. } => None,
        }
    }
}
