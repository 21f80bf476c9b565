//! Closed tag sets: request verbs and body encodings.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProxyError;

/// Key used in transport options when a body-carrying request never fixed
/// its body type.
pub const GENERIC_BODY_KEY: &str = "body";

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/// The verbs a request may carry.
///
/// `Rpc` is not an HTTP verb: it tags calls routed to an RPC (SOAP) client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// Fetch; never sends a body.
    Get,
    /// Create or submit; sends the body.
    Post,
    /// Replace; sends the body.
    Put,
    /// Remove; never sends a body.
    Delete,
    /// Remote procedure call, routed to the RPC client only.
    Rpc,
}

impl Method {
    /// Every supported verb.
    pub const ALL: [Method; 5] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Rpc,
    ];

    /// Returns the canonical upper-case verb name.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Rpc => "RPC",
        }
    }

    /// Returns `true` if requests with this verb send a body to the transport.
    ///
    /// GET and DELETE never do, even when a body was set on the builder.
    pub fn carries_body(self) -> bool {
        !matches!(self, Method::Get | Method::Delete)
    }
}

impl FromStr for Method {
    type Err = ProxyError;

    /// Parses a verb name, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ProxyError::UnsupportedMethod {
                method: s.to_string(),
            })
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// BodyType
// ---------------------------------------------------------------------------

/// Mutually exclusive payload encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyType {
    /// `application/x-www-form-urlencoded` key/value pairs.
    FormParams,
    /// A JSON object.
    Json,
    /// `multipart/form-data` parts, in order. Required for file uploads.
    Multipart,
}

impl BodyType {
    /// The key the body is filed under in transport options.
    pub fn key(self) -> &'static str {
        match self {
            BodyType::FormParams => "form_params",
            BodyType::Json => "json",
            BodyType::Multipart => "multipart",
        }
    }
}

impl std::fmt::Display for BodyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BodyType::FormParams => f.write_str("form"),
            BodyType::Json => f.write_str("json"),
            BodyType::Multipart => f.write_str("multipart"),
        }
    }
}
