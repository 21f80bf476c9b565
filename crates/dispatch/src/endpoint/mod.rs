//! Endpoints: addressable remote operations against a service.
//!
//! The set of endpoint variants is closed. Each variant wraps a caller-supplied
//! [`EndpointDef`] and decodes the [`Response`] into its own typed result:
//!
//! | Variant | Decoded into |
//! |---------|--------------|
//! | [`RestResource`] | JSON value (object or array) |
//! | [`Webpage`] | a [`crate::QueryableDocument`] answering selector queries |
//! | [`SoapOperation`] | `{"result": <operation return value>}` |
//!
//! An endpoint is built per call, passed by value to the orchestrator, and
//! returned carrying its response and decoded state.

mod rest;
mod soap;
mod webpage;

use std::sync::Arc;

pub use rest::RestResource;
pub use soap::{SoapOperation, RESULT_KEY};
pub use webpage::Webpage;

use crate::{DocumentParser, Method, ProxyError, Response, Service};

mod sealed {
    pub trait Sealed {}
}

/// Describes one concrete endpoint: which service it targets, its request
/// name, and the verbs it accepts.
///
/// ```
/// use dispatch::{Capability, EndpointDef, Method, Service};
///
/// struct JsonPlaceholder;
///
/// impl Service for JsonPlaceholder {
///     const CAPABILITY: Capability = Capability::Http;
///     fn uri(&self) -> &str {
///         "https://jsonplaceholder.typicode.com"
///     }
/// }
///
/// struct Posts;
///
/// impl EndpointDef for Posts {
///     type Service = JsonPlaceholder;
///
///     fn request_name(&self) -> &str {
///         "/posts"
///     }
///
///     fn supported_methods(&self) -> &[Method] {
///         &[Method::Put, Method::Delete]
///     }
/// }
/// ```
pub trait EndpointDef: Send + Sync + 'static {
    /// The service this endpoint belongs to. Fixed per endpoint type.
    type Service: Service;

    /// Resource path (HTTP) or operation name (RPC).
    fn request_name(&self) -> &str;

    /// HTTP verbs the endpoint accepts. GET only unless overridden.
    ///
    /// Ignored by [`SoapOperation`], which accepts RPC only.
    fn supported_methods(&self) -> &[Method] {
        &[Method::Get]
    }
}

/// Shared state the decode step may need.
#[derive(Clone, Default)]
pub struct DecodeContext {
    pub document_parser: Option<Arc<dyn DocumentParser>>,
}

impl std::fmt::Debug for DecodeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeContext")
            .field("document_parser", &self.document_parser.is_some())
            .finish()
    }
}

/// Behaviour common to every endpoint variant.
///
/// Sealed: only [`RestResource`], [`Webpage`], and [`SoapOperation`]
/// implement it.
pub trait Endpoint: sealed::Sealed {
    type Def: EndpointDef;

    fn def(&self) -> &Self::Def;

    /// Request target as the client sends it.
    fn full_request_name(&self) -> String;

    fn supports_method(&self, method: Method) -> bool;

    /// Stores `response` and decodes it. Called once per dispatch.
    fn attach_response(
        &mut self,
        response: Response,
        context: &DecodeContext,
    ) -> Result<(), ProxyError>;

    /// The response attached by the last dispatch.
    fn response(&self) -> Option<&Response>;
}

/// Endpoints dispatched through the HTTP verbs.
pub trait HttpEndpoint: Endpoint {
    /// Query fragment appended to the request name, slashes trimmed.
    fn query_fragment(&self) -> &str;
}

/// Endpoints dispatched as RPC calls.
pub trait RpcEndpoint: Endpoint {}

/// Whitelist check shared by the HTTP variants.
fn whitelisted<D: EndpointDef>(def: &D, method: Method) -> bool {
    def.supported_methods().contains(&method)
}
