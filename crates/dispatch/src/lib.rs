//! Dispatch core for WebProxy.
//!
//! This crate turns a call against a typed endpoint into a transport request,
//! routes it to the client serving the endpoint's service, and decodes the
//! response back into the endpoint. Transports and the document query engine
//! are ports; adapter crates implement them.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate performs no network I/O.
//! It defines *what* is needed; the adapter crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`proxy`] | [`WebProxy`], the entry surface |
//! | [`registry`] | Service and client singletons, capability routing |
//! | [`client`] | HTTP and SOAP clients |
//! | [`endpoint`] | Endpoint variants and their decoders |
//! | [`request`] | Immutable [`Request`] and its builder |
//! | [`response`] | [`Response`] holder |
//! | [`ports`] | Transport and document query traits |
//! | [`config`] | TOML configuration |
//! | [`errors`] | [`ProxyError`] and [`TransportError`] |
//! | [`identifiers`] | [`DispatchId`] |
//! | [`types`] | Shared aliases and [`Timestamp`] |
//!
//! ## Example
//!
//! ```no_run
//! use dispatch::{Capability, EndpointDef, Headers, Registry, RestResource, Service, WebProxy};
//! # use dispatch::{HttpReply, HttpTransport, Method, TransportError, TransportOptions};
//! # struct Transport;
//! # #[async_trait::async_trait]
//! # impl HttpTransport for Transport {
//! #     async fn execute(&self, _: Method, _: &str, _: TransportOptions)
//! #         -> Result<HttpReply, TransportError> { unimplemented!() }
//! # }
//!
//! struct Namedays;
//!
//! impl Service for Namedays {
//!     const CAPABILITY: Capability = Capability::Http;
//!     fn uri(&self) -> &str {
//!         "https://nameday.example"
//!     }
//! }
//!
//! struct Today;
//!
//! impl EndpointDef for Today {
//!     type Service = Namedays;
//!     fn request_name(&self) -> &str {
//!         "/today"
//!     }
//! }
//!
//! # async fn run() -> Result<(), dispatch::ProxyError> {
//! let registry = Registry::builder()
//!     .service(|| Namedays)
//!     .http_transport(Transport)
//!     .build();
//! let proxy = WebProxy::new(registry);
//!
//! let today = proxy.get(RestResource::new(Today), Headers::new()).await?;
//! println!("{:?}", today.field("name"));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod endpoint;
pub mod errors;
pub mod identifiers;
pub mod method;
pub mod paths;
pub mod ports;
pub mod proxy;
pub mod registry;
pub mod request;
pub mod response;
pub mod service;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use client::{Client, ClientKind, HttpClient, SoapClient, Target};
pub use config::{HttpSettings, ProxyConfig, SoapSettings};
pub use endpoint::{
    DecodeContext, Endpoint, EndpointDef, HttpEndpoint, RestResource, RpcEndpoint, SoapOperation,
    Webpage, RESULT_KEY,
};
pub use errors::{ProxyError, TransportError};
pub use identifiers::DispatchId;
pub use method::{BodyType, Method, GENERIC_BODY_KEY};
pub use ports::{
    DocumentParser, HttpReply, HttpTransport, QueryMatch, QueryableDocument, RpcReply,
    RpcTransport,
};
pub use proxy::WebProxy;
pub use registry::{Registry, RegistryBuilder, DEFAULT_ROUTES};
pub use request::{
    Attachment, MultipartPart, PartContents, Request, RequestBuilder, TransportBody,
    TransportOptions,
};
pub use response::{NativeResponse, Response};
pub use service::{Capability, Service};
pub use types::{Fields, Headers, Options, Timestamp};
