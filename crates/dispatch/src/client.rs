//! Client adapters: execute a request against an endpoint's service through
//! an injected transport.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::paths::full_uri;
use crate::{
    BodyType, HttpTransport, Method, NativeResponse, ProxyError, Request, Response, RpcTransport,
};

/// The closed set of client kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientKind {
    Http,
    Soap,
}

impl std::fmt::Display for ClientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientKind::Http => f.write_str("http"),
            ClientKind::Soap => f.write_str("soap"),
        }
    }
}

/// Where a call goes: the service's base URI and the endpoint's full
/// request name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub service_uri: String,
    pub request_name: String,
}

/// Executes a [`Request`] and wraps the transport result in a [`Response`].
#[async_trait]
pub trait Client: Send + Sync {
    fn kind(&self) -> ClientKind;

    async fn request(&self, target: &Target, request: Request) -> Result<Response, ProxyError>;
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Serves HTTP-capable services.
pub struct HttpClient {
    transport: Arc<dyn HttpTransport>,
}

impl HttpClient {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl Client for HttpClient {
    fn kind(&self) -> ClientKind {
        ClientKind::Http
    }

    async fn request(&self, target: &Target, request: Request) -> Result<Response, ProxyError> {
        let method = request.method();
        let uri = full_uri(&target.service_uri, &target.request_name);
        debug!(%method, %uri, "Executing HTTP request");

        let reply = self
            .transport
            .execute(method, &uri, request.into_transport_options())
            .await?;

        Ok(Response::new(
            NativeResponse::Http {
                status: reply.status,
                headers: reply.headers,
            },
            reply.body,
        ))
    }
}

// ---------------------------------------------------------------------------
// SOAP
// ---------------------------------------------------------------------------

/// Serves SOAP-capable services. The request's fields are the operation
/// parameters; the request name is the operation name.
pub struct SoapClient {
    transport: Arc<dyn RpcTransport>,
}

impl SoapClient {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl Client for SoapClient {
    fn kind(&self) -> ClientKind {
        ClientKind::Soap
    }

    async fn request(&self, target: &Target, request: Request) -> Result<Response, ProxyError> {
        if request.method() != Method::Rpc {
            return Err(ProxyError::unsupported(request.method()));
        }
        // RPC parameters are one keyed object; parts and files have no slot.
        if request.body_type() == Some(BodyType::Multipart) {
            return Err(ProxyError::RequestBodyTypeMismatch {
                current: BodyType::Multipart,
                requested: BodyType::Json,
            });
        }
        debug!(
            service = %target.service_uri,
            operation = %target.request_name,
            "Executing RPC call"
        );

        let reply = self
            .transport
            .call(
                &target.service_uri,
                &target.request_name,
                request.fields(),
                request.headers(),
            )
            .await?;

        Ok(Response::new(
            NativeResponse::Rpc {
                method_result: reply.result,
            },
            reply.raw_response,
        ))
    }
}
