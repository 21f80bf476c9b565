//! The orchestrator: the public entry surface.
//!
//! Every dispatch runs the same sequence:
//!
//! 1. check the request's method against the endpoint (before any network
//!    interaction);
//! 2. look up the endpoint's service singleton and the client serving its
//!    capability;
//! 3. execute the request through the client;
//! 4. attach the response to the endpoint, which decodes it;
//! 5. hand the endpoint back to the caller.
//!
//! Each dispatch is awaited to completion by the caller; nothing is batched,
//! retried, or cached.

use std::any::type_name;
use std::sync::Arc;

use tracing::{debug, info_span, Instrument};

use crate::{
    DecodeContext, DispatchId, DocumentParser, Endpoint, EndpointDef, Fields, Headers,
    HttpEndpoint, Method, Options, ProxyConfig, ProxyError, Registry, Request, RpcEndpoint,
    Service, Target,
};

/// Dispatches endpoints through the clients of its [`Registry`].
pub struct WebProxy {
    registry: Registry,
    default_headers: Headers,
    default_options: Options,
    decode_context: DecodeContext,
}

impl WebProxy {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            default_headers: Headers::new(),
            default_options: Options::new(),
            decode_context: DecodeContext::default(),
        }
    }

    /// Headers merged into every request; per-call headers win.
    pub fn with_default_headers(mut self, headers: Headers) -> Self {
        self.default_headers = headers;
        self
    }

    /// Options merged into every request; per-call options win.
    pub fn with_default_options(mut self, options: Options) -> Self {
        self.default_options = options;
        self
    }

    /// Takes default headers and options from `config`.
    pub fn with_config(self, config: &ProxyConfig) -> Self {
        self.with_default_headers(config.default_headers.clone())
            .with_default_options(config.default_options.clone())
    }

    /// Parser used to decode [`crate::Webpage`] endpoints.
    pub fn with_document_parser(mut self, parser: impl DocumentParser + 'static) -> Self {
        self.decode_context.document_parser = Some(Arc::new(parser));
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // -----------------------------------------------------------------------
    // Verb-shaped entries
    // -----------------------------------------------------------------------

    /// GET `endpoint`.
    pub async fn get<E: HttpEndpoint>(&self, endpoint: E, headers: Headers) -> Result<E, ProxyError> {
        let request = Request::builder(Method::Get).headers(headers).build();
        self.http_request(endpoint, request).await
    }

    /// POST `body` and `files` (`(field name, path)` pairs) to `endpoint`.
    ///
    /// The body is form-encoded, or multipart when any file is given.
    pub async fn post<E, N, P>(
        &self,
        endpoint: E,
        body: Fields,
        files: impl IntoIterator<Item = (N, P)>,
        headers: Headers,
    ) -> Result<E, ProxyError>
    where
        E: HttpEndpoint,
        N: Into<String>,
        P: AsRef<std::path::Path>,
    {
        let request = Request::builder(Method::Post)
            .files(files)?
            .body(body)
            .headers(headers)
            .build();
        self.http_request(endpoint, request).await
    }

    /// PUT a form-encoded `body` to `endpoint`.
    pub async fn put<E: HttpEndpoint>(
        &self,
        endpoint: E,
        body: Fields,
        headers: Headers,
    ) -> Result<E, ProxyError> {
        let request = Request::builder(Method::Put)
            .body(body)
            .headers(headers)
            .build();
        self.http_request(endpoint, request).await
    }

    /// DELETE `endpoint`.
    pub async fn delete<E: HttpEndpoint>(
        &self,
        endpoint: E,
        headers: Headers,
    ) -> Result<E, ProxyError> {
        let request = Request::builder(Method::Delete).headers(headers).build();
        self.http_request(endpoint, request).await
    }

    /// Calls the RPC operation of `endpoint` with `parameters`.
    pub async fn call<E: RpcEndpoint>(
        &self,
        endpoint: E,
        parameters: Fields,
        headers: Headers,
    ) -> Result<E, ProxyError> {
        let request = Request::builder(Method::Rpc)
            .body(parameters)
            .headers(headers)
            .build();
        self.rpc_request(endpoint, request).await
    }

    // -----------------------------------------------------------------------
    // Generic dispatch
    // -----------------------------------------------------------------------

    /// Dispatches an arbitrary HTTP request.
    ///
    /// Fails with [`ProxyError::UnsupportedMethod`] if the endpoint does not
    /// accept the request's method.
    pub async fn http_request<E: HttpEndpoint>(
        &self,
        endpoint: E,
        request: Request,
    ) -> Result<E, ProxyError> {
        if !endpoint.supports_method(request.method()) {
            return Err(ProxyError::unsupported(request.method()));
        }
        self.dispatch(endpoint, request).await
    }

    /// Dispatches an RPC request.
    ///
    /// Fails with [`ProxyError::UnsupportedMethod`] unless the request's
    /// method is RPC.
    pub async fn rpc_request<E: RpcEndpoint>(
        &self,
        endpoint: E,
        request: Request,
    ) -> Result<E, ProxyError> {
        if request.method() != Method::Rpc {
            return Err(ProxyError::unsupported(request.method()));
        }
        self.dispatch(endpoint, request).await
    }

    async fn dispatch<E: Endpoint>(&self, mut endpoint: E, request: Request) -> Result<E, ProxyError> {
        let dispatch_id = DispatchId::new_random();
        let target_name = endpoint.full_request_name();
        let span = info_span!(
            "dispatch",
            %dispatch_id,
            method = %request.method(),
            endpoint = type_name::<E>(),
            target = %target_name,
        );

        async move {
            let service = self
                .registry
                .service::<<E::Def as EndpointDef>::Service>()?;
            let client = self.registry.client_for_service(&*service)?;
            let target = Target {
                service_uri: service.uri().to_string(),
                request_name: target_name,
            };

            let request = request.with_defaults(&self.default_headers, &self.default_options);
            let response = client.request(&target, request).await?;
            debug!(status = ?response.status(), bytes = response.body().len(), "Response received");

            endpoint.attach_response(response, &self.decode_context)?;
            Ok::<E, ProxyError>(endpoint)
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for WebProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebProxy")
            .field("registry", &self.registry)
            .field("default_headers", &self.default_headers)
            .field("default_options", &self.default_options)
            .field("decode_context", &self.decode_context)
            .finish()
    }
}
