//! Fixtures shared by the unit tests: services, endpoint definitions, and
//! fake ports that record what they were asked to do.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    Capability, DocumentParser, EndpointDef, Fields, Headers, HttpReply, HttpTransport, Method,
    NativeResponse, ProxyError, QueryMatch, QueryableDocument, Response, RpcReply, RpcTransport,
    Service, TransportBody, TransportError, TransportOptions,
};

pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

pub fn http_response(status: u16, body: &str) -> Response {
    Response::new(
        NativeResponse::Http {
            status,
            headers: Headers::new(),
        },
        body,
    )
}

pub fn rpc_response(method_result: Value) -> Response {
    Response::new(
        NativeResponse::Rpc { method_result },
        "<soap:Envelope/>",
    )
}

// ---------------------------------------------------------------------------
// Services and endpoint definitions
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct RestApi;

impl Service for RestApi {
    const CAPABILITY: Capability = Capability::Http;

    fn uri(&self) -> &str {
        "https://api.example.test/"
    }
}

#[derive(Debug)]
pub struct LocalWebsite;

impl Service for LocalWebsite {
    const CAPABILITY: Capability = Capability::Http;

    fn uri(&self) -> &str {
        "http://localhost/site"
    }
}

#[derive(Debug)]
pub struct LocalSoapService;

impl Service for LocalSoapService {
    const CAPABILITY: Capability = Capability::Soap;

    fn uri(&self) -> &str {
        "http://localhost/soap/?wsdl"
    }
}

#[derive(Debug)]
pub struct TodayResource;

impl EndpointDef for TodayResource {
    type Service = RestApi;

    fn request_name(&self) -> &str {
        "/today"
    }
}

#[derive(Debug)]
pub struct PostsResource;

impl EndpointDef for PostsResource {
    type Service = RestApi;

    fn request_name(&self) -> &str {
        "/posts"
    }

    fn supported_methods(&self) -> &[Method] {
        &[Method::Put, Method::Delete]
    }
}

#[derive(Debug)]
pub struct HomePage;

impl EndpointDef for HomePage {
    type Service = LocalWebsite;

    fn request_name(&self) -> &str {
        "/"
    }
}

#[derive(Debug)]
pub struct FormPage;

impl EndpointDef for FormPage {
    type Service = LocalWebsite;

    fn request_name(&self) -> &str {
        "/"
    }

    fn supported_methods(&self) -> &[Method] {
        &[Method::Post]
    }
}

#[derive(Debug)]
pub struct ListProducts;

impl EndpointDef for ListProducts {
    type Service = LocalSoapService;

    fn request_name(&self) -> &str {
        "listProducts"
    }
}

// ---------------------------------------------------------------------------
// Fake HTTP transport
// ---------------------------------------------------------------------------

/// What [`FakeHttpTransport`] saw for one call.
#[derive(Debug, Clone)]
pub struct HttpCall {
    pub method: Method,
    pub uri: String,
    pub headers: Headers,
    pub body_key: Option<&'static str>,
    pub part_names: Vec<String>,
}

#[derive(Debug, Clone)]
enum HttpOutcome {
    Reply { content_type: &'static str, body: String },
    Fail(String),
}

#[derive(Debug, Clone)]
pub struct FakeHttpTransport {
    outcome: HttpOutcome,
    calls: Arc<Mutex<Vec<HttpCall>>>,
}

impl FakeHttpTransport {
    pub fn json(body: &str) -> Self {
        Self::with(HttpOutcome::Reply {
            content_type: "application/json",
            body: body.to_string(),
        })
    }

    pub fn html(body: &str) -> Self {
        Self::with(HttpOutcome::Reply {
            content_type: "text/html",
            body: body.to_string(),
        })
    }

    pub fn failing(message: &str) -> Self {
        Self::with(HttpOutcome::Fail(message.to_string()))
    }

    fn with(outcome: HttpOutcome) -> Self {
        Self {
            outcome,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<HttpCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for FakeHttpTransport {
    async fn execute(
        &self,
        method: Method,
        uri: &str,
        options: TransportOptions,
    ) -> Result<HttpReply, TransportError> {
        let part_names = match &options.body {
            Some(TransportBody::Multipart(parts)) => {
                parts.iter().map(|part| part.name.clone()).collect()
            }
            _ => Vec::new(),
        };
        self.calls.lock().unwrap().push(HttpCall {
            method,
            uri: uri.to_string(),
            headers: options.headers,
            body_key: options.body.as_ref().map(TransportBody::key),
            part_names,
        });

        match &self.outcome {
            HttpOutcome::Reply { content_type, body } => {
                let mut headers = Headers::new();
                headers.insert("content-type".to_string(), content_type.to_string());
                Ok(HttpReply {
                    status: 200,
                    headers,
                    body: body.clone(),
                })
            }
            HttpOutcome::Fail(message) => Err(TransportError::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                message.clone(),
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Fake RPC transport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RpcCall {
    pub service_uri: String,
    pub operation: String,
    pub parameters: Fields,
    pub headers: Headers,
}

#[derive(Debug, Clone)]
pub struct FakeRpcTransport {
    result: Value,
    calls: Arc<Mutex<Vec<RpcCall>>>,
}

impl FakeRpcTransport {
    pub fn returning(result: Value) -> Self {
        Self {
            result,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<RpcCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RpcTransport for FakeRpcTransport {
    async fn call(
        &self,
        service_uri: &str,
        operation: &str,
        parameters: &Fields,
        headers: &Headers,
    ) -> Result<RpcReply, TransportError> {
        self.calls.lock().unwrap().push(RpcCall {
            service_uri: service_uri.to_string(),
            operation: operation.to_string(),
            parameters: parameters.clone(),
            headers: headers.clone(),
        });
        Ok(RpcReply {
            result: self.result.clone(),
            raw_response: format!("<{operation}Response/>"),
        })
    }
}

// ---------------------------------------------------------------------------
// Fake document parser
// ---------------------------------------------------------------------------

/// Answers selector queries from a fixed table; unknown selectors match
/// nothing.
#[derive(Debug, Clone, Default)]
pub struct FakeDocumentParser {
    matches: HashMap<String, QueryMatch>,
    parsed: Arc<AtomicUsize>,
    queries: Arc<AtomicUsize>,
}

impl FakeDocumentParser {
    pub fn with_match(
        mut self,
        selector: &str,
        text: Option<&str>,
        attributes: &[(&str, &str)],
        match_count: usize,
    ) -> Self {
        self.matches.insert(
            selector.to_string(),
            QueryMatch {
                text: text.map(str::to_string),
                attributes: attributes
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                match_count,
            },
        );
        self
    }

    pub fn parsed(&self) -> usize {
        self.parsed.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl DocumentParser for FakeDocumentParser {
    fn parse(&self, _raw_body: &str) -> Result<Box<dyn QueryableDocument>, ProxyError> {
        self.parsed.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeDocument {
            matches: self.matches.clone(),
            queries: self.queries.clone(),
        }))
    }
}

struct FakeDocument {
    matches: HashMap<String, QueryMatch>,
    queries: Arc<AtomicUsize>,
}

impl QueryableDocument for FakeDocument {
    fn query(&self, selector: &str) -> Result<QueryMatch, ProxyError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.matches.get(selector).cloned().unwrap_or_default())
    }
}
