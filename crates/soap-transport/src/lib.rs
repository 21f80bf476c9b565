//! WebProxy SOAP transport adapter.
//!
//! Implements the [`dispatch::RpcTransport`] port as SOAP 1.1 RPC/encoded
//! calls posted over `reqwest`, with envelopes written and read through
//! `quick-xml`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Envelope encoding, the `SOAPAction` header, response
//! decoding, and fault detection live here. The [`dispatch`] crate sees only
//! [`dispatch::RpcTransport`].
//!
//! ## Addressing
//!
//! A service URI names the WSDL (`http://host/service/?wsdl`). Calls are posted
//! to the same URI with its query removed. Unless configured, the operation
//! namespace is that endpoint URL and the action is `"{namespace}#{operation}"`.
//! The WSDL itself is not fetched.

pub mod envelope;
pub mod errors;
pub mod response;

use std::time::Duration;

use async_trait::async_trait;
use dispatch::{Fields, Headers, RpcReply, RpcTransport, SoapSettings, TransportError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use tracing::{debug, warn};

pub use envelope::build_envelope;
pub use errors::SoapError;
pub use response::parse_response;

/// [`RpcTransport`] speaking SOAP 1.1 over HTTP.
#[derive(Debug, Clone)]
pub struct SoapTransport {
    client: reqwest::Client,
    namespace: Option<String>,
    action_prefix: Option<String>,
}

impl SoapTransport {
    pub fn new(settings: &SoapSettings) -> Result<Self, SoapError> {
        let mut builder = reqwest::Client::builder();
        if let Some(seconds) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let client = builder.build().map_err(SoapError::Client)?;

        Ok(Self {
            client,
            namespace: settings.namespace.clone(),
            action_prefix: settings.action_prefix.clone(),
        })
    }

    /// The `SOAPAction` for `operation` on `endpoint`.
    pub fn action(&self, endpoint: &str, operation: &str) -> String {
        match &self.action_prefix {
            Some(prefix) => format!("{prefix}{operation}"),
            None => format!("{}#{operation}", self.namespace(endpoint)),
        }
    }

    fn namespace<'a>(&'a self, endpoint: &'a str) -> &'a str {
        self.namespace.as_deref().unwrap_or(endpoint)
    }

    async fn send(
        &self,
        service_uri: &str,
        operation: &str,
        parameters: &Fields,
        headers: &Headers,
    ) -> Result<RpcReply, SoapError> {
        let endpoint = endpoint_url(service_uri);
        let envelope = build_envelope(self.namespace(endpoint), operation, parameters)?;
        let action = self.action(endpoint, operation);
        debug!(endpoint, operation, %action, "Posting SOAP envelope");

        let response = self
            .client
            .post(endpoint)
            .headers(soap_headers(headers, &action)?)
            .body(envelope)
            .send()
            .await?;
        let status = response.status().as_u16();
        let raw_response = response.text().await?;

        // Faults usually arrive with status 500; the body decides.
        let result = match parse_response(&raw_response) {
            Err(SoapError::Fault {
                code,
                message,
                detail,
            }) => {
                warn!(endpoint, operation, %code, %message, "SOAP fault");
                return Err(SoapError::Fault {
                    code,
                    message,
                    detail,
                });
            }
            _ if status >= 400 => {
                return Err(SoapError::Status {
                    endpoint: endpoint.to_string(),
                    status,
                })
            }
            parsed => parsed?,
        };

        Ok(RpcReply {
            result,
            raw_response,
        })
    }
}

#[async_trait]
impl RpcTransport for SoapTransport {
    async fn call(
        &self,
        service_uri: &str,
        operation: &str,
        parameters: &Fields,
        headers: &Headers,
    ) -> Result<RpcReply, TransportError> {
        self.send(service_uri, operation, parameters, headers)
            .await
            .map_err(TransportError::new)
    }
}

/// The URL calls are posted to: the service URI without its query.
pub fn endpoint_url(service_uri: &str) -> &str {
    service_uri
        .split_once('?')
        .map_or(service_uri, |(endpoint, _)| endpoint)
}

fn soap_headers(headers: &Headers, action: &str) -> Result<HeaderMap, SoapError> {
    let invalid = |name: &str, reason: String| SoapError::InvalidHeader {
        name: name.to_string(),
        reason,
    };

    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| invalid(name, e.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(name, e.to_string()))?;
        map.insert(header_name, header_value);
    }
    map.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/xml; charset=utf-8"),
    );
    map.insert(
        HeaderName::from_static("soapaction"),
        HeaderValue::from_str(&format!("\"{action}\""))
            .map_err(|e| invalid("SOAPAction", e.to_string()))?,
    );
    Ok(map)
}
