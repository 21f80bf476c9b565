//! WebProxy HTTP transport adapter.
//!
//! Implements the [`dispatch::HttpTransport`] port with `reqwest`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Body encoding, header validation, timeouts, and status
//! handling live here. The [`dispatch`] crate sees only
//! [`dispatch::HttpTransport`].
//!
//! ## Body encoding
//!
//! | [`TransportBody`] | Sent as |
//! |-------------------|---------|
//! | `FormParams` | `application/x-www-form-urlencoded`, nested values in bracket notation |
//! | `Json` | `application/json` |
//! | `Multipart` | `multipart/form-data`, parts in order |
//! | `Unset` | form-encoded when it has fields, otherwise no body |
//!
//! ## Request options
//!
//! - `timeout`: seconds for this request (`0` waits indefinitely).
//! - `http_errors`: `false` returns 4xx/5xx responses instead of failing.

pub mod encoding;
pub mod errors;

use std::time::Duration;

use async_trait::async_trait;
use dispatch::{
    Headers, HttpReply, HttpSettings, HttpTransport, Method, TransportBody, TransportError,
    TransportOptions,
};
use tracing::{debug, warn};

pub use encoding::{HTTP_ERRORS_OPTION, TIMEOUT_OPTION};
pub use errors::HttpTransportError;

use encoding::{form_pairs, header_map, http_errors_option, multipart_form, timeout_option};

/// Longest body prefix kept in [`HttpTransportError::Status`].
const STATUS_BODY_PREVIEW: usize = 200;

/// [`HttpTransport`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    fail_on_status: bool,
}

impl ReqwestTransport {
    pub fn new(settings: &HttpSettings) -> Result<Self, HttpTransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(seconds) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        if let Some(user_agent) = &settings.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let client = builder.build().map_err(HttpTransportError::Client)?;

        Ok(Self {
            client,
            fail_on_status: settings.fail_on_status,
        })
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        options: TransportOptions,
    ) -> Result<HttpReply, HttpTransportError> {
        let verb = http_method(method)?;
        let TransportOptions {
            headers,
            options,
            body,
        } = options;

        let mut request = self.client.request(verb, uri).headers(header_map(&headers)?);
        if let Some(timeout) = timeout_option(&options)? {
            request = request.timeout(timeout);
        }
        let fail_on_status = http_errors_option(&options)?.unwrap_or(self.fail_on_status);

        request = match body {
            None => request,
            Some(TransportBody::FormParams(fields)) => request.form(&form_pairs(&fields)),
            Some(TransportBody::Unset(fields)) if fields.is_empty() => request,
            Some(TransportBody::Unset(fields)) => request.form(&form_pairs(&fields)),
            Some(TransportBody::Json(fields)) => request.json(&fields),
            Some(TransportBody::Multipart(parts)) => request.multipart(multipart_form(parts).await?),
        };

        let response = request.send().await?;
        let status = response.status().as_u16();
        let headers = response_headers(response.headers());
        let body = response.text().await?;
        debug!(%method, uri, status, bytes = body.len(), "HTTP response received");

        if fail_on_status && status >= 400 {
            warn!(%method, uri, status, "HTTP error status");
            return Err(HttpTransportError::Status {
                uri: uri.to_string(),
                status,
                body: body.chars().take(STATUS_BODY_PREVIEW).collect(),
            });
        }

        Ok(HttpReply {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        method: Method,
        uri: &str,
        options: TransportOptions,
    ) -> Result<HttpReply, TransportError> {
        self.send(method, uri, options)
            .await
            .map_err(TransportError::new)
    }
}

fn http_method(method: Method) -> Result<reqwest::Method, HttpTransportError> {
    match method {
        Method::Get => Ok(reqwest::Method::GET),
        Method::Post => Ok(reqwest::Method::POST),
        Method::Put => Ok(reqwest::Method::PUT),
        Method::Delete => Ok(reqwest::Method::DELETE),
        Method::Rpc => Err(HttpTransportError::UnsupportedMethod(method)),
    }
}

/// Copies response headers; repeated names are joined with `", "`.
fn response_headers(map: &reqwest::header::HeaderMap) -> Headers {
    let mut headers = Headers::new();
    for (name, value) in map {
        let Ok(value) = value.to_str() else {
            continue;
        };
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    headers
}
