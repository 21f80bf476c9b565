use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use super::{sealed::Sealed, whitelisted, DecodeContext, Endpoint, EndpointDef, HttpEndpoint};
use crate::paths::{join_request_name, trim_slashes};
use crate::{Method, ProxyError, Response};

/// A REST resource: the response body is decoded as JSON.
///
/// The decoded value is an object or an array; any other JSON document, or a
/// body that is not JSON at all, fails the dispatch with
/// [`ProxyError::DecodeFailure`].
#[derive(Debug)]
pub struct RestResource<D: EndpointDef> {
    def: D,
    query: String,
    response: Option<Response>,
    data: Option<Value>,
}

impl<D: EndpointDef> RestResource<D> {
    pub fn new(def: D) -> Self {
        Self::with_query(def, "")
    }

    /// Targets `request_name/query`, e.g. a resource id.
    pub fn with_query(def: D, query: impl AsRef<str>) -> Self {
        Self {
            def,
            query: trim_slashes(query.as_ref()).to_string(),
            response: None,
            data: None,
        }
    }

    /// The decoded JSON document.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// A top-level field of a decoded JSON object.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.as_ref()?.get(key)
    }

    /// Deserialises the decoded document into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ProxyError> {
        let data = self
            .data
            .clone()
            .ok_or_else(|| ProxyError::decode::<Self>("no response attached"))?;
        serde_json::from_value(data).map_err(|e| ProxyError::decode::<Self>(e.to_string()))
    }
}

impl<D: EndpointDef> Sealed for RestResource<D> {}

impl<D: EndpointDef> Endpoint for RestResource<D> {
    type Def = D;

    fn def(&self) -> &D {
        &self.def
    }

    fn full_request_name(&self) -> String {
        join_request_name(self.def.request_name(), &self.query)
    }

    fn supports_method(&self, method: Method) -> bool {
        whitelisted(&self.def, method)
    }

    fn attach_response(
        &mut self,
        response: Response,
        _context: &DecodeContext,
    ) -> Result<(), ProxyError> {
        let decoded = decode_json::<Self>(response.body());
        self.response = Some(response);
        self.data = Some(decoded?);
        Ok(())
    }

    fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }
}

impl<D: EndpointDef> HttpEndpoint for RestResource<D> {
    fn query_fragment(&self) -> &str {
        &self.query
    }
}

fn decode_json<E>(body: &str) -> Result<Value, ProxyError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "Response body is not valid JSON");
        ProxyError::decode::<E>(format!("invalid JSON: {e}"))
    })?;

    match value {
        Value::Object(_) | Value::Array(_) => Ok(value),
        other => {
            warn!(value = %other, "Response body is not a JSON object or array");
            Err(ProxyError::decode::<E>(format!(
                "expected a JSON object or array, got {other}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;
    use crate::test_support::{http_response, PostsResource, TodayResource};

    #[test]
    fn test_default_whitelist_is_get_only() {
        let endpoint = RestResource::new(TodayResource);

        assert!(endpoint.supports_method(Method::Get));
        for method in [Method::Post, Method::Put, Method::Delete, Method::Rpc] {
            assert!(!endpoint.supports_method(method));
        }
    }

    #[test]
    fn test_declared_whitelist() {
        let endpoint = RestResource::new(PostsResource);

        assert!(endpoint.supports_method(Method::Put));
        assert!(endpoint.supports_method(Method::Delete));
        assert!(!endpoint.supports_method(Method::Get));
    }

    #[test]
    fn test_full_request_name_joins_query() {
        assert_eq!(
            RestResource::with_query(PostsResource, "/5/").full_request_name(),
            "posts/5"
        );
        assert_eq!(RestResource::new(PostsResource).full_request_name(), "posts");
    }

    #[test]
    fn test_decodes_json_object() {
        let mut endpoint = RestResource::new(TodayResource);

        endpoint
            .attach_response(
                http_response(200, r#"{"name": "Lukáš", "day": 18}"#),
                &DecodeContext::default(),
            )
            .unwrap();

        assert_eq!(endpoint.field("name"), Some(&json!("Lukáš")));
        assert_eq!(endpoint.response().unwrap().status(), Some(200));

        #[derive(Deserialize)]
        struct Nameday {
            name: String,
            day: u8,
        }
        let nameday: Nameday = endpoint.deserialize().unwrap();
        assert_eq!(nameday.name, "Lukáš");
        assert_eq!(nameday.day, 18);
    }

    #[test]
    fn test_decodes_json_array() {
        let mut endpoint = RestResource::new(TodayResource);

        endpoint
            .attach_response(http_response(200, "[1, 2, 3]"), &DecodeContext::default())
            .unwrap();

        assert_eq!(endpoint.data(), Some(&json!([1, 2, 3])));
        assert_eq!(endpoint.field("name"), None);
    }

    #[test]
    fn test_malformed_json_is_a_decode_failure() {
        let mut endpoint = RestResource::new(TodayResource);

        let result = endpoint.attach_response(
            http_response(200, "<html>not json</html>"),
            &DecodeContext::default(),
        );

        assert!(matches!(result, Err(ProxyError::DecodeFailure { .. })));
        assert!(endpoint.data().is_none());
    }

    #[test]
    #[traced_test]
    fn test_scalar_json_is_a_decode_failure() {
        let mut endpoint = RestResource::new(TodayResource);

        let result = endpoint.attach_response(http_response(200, "42"), &DecodeContext::default());

        assert!(matches!(result, Err(ProxyError::DecodeFailure { .. })));
        assert!(logs_contain("not a JSON object or array"));
    }
}
