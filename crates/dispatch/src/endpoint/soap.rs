use serde_json::Value;
use tracing::warn;

use super::{sealed::Sealed, DecodeContext, Endpoint, EndpointDef, RpcEndpoint};
use crate::{Fields, Method, NativeResponse, ProxyError, Response};

/// Key under which the operation's return value is stored.
pub const RESULT_KEY: &str = "result";

/// A SOAP operation: the request name is the operation name, used verbatim.
///
/// Decoding unwraps the operation's return value into `{"result": <value>}`,
/// whatever shape the value has.
#[derive(Debug)]
pub struct SoapOperation<D: EndpointDef> {
    def: D,
    response: Option<Response>,
    data: Option<Fields>,
}

impl<D: EndpointDef> SoapOperation<D> {
    pub fn new(def: D) -> Self {
        Self {
            def,
            response: None,
            data: None,
        }
    }

    /// The single-key result map.
    pub fn data(&self) -> Option<&Fields> {
        self.data.as_ref()
    }

    /// The operation's return value.
    pub fn result(&self) -> Option<&Value> {
        self.data.as_ref()?.get(RESULT_KEY)
    }
}

impl<D: EndpointDef> Sealed for SoapOperation<D> {}

impl<D: EndpointDef> Endpoint for SoapOperation<D> {
    type Def = D;

    fn def(&self) -> &D {
        &self.def
    }

    fn full_request_name(&self) -> String {
        self.def.request_name().to_string()
    }

    fn supports_method(&self, method: Method) -> bool {
        method == Method::Rpc
    }

    fn attach_response(
        &mut self,
        response: Response,
        _context: &DecodeContext,
    ) -> Result<(), ProxyError> {
        let method_result = match response.native() {
            NativeResponse::Rpc { method_result } => method_result.clone(),
            NativeResponse::Http { status, .. } => {
                warn!(status, "SOAP operation received an HTTP response");
                return Err(ProxyError::decode::<Self>(
                    "expected an RPC result, got an HTTP response",
                ))
            }
        };

        let mut data = Fields::new();
        data.insert(RESULT_KEY.to_string(), method_result);
        self.response = Some(response);
        self.data = Some(data);
        Ok(())
    }

    fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }
}

impl<D: EndpointDef> RpcEndpoint for SoapOperation<D> {}
