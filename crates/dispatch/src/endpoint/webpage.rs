use tracing::warn;

use super::{sealed::Sealed, whitelisted, DecodeContext, Endpoint, EndpointDef, HttpEndpoint};
use crate::paths::{join_request_name, trim_slashes};
use crate::{Method, ProxyError, QueryMatch, QueryableDocument, Response};

/// A scraped webpage: the response body is parsed into a queryable document.
///
/// Decoding only builds the document. Selectors run when [`Webpage::attr`],
/// [`Webpage::text`], [`Webpage::count`], or [`Webpage::query`] is called.
pub struct Webpage<D: EndpointDef> {
    def: D,
    query: String,
    response: Option<Response>,
    document: Option<Box<dyn QueryableDocument>>,
}

impl<D: EndpointDef> Webpage<D> {
    pub fn new(def: D) -> Self {
        Self::with_query(def, "")
    }

    /// Targets `request_name/query`, e.g. a page file name.
    pub fn with_query(def: D, query: impl AsRef<str>) -> Self {
        Self {
            def,
            query: trim_slashes(query.as_ref()).to_string(),
            response: None,
            document: None,
        }
    }

    /// The parsed document, for queries beyond the shorthands below.
    pub fn document(&self) -> Option<&dyn QueryableDocument> {
        self.document.as_deref()
    }

    /// Runs `selector` against the document.
    pub fn query(&self, selector: &str) -> Result<QueryMatch, ProxyError> {
        self.document
            .as_deref()
            .ok_or_else(|| ProxyError::decode::<Self>("no document attached"))?
            .query(selector)
    }

    /// Attribute `attr` of the first element matching `selector`; empty if
    /// nothing matches or the attribute is absent.
    pub fn attr(&self, selector: &str, attr: &str) -> Result<String, ProxyError> {
        Ok(self
            .query(selector)?
            .attributes
            .remove(attr)
            .unwrap_or_default())
    }

    /// Trimmed text of the first element matching `selector`; empty if
    /// nothing matches.
    pub fn text(&self, selector: &str) -> Result<String, ProxyError> {
        Ok(self
            .query(selector)?
            .text
            .map(|text| text.trim().to_string())
            .unwrap_or_default())
    }

    /// Number of elements matching `selector`.
    pub fn count(&self, selector: &str) -> Result<usize, ProxyError> {
        Ok(self.query(selector)?.match_count)
    }
}

impl<D: EndpointDef + std::fmt::Debug> std::fmt::Debug for Webpage<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Webpage")
            .field("def", &self.def)
            .field("query", &self.query)
            .field("response", &self.response)
            .field("document", &self.document.is_some())
            .finish()
    }
}

impl<D: EndpointDef> Sealed for Webpage<D> {}

impl<D: EndpointDef> Endpoint for Webpage<D> {
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
        context: &DecodeContext,
    ) -> Result<(), ProxyError> {
        let Some(parser) = context.document_parser.as_ref() else {
            warn!("Webpage response received without a document parser");
            return Err(ProxyError::ConfigurationError {
                message: "no document parser configured for webpage endpoints".to_string(),
            });
        };
        let document = parser.parse(response.body()).inspect_err(|e| {
            warn!(error = %e, "Response body could not be parsed as a document");
        });
        self.response = Some(response);
        self.document = Some(document?);
        Ok(())
    }

    fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }
}

impl<D: EndpointDef> HttpEndpoint for Webpage<D> {
    fn query_fragment(&self) -> &str {
        &self.query
    }
}
