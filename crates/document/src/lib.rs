//! WebProxy document query adapter.
//!
//! Implements [`dispatch::DocumentParser`] and [`dispatch::QueryableDocument`]
//! with `scraper`: response bodies are parsed as HTML documents and queried
//! with CSS selectors.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** The [`dispatch`] crate sees only the two port traits.

use dispatch::{DocumentParser, ProxyError, QueryMatch, QueryableDocument};
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}

impl From<DocumentError> for ProxyError {
    fn from(error: DocumentError) -> Self {
        match error {
            DocumentError::InvalidSelector { selector, reason } => {
                ProxyError::InvalidSelector { selector, reason }
            }
        }
    }
}

/// Parses bodies into [`HtmlDocument`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlParser;

impl DocumentParser for HtmlParser {
    fn parse(&self, raw_body: &str) -> Result<Box<dyn QueryableDocument>, ProxyError> {
        Ok(Box::new(HtmlDocument::parse(raw_body)))
    }
}

/// A parsed HTML document.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    /// Parses `raw_body`. Malformed markup is repaired, never rejected.
    pub fn parse(raw_body: &str) -> Self {
        let html = Html::parse_document(raw_body);
        if !html.errors.is_empty() {
            debug!(errors = html.errors.len(), "Document parsed with recovered errors");
        }
        Self { html }
    }

    pub fn select(&self, selector: &str) -> Result<QueryMatch, DocumentError> {
        let compiled = Selector::parse(selector).map_err(|e| DocumentError::InvalidSelector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })?;

        let mut matches = self.html.select(&compiled);
        let Some(first) = matches.next() else {
            return Ok(QueryMatch::default());
        };

        Ok(QueryMatch {
            text: Some(first.text().collect()),
            attributes: first
                .value()
                .attrs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            match_count: 1 + matches.count(),
        })
    }
}

impl QueryableDocument for HtmlDocument {
    fn query(&self, selector: &str) -> Result<QueryMatch, ProxyError> {
        Ok(self.select(selector)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
          <body>
            <div class="address">
              <h3> Jan Novák </h3>
              <div class="adr">Dlouhá 12<br>Praha</div>
            </div>
            <a class="link" href="/first" data-id="1">First</a>
            <a class="link" href="/second">Second</a>
          </body>
        </html>
    "#;

    #[test]
    fn test_first_match_text_and_count() {
        let document = HtmlDocument::parse(PAGE);

        let found = document.select(".address h3").unwrap();

        assert_eq!(found.text.as_deref(), Some(" Jan Novák "));
        assert_eq!(found.match_count, 1);
    }

    #[test]
    fn test_attributes_of_first_match() {
        let document = HtmlDocument::parse(PAGE);

        let found = document.select("a.link").unwrap();

        assert_eq!(found.match_count, 2);
        assert_eq!(found.attributes["href"], "/first");
        assert_eq!(found.attributes["data-id"], "1");
        assert_eq!(found.text.as_deref(), Some("First"));
    }

    #[test]
    fn test_nested_text_is_concatenated() {
        let document = HtmlDocument::parse(PAGE);

        let found = document.select(".adr").unwrap();

        assert_eq!(found.text.as_deref(), Some("Dlouhá 12Praha"));
    }

    #[test]
    fn test_no_match_is_empty() {
        let document = HtmlDocument::parse(PAGE);

        assert_eq!(document.select("table td").unwrap(), QueryMatch::default());
    }

    #[test]
    fn test_invalid_selector_maps_to_proxy_error() {
        let document = HtmlParser.parse(PAGE).unwrap();

        let result = document.query("a[");

        assert!(matches!(
            result,
            Err(ProxyError::InvalidSelector { ref selector, .. }) if selector == "a["
        ));
    }
}
