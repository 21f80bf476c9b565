//! Proxy configuration.
//!
//! Loaded from TOML. Every section is optional:
//!
//! ```toml
//! [default_headers]
//! User-Agent = "webproxy/0.1"
//!
//! [default_options]
//! timeout = 30
//!
//! [http]
//! timeout_secs = 30
//! fail_on_status = true
//!
//! [soap]
//! namespace = "urn:products"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Headers, Options, ProxyError};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProxyConfig {
    /// Headers merged into every request; per-call headers win.
    pub default_headers: Headers,
    /// Options merged into every request; per-call options win.
    pub default_options: Options,
    pub http: HttpSettings,
    pub soap: SoapSettings,
}

/// Settings for the HTTP transport adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpSettings {
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    /// Treat 4xx and 5xx responses as transport failures.
    pub fail_on_status: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            user_agent: None,
            fail_on_status: true,
        }
    }
}

/// Settings for the SOAP transport adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SoapSettings {
    /// Target namespace of the operations. Defaults to the service endpoint
    /// URL.
    pub namespace: Option<String>,
    /// Prefix of the `SOAPAction` header. Defaults to `"{namespace}#"`.
    pub action_prefix: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ProxyConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ProxyError> {
        toml::from_str(source).map_err(|e| ProxyError::ConfigurationError {
            message: e.to_string(),
        })
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProxyError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ProxyError::ConfigurationError {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        Self::from_toml_str(&source)
    }
}
