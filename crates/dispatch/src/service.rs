//! Services: named remote origins shared by endpoints.

use serde::{Deserialize, Serialize};

/// What kind of client a service needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// An HTTP origin (REST API or website).
    Http,
    /// A SOAP service described by a WSDL URI.
    Soap,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Http => f.write_str("http"),
            Capability::Soap => f.write_str("soap"),
        }
    }
}

/// A remote origin.
///
/// Identified by its concrete type: the [`crate::Registry`] keeps at most one
/// instance per type. The capability is a property of the type, not of the
/// instance.
///
/// ```
/// use dispatch::{Capability, Service};
///
/// struct JsonPlaceholder;
///
/// impl Service for JsonPlaceholder {
///     const CAPABILITY: Capability = Capability::Http;
///
///     fn uri(&self) -> &str {
///         "https://jsonplaceholder.typicode.com"
///     }
/// }
/// ```
pub trait Service: Send + Sync + 'static {
    /// The client capability this service requires.
    const CAPABILITY: Capability;

    /// Base URI: the HTTP root, or the WSDL URI for SOAP services.
    fn uri(&self) -> &str;
}
