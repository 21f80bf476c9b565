//! Service and client singleton registries.
//!
//! A [`Registry`] is an explicit object owned by the orchestrator. It holds two
//! caches:
//!
//! - services, keyed by the service's `TypeId`, built from factories
//!   registered on the [`RegistryBuilder`];
//! - clients, keyed by [`ClientKind`], built from the injected transports.
//!
//! Both caches use an atomic get-or-create, so at most one instance per key
//! ever exists, even with concurrent callers. Instances live as long as the
//! registry.
//!
//! Capabilities map to client kinds through a routing table fixed when the
//! registry is built ([`DEFAULT_ROUTES`] unless overridden).

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::{
    Capability, Client, ClientKind, HttpClient, HttpTransport, ProxyError, RpcTransport,
    Service, SoapClient,
};

/// The routing table a new [`RegistryBuilder`] starts with.
pub const DEFAULT_ROUTES: [(Capability, ClientKind); 2] = [
    (Capability::Http, ClientKind::Http),
    (Capability::Soap, ClientKind::Soap),
];

type ServiceInstance = Arc<dyn Any + Send + Sync>;
type ServiceFactory = Box<dyn Fn() -> ServiceInstance + Send + Sync>;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Owns the service and client singletons.
pub struct Registry {
    factories: HashMap<TypeId, ServiceFactory>,
    services: DashMap<TypeId, ServiceInstance>,
    http_transport: Option<Arc<dyn HttpTransport>>,
    rpc_transport: Option<Arc<dyn RpcTransport>>,
    clients: DashMap<ClientKind, Arc<dyn Client>>,
    routes: HashMap<Capability, ClientKind>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Returns the singleton for service type `S`, creating it on first use.
    ///
    /// Fails with [`ProxyError::UnknownService`] if `S` was never registered.
    /// Factories run with the cache entry locked and must not call back into
    /// the registry.
    pub fn service<S: Service>(&self) -> Result<Arc<S>, ProxyError> {
        let type_id = TypeId::of::<S>();
        let factory = self
            .factories
            .get(&type_id)
            .ok_or_else(|| unknown_service(type_name::<S>()))?;

        let instance = self
            .services
            .entry(type_id)
            .or_insert_with(|| {
                debug!(service = type_name::<S>(), "Creating service singleton");
                factory()
            })
            .value()
            .clone();

        instance
            .downcast::<S>()
            .map_err(|_| unknown_service(type_name::<S>()))
    }

    /// Returns the singleton client of `kind`, creating it on first use.
    ///
    /// Fails with [`ProxyError::UnknownClient`] if no transport for `kind` was
    /// injected.
    pub fn client(&self, kind: ClientKind) -> Result<Arc<dyn Client>, ProxyError> {
        let entry = self.clients.entry(kind).or_try_insert_with(|| {
            debug!(client = %kind, "Creating client singleton");
            self.build_client(kind)
        })?;
        Ok(entry.value().clone())
    }

    /// Resolves the client serving `capability` through the routing table.
    ///
    /// Fails with [`ProxyError::UnknownService`] if the capability has no
    /// route.
    pub fn client_for(&self, capability: Capability) -> Result<Arc<dyn Client>, ProxyError> {
        let kind = self
            .routes
            .get(&capability)
            .copied()
            .ok_or_else(|| unknown_service(&format!("{capability} capability")))?;
        self.client(kind)
    }

    /// Resolves the client serving `service`'s capability.
    pub fn client_for_service<S: Service>(&self, _service: &S) -> Result<Arc<dyn Client>, ProxyError> {
        self.client_for(S::CAPABILITY)
    }

    /// Number of service singletons created so far.
    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    /// Number of client singletons created so far.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    fn build_client(&self, kind: ClientKind) -> Result<Arc<dyn Client>, ProxyError> {
        let unknown = || ProxyError::UnknownClient {
            client: kind.to_string(),
        };
        let client: Arc<dyn Client> = match kind {
            ClientKind::Http => {
                Arc::new(HttpClient::new(self.http_transport.clone().ok_or_else(unknown)?))
            }
            ClientKind::Soap => {
                Arc::new(SoapClient::new(self.rpc_transport.clone().ok_or_else(unknown)?))
            }
        };
        Ok(client)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("registered_services", &self.factories.len())
            .field("services", &self.services.len())
            .field("clients", &self.clients.len())
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

fn unknown_service(service: &str) -> ProxyError {
    ProxyError::UnknownService {
        service: service.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Configures the service factories, transports, and routing table of a
/// [`Registry`].
pub struct RegistryBuilder {
    factories: HashMap<TypeId, ServiceFactory>,
    http_transport: Option<Arc<dyn HttpTransport>>,
    rpc_transport: Option<Arc<dyn RpcTransport>>,
    routes: HashMap<Capability, ClientKind>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            http_transport: None,
            rpc_transport: None,
            routes: DEFAULT_ROUTES.into_iter().collect(),
        }
    }

    /// Registers service type `S`. `factory` runs once, on first lookup.
    pub fn service<S, F>(mut self, factory: F) -> Self
    where
        S: Service,
        F: Fn() -> S + Send + Sync + 'static,
    {
        self.factories.insert(
            TypeId::of::<S>(),
            Box::new(move || Arc::new(factory()) as ServiceInstance),
        );
        self
    }

    /// Injects the transport behind the HTTP client.
    pub fn http_transport(mut self, transport: impl HttpTransport + 'static) -> Self {
        self.http_transport = Some(Arc::new(transport));
        self
    }

    /// Injects the transport behind the SOAP client.
    pub fn rpc_transport(mut self, transport: impl RpcTransport + 'static) -> Self {
        self.rpc_transport = Some(Arc::new(transport));
        self
    }

    /// Routes `capability` to `kind`, replacing any existing route.
    pub fn route(mut self, capability: Capability, kind: ClientKind) -> Self {
        self.routes.insert(capability, kind);
        self
    }

    /// Removes the route for `capability`; services with it become unknown
    /// to the client registry.
    pub fn without_route(mut self, capability: Capability) -> Self {
        self.routes.remove(&capability);
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            factories: self.factories,
            services: DashMap::new(),
            http_transport: self.http_transport,
            rpc_transport: self.rpc_transport,
            clients: DashMap::new(),
            routes: self.routes,
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::test_support::{FakeHttpTransport, FakeRpcTransport, LocalSoapService, RestApi};

    #[test]
    fn test_service_is_a_singleton() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let registry = Registry::builder()
            .service(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                RestApi
            })
            .build();

        let first = registry.service::<RestApi>().unwrap();
        let second = registry.service::<RestApi>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(registry.service_count(), 1);
    }

    #[test]
    fn test_service_singleton_under_concurrent_lookups() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let registry = Arc::new(
            Registry::builder()
                .service(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    RestApi
                })
                .build(),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.service::<RestApi>().unwrap())
            })
            .collect();
        let instances: Vec<Arc<RestApi>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_unregistered_service_is_unknown() {
        let registry = Registry::builder().service(|| RestApi).build();

        let result = registry.service::<LocalSoapService>();

        assert!(matches!(result, Err(ProxyError::UnknownService { .. })));
        assert_eq!(registry.service_count(), 0);
    }

    #[test]
    fn test_client_is_a_singleton_per_kind() {
        let registry = Registry::builder()
            .http_transport(FakeHttpTransport::json("{}"))
            .rpc_transport(FakeRpcTransport::returning(serde_json::json!(1)))
            .build();

        let first = registry.client(ClientKind::Http).unwrap();
        let second = registry.client(ClientKind::Http).unwrap();
        let soap = registry.client(ClientKind::Soap).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(soap.kind(), ClientKind::Soap);
        assert_eq!(registry.client_count(), 2);
    }

    #[test]
    fn test_client_without_transport_is_unknown() {
        let registry = Registry::builder()
            .http_transport(FakeHttpTransport::json("{}"))
            .build();

        let result = registry.client(ClientKind::Soap);

        assert!(matches!(result, Err(ProxyError::UnknownClient { .. })));
        assert_eq!(registry.client_count(), 0);
    }

    #[test]
    fn test_client_for_service_follows_capability() {
        let registry = Registry::builder()
            .service(|| RestApi)
            .service(|| LocalSoapService)
            .http_transport(FakeHttpTransport::json("{}"))
            .rpc_transport(FakeRpcTransport::returning(serde_json::json!(1)))
            .build();

        let rest = registry.service::<RestApi>().unwrap();
        let soap = registry.service::<LocalSoapService>().unwrap();

        assert_eq!(
            registry.client_for_service(&*rest).unwrap().kind(),
            ClientKind::Http
        );
        assert_eq!(
            registry.client_for_service(&*soap).unwrap().kind(),
            ClientKind::Soap
        );
    }

    #[test]
    fn test_unrouted_capability_is_unknown_service() {
        let registry = Registry::builder()
            .rpc_transport(FakeRpcTransport::returning(serde_json::json!(1)))
            .without_route(Capability::Soap)
            .build();

        let result = registry.client_for(Capability::Soap);

        assert!(matches!(result, Err(ProxyError::UnknownService { .. })));
    }

    #[test]
    fn test_custom_route() {
        let registry = Registry::builder()
            .http_transport(FakeHttpTransport::json("{}"))
            .route(Capability::Soap, ClientKind::Http)
            .build();

        assert_eq!(
            registry.client_for(Capability::Soap).unwrap().kind(),
            ClientKind::Http
        );
    }
}
