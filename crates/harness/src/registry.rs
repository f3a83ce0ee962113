//! Typed, lazily-constructing service container
//!
//! Every automation capability (browser handle, settings client, page
//! object, workflow helper) is registered once under a name together with a
//! factory. The first resolution runs the factory and memoizes the instance;
//! every later resolution of the same name returns the same `Arc`.
//!
//! ```text
//! ServiceRegistry
//!   ├── register(key, factory)      -> DuplicateService on reuse of a name
//!   ├── resolve(key) -> Arc<T>      -> UnknownService / CircularDependency
//!   └── resolve_many(kind, names)   -> ServiceBundle restricted to names
//! ```
//!
//! Factories receive a [`Resolver`] and may resolve their own dependencies
//! through it. The resolver carries the chain of names being constructed by
//! that one call, so cycles are detected per resolution and concurrent
//! callers never see each other's chains. The cache lock is never held while
//! a factory runs. Two callers racing on the first resolution of a name may
//! both run its factory; the first instance cached is the one both get.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{HarnessError, HarnessResult};

type Instance = Arc<dyn Any + Send + Sync>;
type Factory = Arc<dyn Fn(&Resolver<'_>) -> HarnessResult<Instance> + Send + Sync>;
type ProviderId = (ProviderKind, String);

/// Namespace a provider lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Service,
    PageObject,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Service => f.write_str("service"),
            ProviderKind::PageObject => f.write_str("page object"),
        }
    }
}

/// Name of a provider together with the type it resolves to.
pub struct ServiceKey<T> {
    kind: ProviderKind,
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ServiceKey<T> {
    pub const fn service(name: &'static str) -> Self {
        Self {
            kind: ProviderKind::Service,
            name,
            _marker: PhantomData,
        }
    }

    pub const fn page_object(name: &'static str) -> Self {
        Self {
            kind: ProviderKind::PageObject,
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }
}

impl<T> Clone for ServiceKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ServiceKey<T> {}

impl<T> fmt::Debug for ServiceKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' ({})", self.kind, self.name, type_name::<T>())
    }
}

struct Descriptor {
    type_id: TypeId,
    type_name: &'static str,
    factory: Factory,
}

/// Dependency container for one test run
#[derive(Default)]
pub struct ServiceRegistry {
    descriptors: Mutex<HashMap<ProviderId, Descriptor>>,
    cache: Mutex<HashMap<ProviderId, Instance>>,
}

/// Handle given to factories for resolving their dependencies.
pub struct Resolver<'a> {
    registry: &'a ServiceRegistry,
    chain: Vec<ProviderId>,
}

impl Resolver<'_> {
    pub fn resolve<T>(&self, key: ServiceKey<T>) -> HarnessResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.registry.resolve_in(key, &self.chain)
    }

    pub fn resolve_many(&self, kind: ProviderKind, names: &[&str]) -> HarnessResult<ServiceBundle> {
        self.registry.resolve_many_in(kind, names, &self.chain)
    }
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `key`. The factory does not run until the
    /// first resolution.
    pub fn register<T, F>(&self, key: ServiceKey<T>, factory: F) -> HarnessResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> HarnessResult<T> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |resolver: &Resolver<'_>| {
            factory(resolver).map(|value| Arc::new(value) as Instance)
        });
        self.insert_descriptor(key, factory)
    }

    /// Register an already constructed instance.
    pub fn register_instance<T>(&self, key: ServiceKey<T>, value: Arc<T>) -> HarnessResult<()>
    where
        T: Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |_: &Resolver<'_>| Ok(value.clone() as Instance));
        self.insert_descriptor(key, factory)
    }

    fn insert_descriptor<T: 'static>(&self, key: ServiceKey<T>, factory: Factory) -> HarnessResult<()> {
        let mut descriptors = self.descriptors.lock();
        let id = (key.kind, key.name.to_string());
        if descriptors.contains_key(&id) {
            return Err(HarnessError::DuplicateService {
                kind: key.kind,
                name: key.name.to_string(),
            });
        }
        descriptors.insert(
            id,
            Descriptor {
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
                factory,
            },
        );
        Ok(())
    }

    pub fn is_registered<T>(&self, key: ServiceKey<T>) -> bool {
        self.descriptors
            .lock()
            .contains_key(&(key.kind, key.name.to_string()))
    }

    /// Registered names of one namespace, sorted.
    pub fn names(&self, kind: ProviderKind) -> Vec<String> {
        let mut names: Vec<String> = self
            .descriptors
            .lock()
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Resolve a provider, constructing it on first use.
    pub fn resolve<T>(&self, key: ServiceKey<T>) -> HarnessResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.resolve_in(key, &[])
    }

    /// Resolve every name in `names` and return them as one bundle.
    pub fn resolve_many(&self, kind: ProviderKind, names: &[&str]) -> HarnessResult<ServiceBundle> {
        self.resolve_many_in(kind, names, &[])
    }

    fn resolve_in<T>(&self, key: ServiceKey<T>, chain: &[ProviderId]) -> HarnessResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let expected = (TypeId::of::<T>(), type_name::<T>());
        let instance = self.resolve_dyn(key.kind, key.name, Some(expected), chain)?;
        downcast(key.kind, key.name, instance)
    }

    fn resolve_many_in(
        &self,
        kind: ProviderKind,
        names: &[&str],
        chain: &[ProviderId],
    ) -> HarnessResult<ServiceBundle> {
        let mut instances = HashMap::with_capacity(names.len());
        for name in names {
            let instance = self.resolve_dyn(kind, name, None, chain)?;
            instances.insert(name.to_string(), instance);
        }
        Ok(ServiceBundle { kind, instances })
    }

    fn resolve_dyn(
        &self,
        kind: ProviderKind,
        name: &str,
        expected: Option<(TypeId, &'static str)>,
        chain: &[ProviderId],
    ) -> HarnessResult<Instance> {
        let id = (kind, name.to_string());

        let (factory, type_id, registered) = {
            let descriptors = self.descriptors.lock();
            let descriptor = descriptors.get(&id).ok_or_else(|| HarnessError::UnknownService {
                kind,
                name: name.to_string(),
            })?;
            (descriptor.factory.clone(), descriptor.type_id, descriptor.type_name)
        };

        if let Some((expected_id, requested)) = expected {
            if expected_id != type_id {
                return Err(HarnessError::ServiceTypeMismatch {
                    kind,
                    name: name.to_string(),
                    registered,
                    requested,
                });
            }
        }

        let cached = self.cache.lock().get(&id).cloned();
        if let Some(instance) = cached {
            return Ok(instance);
        }

        if chain.contains(&id) {
            let chain = chain
                .iter()
                .map(|(_, n)| n.as_str())
                .chain(std::iter::once(name))
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(HarnessError::CircularDependency { chain });
        }

        debug!("Constructing {} '{}'", kind, name);
        let mut nested = chain.to_vec();
        nested.push(id.clone());
        let instance = factory(&Resolver {
            registry: self,
            chain: nested,
        })?;

        let mut cache = self.cache.lock();
        Ok(cache.entry(id).or_insert(instance).clone())
    }
}

fn downcast<T>(kind: ProviderKind, name: &str, instance: Instance) -> HarnessResult<Arc<T>>
where
    T: Send + Sync + 'static,
{
    instance
        .downcast::<T>()
        .map_err(|_| HarnessError::ServiceTypeMismatch {
            kind,
            name: name.to_string(),
            registered: "another type",
            requested: type_name::<T>(),
        })
}

/// A set of resolved providers, restricted to the names that were asked for.
pub struct ServiceBundle {
    kind: ProviderKind,
    instances: HashMap<String, Instance>,
}

impl ServiceBundle {
    pub fn get<T>(&self, key: ServiceKey<T>) -> HarnessResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let unknown = || HarnessError::UnknownService {
            kind: key.kind,
            name: key.name.to_string(),
        };
        if key.kind != self.kind {
            return Err(unknown());
        }
        let instance = self.instances.get(key.name).cloned().ok_or_else(unknown)?;
        downcast(key.kind, key.name, instance)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.instances.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Header;
    struct Dashboard {
        header: Arc<Header>,
    }
    struct Counter(usize);

    const HEADER: ServiceKey<Header> = ServiceKey::page_object("header");
    const DASHBOARD: ServiceKey<Dashboard> = ServiceKey::page_object("dashboard");

    #[test]
    fn test_resolve_returns_same_instance() {
        let registry = ServiceRegistry::new();
        registry.register(HEADER, |_| Ok(Header)).unwrap();

        let first = registry.resolve(HEADER).unwrap();
        let second = registry.resolve(HEADER).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_factory_runs_lazily_and_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ServiceRegistry::new();
        let key: ServiceKey<Counter> = ServiceKey::service("counter");
        let seen = calls.clone();
        registry
            .register(key, move |_| Ok(Counter(seen.fetch_add(1, Ordering::SeqCst))))
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        registry.resolve(key).unwrap();
        let again = registry.resolve(key).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(again.0, 0);
    }

    #[test]
    fn test_unknown_service_fails() {
        let registry = ServiceRegistry::new();
        let err = registry.resolve(HEADER).err().unwrap();
        assert!(matches!(err, HarnessError::UnknownService { ref name, .. } if name == "header"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = ServiceRegistry::new();
        registry.register(HEADER, |_| Ok(Header)).unwrap();
        let err = registry.register(HEADER, |_| Ok(Header)).unwrap_err();
        assert!(matches!(err, HarnessError::DuplicateService { .. }));
    }

    #[test]
    fn test_namespaces_are_separate() {
        let registry = ServiceRegistry::new();
        let as_service: ServiceKey<Header> = ServiceKey::service("header");
        registry.register(HEADER, |_| Ok(Header)).unwrap();
        registry.register(as_service, |_| Ok(Header)).unwrap();
        assert_eq!(registry.names(ProviderKind::Service), vec!["header"]);
        assert_eq!(registry.names(ProviderKind::PageObject), vec!["header"]);
    }

    #[test]
    fn test_reentrant_resolution_shares_dependencies() {
        let registry = ServiceRegistry::new();
        registry.register(HEADER, |_| Ok(Header)).unwrap();
        registry
            .register(DASHBOARD, |r| {
                Ok(Dashboard {
                    header: r.resolve(HEADER)?,
                })
            })
            .unwrap();

        let dashboard = registry.resolve(DASHBOARD).unwrap();
        let header = registry.resolve(HEADER).unwrap();
        assert!(Arc::ptr_eq(&dashboard.header, &header));
    }

    #[test]
    fn test_cycle_is_detected() {
        struct A;
        struct B;
        const A_KEY: ServiceKey<A> = ServiceKey::service("a");
        const B_KEY: ServiceKey<B> = ServiceKey::service("b");

        let registry = ServiceRegistry::new();
        registry
            .register(A_KEY, |r| {
                r.resolve(B_KEY)?;
                Ok(A)
            })
            .unwrap();
        registry
            .register(B_KEY, |r| {
                r.resolve(A_KEY)?;
                Ok(B)
            })
            .unwrap();

        let err = registry.resolve(A_KEY).err().unwrap();
        match err {
            HarnessError::CircularDependency { chain } => assert_eq!(chain, "a -> b -> a"),
            other => panic!("unexpected error: {other}"),
        }
        // The failed attempt leaves nothing behind.
        let err = registry.resolve(B_KEY).err().unwrap();
        assert!(matches!(err, HarnessError::CircularDependency { ref chain } if chain == "b -> a -> b"));
    }

    #[test]
    fn test_type_mismatch_is_reported() {
        let registry = ServiceRegistry::new();
        registry.register(HEADER, |_| Ok(Header)).unwrap();
        let wrong: ServiceKey<Counter> = ServiceKey::page_object("header");
        let err = registry.resolve(wrong).err().unwrap();
        assert!(matches!(err, HarnessError::ServiceTypeMismatch { .. }));
    }

    #[test]
    fn test_resolve_many_is_restricted_to_requested_names() {
        let registry = ServiceRegistry::new();
        registry.register(HEADER, |_| Ok(Header)).unwrap();
        registry
            .register(DASHBOARD, |r| {
                Ok(Dashboard {
                    header: r.resolve(HEADER)?,
                })
            })
            .unwrap();

        let bundle = registry
            .resolve_many(ProviderKind::PageObject, &["header"])
            .unwrap();
        assert_eq!(bundle.len(), 1);
        assert!(bundle.get(HEADER).is_ok());
        assert!(matches!(
            bundle.get(DASHBOARD),
            Err(HarnessError::UnknownService { .. })
        ));

        let err = registry
            .resolve_many(ProviderKind::PageObject, &["header", "missing"])
            .err()
            .unwrap();
        assert!(matches!(err, HarnessError::UnknownService { ref name, .. } if name == "missing"));
    }

    #[test]
    fn test_registered_instance_is_returned_as_is() {
        let registry = ServiceRegistry::new();
        let header = Arc::new(Header);
        registry.register_instance(HEADER, header.clone()).unwrap();
        assert!(Arc::ptr_eq(&registry.resolve(HEADER).unwrap(), &header));
    }

    #[test]
    fn test_concurrent_first_resolution_is_not_a_cycle() {
        use std::sync::Barrier;
        use std::thread;
        use std::time::Duration;

        struct Slow;
        const SLOW: ServiceKey<Slow> = ServiceKey::service("slow");

        let registry = Arc::new(ServiceRegistry::new());
        let started = Arc::new(Barrier::new(2));
        let gate = started.clone();
        let calls = Arc::new(AtomicUsize::new(0));
        registry
            .register(SLOW, move |_| {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    gate.wait();
                    thread::sleep(Duration::from_millis(100));
                }
                Ok(Slow)
            })
            .unwrap();
        let first = {
            let registry = registry.clone();
            thread::spawn(move || registry.resolve(SLOW))
        };
        started.wait();
        let second = registry.resolve(SLOW);
        let first = first.join().unwrap();

        assert!(first.is_ok(), "{:?}", first.err());
        let second = second.unwrap();
        assert!(Arc::ptr_eq(&first.unwrap(), &second));
        assert!(Arc::ptr_eq(&registry.resolve(SLOW).unwrap(), &second));
    }
}
