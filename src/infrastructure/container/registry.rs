//! String-keyed service container.
//!
//! Every registration also binds the factory's output type to its key, so the
//! injector can go from a parameter type to a key without reflection. The last
//! registration (or explicit [`Container::bind`]) for a type wins.

use dashmap::DashMap;
use std::any::TypeId;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::provider::{Instance, Provider};
use super::Lifetime;
use crate::config::ContainerConfig;
use crate::errors::{BoxError, ContainerError, Result};
use crate::logging::OperationTimer;

/// Service container
#[derive(Clone)]
pub struct Container {
    pub(super) inner: Arc<ContainerInner>,
}

pub(super) struct ContainerInner {
    config: ContainerConfig,
    /// Providers by key
    providers: DashMap<String, Arc<Provider>>,
    /// Type to key bindings used for type-driven resolution
    bindings: DashMap<TypeId, String>,
    stats: InnerStats,
}

/// Internal counters
#[derive(Default)]
struct InnerStats {
    total_resolutions: AtomicU64,
    singleton_cache_hits: AtomicU64,
    singleton_cache_misses: AtomicU64,
    factory_creations: AtomicU64,
    failed_resolutions: AtomicU64,
}

impl Container {
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        tracing::debug!(container = %config.name, "Container created");
        Self {
            inner: Arc::new(ContainerInner {
                config,
                providers: DashMap::new(),
                bindings: DashMap::new(),
                stats: InnerStats::default(),
            }),
        }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// Register a singleton; `factory` runs on first resolution only.
    pub fn register_singleton<T, F>(&self, key: impl Into<String>, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.try_register_singleton(key, move || Ok(factory()));
    }

    /// Register a factory; `factory` runs on every resolution.
    pub fn register_factory<T, F>(&self, key: impl Into<String>, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.try_register_factory(key, move || Ok(factory()));
    }

    pub fn try_register_singleton<T, F>(&self, key: impl Into<String>, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        let key = key.into();
        self.insert(Provider::new_sync(key, Lifetime::Singleton, factory));
    }

    pub fn try_register_factory<T, F>(&self, key: impl Into<String>, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        let key = key.into();
        self.insert(Provider::new_sync(key, Lifetime::Factory, factory));
    }

    /// Register a singleton whose creation function is async.
    ///
    /// Only [`Container::aresolve`] and async injection can create it; the
    /// sync path fails with [`ContainerError::AsyncProvider`] until it is cached.
    pub fn register_async_singleton<T, F, Fut>(&self, key: impl Into<String>, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, BoxError>> + Send + 'static,
    {
        let key = key.into();
        self.insert(Provider::new_async(key, Lifetime::Singleton, factory));
    }

    pub fn register_async_factory<T, F, Fut>(&self, key: impl Into<String>, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, BoxError>> + Send + 'static,
    {
        let key = key.into();
        self.insert(Provider::new_async(key, Lifetime::Factory, factory));
    }

    fn insert(&self, provider: Provider) {
        let key = provider.key().to_string();
        tracing::debug!(
            container = %self.name(),
            key = %key,
            lifetime = ?provider.lifetime(),
            service = provider.type_name(),
            is_async = provider.is_async(),
            "Registering provider"
        );

        let type_id = provider.type_id();
        self.inner.bindings.insert(type_id, key.clone());
        let previous = self.inner.providers.insert(key.clone(), Arc::new(provider));
        if let Some(previous) = previous {
            tracing::debug!(container = %self.name(), key = %key, "Previous registration overwritten");
            if previous.type_id() != type_id {
                self.release_binding(previous.type_id(), &key);
            }
        }
    }

    /// Drop a binding that still points at `key` after `key` stopped producing
    /// that type, falling back to another key that does.
    fn release_binding(&self, type_id: TypeId, key: &str) {
        if self
            .inner
            .bindings
            .remove_if(&type_id, |_, bound| bound == key)
            .is_none()
        {
            return;
        }

        let fallback = self
            .inner
            .providers
            .iter()
            .filter(|entry| entry.value().type_id() == type_id)
            .map(|entry| entry.key().clone())
            .min();
        if let Some(fallback) = fallback {
            tracing::debug!(container = %self.name(), key = %fallback, "Type rebound after overwrite");
            self.inner.bindings.entry(type_id).or_insert(fallback);
        }
    }

    /// Bind `T` to `key` for type-driven resolution.
    ///
    /// The key does not need to be registered yet; it is looked up at
    /// resolution time.
    pub fn bind<T: 'static>(&self, key: impl Into<String>) {
        let key = key.into();
        tracing::debug!(
            container = %self.name(),
            key = %key,
            service = std::any::type_name::<T>(),
            "Binding type to key"
        );
        self.inner.bindings.insert(TypeId::of::<T>(), key);
    }

    /// Key currently bound to `T`
    pub fn key_for<T: 'static>(&self) -> Option<String> {
        self.inner
            .bindings
            .get(&TypeId::of::<T>())
            .map(|entry| entry.value().clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.providers.contains_key(key)
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .inner
            .providers
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.inner.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.providers.is_empty()
    }

    /// Resolve `key` synchronously
    pub fn resolve<T: Send + Sync + 'static>(&self, key: &str) -> Result<Arc<T>> {
        let provider = self.lookup(key)?;
        let cached = self.record_start(&provider);
        let result = if cached {
            provider.create()
        } else {
            let timer = OperationTimer::new("create").with_key(key);
            let result = provider.create();
            timer.finish();
            result
        };
        self.finish::<T>(&provider, result)
    }

    /// Resolve `key`, awaiting an async creation function if needed
    pub async fn aresolve<T: Send + Sync + 'static>(&self, key: &str) -> Result<Arc<T>> {
        let provider = self.lookup(key)?;
        let cached = self.record_start(&provider);
        let result = if cached {
            provider.create_async().await
        } else {
            let timer = OperationTimer::new("create_async").with_key(key);
            let result = provider.create_async().await;
            timer.finish();
            result
        };
        self.finish::<T>(&provider, result)
    }

    /// Resolve through the key bound to `T`
    pub fn resolve_by_type<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let key = self.bound_key::<T>()?;
        self.resolve::<T>(&key)
    }

    pub async fn aresolve_by_type<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let key = self.bound_key::<T>()?;
        self.aresolve::<T>(&key).await
    }

    fn bound_key<T: 'static>(&self) -> Result<String> {
        self.key_for::<T>().ok_or_else(|| {
            self.count_failure();
            ContainerError::TypeNotBound {
                type_name: std::any::type_name::<T>(),
            }
        })
    }

    /// Clone the provider out so no map guard is held while it runs;
    /// factories may resolve other keys from this container.
    fn lookup(&self, key: &str) -> Result<Arc<Provider>> {
        if let Some(entry) = self.inner.providers.get(key) {
            return Ok(entry.value().clone());
        }

        self.count_failure();
        tracing::debug!(container = %self.name(), key = %key, "Provider not found");
        Err(ContainerError::ProviderNotFound {
            key: key.to_string(),
            available: self.keys(),
        })
    }

    /// Returns whether the provider already held a cached instance.
    fn record_start(&self, provider: &Provider) -> bool {
        let cached = provider.is_cached();
        if !self.inner.config.track_stats {
            return cached;
        }

        let stats = &self.inner.stats;
        stats.total_resolutions.fetch_add(1, Ordering::Relaxed);
        match provider.lifetime() {
            Lifetime::Singleton if cached => {
                stats.singleton_cache_hits.fetch_add(1, Ordering::Relaxed);
            }
            Lifetime::Singleton => {
                stats.singleton_cache_misses.fetch_add(1, Ordering::Relaxed);
            }
            // Counted in `finish` once creation succeeds
            Lifetime::Factory => {}
        }
        cached
    }

    fn finish<T: Send + Sync + 'static>(
        &self,
        provider: &Provider,
        result: Result<Instance>,
    ) -> Result<Arc<T>> {
        let instance = match result {
            Ok(instance) => instance,
            Err(e) => {
                self.count_failure();
                return Err(e);
            }
        };

        if provider.lifetime() == Lifetime::Factory && self.inner.config.track_stats {
            self.inner
                .stats
                .factory_creations
                .fetch_add(1, Ordering::Relaxed);
        }

        tracing::trace!(container = %self.name(), key = %provider.key(), "Resolved");
        instance.downcast::<T>().map_err(|_| {
            self.count_failure();
            ContainerError::TypeMismatch {
                key: provider.key().to_string(),
                expected: std::any::type_name::<T>(),
                actual: provider.type_name(),
            }
        })
    }

    fn count_failure(&self) {
        if self.inner.config.track_stats {
            self.inner
                .stats
                .failed_resolutions
                .fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn get_stats(&self) -> ContainerStats {
        let stats = &self.inner.stats;
        let active_singletons = self
            .inner
            .providers
            .iter()
            .filter(|entry| entry.value().is_cached())
            .count();

        ContainerStats {
            total_resolutions: stats.total_resolutions.load(Ordering::Relaxed),
            singleton_cache_hits: stats.singleton_cache_hits.load(Ordering::Relaxed),
            singleton_cache_misses: stats.singleton_cache_misses.load(Ordering::Relaxed),
            factory_creations: stats.factory_creations.load(Ordering::Relaxed),
            failed_resolutions: stats.failed_resolutions.load(Ordering::Relaxed),
            registered_services: self.inner.providers.len(),
            active_singletons,
        }
    }

    pub(super) fn ptr_eq(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.name())
            .field("keys", &self.keys())
            .finish()
    }
}

/// Container statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerStats {
    /// Resolutions that reached a provider
    pub total_resolutions: u64,
    pub singleton_cache_hits: u64,
    pub singleton_cache_misses: u64,
    pub factory_creations: u64,
    /// Lookups or creations that returned an error
    pub failed_resolutions: u64,
    pub registered_services: usize,
    pub active_singletons: usize,
}

impl ContainerStats {
    /// Singleton cache hit rate, 0.0 to 1.0
    pub fn hit_rate(&self) -> f64 {
        let total = self.singleton_cache_hits + self.singleton_cache_misses;
        if total == 0 {
            0.0
        } else {
            self.singleton_cache_hits as f64 / total as f64
        }
    }

    pub fn performance_summary(&self) -> String {
        format!(
            "Container: {} resolutions, {:.1}% singleton hit rate, {} registered, {} active singletons",
            self.total_resolutions,
            self.hit_rate() * 100.0,
            self.registered_services,
            self.active_singletons
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug)]
    struct Service {
        id: usize,
    }

    #[test]
    fn test_singleton_resolves_same_instance() {
        let container = Container::new();
        let constructed = Arc::new(AtomicUsize::new(0));
        let constructed_clone = constructed.clone();
        container.register_singleton("svc", move || Service {
            id: constructed_clone.fetch_add(1, Ordering::SeqCst) + 1,
        });

        let first = container.resolve::<Service>("svc").unwrap();
        let second = container.resolve::<Service>("svc").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 1);
        assert_eq!(constructed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_factory_yields_sequence() {
        let container = Container::new();
        let next = Arc::new(AtomicUsize::new(0));
        let next_clone = next.clone();
        container.register_factory("id", move || next_clone.fetch_add(1, Ordering::SeqCst));

        let ids: Vec<usize> = (0..3)
            .map(|_| *container.resolve::<usize>("id").unwrap())
            .collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_reregistration_overwrites() {
        let container = Container::new();
        container.register_singleton("svc", || Service { id: 1 });
        container.register_singleton("svc", || Service { id: 2 });

        assert_eq!(container.resolve::<Service>("svc").unwrap().id, 2);
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn test_unregistered_key_fails() {
        let container = Container::new();
        container.register_singleton("present", || Service { id: 1 });

        let err = container.resolve::<Service>("missing").unwrap_err();
        match err {
            ContainerError::ProviderNotFound { key, available } => {
                assert_eq!(key, "missing");
                assert_eq!(available, vec!["present".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_type_mismatch() {
        let container = Container::new();
        container.register_singleton("svc", || Service { id: 1 });

        let err = container.resolve::<String>("svc").unwrap_err();
        assert!(matches!(
            err,
            ContainerError::TypeMismatch { ref key, .. } if key == "svc"
        ));
    }

    #[test]
    fn test_resolve_by_type_follows_latest_binding() {
        let container = Container::new();
        container.register_singleton("primary", || Service { id: 1 });
        assert_eq!(container.key_for::<Service>().as_deref(), Some("primary"));
        assert_eq!(container.resolve_by_type::<Service>().unwrap().id, 1);

        container.register_singleton("secondary", || Service { id: 2 });
        assert_eq!(container.resolve_by_type::<Service>().unwrap().id, 2);

        container.bind::<Service>("primary");
        assert_eq!(container.resolve_by_type::<Service>().unwrap().id, 1);

        let err = container.resolve_by_type::<String>().unwrap_err();
        assert!(matches!(err, ContainerError::TypeNotBound { .. }));
    }

    #[test]
    fn test_factory_can_resolve_nested_dependency() {
        #[derive(Debug)]
        struct Repository {
            service: Arc<Service>,
        }

        let container = Container::new();
        container.register_singleton("svc", || Service { id: 9 });
        let handle = container.clone();
        container.try_register_factory("repo", move || {
            let service = handle.resolve::<Service>("svc")?;
            Ok(Repository { service })
        });

        let repo = container.resolve::<Repository>("repo").unwrap();
        assert_eq!(repo.service.id, 9);
    }

    #[test]
    fn test_stats() {
        let container = Container::new();
        container.register_singleton("svc", || Service { id: 1 });
        container.register_factory("id", || 0usize);

        for _ in 0..4 {
            container.resolve::<Service>("svc").unwrap();
        }
        container.resolve::<usize>("id").unwrap();
        let _ = container.resolve::<usize>("missing");

        let stats = container.get_stats();
        assert_eq!(stats.total_resolutions, 5);
        assert_eq!(stats.singleton_cache_misses, 1);
        assert_eq!(stats.singleton_cache_hits, 3);
        assert_eq!(stats.factory_creations, 1);
        assert_eq!(stats.failed_resolutions, 1);
        assert_eq!(stats.registered_services, 2);
        assert_eq!(stats.active_singletons, 1);
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stats_can_be_disabled() {
        let config = ContainerConfig {
            name: "quiet".to_string(),
            track_stats: false,
        };
        let container = Container::with_config(config);
        container.register_singleton("svc", || Service { id: 1 });
        container.resolve::<Service>("svc").unwrap();

        let stats = container.get_stats();
        assert_eq!(stats.total_resolutions, 0);
        assert_eq!(stats.active_singletons, 1);
        assert_eq!(container.name(), "quiet");
    }

    #[tokio::test]
    async fn test_aresolve_async_factory() {
        let container = Container::new();
        container.register_async_factory("svc", || async {
            tokio::task::yield_now().await;
            Ok::<_, BoxError>(Service { id: 3 })
        });

        let service = container.aresolve::<Service>("svc").await.unwrap();
        assert_eq!(service.id, 3);

        let err = container.resolve::<Service>("svc").unwrap_err();
        assert!(matches!(err, ContainerError::AsyncProvider { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_async_singleton_resolution() {
        let container = Container::new();
        let constructed = Arc::new(AtomicUsize::new(0));
        let constructed_clone = constructed.clone();
        container.register_async_singleton("svc", move || {
            let constructed = constructed_clone.clone();
            async move {
                tokio::task::yield_now().await;
                let id = constructed.fetch_add(1, Ordering::SeqCst);
                Ok::<_, BoxError>(Service { id })
            }
        });

        let mut handles = vec![];
        for _ in 0..50 {
            let container = container.clone();
            handles.push(tokio::spawn(async move {
                container.aresolve_by_type::<Service>().await.unwrap()
            }));
        }

        let results = future::join_all(handles).await;
        for result in results {
            assert_eq!(result.unwrap().id, 0);
        }
        assert_eq!(constructed.load(Ordering::SeqCst), 1);
    }
}
