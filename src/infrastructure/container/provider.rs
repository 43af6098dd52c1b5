//! Providers: one creation strategy each.
//!
//! A provider owns its creation function and, for singletons, the cached
//! instance. Instances are type-erased; the container downcasts them.

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::Lifetime;
use crate::errors::{BoxError, ContainerError, Result};

/// Type-erased service instance
pub type Instance = Arc<dyn Any + Send + Sync>;

type SyncCreate = Arc<dyn Fn() -> std::result::Result<Instance, BoxError> + Send + Sync>;
type AsyncCreate =
    Arc<dyn Fn() -> BoxFuture<'static, std::result::Result<Instance, BoxError>> + Send + Sync>;

#[derive(Clone)]
enum Creator {
    Sync(SyncCreate),
    Async(AsyncCreate),
}

pub struct Provider {
    key: String,
    lifetime: Lifetime,
    creator: Creator,
    type_id: TypeId,
    type_name: &'static str,
    /// Singleton slot; never written for factories
    instance: OnceCell<Instance>,
    /// Serialises synchronous first creation
    init_lock: Mutex<()>,
}

impl Provider {
    pub fn new_sync<T, F>(key: impl Into<String>, lifetime: Lifetime, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        let creator = Creator::Sync(Arc::new(move || {
            factory().map(|service| Arc::new(service) as Instance)
        }));
        Self::with_creator::<T>(key.into(), lifetime, creator)
    }

    pub fn new_async<T, F, Fut>(key: impl Into<String>, lifetime: Lifetime, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, BoxError>> + Send + 'static,
    {
        let creator = Creator::Async(Arc::new(move || {
            let fut = factory();
            Box::pin(async move { fut.await.map(|service| Arc::new(service) as Instance) })
        }));
        Self::with_creator::<T>(key.into(), lifetime, creator)
    }

    fn with_creator<T: 'static>(key: String, lifetime: Lifetime, creator: Creator) -> Self {
        Self {
            key,
            lifetime,
            creator,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            instance: OnceCell::new(),
            init_lock: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn is_async(&self) -> bool {
        matches!(self.creator, Creator::Async(_))
    }

    /// TypeId of the instances this provider produces
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// True once a singleton has been created successfully
    pub fn is_cached(&self) -> bool {
        self.instance.initialized()
    }

    /// Produce an instance without suspending.
    ///
    /// Async creation functions cannot be driven here and yield
    /// [`ContainerError::AsyncProvider`].
    pub fn create(&self) -> Result<Instance> {
        match self.lifetime {
            Lifetime::Factory => self.invoke_sync(),
            Lifetime::Singleton => {
                if let Some(instance) = self.instance.get() {
                    return Ok(instance.clone());
                }

                let _guard = self.init_lock.lock();
                if let Some(instance) = self.instance.get() {
                    return Ok(instance.clone());
                }

                let instance = self.invoke_sync()?;
                // An async caller may be initialising the cell right now; in that
                // case hand back our own instance rather than block.
                match self.instance.set(instance.clone()) {
                    Ok(()) => Ok(instance),
                    Err(_) => {
                        tracing::debug!(
                            key = %self.key,
                            "Singleton initialised concurrently by an async caller; extra instance created"
                        );
                        Ok(self.instance.get().cloned().unwrap_or(instance))
                    }
                }
            }
        }
    }

    /// Produce an instance, awaiting an async creation function if needed.
    ///
    /// A failed or cancelled singleton creation leaves the slot empty.
    pub async fn create_async(&self) -> Result<Instance> {
        match self.lifetime {
            Lifetime::Factory => self.invoke_async().await,
            Lifetime::Singleton => {
                let instance = self
                    .instance
                    .get_or_try_init(|| self.invoke_async())
                    .await?;
                Ok(instance.clone())
            }
        }
    }

    fn invoke_sync(&self) -> Result<Instance> {
        match &self.creator {
            Creator::Sync(create) => create().map_err(|source| self.creation_failed(source)),
            Creator::Async(_) => Err(ContainerError::AsyncProvider {
                key: self.key.clone(),
            }),
        }
    }

    async fn invoke_async(&self) -> Result<Instance> {
        let create = match &self.creator {
            Creator::Sync(_) => return self.invoke_sync(),
            Creator::Async(create) => create.clone(),
        };
        create().await.map_err(|source| self.creation_failed(source))
    }

    fn creation_failed(&self, source: BoxError) -> ContainerError {
        tracing::warn!(key = %self.key, error = %source, "Service creation failed");
        ContainerError::CreationFailed {
            key: self.key.clone(),
            source,
        }
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("key", &self.key)
            .field("lifetime", &self.lifetime)
            .field("type_name", &self.type_name)
            .field("is_async", &self.is_async())
            .field("cached", &self.is_cached())
            .finish()
    }
}
