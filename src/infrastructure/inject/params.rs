//! Injectable parameter types and the per-call resolution context.

use async_trait::async_trait;
use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use crate::errors::{ContainerError, Result};
use crate::infrastructure::container::{get_default_container, Container};

/// Arguments supplied by the caller of an injected function.
///
/// Each value is consumed by the first parameter, in declaration order, that
/// asks for its type. Supplied values always win over container resolution.
#[derive(Default)]
pub struct CallArgs {
    values: Vec<(TypeId, Box<dyn Any + Send>)>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Send + 'static>(mut self, value: T) -> Self {
        self.push(value);
        self
    }

    pub fn push<T: Send + 'static>(&mut self, value: T) {
        self.values.push((TypeId::of::<T>(), Box::new(value)));
    }

    /// Remove and return the first supplied value of type `T`
    pub fn take<T: 'static>(&mut self) -> Option<T> {
        let index = self
            .values
            .iter()
            .position(|(type_id, _)| *type_id == TypeId::of::<T>())?;
        let (_, value) = self.values.remove(index);
        value.downcast::<T>().ok().map(|boxed| *boxed)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for CallArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallArgs")
            .field("len", &self.values.len())
            .finish()
    }
}

/// State for one invocation of an injected function
pub struct CallContext {
    container: Option<Container>,
    args: CallArgs,
}

impl CallContext {
    pub fn new(container: Option<Container>, args: CallArgs) -> Self {
        Self { container, args }
    }

    /// Bound container, or the default container looked up on first use
    pub fn container(&mut self) -> Result<Container> {
        if let Some(container) = &self.container {
            return Ok(container.clone());
        }
        let container = get_default_container()?;
        self.container = Some(container.clone());
        Ok(container)
    }

    pub fn take_arg<T: 'static>(&mut self) -> Option<T> {
        self.args.take::<T>()
    }

    pub fn remaining_args(&self) -> usize {
        self.args.len()
    }
}

/// A parameter type the injector knows how to produce.
///
/// Implement this for your own types to customise how they are obtained.
#[async_trait]
pub trait FromContainer: Sized + Send + 'static {
    fn from_container(ctx: &mut CallContext) -> Result<Self>;

    /// Async variant used by async injected functions; may await async providers.
    async fn from_container_async(ctx: &mut CallContext) -> Result<Self> {
        Self::from_container(ctx)
    }
}

/// Parameter resolved by its type through the container's type bindings
pub struct Inject<T>(pub Arc<T>);

impl<T> Inject<T> {
    pub fn into_inner(self) -> Arc<T> {
        self.0
    }
}

impl<T> Deref for Inject<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> Clone for Inject<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Inject").field(&self.0).finish()
    }
}

fn supplied<T: Send + Sync + 'static>(ctx: &mut CallContext) -> Option<Arc<T>> {
    ctx.take_arg::<Arc<T>>()
        .or_else(|| ctx.take_arg::<T>().map(Arc::new))
}

#[async_trait]
impl<T: Send + Sync + 'static> FromContainer for Inject<T> {
    fn from_container(ctx: &mut CallContext) -> Result<Self> {
        if let Some(value) = supplied::<T>(ctx) {
            return Ok(Inject(value));
        }
        ctx.container()?.resolve_by_type::<T>().map(Inject)
    }

    async fn from_container_async(ctx: &mut CallContext) -> Result<Self> {
        if let Some(value) = supplied::<T>(ctx) {
            return Ok(Inject(value));
        }
        let container = ctx.container()?;
        container.aresolve_by_type::<T>().await.map(Inject)
    }
}

/// A string key usable as a type parameter of [`Keyed`]
pub trait ServiceKey: Send + Sync + 'static {
    const KEY: &'static str;
}

/// Declare a [`ServiceKey`] type.
///
/// ```ignore
/// service_key!(pub PrimaryDb = "db.primary");
/// ```
#[macro_export]
macro_rules! service_key {
    ($vis:vis $name:ident = $key:expr) => {
        $vis struct $name;

        impl $crate::ServiceKey for $name {
            const KEY: &'static str = $key;
        }
    };
}

/// Parameter resolved by an explicit key, bypassing type bindings
pub struct Keyed<T, K> {
    value: Arc<T>,
    _key: PhantomData<fn() -> K>,
}

impl<T, K: ServiceKey> Keyed<T, K> {
    pub fn new(value: Arc<T>) -> Self {
        Self {
            value,
            _key: PhantomData,
        }
    }

    pub fn key() -> &'static str {
        K::KEY
    }

    pub fn into_inner(self) -> Arc<T> {
        self.value
    }
}

impl<T, K> Deref for Keyed<T, K> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

#[async_trait]
impl<T: Send + Sync + 'static, K: ServiceKey> FromContainer for Keyed<T, K> {
    fn from_container(ctx: &mut CallContext) -> Result<Self> {
        if let Some(value) = supplied::<T>(ctx) {
            return Ok(Keyed::new(value));
        }
        ctx.container()?.resolve::<T>(K::KEY).map(Keyed::new)
    }

    async fn from_container_async(ctx: &mut CallContext) -> Result<Self> {
        if let Some(value) = supplied::<T>(ctx) {
            return Ok(Keyed::new(value));
        }
        let container = ctx.container()?;
        container.aresolve::<T>(K::KEY).await.map(Keyed::new)
    }
}

/// Parameter that must be supplied by the caller; never resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg<T>(pub T);

impl<T> Arg<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Arg<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

#[async_trait]
impl<T: Send + 'static> FromContainer for Arg<T> {
    fn from_container(ctx: &mut CallContext) -> Result<Self> {
        ctx.take_arg::<T>()
            .map(Arg)
            .ok_or(ContainerError::MissingArgument {
                type_name: std::any::type_name::<T>(),
            })
    }
}

/// The container itself, for manual resolution inside the function
#[async_trait]
impl FromContainer for Container {
    fn from_container(ctx: &mut CallContext) -> Result<Self> {
        ctx.container()
    }
}
