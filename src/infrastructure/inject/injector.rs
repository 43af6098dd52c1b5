use std::marker::PhantomData;

use super::handler::{AsyncHandler, Handler};
use super::params::{CallArgs, CallContext};
use crate::errors::Result;
use crate::infrastructure::container::Container;

/// Builds injected wrappers.
///
/// Without an explicit container, wrappers use the default container, looked
/// up at call time and only when a parameter actually needs resolving.
#[derive(Clone, Default)]
pub struct Injector {
    container: Option<Container>,
}

impl Injector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve from `container` instead of the default container
    pub fn with_container(container: Container) -> Self {
        Self {
            container: Some(container),
        }
    }

    pub fn container(&self) -> Option<&Container> {
        self.container.as_ref()
    }

    pub fn wrap<F, Args>(&self, handler: F) -> Injected<F, Args>
    where
        F: Handler<Args>,
    {
        Injected {
            handler,
            injector: self.clone(),
            _args: PhantomData,
        }
    }

    pub fn wrap_async<F, Args>(&self, handler: F) -> AsyncInjected<F, Args>
    where
        F: AsyncHandler<Args>,
    {
        AsyncInjected {
            handler,
            injector: self.clone(),
            _args: PhantomData,
        }
    }

    fn context(&self, args: CallArgs) -> CallContext {
        CallContext::new(self.container.clone(), args)
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("container", &self.container.as_ref().map(|c| c.name()))
            .finish()
    }
}

/// Injector with default settings
pub fn injector() -> Injector {
    Injector::new()
}

/// Wrap a synchronous function; same as `injector().wrap(handler)`
pub fn inject<F, Args>(handler: F) -> Injected<F, Args>
where
    F: Handler<Args>,
{
    injector().wrap(handler)
}

/// Wrap an async function; same as `injector().wrap_async(handler)`
pub fn inject_async<F, Args>(handler: F) -> AsyncInjected<F, Args>
where
    F: AsyncHandler<Args>,
{
    injector().wrap_async(handler)
}

/// Synchronous injected function
pub struct Injected<F, Args> {
    handler: F,
    injector: Injector,
    _args: PhantomData<fn() -> Args>,
}

impl<F, Args> Injected<F, Args>
where
    F: Handler<Args>,
{
    pub fn call(&self) -> Result<F::Output> {
        self.call_with(CallArgs::new())
    }

    /// Call with caller-supplied arguments; the rest are resolved.
    pub fn call_with(&self, args: CallArgs) -> Result<F::Output> {
        let mut ctx = self.injector.context(args);
        let output = self.handler.invoke(&mut ctx).inspect_failure::<F>()?;
        if ctx.remaining_args() > 0 {
            tracing::debug!(
                handler = std::any::type_name::<F>(),
                unused = ctx.remaining_args(),
                "Supplied arguments were not consumed"
            );
        }
        Ok(output)
    }

    pub fn injector(&self) -> &Injector {
        &self.injector
    }
}

impl<F: Clone, Args> Clone for Injected<F, Args> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            injector: self.injector.clone(),
            _args: PhantomData,
        }
    }
}

/// Async injected function
pub struct AsyncInjected<F, Args> {
    handler: F,
    injector: Injector,
    _args: PhantomData<fn() -> Args>,
}

impl<F, Args> AsyncInjected<F, Args>
where
    F: AsyncHandler<Args>,
{
    pub async fn call(&self) -> Result<F::Output> {
        self.call_with(CallArgs::new()).await
    }

    pub async fn call_with(&self, args: CallArgs) -> Result<F::Output> {
        let ctx = self.injector.context(args);
        self.handler.invoke(ctx).await.inspect_failure::<F>()
    }

    pub fn injector(&self) -> &Injector {
        &self.injector
    }
}

impl<F: Clone, Args> Clone for AsyncInjected<F, Args> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            injector: self.injector.clone(),
            _args: PhantomData,
        }
    }
}

trait InspectFailure {
    fn inspect_failure<F>(self) -> Self;
}

impl<T> InspectFailure for Result<T> {
    fn inspect_failure<F>(self) -> Self {
        if let Err(e) = &self {
            tracing::debug!(
                handler = std::any::type_name::<F>(),
                error = %e,
                "Injection failed, handler not invoked"
            );
        }
        self
    }
}
