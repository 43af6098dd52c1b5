//! Argument injection for plain functions and closures.
//!
//! Parameter types decide what is resolved: [`Inject<T>`] by type binding,
//! [`Keyed<T, K>`] by explicit key, [`Arg<T>`] only from caller-supplied
//! [`CallArgs`]. Sync functions are wrapped with [`inject`] and never
//! suspend; async functions are wrapped with [`inject_async`] and may await
//! async providers.

pub mod handler;
pub mod injector;
pub mod params;

pub use handler::{AsyncHandler, Handler};
pub use injector::{inject, inject_async, injector, AsyncInjected, Injected, Injector};
pub use params::{Arg, CallArgs, CallContext, FromContainer, Inject, Keyed, ServiceKey};
