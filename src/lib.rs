//! A small dependency-injection container.
//!
//! Register providers under string keys, resolve them by key or by type, and
//! wrap functions so their parameters are filled from the container.
//!
//! ```no_run
//! use injekt::{inject, Container, Inject};
//!
//! struct Mailer;
//!
//! impl Mailer {
//!     fn send(&self, to: &str) -> String {
//!         format!("sent to {to}")
//!     }
//! }
//!
//! let container = Container::new();
//! container.register_singleton("mailer", || Mailer);
//! container.set_default();
//!
//! let notify = inject(|mailer: Inject<Mailer>| mailer.send("ops@example.com"));
//! assert_eq!(notify.call().unwrap(), "sent to ops@example.com");
//! ```

pub mod config;
pub mod errors;
pub mod infrastructure;
pub mod logging;

// Re-export commonly used items for convenience
pub use config::{ConfigLoader, ContainerConfig};
pub use errors::{BoxError, ConfigError, ContainerError, Result};
pub use infrastructure::container::{
    clear_default_container, get_default_container, Container, ContainerStats, Lifetime,
};
pub use infrastructure::inject::{
    inject, inject_async, injector, Arg, AsyncInjected, CallArgs, CallContext, FromContainer, Inject, Injected,
    Injector, Keyed, ServiceKey,
};
