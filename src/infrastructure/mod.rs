//! Infrastructure layer
//!
//! - the service container and its providers
//! - argument injection on top of the container

// Container implementation
pub mod container;
pub mod inject;

// Re-export API
pub use container::{Container, ContainerStats, Lifetime, Provider};
pub use inject::{inject, inject_async, injector, Injector};
