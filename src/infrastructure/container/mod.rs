//! Container module

pub mod default;
pub mod provider;
pub mod registry;

pub use default::{clear_default_container, get_default_container};
pub use provider::{Instance, Provider};
pub use registry::{Container, ContainerStats};

// Lifecycle enum kept at container module level so providers and the registry share it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// One instance, created on first resolution and cached
    Singleton,
    /// New instance per resolve
    Factory,
}
