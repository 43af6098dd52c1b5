pub mod container_config;
pub mod loader;

// Re-export commonly used types
pub use container_config::{ContainerConfig, PartialContainerConfig};
pub use loader::ConfigLoader;

// Re-export environment variable names
pub use container_config::{ENV_CONTAINER_NAME, ENV_TRACK_STATS};
