use thiserror::Error;

/// Error type returned by factories. Boxed so that any `std::error::Error`
/// (or a plain string via `.into()`) can be reported from a creation function.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = ContainerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Provider '{key}' not found{}", format_available(.available))]
    ProviderNotFound {
        key: String,
        available: Vec<String>,
    },
    #[error("No provider bound for type '{type_name}'")]
    TypeNotBound { type_name: &'static str },
    #[error("No default container set. Call container.set_default() first.")]
    NoDefaultContainer,
    #[error("Failed to create service '{key}': {source}")]
    CreationFailed {
        key: String,
        #[source]
        source: BoxError,
    },
    #[error("Type mismatch for '{key}': expected '{expected}', found '{actual}'")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("Provider '{key}' has an async factory and must be resolved with aresolve")]
    AsyncProvider { key: String },
    #[error("Missing call argument of type '{type_name}'")]
    MissingArgument { type_name: &'static str },
}

impl ContainerError {
    /// True for both string-key and type-derived lookup misses.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ContainerError::ProviderNotFound { .. } | ContainerError::TypeNotBound { .. }
        )
    }

    pub fn is_creation_failure(&self) -> bool {
        matches!(self, ContainerError::CreationFailed { .. })
    }
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        String::new()
    } else {
        format!(". Available providers: {}", available.join(", "))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Invalid value '{value}' for {field}")]
    InvalidValue { field: String, value: String },
}
