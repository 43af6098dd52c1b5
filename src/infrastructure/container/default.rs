//! Process-wide default container.
//!
//! Only a weak reference is kept: the default never outlives the handles the
//! application holds.

use lazy_static::lazy_static;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

use super::registry::{Container, ContainerInner};
use crate::errors::{ContainerError, Result};

lazy_static! {
    static ref DEFAULT_CONTAINER: RwLock<Option<Weak<ContainerInner>>> = RwLock::new(None);
}

impl Container {
    /// Make this container the process-wide default.
    ///
    /// No-op if it already is; otherwise replaces the previous default.
    pub fn set_default(&self) {
        let mut slot = DEFAULT_CONTAINER.write();
        if let Some(current) = slot.as_ref().and_then(Weak::upgrade) {
            if Arc::ptr_eq(&current, &self.inner) {
                return;
            }
        }

        tracing::debug!(container = %self.name(), "Default container set");
        *slot = Some(Arc::downgrade(&self.inner));
    }

    pub fn is_default(&self) -> bool {
        get_default_container()
            .map(|current| current.ptr_eq(self))
            .unwrap_or(false)
    }
}

/// The current default container
pub fn get_default_container() -> Result<Container> {
    DEFAULT_CONTAINER
        .read()
        .as_ref()
        .and_then(Weak::upgrade)
        .map(|inner| Container { inner })
        .ok_or(ContainerError::NoDefaultContainer)
}

/// Forget the default container
pub fn clear_default_container() {
    if DEFAULT_CONTAINER.write().take().is_some() {
        tracing::debug!("Default container cleared");
    }
}
