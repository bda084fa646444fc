//! The registry façade: the public CRUD contract over function revisions.
//!
//! A `Registry` holds an injected [`FunctionStore`] and adds the identity
//! and encoding discipline on top of it: payloads are base64-decoded before
//! anything is persisted, caller-supplied versions are never trusted, and
//! every store failure is wrapped with the operation that hit it. No
//! retries, no partial recovery.

use thiserror::Error;
use tracing::info;

use crate::function::{Function, FunctionRef};
use crate::store::{FunctionStore, StoreError};
use crate::types::identifiers::FunctionName;
use crate::wire::{self, FunctionEnvelope};

/// Caller-facing failure taxonomy.
///
/// Boundary bindings map each variant to a stable response signal;
/// `StoreUnavailable` keeps the store's own error as a source rather than
/// folding its text into the message.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{op}: no function matches {target}")]
    NotFound { op: &'static str, target: String },
    #[error("{op}: store unavailable")]
    StoreUnavailable {
        op: &'static str,
        #[source]
        source: StoreError,
    },
}

impl RegistryError {
    fn from_store(op: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(target) => RegistryError::NotFound { op, target },
            other => RegistryError::StoreUnavailable { op, source: other },
        }
    }
}

/// Versioned function registry over an injected store capability.
pub struct Registry<S> {
    store: S,
}

impl<S: FunctionStore> Registry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Latest revision of every known function.
    pub fn list(&self) -> Result<Vec<Function>, RegistryError> {
        self.store
            .list()
            .map_err(|e| RegistryError::from_store("list", e))
    }

    /// Persist a first revision of the envelope's function.
    ///
    /// Any caller-supplied version is ignored; the one the store assigns
    /// comes back in the returned ref.
    pub fn create(&self, envelope: &FunctionEnvelope) -> Result<FunctionRef, RegistryError> {
        let name = FunctionName::parse(&envelope.name)
            .map_err(|e| RegistryError::InvalidArgument(e.to_string()))?;
        let code = wire::decode_code(&envelope.code)
            .map_err(|e| RegistryError::InvalidArgument(e.to_string()))?;

        let version = self
            .store
            .create(&name, &code)
            .map_err(|e| RegistryError::from_store("create", e))?;

        info!(function = %name, version = %version, "Created function");
        Ok(FunctionRef::at(name, version))
    }

    /// Fetch one revision; a ref without a version resolves to latest.
    pub fn get(&self, target: &FunctionRef) -> Result<Function, RegistryError> {
        self.store
            .get(target)
            .map_err(|e| RegistryError::from_store("get", e))
    }

    /// Append a new revision under `target_name`.
    ///
    /// The envelope must agree with the name the caller is operating on;
    /// prior revisions are left untouched.
    pub fn update(
        &self,
        target_name: &str,
        envelope: &FunctionEnvelope,
    ) -> Result<FunctionRef, RegistryError> {
        if envelope.name != target_name {
            return Err(RegistryError::InvalidArgument(
                "Function name doesn't match target".to_string(),
            ));
        }

        let name = FunctionName::parse(&envelope.name)
            .map_err(|e| RegistryError::InvalidArgument(e.to_string()))?;
        let code = wire::decode_code(&envelope.code)
            .map_err(|e| RegistryError::InvalidArgument(e.to_string()))?;

        let version = self
            .store
            .update(&name, &code)
            .map_err(|e| RegistryError::from_store("update", e))?;

        info!(function = %name, version = %version, "Updated function");
        Ok(FunctionRef::at(name, version))
    }

    /// Remove one revision, or every revision of a name when the ref
    /// carries no version.
    pub fn delete(&self, target: &FunctionRef) -> Result<(), RegistryError> {
        if target.version.is_none() {
            info!(function = %target.name, "Deleting all versions");
        }

        self.store
            .delete(target)
            .map_err(|e| RegistryError::from_store("delete", e))?;

        info!(function = %target, "Deleted function");
        Ok(())
    }
}
