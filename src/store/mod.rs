//! Storage capability behind the registry.
//!
//! The registry never touches durable state directly; it goes through
//! [`FunctionStore`]. Implementations own their concurrency control and
//! must keep version assignment collision-free under concurrent writers.

pub mod file;
pub mod memory;

use thiserror::Error;

use crate::function::{Function, FunctionRef};
use crate::types::identifiers::{FunctionName, FunctionVersion};

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no function matches {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("corrupt store entry: {0}")]
    Corrupt(String),
}

/// Collection contract over immutable function revisions.
///
/// All methods take `&self`; implementations serialize their own writes.
/// Revisions are kept in creation order per name, and "latest" always
/// means the most recently created surviving revision.
pub trait FunctionStore {
    /// Latest revision of every known name, ordered by name.
    fn list(&self) -> Result<Vec<Function>, StoreError>;

    /// Open a revision chain for `name` and persist its first revision.
    fn create(&self, name: &FunctionName, code: &[u8]) -> Result<FunctionVersion, StoreError>;

    /// Fetch one revision; a ref without a version resolves to latest.
    fn get(&self, target: &FunctionRef) -> Result<Function, StoreError>;

    /// Append a new revision to an existing chain. Unknown names are
    /// `NotFound`; a chain must be opened by `create`.
    fn update(&self, name: &FunctionName, code: &[u8]) -> Result<FunctionVersion, StoreError>;

    /// Remove one revision, or the whole chain when the ref has no version.
    fn delete(&self, target: &FunctionRef) -> Result<(), StoreError>;
}
