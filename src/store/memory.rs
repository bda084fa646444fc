//! Process-local store, the default for tests and embedding.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use crate::function::{Function, FunctionRef};
use crate::store::{FunctionStore, StoreError};
use crate::types::identifiers::{FunctionName, FunctionVersion};

/// All revisions of one name, in creation order.
#[derive(Debug, Default)]
struct Chain {
    next_seq: u64,
    revisions: Vec<Function>,
}

impl Chain {
    fn mint(&mut self, name: &FunctionName, code: &[u8]) -> FunctionVersion {
        let seq = self.next_seq;
        self.next_seq += 1;

        let function = Function::revision(name.clone(), seq, code.to_vec());
        let version = function.version.clone();
        self.revisions.push(function);
        version
    }
}

/// In-memory function store.
///
/// A single mutex serializes all writes, which is what makes version
/// assignment collision-free here: the per-name sequence is only ever
/// advanced under the lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    chains: Mutex<BTreeMap<String, Chain>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FunctionStore for MemoryStore {
    fn list(&self) -> Result<Vec<Function>, StoreError> {
        let chains = self.chains.lock().unwrap_or_else(PoisonError::into_inner);

        // BTreeMap gives name order; last revision is the visible one.
        Ok(chains
            .values()
            .filter_map(|chain| chain.revisions.last().cloned())
            .collect())
    }

    fn create(&self, name: &FunctionName, code: &[u8]) -> Result<FunctionVersion, StoreError> {
        let mut chains = self.chains.lock().unwrap_or_else(PoisonError::into_inner);

        let chain = chains.entry(name.as_str().to_string()).or_default();
        Ok(chain.mint(name, code))
    }

    fn get(&self, target: &FunctionRef) -> Result<Function, StoreError> {
        let chains = self.chains.lock().unwrap_or_else(PoisonError::into_inner);

        let chain = chains
            .get(target.name.as_str())
            .ok_or_else(|| StoreError::NotFound(target.to_string()))?;

        let found = match &target.version {
            None => chain.revisions.last(),
            Some(v) => chain.revisions.iter().find(|f| &f.version == v),
        };

        found
            .cloned()
            .ok_or_else(|| StoreError::NotFound(target.to_string()))
    }

    fn update(&self, name: &FunctionName, code: &[u8]) -> Result<FunctionVersion, StoreError> {
        let mut chains = self.chains.lock().unwrap_or_else(PoisonError::into_inner);

        let chain = chains
            .get_mut(name.as_str())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;

        Ok(chain.mint(name, code))
    }

    fn delete(&self, target: &FunctionRef) -> Result<(), StoreError> {
        let mut chains = self.chains.lock().unwrap_or_else(PoisonError::into_inner);

        match &target.version {
            None => {
                chains
                    .remove(target.name.as_str())
                    .ok_or_else(|| StoreError::NotFound(target.to_string()))?;
            }
            Some(v) => {
                let chain = chains
                    .get_mut(target.name.as_str())
                    .ok_or_else(|| StoreError::NotFound(target.to_string()))?;

                let idx = chain
                    .revisions
                    .iter()
                    .position(|f| &f.version == v)
                    .ok_or_else(|| StoreError::NotFound(target.to_string()))?;
                chain.revisions.remove(idx);

                // An emptied chain disappears entirely; the name is gone
                // until a fresh create reopens it.
                if chain.revisions.is_empty() {
                    chains.remove(target.name.as_str());
                }
            }
        }

        Ok(())
    }
}
