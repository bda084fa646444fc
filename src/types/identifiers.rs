use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionName(String);

#[derive(Debug, Error)]
pub enum NameError {
    #[error("Function name is empty")]
    Empty,
}

impl FunctionName {
    /// Create a FunctionName from caller-supplied text.
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        if raw.is_empty() {
            return Err(NameError::Empty);
        }

        Ok(FunctionName(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FunctionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content hash version.
///
/// The per-name sequence participates in the hash so that re-uploading
/// byte-identical code still mints a fresh version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionVersion(String);

impl FunctionVersion {
    pub fn derive(name: &FunctionName, seq: u64, code: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(name.as_str().as_bytes());
        hasher.update(b":");
        hasher.update(seq.to_be_bytes());
        hasher.update(b":");
        hasher.update(code);

        let hash = hasher.finalize();
        let hex = hex::encode(hash);

        FunctionVersion(format!("sha256:{hex}"))
    }

    /// Wrap version text previously handed out by the registry.
    pub fn from_wire(raw: impl Into<String>) -> Self {
        FunctionVersion(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FunctionVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
