use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::identifiers::{FunctionName, FunctionVersion};

/// One immutable revision of a named function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: FunctionName,
    pub version: FunctionVersion,
    pub code: Vec<u8>,
    pub created_at: DateTime<Utc>, // informational only
}

impl Function {
    /// Mint a new revision of `name` from decoded code bytes.
    ///
    /// This is the only path a store should use to create revisions.
    /// The version is derived here, so a Function can never exist whose
    /// version disagrees with its content.
    pub fn revision(name: FunctionName, seq: u64, code: Vec<u8>) -> Self {
        let version = FunctionVersion::derive(&name, seq, &code);

        Function {
            name,
            version,
            code,
            created_at: Utc::now(),
        }
    }
}

/// Address of a Function: a name plus an optional version.
///
/// A missing version means "resolve to the latest revision".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionRef {
    pub name: FunctionName,
    pub version: Option<FunctionVersion>,
}

impl FunctionRef {
    pub fn latest(name: FunctionName) -> Self {
        FunctionRef {
            name,
            version: None,
        }
    }

    pub fn at(name: FunctionName, version: FunctionVersion) -> Self {
        FunctionRef {
            name,
            version: Some(version),
        }
    }
}

impl std::fmt::Display for FunctionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}@{}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}
