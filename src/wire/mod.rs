//! Text-safe representation of payloads at the external boundary.
//!
//! Code bytes cross the boundary as standard-alphabet base64 in both
//! directions. The registry itself only deals in decoded bytes; the
//! raw-vs-full shaping of a `get` response happens here.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::function::{Function, FunctionRef};
use crate::types::identifiers::{FunctionName, FunctionVersion, NameError};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("Malformed base64 payload: {0}")]
    Payload(#[from] base64::DecodeError),
    #[error(transparent)]
    Name(#[from] NameError),
}

/// A Function as it crosses the boundary: code held as base64 text.
///
/// Inbound, `version` and `created_at` are ignored; the store assigns
/// both. Outbound they are always populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionEnvelope {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl FunctionEnvelope {
    /// Convenience for callers assembling an inbound envelope.
    pub fn new(name: impl Into<String>, code_base64: impl Into<String>) -> Self {
        FunctionEnvelope {
            name: name.into(),
            version: String::new(),
            code: code_base64.into(),
            created_at: None,
        }
    }
}

pub fn encode_code(code: &[u8]) -> String {
    STANDARD.encode(code)
}

/// Decode wire text into payload bytes. Malformed text is a caller error,
/// never silently swallowed.
pub fn decode_code(text: &str) -> Result<Vec<u8>, WireError> {
    Ok(STANDARD.decode(text)?)
}

/// Build a typed address from boundary strings (path name, optional
/// version query). An absent or empty version means "latest".
pub fn parse_ref(name: &str, version: Option<&str>) -> Result<FunctionRef, WireError> {
    let name = FunctionName::parse(name)?;
    let version = match version {
        Some(v) if !v.is_empty() => Some(FunctionVersion::from_wire(v)),
        _ => None,
    };

    Ok(FunctionRef { name, version })
}

/// Full rendering: the Function with its code re-encoded to wire text.
pub fn to_envelope(function: &Function) -> FunctionEnvelope {
    FunctionEnvelope {
        name: function.name.as_str().to_string(),
        version: function.version.as_str().to_string(),
        code: encode_code(&function.code),
        created_at: Some(function.created_at),
    }
}

/// Raw rendering: just the decoded payload bytes.
pub fn render_raw(function: &Function) -> Vec<u8> {
    function.code.clone()
}
