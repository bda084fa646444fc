//! Versioned function-artifact registry core.
//!
//! `registry-core` manages named, immutable function revisions: every write
//! mints a new content-derived version, retrieval resolves "latest" or a
//! specific version, and deletion targets one revision or a whole name.
//! Durable storage sits behind the [`store::FunctionStore`] capability;
//! payload bytes cross the external boundary as base64 text via [`wire`].
//!
//! The registry executes nothing — it owns artifact metadata and payload
//! lifecycle only.

pub mod function;
pub mod registry;
pub mod store;
pub mod types;
pub mod wire;
