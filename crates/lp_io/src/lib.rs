//! crates/lp_io/src/lib.rs
//! I/O crate for the engine: everything that touches the filesystem or needs
//! a byte-exact encoding lives here.
//!
//! - Shared error type (`IoError`) with `From` conversions used across modules.
//! - Canonical JSON (sorted keys, compact) and atomic writes.
//! - SHA-256 fingerprints and ticket ids.
//! - Engine config, rule book, draw files and the state snapshot.

#![forbid(unsafe_code)]

use thiserror::Error;

pub mod canonical_json;
pub mod config;
pub mod hasher;
pub mod loader;

/// Unified error for lp_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors (open, create_dir_all, rename, fsync, ...).
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON (de)serialization errors with a JSON Pointer hint.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    /// Input exceeded a configured size limit.
    #[error("limit exceeded: {0}")]
    Limit(String),

    /// Engine config problems (shape, offline policy, missing files).
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    /// A loaded rule book is internally inconsistent.
    #[error("rule book: {0}")]
    Rules(#[from] lp_core::RuleError),

    /// Generic invariants on loaded data.
    #[error("invalid: {0}")]
    Invalid(String),
}

pub type IoResult<T> = Result<T, IoError>;

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json keeps line/column, not a pointer; default to root.
        IoError::Json { pointer: "/".to_string(), msg: e.to_string() }
    }
}

/// Returns true if `s` looks like a URL (any `<scheme>://`, plus bare http(s):).
#[inline]
pub fn looks_like_url_strict(s: &str) -> bool {
    let s = s.trim();
    s.contains("://") || s.starts_with("http:") || s.starts_with("https:")
}

pub mod prelude {
    pub use crate::{looks_like_url_strict, IoError, IoResult};

    pub use crate::canonical_json::{to_canonical_json_bytes, write_canonical_file};
    pub use crate::config::{load_config, EngineConfig, ResolvedConfig};
    pub use crate::hasher::{combination_fingerprint, sha256_hex, ticket_id_for};
    pub use crate::loader::{load_draws, load_rule_book, load_snapshot, load_ticket_draft, save_snapshot, StateSnapshot};
}
