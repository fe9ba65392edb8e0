// crates/lp_io/src/config.rs
//
// Engine config: which pools exist (and their game), the draw-schedule knobs,
// and where the rule book and state snapshot live.
//
// • Offline-only: any path with a scheme ("://", "http:", "https:") is rejected.
// • Relative paths resolve against the config file's directory.
// • `rule_book_path`, if given, must exist and be a file. The state file may
//   not exist yet (first run).
// • `rule_book_sha256`, if given, must be 64-lower-hex and match the SHA-256
//   of the rule book's canonical JSON.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lp_core::{GameType, PoolId};

use crate::{looks_like_url_strict, IoError};

pub const DEFAULT_STATE_FILE: &str = "lp_state.json";
pub const DEFAULT_DRAW_TIME_UTC: &str = "23:00";
pub const DEFAULT_ENTRY_CUTOFF_MINUTES: u32 = 60;
const MAX_CUTOFF_MINUTES: u32 = 7 * 24 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    pub pools: Vec<PoolConfig>,
    #[serde(default)]
    pub schedule: Option<ScheduleConfig>,
    #[serde(default)]
    pub rule_book_path: Option<String>,
    #[serde(default)]
    pub rule_book_sha256: Option<String>,
    #[serde(default)]
    pub state_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    pub pool_id: PoolId,
    pub game: GameType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// "HH:MM", UTC.
    #[serde(default = "default_draw_time")]
    pub draw_time_utc: String,
    #[serde(default = "default_cutoff")]
    pub entry_cutoff_minutes: u32,
}

fn default_draw_time() -> String { DEFAULT_DRAW_TIME_UTC.to_string() }
fn default_cutoff() -> u32 { DEFAULT_ENTRY_CUTOFF_MINUTES }

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { draw_time_utc: default_draw_time(), entry_cutoff_minutes: default_cutoff() }
    }
}

/// Config with paths resolved and values parsed.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub pools: BTreeMap<PoolId, GameType>,
    pub draw_time_utc: NaiveTime,
    pub entry_cutoff_minutes: u32,
    pub rule_book_path: Option<PathBuf>,
    pub rule_book_sha256: Option<String>,
    pub state_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config must list at least one pool")]
    NoPools,
    #[error("pool {0} listed more than once")]
    DuplicatePool(PoolId),
    #[error("field must not be empty: {0}")]
    Empty(&'static str),
    #[error("path must be offline (no scheme) for {0}: {1}")]
    UrlPath(&'static str, String),
    #[error("cannot access {0}: {1}")]
    Io(&'static str, String),
    #[error("path is not a file for {0}: {1}")]
    NotAFile(&'static str, String),
    #[error("invalid draw_time_utc (expected HH:MM): {0}")]
    DrawTime(String),
    #[error("entry_cutoff_minutes {0} exceeds one week")]
    Cutoff(u32),
    #[error("invalid sha256 format for {0}: {1}")]
    DigestShape(&'static str, String),
    #[error("digest supplied for missing input: {0}")]
    DigestForMissing(&'static str),
    #[error("sha256 mismatch for {0}: expected {1}, got {2}")]
    DigestMismatch(&'static str, String, String),
}

#[inline]
fn is_lower_hex_64(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[inline]
fn join_under(base: &Path, rel: &str) -> PathBuf {
    let p = Path::new(rel);
    if p.is_absolute() { p.to_path_buf() } else { base.join(p) }
}

fn offline_check(label: &'static str, path: &str) -> Result<(), ConfigError> {
    if path.is_empty() {
        return Err(ConfigError::Empty(label));
    }
    if looks_like_url_strict(path) {
        return Err(ConfigError::UrlPath(label, path.to_string()));
    }
    Ok(())
}

fn must_exist_file(label: &'static str, p: &Path) -> Result<(), ConfigError> {
    let md = fs::metadata(p).map_err(|e| ConfigError::Io(label, format!("{} ({e})", p.display())))?;
    if !md.is_file() {
        return Err(ConfigError::NotAFile(label, p.display().to_string()));
    }
    Ok(())
}

/// Shape and policy checks. No I/O.
pub fn validate_config(cfg: &EngineConfig) -> Result<(), ConfigError> {
    if cfg.pools.is_empty() {
        return Err(ConfigError::NoPools);
    }
    let mut seen = BTreeSet::new();
    for p in &cfg.pools {
        if !seen.insert(&p.pool_id) {
            return Err(ConfigError::DuplicatePool(p.pool_id.clone()));
        }
    }
    if let Some(s) = &cfg.rule_book_path {
        offline_check("rule_book_path", s)?;
    }
    if let Some(s) = &cfg.state_path {
        offline_check("state_path", s)?;
    }
    if let Some(h) = &cfg.rule_book_sha256 {
        if cfg.rule_book_path.is_none() {
            return Err(ConfigError::DigestForMissing("rule_book_path"));
        }
        if !is_lower_hex_64(h) {
            return Err(ConfigError::DigestShape("rule_book_sha256", h.clone()));
        }
    }
    let sched = cfg.schedule.clone().unwrap_or_default();
    parse_draw_time(&sched.draw_time_utc)?;
    if sched.entry_cutoff_minutes > MAX_CUTOFF_MINUTES {
        return Err(ConfigError::Cutoff(sched.entry_cutoff_minutes));
    }
    Ok(())
}

fn parse_draw_time(s: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| ConfigError::DrawTime(s.to_string()))
}

/// Resolve paths under `base_dir` (the config file's directory) and parse values.
pub fn resolve(base_dir: &Path, cfg: &EngineConfig) -> Result<ResolvedConfig, ConfigError> {
    validate_config(cfg)?;
    let sched = cfg.schedule.clone().unwrap_or_default();

    let rule_book_path = cfg.rule_book_path.as_deref().map(|s| join_under(base_dir, s));
    if let Some(p) = &rule_book_path {
        must_exist_file("rule_book_path", p)?;
    }
    let state_path = join_under(base_dir, cfg.state_path.as_deref().unwrap_or(DEFAULT_STATE_FILE));

    Ok(ResolvedConfig {
        pools: cfg.pools.iter().map(|p| (p.pool_id.clone(), p.game)).collect(),
        draw_time_utc: parse_draw_time(&sched.draw_time_utc)?,
        entry_cutoff_minutes: sched.entry_cutoff_minutes,
        rule_book_path,
        rule_book_sha256: cfg.rule_book_sha256.clone(),
        state_path,
    })
}

/// Read, validate and resolve a config file.
pub fn load_config(path: &Path) -> Result<ResolvedConfig, IoError> {
    let v = crate::loader::read_json_value_with_limits(path)?;
    let cfg: EngineConfig = serde_json::from_value(v)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let resolved = resolve(base, &cfg)?;
    tracing::debug!(
        config = %path.display(),
        pools = resolved.pools.len(),
        state = %resolved.state_path.display(),
        "config loaded"
    );
    Ok(resolved)
}
