//! Loader: read local JSON artifacts (ticket drafts, draw results, rule book,
//! state snapshot) with size limits, and write the snapshot back canonically.
//! No network I/O.

#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use lp_core::determinism::sort_canonical;
use lp_core::{DrawResult, GameRules, RuleBook, Ticket, TicketDraft, WinningRecord};

use crate::canonical_json::write_canonical_file;
use crate::config::ConfigError;
use crate::{hasher, IoError};

/// Largest JSON input accepted (state snapshots dominate).
pub const MAX_JSON_BYTES: u64 = 32 * 1024 * 1024;

// ----------------------------- Wire-facing types -----------------------------

/// Rule book file: `{ "games": [ GameRules, ... ] }`. Each entry replaces the
/// built-in rules for its game.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleBookFile {
    pub games: Vec<GameRules>,
}

/// Draw file: `{ "draws": [ DrawResult, ... ] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DrawFile {
    pub draws: Vec<DrawResult>,
}

/// Persisted engine state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateSnapshot {
    #[serde(default)]
    pub tickets: Vec<Ticket>,
    #[serde(default)]
    pub winning_records: Vec<WinningRecord>,
}

// ----------------------------- Reading -----------------------------

/// Read a file into a JSON `Value`, refusing anything above [`MAX_JSON_BYTES`].
pub fn read_json_value_with_limits(path: &Path) -> Result<Value, IoError> {
    let f = File::open(path).map_err(|e| IoError::Path(format!("{}: {e}", path.display())))?;
    let len = f.metadata()?.len();
    if len > MAX_JSON_BYTES {
        return Err(IoError::Limit(format!("{} is {len} bytes (max {MAX_JSON_BYTES})", path.display())));
    }
    let mut buf = Vec::with_capacity(len as usize);
    // Guard against files growing between stat and read.
    f.take(MAX_JSON_BYTES + 1).read_to_end(&mut buf)?;
    if buf.len() as u64 > MAX_JSON_BYTES {
        return Err(IoError::Limit(format!("{} grew past {MAX_JSON_BYTES} bytes", path.display())));
    }
    serde_json::from_slice(&buf).map_err(|e| IoError::Json {
        pointer: "/".into(),
        msg: format!("{}: {e}", path.display()),
    })
}

fn from_value<T: for<'de> Deserialize<'de>>(path: &Path, v: Value) -> Result<T, IoError> {
    serde_json::from_value(v).map_err(|e| IoError::Json {
        pointer: "/".into(),
        msg: format!("{}: {e}", path.display()),
    })
}

pub fn load_ticket_draft(path: &Path) -> Result<TicketDraft, IoError> {
    from_value(path, read_json_value_with_limits(path)?)
}

/// Load draw results. At most one result may exist per `(game, draw_date)`.
pub fn load_draws(path: &Path) -> Result<Vec<DrawResult>, IoError> {
    let file: DrawFile = from_value(path, read_json_value_with_limits(path)?)?;
    let mut seen = BTreeSet::new();
    for d in &file.draws {
        if !seen.insert(d.key()) {
            return Err(IoError::Invalid(format!(
                "{}: more than one {} result for {}",
                path.display(),
                d.game,
                d.draw_date
            )));
        }
    }
    Ok(file.draws)
}

/// Built-in rules overridden by the file at `path`. When `expected_sha256` is
/// given, the file's canonical JSON must hash to it.
pub fn load_rule_book(path: &Path, expected_sha256: Option<&str>) -> Result<RuleBook, IoError> {
    let v = read_json_value_with_limits(path)?;
    if let Some(expected) = expected_sha256 {
        let got = hasher::sha256_canonical(&v)?;
        if got != expected {
            return Err(ConfigError::DigestMismatch("rule_book_path", expected.to_string(), got).into());
        }
    }
    let file: RuleBookFile = from_value(path, v)?;
    let mut games = BTreeSet::new();
    for g in &file.games {
        if !games.insert(g.game) {
            return Err(IoError::Invalid(format!("{}: game {} defined twice", path.display(), g.game)));
        }
    }
    let book = RuleBook::builtin().with_overrides(file.games)?;
    tracing::debug!(rule_book = %path.display(), games = games.len(), "rule book loaded");
    Ok(book)
}

/// Load the state snapshot; a missing file is an empty state.
pub fn load_snapshot(path: &Path) -> Result<StateSnapshot, IoError> {
    if !path.exists() {
        tracing::debug!(state = %path.display(), "no state file yet; starting empty");
        return Ok(StateSnapshot::default());
    }
    from_value(path, read_json_value_with_limits(path)?)
}

/// Write the snapshot as canonical JSON (atomic), in canonical order.
pub fn save_snapshot(path: &Path, snapshot: &StateSnapshot) -> Result<(), IoError> {
    let mut snap = snapshot.clone();
    sort_canonical(&mut snap.tickets);
    sort_canonical(&mut snap.winning_records);
    write_canonical_file(path, &serde_json::to_value(&snap)?)?;
    tracing::debug!(
        state = %path.display(),
        tickets = snap.tickets.len(),
        winning_records = snap.winning_records.len(),
        "state saved"
    );
    Ok(())
}
