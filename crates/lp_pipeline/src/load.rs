//! LOAD stage: config → rule book → schedule → state snapshot → `EngineCtx`.
//! Stored tickets are re-checked against the rule book before use.
//! Also writes the state back after a mutating command.

#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use lp_core::RuleBook;
use lp_io::{config, loader, IoError};

use crate::schedule::WeeklySchedule;
use crate::store::MemoryStore;
use crate::{EngineCtx, PipelineError};

/// An engine backed by the on-disk state snapshot.
#[derive(Debug)]
pub struct LoadedEngine {
    pub ctx: EngineCtx,
    pub store: Arc<MemoryStore>,
    pub state_path: PathBuf,
}

pub fn load_engine(config_path: &Path) -> Result<LoadedEngine, PipelineError> {
    let cfg = config::load_config(config_path)?;

    let rules = match &cfg.rule_book_path {
        Some(p) => loader::load_rule_book(p, cfg.rule_book_sha256.as_deref())?,
        None => RuleBook::builtin(),
    };
    for game in cfg.pools.values() {
        rules.get(*game)?;
    }
    let schedule = WeeklySchedule::from_rules(&rules, cfg.draw_time_utc, cfg.entry_cutoff_minutes);

    let snapshot = loader::load_snapshot(&cfg.state_path)?;
    for t in &snapshot.tickets {
        let game_rules = rules.get(t.game)?;
        t.validate(game_rules).map_err(|e| {
            IoError::Invalid(format!("{}: ticket {}: {e}", cfg.state_path.display(), t.id))
        })?;
    }
    let store = Arc::new(MemoryStore::from_snapshot(snapshot)?);

    info!(
        config = %config_path.display(),
        pools = cfg.pools.len(),
        tickets = store.len()?,
        "engine loaded"
    );

    let ctx = EngineCtx::new(rules, cfg.pools, Arc::new(schedule), store.clone());
    Ok(LoadedEngine { ctx, store, state_path: cfg.state_path })
}

impl LoadedEngine {
    /// Write the current store contents to the state file (canonical, atomic).
    pub fn persist(&self) -> Result<(), PipelineError> {
        let snap = self.store.snapshot()?;
        loader::save_snapshot(&self.state_path, &snap)?;
        Ok(())
    }
}
