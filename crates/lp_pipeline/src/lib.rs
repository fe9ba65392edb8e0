//! lp_pipeline: engine orchestration.
//!
//! - entry: draft → validate → duplicate guard → unique insert
//! - reconcile: authoritative pass over unchecked tickets, and the fallback
//!   pool-results view with its background "mark checked" writer
//!
//! Pure decisions come from `lp_algo`; files and ids from `lp_io`. The
//! collaborators the engine does not own (schedule, draw results, storage,
//! notification) sit behind traits so callers can plug in their own.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use lp_core::{GameRules, GameType, PoolId, RuleBook};

pub mod draws;
pub mod entry;
pub mod events;
pub mod load;
pub mod reconcile;
pub mod schedule;
pub mod store;
pub mod validate;

pub use draws::{DrawSource, DrawSourceError, StaticDrawSource};
pub use entry::{enter_ticket, validate_draft, EntryOutcome};
pub use events::{CollectingSink, NoopSink, WinningRecordSink};
pub use load::{load_engine, LoadedEngine};
pub use reconcile::{
    pool_results, reconcile_draw, reconcile_latest, BackgroundMark, MarkSummary, OutcomeSource, PoolResults,
    ReconcileReport, TicketView,
};
pub use schedule::{DrawSchedule, Eligibility, ScheduleError, WeeklySchedule};
pub use store::{MemoryStore, StoreError, TicketOutcome, TicketStore, Transition};
pub use validate::{IssueKind, IssueLocation, ValidationIssue, ValidationReport};

/// Single error surface for engine operations. Business rejections are not
/// errors; see [`EntryOutcome`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A collaborator (store, schedule, draw source) failed; the caller may retry.
    #[error("infrastructure: {0}")]
    Infrastructure(String),

    #[error(transparent)]
    Rules(#[from] lp_core::RuleError),

    /// The caller named a pool the engine is not configured for.
    #[error("pool {0} is not configured")]
    UnknownPool(PoolId),

    /// The draw result does not fit its game's rules.
    #[error("draw result: {0}")]
    Draw(#[from] lp_core::DrawError),

    #[error(transparent)]
    Io(#[from] lp_io::IoError),
}

impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        PipelineError::Infrastructure(format!("store: {e}"))
    }
}

impl From<ScheduleError> for PipelineError {
    fn from(e: ScheduleError) -> Self {
        PipelineError::Infrastructure(format!("schedule: {e}"))
    }
}

impl From<DrawSourceError> for PipelineError {
    fn from(e: DrawSourceError) -> Self {
        PipelineError::Infrastructure(format!("draw source: {e}"))
    }
}

/// Everything an engine operation needs. Cheap to clone; all collaborators are shared.
#[derive(Clone)]
pub struct EngineCtx {
    pub rules: Arc<RuleBook>,
    /// Configured pools and the game each one plays.
    pub pools: BTreeMap<PoolId, GameType>,
    pub schedule: Arc<dyn DrawSchedule>,
    pub store: Arc<dyn TicketStore>,
    pub sink: Arc<dyn WinningRecordSink>,
}

impl EngineCtx {
    pub fn new(
        rules: RuleBook,
        pools: BTreeMap<PoolId, GameType>,
        schedule: Arc<dyn DrawSchedule>,
        store: Arc<dyn TicketStore>,
    ) -> Self {
        Self { rules: Arc::new(rules), pools, schedule, store, sink: Arc::new(NoopSink) }
    }

    pub fn with_sink(mut self, sink: Arc<dyn WinningRecordSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn rules_for(&self, game: GameType) -> Result<&GameRules, PipelineError> {
        Ok(self.rules.get(game)?)
    }

    pub fn pool_game(&self, pool: &PoolId) -> Option<GameType> {
        self.pools.get(pool).copied()
    }
}

impl std::fmt::Debug for EngineCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineCtx")
            .field("pools", &self.pools)
            .field("games", &self.rules.iter().map(|r| r.game).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
