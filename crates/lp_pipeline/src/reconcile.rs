//! Win reconciliation.
//!
//! Two independent paths score tickets against a concluded draw:
//!
//! - **Authoritative** ([`reconcile_draw`]): every unchecked ticket for the
//!   draw is classified and its terminal state written. Tickets are
//!   independent, so the pass runs them in parallel.
//! - **Fallback** ([`pool_results`]): classifies a pool's tickets in memory
//!   for display and hands the writes to a background thread the caller does
//!   not wait on.
//!
//! Both paths write through `TicketStore::record_outcome`, a compare-and-set
//! on `checked` plus an upsert of the winning record. Whichever lands first
//! wins; the other is a no-op. A lost background write only delays the
//! terminal state until the next authoritative pass.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use lp_algo::{classify, Classification};
use lp_core::determinism::sort_canonical;
use lp_core::{Cents, DrawResult, GameRules, GameType, PoolId, PrizeTier, Ticket, TicketId, WinningRecord};

use crate::draws::DrawSource;
use crate::events::WinningRecordSink;
use crate::store::{TicketOutcome, TicketStore, Transition};
use crate::{EngineCtx, PipelineError};

/// Counts for one authoritative pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub game: GameType,
    pub draw_date: NaiveDate,
    /// Unchecked tickets found for the draw.
    pub scanned: usize,
    /// Tickets this pass moved to checked (winners included).
    pub checked: usize,
    /// Of `checked`, how many won.
    pub winners: usize,
    /// Tickets another writer finished first.
    pub already_checked: usize,
    /// Tickets that failed to classify or write; left unchecked.
    pub skipped: usize,
    /// Sum of `prize_amount` over records this pass inserted.
    pub new_prize_total: Cents,
}

fn outcome_for(ticket: &Ticket, c: Option<Classification>) -> TicketOutcome {
    match c {
        None => TicketOutcome::loser(),
        Some(c) => TicketOutcome::winner(WinningRecord {
            ticket_id: ticket.id.clone(),
            pool_id: ticket.pool_id.clone(),
            draw_date: ticket.draw_date,
            prize_tier: c.tier,
            numbers_matched: c.main_matches,
            bonus_matched: c.bonus_matched,
            prize_amount: c.prize_amount,
        }),
    }
}

enum PerTicket {
    Applied(Option<WinningRecord>),
    AlreadyChecked,
    Skipped,
}

fn process_ticket(store: &dyn TicketStore, ticket: &Ticket, draw: &DrawResult, rules: &GameRules) -> PerTicket {
    let classification = match classify(ticket, draw, rules) {
        Ok(c) => c,
        Err(e) => {
            warn!(ticket_id = %ticket.id, error = %e, "classification failed; ticket skipped");
            return PerTicket::Skipped;
        }
    };
    let outcome = outcome_for(ticket, classification);
    match store.record_outcome(&ticket.id, &outcome) {
        Ok(Transition::Applied) => {
            debug!(ticket_id = %ticket.id, is_winner = outcome.is_winner, "ticket checked");
            PerTicket::Applied(outcome.record)
        }
        Ok(Transition::AlreadyChecked) => {
            debug!(ticket_id = %ticket.id, "ticket already checked");
            PerTicket::AlreadyChecked
        }
        Err(e) => {
            warn!(ticket_id = %ticket.id, error = %e, "recording outcome failed; ticket skipped");
            PerTicket::Skipped
        }
    }
}

/// Authoritative pass for one concluded draw.
///
/// A malformed draw aborts before any ticket is touched. A per-ticket failure
/// is logged and the ticket stays unchecked for the next pass.
pub fn reconcile_draw(ctx: &EngineCtx, draw: &DrawResult) -> Result<ReconcileReport, PipelineError> {
    let rules = ctx.rules_for(draw.game)?;
    draw.validate(rules)?;

    let tickets = ctx.store.unchecked_for_draw(draw.game, draw.draw_date).map_err(|e| {
        error!(game = %draw.game, draw_date = %draw.draw_date, error = %e, "cannot list unchecked tickets");
        PipelineError::from(e)
    })?;
    let store = ctx.store.as_ref();
    let results: Vec<PerTicket> = tickets
        .par_iter()
        .map(|t| process_ticket(store, t, draw, rules))
        .collect();

    let mut report = ReconcileReport {
        game: draw.game,
        draw_date: draw.draw_date,
        scanned: tickets.len(),
        checked: 0,
        winners: 0,
        already_checked: 0,
        skipped: 0,
        new_prize_total: Cents::ZERO,
    };
    let mut new_records = Vec::new();
    for r in results {
        match r {
            PerTicket::Applied(record) => {
                report.checked += 1;
                if let Some(rec) = record {
                    report.winners += 1;
                    report.new_prize_total = report.new_prize_total.saturating_add(rec.prize_amount);
                    new_records.push(rec);
                }
            }
            PerTicket::AlreadyChecked => report.already_checked += 1,
            PerTicket::Skipped => report.skipped += 1,
        }
    }

    sort_canonical(&mut new_records);
    for rec in &new_records {
        ctx.sink.on_record(rec);
    }

    info!(
        game = %report.game,
        draw_date = %report.draw_date,
        scanned = report.scanned,
        checked = report.checked,
        winners = report.winners,
        already_checked = report.already_checked,
        skipped = report.skipped,
        new_prize_total = %report.new_prize_total,
        "reconciliation pass complete"
    );
    Ok(report)
}

/// Authoritative pass against the source's latest draw for `game`.
/// `None` when the source has no draw yet.
pub fn reconcile_latest(
    ctx: &EngineCtx,
    game: GameType,
    source: &dyn DrawSource,
) -> Result<Option<ReconcileReport>, PipelineError> {
    match source.latest_draw(game)? {
        Some(draw) => reconcile_draw(ctx, &draw).map(Some),
        None => {
            info!(game = %game, "no concluded draw; nothing to reconcile");
            Ok(None)
        }
    }
}

/* ------------------------------- Fallback view ------------------------------- */

/// Where a displayed outcome came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeSource {
    /// The ticket was already checked; outcome read back from storage.
    Stored,
    /// Classified in memory for this view.
    Computed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TicketView {
    pub ticket_id: TicketId,
    pub numbers: Vec<u8>,
    pub bonus: u8,
    pub source: OutcomeSource,
    pub is_winner: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prize_tier: Option<PrizeTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prize_amount: Option<Cents>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PoolResults {
    pub pool_id: PoolId,
    pub game: GameType,
    /// Draw the view was computed against; `None` if no draw has concluded.
    pub draw: Option<DrawResult>,
    pub tickets: Vec<TicketView>,
    /// Unchecked tickets handed to the background writer.
    pub pending_marks: usize,
}

/// What the background writer managed to do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MarkSummary {
    pub applied: usize,
    pub already_checked: usize,
    pub failed: usize,
}

/// Handle on the fire-and-forget writer. Dropping it detaches the writer.
#[derive(Debug)]
pub struct BackgroundMark {
    rx: Option<Receiver<MarkSummary>>,
}

impl BackgroundMark {
    fn idle() -> Self { Self { rx: None } }

    /// Wait up to `timeout` for the writer. `None` on timeout, or when there was
    /// nothing to write, or the writer died.
    pub fn wait(self, timeout: Duration) -> Option<MarkSummary> {
        let rx = self.rx?;
        match rx.recv_timeout(timeout) {
            Ok(s) => Some(s),
            Err(RecvTimeoutError::Timeout) => {
                debug!("background marker still running; not waiting further");
                None
            }
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

fn spawn_marker(
    store: Arc<dyn TicketStore>,
    sink: Arc<dyn WinningRecordSink>,
    pending: Vec<(TicketId, TicketOutcome)>,
) -> BackgroundMark {
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new().name("lp-fallback-mark".into()).spawn(move || {
        let mut summary = MarkSummary::default();
        for (id, outcome) in pending {
            match store.record_outcome(&id, &outcome) {
                Ok(Transition::Applied) => {
                    summary.applied += 1;
                    if let Some(rec) = &outcome.record {
                        sink.on_record(rec);
                    }
                }
                Ok(Transition::AlreadyChecked) => summary.already_checked += 1,
                Err(e) => {
                    summary.failed += 1;
                    debug!(ticket_id = %id, error = %e, "fallback mark failed; left for the authoritative pass");
                }
            }
        }
        // The receiver may be gone; that is fine.
        let _ = tx.send(summary);
    });
    match spawned {
        Ok(_) => BackgroundMark { rx: Some(rx) },
        Err(e) => {
            warn!(error = %e, "could not start fallback marker");
            BackgroundMark::idle()
        }
    }
}

/// Fallback view of a pool's tickets against the latest draw for its game.
///
/// Already-checked tickets show their stored outcome. Unchecked ones are
/// classified here, shown, and queued for a background write; the view is
/// returned without waiting for it.
pub fn pool_results(
    ctx: &EngineCtx,
    pool_id: &PoolId,
    source: &dyn DrawSource,
) -> Result<(PoolResults, BackgroundMark), PipelineError> {
    let game = ctx
        .pool_game(pool_id)
        .ok_or_else(|| PipelineError::UnknownPool(pool_id.clone()))?;
    let Some(draw) = source.latest_draw(game)? else {
        let empty = PoolResults { pool_id: pool_id.clone(), game, draw: None, tickets: Vec::new(), pending_marks: 0 };
        return Ok((empty, BackgroundMark::idle()));
    };
    let rules = ctx.rules_for(game)?;
    draw.validate(rules)?;

    let mut tickets = ctx.store.tickets_for_pool_draw(pool_id, draw.draw_date)?;
    sort_canonical(&mut tickets);

    let mut views = Vec::with_capacity(tickets.len());
    let mut pending = Vec::new();
    for t in &tickets {
        if t.checked {
            let record = if t.is_winner { ctx.store.winning_record(&t.id, t.draw_date)? } else { None };
            views.push(TicketView {
                ticket_id: t.id.clone(),
                numbers: t.numbers.clone(),
                bonus: t.bonus,
                source: OutcomeSource::Stored,
                is_winner: t.is_winner,
                prize_tier: record.as_ref().map(|r| r.prize_tier),
                prize_amount: record.as_ref().map(|r| r.prize_amount),
            });
            continue;
        }
        let c = match classify(t, &draw, rules) {
            Ok(c) => c,
            Err(e) => {
                warn!(ticket_id = %t.id, error = %e, "classification failed; ticket omitted from view");
                continue;
            }
        };
        views.push(TicketView {
            ticket_id: t.id.clone(),
            numbers: t.numbers.clone(),
            bonus: t.bonus,
            source: OutcomeSource::Computed,
            is_winner: c.is_some(),
            prize_tier: c.map(|c| c.tier),
            prize_amount: c.map(|c| c.prize_amount),
        });
        pending.push((t.id.clone(), outcome_for(t, c)));
    }

    let pending_marks = pending.len();
    let marker = if pending.is_empty() {
        BackgroundMark::idle()
    } else {
        spawn_marker(Arc::clone(&ctx.store), Arc::clone(&ctx.sink), pending)
    };
    debug!(pool = %pool_id, draw_date = %draw.draw_date, shown = views.len(), pending_marks, "pool results computed");

    Ok((PoolResults { pool_id: pool_id.clone(), game, draw: Some(draw), tickets: views, pending_marks }, marker))
}
