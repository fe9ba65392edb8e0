//! Ticket entry: validate → duplicate guard → unique insert.
//!
//! Rejections (bad numbers, closed draw, duplicate combination) are returned
//! as values. `Err` means a collaborator failed and the user may retry.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use lp_core::{Ticket, TicketDraft};
use lp_io::hasher::ticket_id_for;

use crate::store::StoreError;
use crate::validate::{validate_ticket, IssueKind, IssueLocation, ValidationIssue, ValidationReport};
use crate::{EngineCtx, PipelineError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryOutcome {
    Accepted(Ticket),
    Rejected(ValidationReport),
}

impl EntryOutcome {
    pub fn is_accepted(&self) -> bool { matches!(self, EntryOutcome::Accepted(_)) }
}

fn reject(kind: IssueKind, location: IssueLocation, message: String) -> ValidationReport {
    ValidationReport::from_issues(vec![ValidationIssue::new(kind, location, message)])
}

/// Validator only; nothing is read from or written to the store.
pub fn validate_draft(ctx: &EngineCtx, draft: &TicketDraft, now: DateTime<Utc>) -> Result<ValidationReport, PipelineError> {
    let Some(pool_game) = ctx.pool_game(&draft.pool_id) else {
        return Ok(reject(IssueKind::UnknownPool, IssueLocation::Root, format!("pool {} is not configured", draft.pool_id)));
    };
    let rules = ctx.rules_for(draft.game)?;
    Ok(validate_ticket(draft, pool_game, rules, ctx.schedule.as_ref(), now)?)
}

/// Full entry flow. On acceptance the stored (unchecked) ticket is returned.
pub fn enter_ticket(ctx: &EngineCtx, draft: &TicketDraft, now: DateTime<Utc>) -> Result<EntryOutcome, PipelineError> {
    let report = validate_draft(ctx, draft, now)?;
    if !report.pass {
        debug!(pool = %draft.pool_id, issues = report.issues.len(), "ticket rejected by validator");
        return Ok(EntryOutcome::Rejected(report));
    }

    // Validation guarantees every number fits; this only guards the conversion.
    let Some(key) = draft.combination() else {
        return Ok(EntryOutcome::Rejected(reject(
            IssueKind::NumberOutOfRange,
            IssueLocation::Numbers,
            "numbers do not fit the engine's number type".into(),
        )));
    };

    let existing = ctx.store.tickets_for_pool_draw(&draft.pool_id, draft.draw_date)?;
    if let Some(dup) = lp_algo::find_duplicate(&key, &existing) {
        debug!(pool = %draft.pool_id, existing = %dup.id, "duplicate combination");
        return Ok(EntryOutcome::Rejected(duplicate_report(&dup.id)));
    }

    let id = ticket_id_for(&draft.pool_id, draft.draw_date, &key)?;
    let ticket = Ticket::from_draft(draft, id, now)
        .ok_or_else(|| PipelineError::Infrastructure("validated draft failed conversion".into()))?;

    // The pre-check above can race with a concurrent entry; the store's
    // uniqueness constraint is what actually decides.
    match ctx.store.insert_unique(ticket.clone()) {
        Ok(()) => {
            info!(
                ticket_id = %ticket.id,
                pool = %ticket.pool_id,
                game = %ticket.game,
                draw_date = %ticket.draw_date,
                method = %ticket.entry_method,
                "ticket entered"
            );
            Ok(EntryOutcome::Accepted(ticket))
        }
        Err(StoreError::UniqueViolation { existing }) => {
            debug!(pool = %draft.pool_id, existing = %existing, "duplicate combination (insert race)");
            Ok(EntryOutcome::Rejected(duplicate_report(&existing)))
        }
        Err(e) => {
            warn!(pool = %draft.pool_id, error = %e, "ticket insert failed");
            Err(e.into())
        }
    }
}

fn duplicate_report(existing: &lp_core::TicketId) -> ValidationReport {
    reject(
        IssueKind::DuplicateTicket,
        IssueLocation::Root,
        format!("this combination is already entered for the pool and draw ({existing})"),
    )
}
