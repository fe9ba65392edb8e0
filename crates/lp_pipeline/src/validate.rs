//! crates/lp_pipeline/src/validate.rs
//! Ticket validation before any persistence.
//!
//! Every check runs; issues are collected, never short-circuited, and sorted
//! stably so the same draft always yields the same report. Only collaborator
//! failures (the draw schedule) come back as `Err`.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use lp_core::{GameRules, GameType, TicketDraft};

use crate::schedule::{DrawSchedule, Eligibility, ScheduleError};

/// Machine-readable reason a ticket was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum IssueKind {
    UnknownPool,
    GameTypeMismatch,
    InvalidNumberCount,
    NumberOutOfRange,
    DuplicateNumberInTicket,
    InvalidMultiplier,
    NotDrawDay,
    DrawClosed,
    DuplicateTicket,
}

/// Where the issue occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "at", content = "index", rename_all = "snake_case")]
pub enum IssueLocation {
    Root,
    GameType,
    /// The main-number list as a whole.
    Numbers,
    /// One main number, by position in the submitted draft.
    MainNumber(usize),
    Bonus,
    Multiplier,
    DrawDate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub location: IssueLocation,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(kind: IssueKind, location: IssueLocation, message: impl Into<String>) -> Self {
        Self { kind, location, message: message.into() }
    }
}

/// pass = no issues; issue order is stable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub pass: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn from_issues(mut issues: Vec<ValidationIssue>) -> Self {
        sort_issues_stably(&mut issues);
        Self { pass: issues.is_empty(), issues }
    }

    pub fn has(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }
}

/// Validate `draft` for a pool configured with `pool_game`.
///
/// Number, bonus and multiplier checks use the rules of the game the draft
/// declares; a mismatch with the pool is reported on its own.
pub fn validate_ticket(
    draft: &TicketDraft,
    pool_game: GameType,
    rules: &GameRules,
    schedule: &dyn DrawSchedule,
    now: DateTime<Utc>,
) -> Result<ValidationReport, ScheduleError> {
    let mut issues = Vec::new();

    if draft.game != pool_game {
        issues.push(ValidationIssue::new(
            IssueKind::GameTypeMismatch,
            IssueLocation::GameType,
            format!("ticket is for {}, pool plays {}", draft.game, pool_game),
        ));
    }
    issues.extend(check_numbers(&draft.numbers, rules));
    issues.extend(check_bonus(draft.bonus, rules));
    issues.extend(check_multiplier(draft.multiplier, rules));
    issues.extend(check_draw_date(draft, schedule, now)?);

    Ok(ValidationReport::from_issues(issues))
}

fn check_numbers(numbers: &[i64], rules: &GameRules) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if numbers.len() != rules.main_number_count as usize {
        issues.push(ValidationIssue::new(
            IssueKind::InvalidNumberCount,
            IssueLocation::Numbers,
            format!("expected {} main numbers, got {}", rules.main_number_count, numbers.len()),
        ));
    }

    let max = i64::from(rules.main_number_range);
    let mut seen = BTreeSet::new();
    for (i, &n) in numbers.iter().enumerate() {
        if !(1..=max).contains(&n) {
            issues.push(ValidationIssue::new(
                IssueKind::NumberOutOfRange,
                IssueLocation::MainNumber(i),
                format!("main number {n} outside 1..={max}"),
            ));
        } else if !seen.insert(n) {
            issues.push(ValidationIssue::new(
                IssueKind::DuplicateNumberInTicket,
                IssueLocation::MainNumber(i),
                format!("main number {n} appears more than once"),
            ));
        }
    }
    issues
}

fn check_bonus(bonus: i64, rules: &GameRules) -> Option<ValidationIssue> {
    let max = i64::from(rules.bonus_number_range);
    (!(1..=max).contains(&bonus)).then(|| {
        ValidationIssue::new(
            IssueKind::NumberOutOfRange,
            IssueLocation::Bonus,
            format!("bonus number {bonus} outside 1..={max}"),
        )
    })
}

fn check_multiplier(multiplier: Option<i64>, rules: &GameRules) -> Option<ValidationIssue> {
    let m = multiplier?;
    let allowed = u8::try_from(m).map(|m| rules.allows_multiplier(m)).unwrap_or(false);
    (!allowed).then(|| {
        ValidationIssue::new(
            IssueKind::InvalidMultiplier,
            IssueLocation::Multiplier,
            format!("multiplier {m} not offered for {} (allowed: {:?})", rules.game, rules.multipliers),
        )
    })
}

fn check_draw_date(
    draft: &TicketDraft,
    schedule: &dyn DrawSchedule,
    now: DateTime<Utc>,
) -> Result<Vec<ValidationIssue>, ScheduleError> {
    let mut issues = Vec::new();
    let date = draft.draw_date;
    match schedule.eligibility(draft.game, date, now)? {
        Eligibility::Open => {}
        Eligibility::NotDrawDay => {
            issues.push(ValidationIssue::new(
                IssueKind::NotDrawDay,
                IssueLocation::DrawDate,
                format!("{} does not draw on {date} ({})", draft.game, date.format("%A")),
            ));
            // A past non-draw day is also closed; report both.
            if schedule.is_draw_closed(draft.game, date, now)? {
                issues.push(closed_issue(date, schedule.entry_cutoff(draft.game, date)?));
            }
        }
        Eligibility::Closed { cutoff } => issues.push(closed_issue(date, cutoff)),
    }
    Ok(issues)
}

fn closed_issue(date: chrono::NaiveDate, cutoff: DateTime<Utc>) -> ValidationIssue {
    ValidationIssue::new(
        IssueKind::DrawClosed,
        IssueLocation::DrawDate,
        format!("entry for the {date} draw closed at {}", cutoff.format("%Y-%m-%dT%H:%M:%SZ")),
    )
}

/// kind, then location, then message.
fn sort_issues_stably(issues: &mut [ValidationIssue]) {
    issues.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then_with(|| a.location.cmp(&b.location))
            .then_with(|| a.message.cmp(&b.message))
    });
}
