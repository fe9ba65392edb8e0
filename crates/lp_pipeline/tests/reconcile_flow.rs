mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use common::*;
use lp_core::{Cents, GameType, PoolId, PrizeTier, Ticket, TicketId, WinningRecord};
use lp_pipeline::{
    enter_ticket, pool_results, reconcile_draw, reconcile_latest, CollectingSink, EntryOutcome, MemoryStore,
    OutcomeSource, PipelineError, StaticDrawSource, StoreError, TicketOutcome, TicketStore, Transition,
};

fn enter(ctx: &lp_pipeline::EngineCtx, numbers: &[i64], bonus: i64) -> Ticket {
    match enter_ticket(ctx, &draft(numbers, bonus), morning()).unwrap() {
        EntryOutcome::Accepted(t) => t,
        EntryOutcome::Rejected(r) => panic!("rejected: {:?}", r.issues),
    }
}

/// Jackpot, 4+bonus, and a ticket disjoint from the draw.
fn seed(ctx: &lp_pipeline::EngineCtx) -> (Ticket, Ticket, Ticket) {
    (
        enter(ctx, &[5, 12, 30, 44, 61], 22),
        enter(ctx, &[5, 12, 30, 44, 9], 22),
        enter(ctx, &[1, 2, 3, 4, 6], 1),
    )
}

#[test]
fn authoritative_pass_scores_every_ticket() {
    let (ctx, store) = ctx();
    let sink = Arc::new(CollectingSink::new());
    let ctx = ctx.with_sink(sink.clone());
    let (jackpot, four_bonus, loser) = seed(&ctx);

    let report = reconcile_draw(&ctx, &draw()).unwrap();
    assert_eq!((report.scanned, report.checked, report.winners, report.skipped), (3, 3, 2, 0));
    assert_eq!(report.new_prize_total, Cents::dollars(150_000_000 + 50_000));

    let jr = store.winning_record(&jackpot.id, draw_date()).unwrap().unwrap();
    assert_eq!(jr.prize_tier, PrizeTier::Jackpot);
    assert_eq!(jr.prize_amount, Cents::dollars(150_000_000));
    assert_eq!((jr.numbers_matched, jr.bonus_matched), (5, true));

    let fr = store.winning_record(&four_bonus.id, draw_date()).unwrap().unwrap();
    assert_eq!(fr.prize_tier, PrizeTier::Match4Bonus);

    let l = store.get(&loser.id).unwrap().unwrap();
    assert!(l.checked && !l.is_winner);
    assert!(store.winning_record(&loser.id, draw_date()).unwrap().is_none());

    assert_eq!(sink.records().len(), 2);
}

#[test]
fn second_pass_changes_nothing() {
    let (ctx, store) = ctx();
    let sink = Arc::new(CollectingSink::new());
    let ctx = ctx.with_sink(sink.clone());
    seed(&ctx);

    reconcile_draw(&ctx, &draw()).unwrap();
    let before = store.snapshot().unwrap();
    let again = reconcile_draw(&ctx, &draw()).unwrap();

    assert_eq!((again.scanned, again.checked, again.winners), (0, 0, 0));
    assert_eq!(again.new_prize_total, Cents::ZERO);
    assert_eq!(store.snapshot().unwrap(), before);
    assert_eq!(store.winning_records().unwrap().len(), 2);
    assert_eq!(sink.records().len(), 2);
}

#[test]
fn malformed_draw_aborts_before_touching_tickets() {
    let (ctx, store) = ctx();
    seed(&ctx);
    let mut bad = draw();
    bad.winning_numbers = vec![5, 5, 30, 44, 61];
    assert!(matches!(reconcile_draw(&ctx, &bad), Err(PipelineError::Draw(_))));
    assert_eq!(store.unchecked_for_draw(GameType::Powerball, draw_date()).unwrap().len(), 3);
}

/// Fails every write for one ticket.
struct FlakyStore {
    inner: MemoryStore,
    broken: std::sync::Mutex<Option<TicketId>>,
}

impl FlakyStore {
    fn broken(&self) -> Option<TicketId> {
        self.broken.lock().unwrap().clone()
    }
}

impl TicketStore for FlakyStore {
    fn insert_unique(&self, ticket: Ticket) -> Result<(), StoreError> { self.inner.insert_unique(ticket) }
    fn get(&self, id: &TicketId) -> Result<Option<Ticket>, StoreError> { self.inner.get(id) }
    fn tickets_for_pool_draw(&self, pool: &PoolId, date: NaiveDate) -> Result<Vec<Ticket>, StoreError> {
        self.inner.tickets_for_pool_draw(pool, date)
    }
    fn unchecked_for_draw(&self, game: GameType, date: NaiveDate) -> Result<Vec<Ticket>, StoreError> {
        self.inner.unchecked_for_draw(game, date)
    }
    fn record_outcome(&self, id: &TicketId, outcome: &TicketOutcome) -> Result<Transition, StoreError> {
        if self.broken().as_ref() == Some(id) {
            return Err(StoreError::Unavailable("disk on fire".into()));
        }
        self.inner.record_outcome(id, outcome)
    }
    fn winning_record(&self, id: &TicketId, date: NaiveDate) -> Result<Option<WinningRecord>, StoreError> {
        self.inner.winning_record(id, date)
    }
    fn winning_records(&self) -> Result<Vec<WinningRecord>, StoreError> { self.inner.winning_records() }
}

#[test]
fn one_failing_ticket_does_not_stop_the_batch() {
    let store = Arc::new(FlakyStore { inner: MemoryStore::new(), broken: Default::default() });
    let ctx = ctx_with(store.clone());
    let (jackpot, four_bonus, loser) = seed(&ctx);
    *store.broken.lock().unwrap() = Some(four_bonus.id.clone());

    let report = reconcile_draw(&ctx, &draw()).unwrap();
    assert_eq!((report.scanned, report.checked, report.skipped), (3, 2, 1));
    assert!(store.get(&jackpot.id).unwrap().unwrap().checked);
    assert!(store.get(&loser.id).unwrap().unwrap().checked);
    assert!(!store.get(&four_bonus.id).unwrap().unwrap().checked);

    // Once the store recovers, the next pass picks up the leftover.
    *store.broken.lock().unwrap() = None;
    let retry = reconcile_draw(&ctx, &draw()).unwrap();
    assert_eq!((retry.scanned, retry.checked, retry.winners), (1, 1, 1));
}

#[test]
fn fallback_view_computes_and_marks_in_background() {
    let (ctx, store) = ctx();
    let sink = Arc::new(CollectingSink::new());
    let ctx = ctx.with_sink(sink.clone());
    let (jackpot, _, loser) = seed(&ctx);
    let source = StaticDrawSource::new([draw()]).unwrap();

    let (view, marker) = pool_results(&ctx, &pool(), &source).unwrap();
    assert_eq!(view.pending_marks, 3);
    assert!(view.tickets.iter().all(|t| t.source == OutcomeSource::Computed));
    let j = view.tickets.iter().find(|t| t.ticket_id == jackpot.id).unwrap();
    assert_eq!(j.prize_tier, Some(PrizeTier::Jackpot));
    let l = view.tickets.iter().find(|t| t.ticket_id == loser.id).unwrap();
    assert!(!l.is_winner && l.prize_amount.is_none());

    let summary = marker.wait(Duration::from_secs(10)).expect("marker finished");
    assert_eq!((summary.applied, summary.failed), (3, 0));

    // The authoritative pass now has nothing left to do.
    let report = reconcile_draw(&ctx, &draw()).unwrap();
    assert_eq!(report.scanned, 0);
    assert_eq!(store.winning_records().unwrap().len(), 2);
    assert_eq!(sink.records().len(), 2);

    // A second view reads stored outcomes.
    let (again, idle) = pool_results(&ctx, &pool(), &source).unwrap();
    assert_eq!(again.pending_marks, 0);
    assert!(again.tickets.iter().all(|t| t.source == OutcomeSource::Stored));
    assert_eq!(again.tickets.len(), 3);
    assert!(idle.wait(Duration::from_millis(1)).is_none());
}

#[test]
fn racing_paths_leave_one_record_per_winner() {
    for _ in 0..20 {
        let (ctx, store) = ctx();
        let sink = Arc::new(CollectingSink::new());
        let ctx = ctx.with_sink(sink.clone());
        seed(&ctx);
        for k in 0..10 {
            enter(&ctx, &[k + 10, k + 20, k + 31, 45, 62], 22);
        }
        let source = StaticDrawSource::new([draw()]).unwrap();

        let a = {
            let ctx = ctx.clone();
            thread::spawn(move || reconcile_draw(&ctx, &draw()).unwrap())
        };
        let (_, marker) = pool_results(&ctx, &pool(), &source).unwrap();
        let report = a.join().unwrap();
        let summary = marker.wait(Duration::from_secs(10)).unwrap_or_default();

        // Every ticket was applied by exactly one of the two writers.
        assert_eq!(report.checked + summary.applied, 13);
        assert!(store.unchecked_for_draw(GameType::Powerball, draw_date()).unwrap().is_empty());
        // 2 seeded winners + 10 tickets matching only the bonus.
        assert_eq!(store.winning_records().unwrap().len(), 12);
        assert_eq!(sink.records().len(), 12);
    }
}

#[test]
fn latest_draw_drives_the_pass() {
    let (ctx, _) = ctx();
    seed(&ctx);
    let empty = StaticDrawSource::default();
    assert_eq!(reconcile_latest(&ctx, GameType::Powerball, &empty).unwrap(), None);

    let mut older = draw();
    older.draw_date = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    let source = StaticDrawSource::new([older, draw()]).unwrap();
    let report = reconcile_latest(&ctx, GameType::Powerball, &source).unwrap().unwrap();
    assert_eq!(report.draw_date, draw_date());
    assert_eq!(report.scanned, 3);
}

/// A ticket that bypassed entry: every number repeats a winning one.
fn repeated_number_ticket() -> Ticket {
    let valid = draft(&[5, 12, 30, 44, 61], 22);
    let id = TicketId::from_fingerprint(&"e".repeat(64)).unwrap();
    let mut t = Ticket::from_draft(&valid, id, morning()).unwrap();
    t.numbers = vec![5, 5, 5, 5, 5];
    t
}

#[test]
fn stored_ticket_with_repeated_numbers_is_skipped_not_paid() {
    let (ctx, store) = ctx();
    let bad = repeated_number_ticket();
    store.insert_unique(bad.clone()).unwrap();

    let report = reconcile_draw(&ctx, &draw()).unwrap();
    assert_eq!((report.scanned, report.checked, report.winners, report.skipped), (1, 0, 0, 1));
    assert_eq!(report.new_prize_total, Cents::ZERO);
    assert!(store.winning_records().unwrap().is_empty());
    assert!(!store.get(&bad.id).unwrap().unwrap().checked);

    let source = StaticDrawSource::new([draw()]).unwrap();
    let (view, marker) = pool_results(&ctx, &pool(), &source).unwrap();
    assert!(view.tickets.is_empty());
    assert_eq!(view.pending_marks, 0);
    assert_eq!(marker.wait(Duration::from_secs(1)), None);
}

#[test]
fn results_for_an_unconfigured_pool_are_an_input_error() {
    let (ctx, _) = ctx();
    let source = StaticDrawSource::new([draw()]).unwrap();
    let ghost: PoolId = "ghost".parse().unwrap();
    match pool_results(&ctx, &ghost, &source) {
        Err(PipelineError::UnknownPool(p)) => assert_eq!(p, ghost),
        other => panic!("expected UnknownPool, got {other:?}"),
    }
}
