#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use lp_core::{Cents, DrawResult, EntryMethod, GameType, PoolId, RuleBook, TicketDraft};
use lp_pipeline::{EngineCtx, MemoryStore, TicketStore, WeeklySchedule};

/// Saturday: a Powerball draw day.
pub fn draw_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()
}

/// Morning of the draw, well before the 22:00 UTC cutoff.
pub fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 6, 9, 0, 0).unwrap()
}

pub fn pool() -> PoolId {
    "office".parse().unwrap()
}

pub fn ctx_with(store: Arc<dyn TicketStore>) -> EngineCtx {
    let rules = RuleBook::builtin();
    let schedule = WeeklySchedule::from_rules(&rules, NaiveTime::from_hms_opt(23, 0, 0).unwrap(), 60);
    let mut pools = BTreeMap::new();
    pools.insert(pool(), GameType::Powerball);
    pools.insert("mm-club".parse().unwrap(), GameType::MegaMillions);
    EngineCtx::new(rules, pools, Arc::new(schedule), store)
}

pub fn ctx() -> (EngineCtx, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (ctx_with(store.clone()), store)
}

pub fn draft(numbers: &[i64], bonus: i64) -> TicketDraft {
    TicketDraft {
        pool_id: pool(),
        game: GameType::Powerball,
        draw_date: draw_date(),
        numbers: numbers.to_vec(),
        bonus,
        multiplier: None,
        entered_by: "alice".parse().unwrap(),
        entry_method: EntryMethod::Manual,
    }
}

pub fn draw() -> DrawResult {
    DrawResult {
        game: GameType::Powerball,
        draw_date: draw_date(),
        winning_numbers: vec![5, 12, 30, 44, 61],
        winning_bonus: 22,
        jackpot_amount: Cents::dollars(150_000_000),
    }
}
