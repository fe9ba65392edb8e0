//! Ticket and winning-record persistence.
//!
//! The engine needs two atomic operations from any backing store:
//! - `insert_unique`: duplicate check + insert under a uniqueness constraint on
//!   `(pool_id, draw_date, sorted numbers, bonus)`.
//! - `record_outcome`: compare-and-set `checked: false → true` together with an
//!   upsert of the winning record keyed by `(ticket_id, draw_date)`.
//!
//! [`MemoryStore`] implements both under one mutex and round-trips through
//! [`lp_io::loader::StateSnapshot`].

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use thiserror::Error;

use lp_core::{CombinationKey, GameType, PoolId, Ticket, TicketId, WinningRecord};
use lp_io::loader::StateSnapshot;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The combination (or id) is already present for this pool and draw.
    #[error("ticket {existing} already holds this combination")]
    UniqueViolation { existing: TicketId },
    #[error("ticket {0} not found")]
    NotFound(TicketId),
    #[error("outcome for ticket {0} is inconsistent: {1}")]
    InconsistentOutcome(TicketId, &'static str),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Terminal state to apply to one ticket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketOutcome {
    pub is_winner: bool,
    /// Present iff `is_winner`.
    pub record: Option<WinningRecord>,
}

impl TicketOutcome {
    pub fn loser() -> Self { Self { is_winner: false, record: None } }
    pub fn winner(record: WinningRecord) -> Self { Self { is_winner: true, record: Some(record) } }
}

/// Result of `record_outcome`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// This call flipped the ticket (and inserted its record, if any).
    Applied,
    /// Another write got there first; nothing changed.
    AlreadyChecked,
}

pub trait TicketStore: Send + Sync {
    fn insert_unique(&self, ticket: Ticket) -> Result<(), StoreError>;

    fn get(&self, id: &TicketId) -> Result<Option<Ticket>, StoreError>;

    fn tickets_for_pool_draw(&self, pool: &PoolId, date: NaiveDate) -> Result<Vec<Ticket>, StoreError>;

    fn unchecked_for_draw(&self, game: GameType, date: NaiveDate) -> Result<Vec<Ticket>, StoreError>;

    /// Atomically: if the ticket is unchecked, set `checked = true`,
    /// `is_winner`, and upsert the record. Otherwise a no-op.
    fn record_outcome(&self, id: &TicketId, outcome: &TicketOutcome) -> Result<Transition, StoreError>;

    fn winning_record(&self, id: &TicketId, date: NaiveDate) -> Result<Option<WinningRecord>, StoreError>;

    fn winning_records(&self) -> Result<Vec<WinningRecord>, StoreError>;
}

#[derive(Debug, Default)]
struct State {
    tickets: BTreeMap<TicketId, Ticket>,
    combos: BTreeMap<(PoolId, NaiveDate, CombinationKey), TicketId>,
    records: BTreeMap<(TicketId, NaiveDate), WinningRecord>,
}

impl State {
    fn insert(&mut self, ticket: Ticket) -> Result<(), StoreError> {
        let combo = (ticket.pool_id.clone(), ticket.draw_date, ticket.combination());
        if let Some(existing) = self.combos.get(&combo) {
            return Err(StoreError::UniqueViolation { existing: existing.clone() });
        }
        if self.tickets.contains_key(&ticket.id) {
            return Err(StoreError::UniqueViolation { existing: ticket.id.clone() });
        }
        self.combos.insert(combo, ticket.id.clone());
        self.tickets.insert(ticket.id.clone(), ticket);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Rebuild from a snapshot, re-checking uniqueness and that a record exists
    /// exactly for the tickets marked as winners.
    pub fn from_snapshot(snap: StateSnapshot) -> Result<Self, StoreError> {
        let mut state = State::default();
        for t in snap.tickets {
            state.insert(t)?;
        }
        for r in snap.winning_records {
            match state.tickets.get(&r.ticket_id) {
                None => return Err(StoreError::NotFound(r.ticket_id)),
                Some(t) if !(t.checked && t.is_winner) => {
                    return Err(StoreError::InconsistentOutcome(r.ticket_id, "record for a ticket not marked as a winner"));
                }
                Some(_) => {}
            }
            state.records.insert(r.key(), r);
        }
        for t in state.tickets.values() {
            if t.is_winner && !t.checked {
                return Err(StoreError::InconsistentOutcome(t.id.clone(), "winner flag on an unchecked ticket"));
            }
            if t.is_winner && !state.records.contains_key(&(t.id.clone(), t.draw_date)) {
                return Err(StoreError::InconsistentOutcome(t.id.clone(), "winner without a winning record"));
            }
        }
        Ok(Self { state: Mutex::new(state) })
    }

    pub fn snapshot(&self) -> Result<StateSnapshot, StoreError> {
        let st = self.lock()?;
        Ok(StateSnapshot {
            tickets: st.tickets.values().cloned().collect(),
            winning_records: st.records.values().cloned().collect(),
        })
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.tickets.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".into()))
    }
}

impl TicketStore for MemoryStore {
    fn insert_unique(&self, ticket: Ticket) -> Result<(), StoreError> {
        self.lock()?.insert(ticket)
    }

    fn get(&self, id: &TicketId) -> Result<Option<Ticket>, StoreError> {
        Ok(self.lock()?.tickets.get(id).cloned())
    }

    fn tickets_for_pool_draw(&self, pool: &PoolId, date: NaiveDate) -> Result<Vec<Ticket>, StoreError> {
        let st = self.lock()?;
        Ok(st
            .tickets
            .values()
            .filter(|t| &t.pool_id == pool && t.draw_date == date)
            .cloned()
            .collect())
    }

    fn unchecked_for_draw(&self, game: GameType, date: NaiveDate) -> Result<Vec<Ticket>, StoreError> {
        let st = self.lock()?;
        Ok(st
            .tickets
            .values()
            .filter(|t| !t.checked && t.game == game && t.draw_date == date)
            .cloned()
            .collect())
    }

    fn record_outcome(&self, id: &TicketId, outcome: &TicketOutcome) -> Result<Transition, StoreError> {
        if outcome.is_winner != outcome.record.is_some() {
            return Err(StoreError::InconsistentOutcome(id.clone(), "is_winner disagrees with record presence"));
        }
        let mut st = self.lock()?;
        let st = &mut *st;
        let ticket = st.tickets.get_mut(id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if ticket.checked {
            return Ok(Transition::AlreadyChecked);
        }
        if let Some(r) = &outcome.record {
            if r.ticket_id != *id || r.draw_date != ticket.draw_date {
                return Err(StoreError::InconsistentOutcome(id.clone(), "record key does not match ticket"));
            }
        }
        ticket.checked = true;
        ticket.is_winner = outcome.is_winner;
        if let Some(r) = &outcome.record {
            st.records.entry(r.key()).or_insert_with(|| r.clone());
        }
        Ok(Transition::Applied)
    }

    fn winning_record(&self, id: &TicketId, date: NaiveDate) -> Result<Option<WinningRecord>, StoreError> {
        Ok(self.lock()?.records.get(&(id.clone(), date)).cloned())
    }

    fn winning_records(&self) -> Result<Vec<WinningRecord>, StoreError> {
        Ok(self.lock()?.records.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lp_core::{Cents, EntryMethod, PrizeTier};

    fn date() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 1, 6).unwrap() }

    fn ticket(hex: &str, numbers: Vec<u8>, bonus: u8) -> Ticket {
        Ticket {
            id: TicketId::from_fingerprint(&hex.repeat(64)).unwrap(),
            pool_id: "office".parse().unwrap(),
            game: GameType::Powerball,
            draw_date: date(),
            numbers,
            bonus,
            multiplier: None,
            checked: false,
            is_winner: false,
            entered_by: "u".parse().unwrap(),
            entry_method: EntryMethod::Manual,
            created_at: Utc::now(),
        }
    }

    fn record(t: &Ticket) -> WinningRecord {
        WinningRecord {
            ticket_id: t.id.clone(),
            pool_id: t.pool_id.clone(),
            draw_date: t.draw_date,
            prize_tier: PrizeTier::Match3,
            numbers_matched: 3,
            bonus_matched: false,
            prize_amount: Cents::dollars(7),
        }
    }

    #[test]
    fn unique_insert_rejects_same_combination() {
        let s = MemoryStore::new();
        let a = ticket("a", vec![1, 2, 3, 4, 5], 6);
        s.insert_unique(a.clone()).unwrap();
        let err = s.insert_unique(ticket("b", vec![1, 2, 3, 4, 5], 6)).unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { existing } if existing == a.id));
        assert_eq!(s.len().unwrap(), 1);
        s.insert_unique(ticket("c", vec![1, 2, 3, 4, 5], 7)).unwrap();
    }

    #[test]
    fn outcome_is_applied_once() {
        let s = MemoryStore::new();
        let t = ticket("a", vec![1, 2, 3, 4, 5], 6);
        s.insert_unique(t.clone()).unwrap();
        let o = TicketOutcome::winner(record(&t));
        assert_eq!(s.record_outcome(&t.id, &o).unwrap(), Transition::Applied);
        assert_eq!(s.record_outcome(&t.id, &o).unwrap(), Transition::AlreadyChecked);
        // A later, different claim cannot reverse the first.
        assert_eq!(s.record_outcome(&t.id, &TicketOutcome::loser()).unwrap(), Transition::AlreadyChecked);
        let stored = s.get(&t.id).unwrap().unwrap();
        assert!(stored.checked && stored.is_winner);
        assert_eq!(s.winning_records().unwrap().len(), 1);
        assert!(s.unchecked_for_draw(GameType::Powerball, date()).unwrap().is_empty());
    }

    #[test]
    fn inconsistent_outcome_is_refused() {
        let s = MemoryStore::new();
        let t = ticket("a", vec![1, 2, 3, 4, 5], 6);
        s.insert_unique(t.clone()).unwrap();
        let bad = TicketOutcome { is_winner: true, record: None };
        assert!(matches!(s.record_outcome(&t.id, &bad), Err(StoreError::InconsistentOutcome(..))));
        assert!(!s.get(&t.id).unwrap().unwrap().checked);
    }

    #[test]
    fn snapshot_round_trip_keeps_constraints() {
        let s = MemoryStore::new();
        let t = ticket("a", vec![1, 2, 3, 4, 5], 6);
        s.insert_unique(t.clone()).unwrap();
        s.record_outcome(&t.id, &TicketOutcome::winner(record(&t))).unwrap();

        let back = MemoryStore::from_snapshot(s.snapshot().unwrap()).unwrap();
        assert_eq!(back.winning_records().unwrap(), s.winning_records().unwrap());
        assert!(back.insert_unique(ticket("b", vec![5, 4, 3, 2, 1], 6)).is_err());

        let mut orphan = StateSnapshot::default();
        orphan.winning_records.push(record(&t));
        assert!(matches!(MemoryStore::from_snapshot(orphan), Err(StoreError::NotFound(_))));

        let mut winner = t.clone();
        winner.checked = true;
        winner.is_winner = true;
        let recordless = StateSnapshot { tickets: vec![winner.clone()], winning_records: Vec::new() };
        assert!(matches!(
            MemoryStore::from_snapshot(recordless),
            Err(StoreError::InconsistentOutcome(id, _)) if id == t.id
        ));

        winner.checked = false;
        let premature = StateSnapshot { tickets: vec![winner], winning_records: Vec::new() };
        assert!(matches!(MemoryStore::from_snapshot(premature), Err(StoreError::InconsistentOutcome(..))));
    }
}
