//! crates/lp_core/src/ticket.rs
//! Ticket drafts (untrusted, as produced by scan/manual entry) and persisted tickets.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::TicketError;
use crate::games::{GameRules, GameType};
use crate::ids::{PoolId, TicketId, UserId};

serde_enum!(
    /// How the ticket reached the engine. Irrelevant to duplicate identity.
    EntryMethod => {
        Scan   = "scan",
        Manual = "manual",
    }
);

/// A candidate ticket as submitted. Numbers are wide signed integers so that
/// out-of-range input (negative, huge) is reported by the validator instead of
/// failing deserialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TicketDraft {
    pub pool_id: PoolId,
    pub game: GameType,
    pub draw_date: NaiveDate,
    pub numbers: Vec<i64>,
    pub bonus: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<i64>,
    pub entered_by: UserId,
    pub entry_method: EntryMethod,
}

impl TicketDraft {
    /// Normalized combination, or `None` when a number does not fit the
    /// engine's number type (the validator reports those as out of range).
    pub fn combination(&self) -> Option<CombinationKey> {
        let numbers = self
            .numbers
            .iter()
            .map(|&n| u8::try_from(n).ok())
            .collect::<Option<Vec<u8>>>()?;
        let bonus = u8::try_from(self.bonus).ok()?;
        Some(CombinationKey::new(numbers, bonus))
    }
}

/// Duplicate identity of a ticket within one pool and draw: main numbers in
/// ascending order plus the bonus number.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CombinationKey {
    numbers: Vec<u8>,
    bonus: u8,
}

impl CombinationKey {
    pub fn new(mut numbers: Vec<u8>, bonus: u8) -> Self {
        numbers.sort_unstable();
        Self { numbers, bonus }
    }

    pub fn numbers(&self) -> &[u8] { &self.numbers }
    pub fn bonus(&self) -> u8 { self.bonus }
}

/// A persisted ticket. Everything except `checked`/`is_winner` is frozen at
/// insert time; those two only ever move from `false` to `true`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ticket {
    pub id: TicketId,
    pub pool_id: PoolId,
    pub game: GameType,
    pub draw_date: NaiveDate,
    /// Ascending.
    pub numbers: Vec<u8>,
    pub bonus: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<u8>,
    pub checked: bool,
    /// Meaningful only once `checked` is set.
    pub is_winner: bool,
    pub entered_by: UserId,
    pub entry_method: EntryMethod,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    /// Build an unchecked ticket from a validated draft.
    ///
    /// Returns `None` if the draft carries values the validator would have
    /// rejected (numbers or multiplier outside `u8`).
    pub fn from_draft(draft: &TicketDraft, id: TicketId, created_at: DateTime<Utc>) -> Option<Ticket> {
        let key = draft.combination()?;
        let multiplier = match draft.multiplier {
            Some(m) => Some(u8::try_from(m).ok()?),
            None => None,
        };
        Some(Ticket {
            id,
            pool_id: draft.pool_id.clone(),
            game: draft.game,
            draw_date: draft.draw_date,
            numbers: key.numbers,
            bonus: key.bonus,
            multiplier,
            checked: false,
            is_winner: false,
            entered_by: draft.entered_by.clone(),
            entry_method: draft.entry_method,
            created_at,
        })
    }

    pub fn combination(&self) -> CombinationKey {
        CombinationKey::new(self.numbers.clone(), self.bonus)
    }

    /// Re-check numbers and bonus against `rules`. Entry guarantees this for
    /// tickets it creates; tickets read back from storage are not trusted.
    pub fn validate(&self, rules: &GameRules) -> Result<(), TicketError> {
        if self.numbers.len() != rules.main_number_count as usize {
            return Err(TicketError::WrongCount { expected: rules.main_number_count, got: self.numbers.len() });
        }
        let mut seen = BTreeSet::new();
        for &value in &self.numbers {
            if !rules.main_range().contains(&value) {
                return Err(TicketError::OutOfRange { value, max: rules.main_number_range });
            }
            if !seen.insert(value) {
                return Err(TicketError::Repeated { value });
            }
        }
        if !rules.bonus_range().contains(&self.bonus) {
            return Err(TicketError::BonusOutOfRange { value: self.bonus, max: rules.bonus_number_range });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::powerball;

    fn draft(numbers: Vec<i64>, bonus: i64) -> TicketDraft {
        TicketDraft {
            pool_id: "office".parse().unwrap(),
            game: GameType::Powerball,
            draw_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            numbers,
            bonus,
            multiplier: None,
            entered_by: "alice".parse().unwrap(),
            entry_method: EntryMethod::Manual,
        }
    }

    #[test]
    fn combination_ignores_order() {
        let a = draft(vec![5, 12, 30, 44, 61], 22).combination().unwrap();
        let b = draft(vec![61, 44, 30, 12, 5], 22).combination().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.numbers(), &[5, 12, 30, 44, 61]);
    }

    #[test]
    fn combination_rejects_wide_values() {
        assert!(draft(vec![-1, 2, 3, 4, 5], 1).combination().is_none());
        assert!(draft(vec![1, 2, 3, 4, 5], 300).combination().is_none());
    }

    #[test]
    fn draft_json_shape() {
        let json = r#"{
            "pool_id": "office", "game": "mega_millions", "draw_date": "2024-03-01",
            "numbers": [1, 2, 3, 4, 5], "bonus": 6, "multiplier": 3,
            "entered_by": "bob", "entry_method": "scan"
        }"#;
        let d: TicketDraft = serde_json::from_str(json).unwrap();
        assert_eq!(d.game, GameType::MegaMillions);
        assert_eq!(d.entry_method, EntryMethod::Scan);
        assert_eq!(d.multiplier, Some(3));
        assert!(serde_json::from_str::<TicketDraft>(&json.replace("\"bonus\"", "\"extra\": 1, \"bonus\"")).is_err());
    }

    #[test]
    fn stored_ticket_is_rechecked_against_rules() {
        let id = TicketId::from_fingerprint(&"cd".repeat(32)).unwrap();
        let mut t = Ticket::from_draft(&draft(vec![5, 12, 30, 44, 61], 22), id, Utc::now()).unwrap();
        let rules = powerball();
        assert_eq!(t.validate(&rules), Ok(()));

        t.numbers = vec![5, 5, 5, 5, 5];
        assert_eq!(t.validate(&rules), Err(TicketError::Repeated { value: 5 }));
        t.numbers = vec![1, 2, 3, 4, 70];
        assert_eq!(t.validate(&rules), Err(TicketError::OutOfRange { value: 70, max: 69 }));
        t.numbers = vec![1, 2, 3, 4];
        assert_eq!(t.validate(&rules), Err(TicketError::WrongCount { expected: 5, got: 4 }));
        t.numbers = vec![1, 2, 3, 4, 5];
        t.bonus = 0;
        assert_eq!(t.validate(&rules), Err(TicketError::BonusOutOfRange { value: 0, max: 26 }));
    }

    #[test]
    fn ticket_starts_unchecked_and_sorted() {
        let id = TicketId::from_fingerprint(&"ab".repeat(32)).unwrap();
        let t = Ticket::from_draft(&draft(vec![9, 1, 5, 3, 7], 2), id, Utc::now()).unwrap();
        assert_eq!(t.numbers, vec![1, 3, 5, 7, 9]);
        assert!(!t.checked && !t.is_winner);
    }
}
