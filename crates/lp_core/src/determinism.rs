//! Determinism utilities: stable orderings for tickets and winning records.
//!
//! Storage may hand tickets back in any order (and reconciliation runs them in
//! parallel), so anything that is reported or persisted is first put into one
//! of these canonical orders.

use core::cmp::Ordering;

use crate::record::WinningRecord;
use crate::ticket::Ticket;

/// A **total**, stable order for values that must sort canonically.
pub trait StableOrd {
    fn stable_cmp(&self, other: &Self) -> Ordering;
}

impl StableOrd for Ticket {
    /// `(pool_id, draw_date, id)`; ids are unique per store.
    #[inline]
    fn stable_cmp(&self, other: &Self) -> Ordering {
        self.pool_id
            .cmp(&other.pool_id)
            .then(self.draw_date.cmp(&other.draw_date))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl StableOrd for WinningRecord {
    /// `(draw_date, pool_id, ticket_id)`.
    #[inline]
    fn stable_cmp(&self, other: &Self) -> Ordering {
        self.draw_date
            .cmp(&other.draw_date)
            .then_with(|| self.pool_id.cmp(&other.pool_id))
            .then_with(|| self.ticket_id.cmp(&other.ticket_id))
    }
}

/// Sort **in place** into canonical order.
#[inline]
pub fn sort_canonical<T: StableOrd>(xs: &mut [T]) {
    xs.sort_by(|a, b| a.stable_cmp(b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    use crate::games::GameType;
    use crate::ids::TicketId;
    use crate::ticket::EntryMethod;

    fn ticket(pool: &str, day: u32, hex: &str) -> Ticket {
        Ticket {
            id: TicketId::from_fingerprint(&hex.repeat(64)).unwrap(),
            pool_id: pool.parse().unwrap(),
            game: GameType::Powerball,
            draw_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            numbers: vec![1, 2, 3, 4, 5],
            bonus: 1,
            multiplier: None,
            checked: false,
            is_winner: false,
            entered_by: "u".parse().unwrap(),
            entry_method: EntryMethod::Scan,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn tickets_sort_by_pool_then_date_then_id() {
        let mut xs = vec![ticket("b", 1, "a"), ticket("a", 3, "c"), ticket("a", 1, "f"), ticket("a", 1, "0")];
        sort_canonical(&mut xs);
        let got: Vec<(String, u32, char)> = xs
            .iter()
            .map(|t| {
                use chrono::Datelike;
                (t.pool_id.to_string(), t.draw_date.day(), t.id.as_hex().chars().next().unwrap())
            })
            .collect();
        assert_eq!(
            got,
            vec![("a".into(), 1, '0'), ("a".into(), 1, 'f'), ("a".into(), 3, 'c'), ("b".into(), 1, 'a')]
        );
    }
}
