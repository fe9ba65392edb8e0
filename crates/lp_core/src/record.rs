//! crates/lp_core/src/record.rs
//! Winning records: the persisted output of a positive classification.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{PoolId, TicketId};
use crate::prize::{Cents, PrizeTier};

/// Exists iff the ticket classified to a tier against the draw for
/// `draw_date`. Keyed by `(ticket_id, draw_date)`; at most one per key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WinningRecord {
    pub ticket_id: TicketId,
    pub pool_id: PoolId,
    pub draw_date: NaiveDate,
    pub prize_tier: PrizeTier,
    pub numbers_matched: u8,
    pub bonus_matched: bool,
    pub prize_amount: Cents,
}

impl WinningRecord {
    #[inline]
    pub fn key(&self) -> (TicketId, NaiveDate) {
        (self.ticket_id.clone(), self.draw_date)
    }
}
