//! crates/lp_core/src/draw.rs
//! Official draw results (produced externally, consumed by reconciliation).

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::DrawError;
use crate::games::{GameRules, GameType};
use crate::prize::Cents;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DrawResult {
    pub game: GameType,
    pub draw_date: NaiveDate,
    pub winning_numbers: Vec<u8>,
    pub winning_bonus: u8,
    pub jackpot_amount: Cents,
}

impl DrawResult {
    /// At most one result exists per key.
    pub fn key(&self) -> (GameType, NaiveDate) { (self.game, self.draw_date) }

    /// Check the result against its game's rules before it is used to score
    /// anything. The game itself is assumed to match `rules.game`.
    pub fn validate(&self, rules: &GameRules) -> Result<(), DrawError> {
        let (game, date) = (self.game, self.draw_date);
        if self.winning_numbers.len() != rules.main_number_count as usize {
            return Err(DrawError::WrongCount {
                game,
                date,
                expected: rules.main_number_count,
                got: self.winning_numbers.len(),
            });
        }
        let mut seen = BTreeSet::new();
        for &value in &self.winning_numbers {
            if !rules.main_range().contains(&value) {
                return Err(DrawError::OutOfRange { game, date, value, max: rules.main_number_range });
            }
            if !seen.insert(value) {
                return Err(DrawError::Repeated { game, date, value });
            }
        }
        if !rules.bonus_range().contains(&self.winning_bonus) {
            return Err(DrawError::BonusOutOfRange {
                game,
                date,
                value: self.winning_bonus,
                max: rules.bonus_number_range,
            });
        }
        Ok(())
    }
}
