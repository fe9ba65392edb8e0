//! crates/lp_core/src/prize.rs
//! Prize tiers, integer money, and the per-game prize decision table.
//!
//! A table is an explicit list of exact `(main_matches, bonus_matched)` rules.
//! Lookup is exact-tuple only: a pair with no rule is "no win".

use core::fmt;

use serde::{Deserialize, Serialize};

serde_enum!(
    /// Named prize categories shared by every supported game.
    PrizeTier => {
        Jackpot     = "jackpot",
        Match5      = "match_5",
        Match4Bonus = "match_4_bonus",
        Match4      = "match_4",
        Match3Bonus = "match_3_bonus",
        Match3      = "match_3",
        Match2Bonus = "match_2_bonus",
        Match1Bonus = "match_1_bonus",
        Match0Bonus = "match_0_bonus",
    }
);

impl core::str::FromStr for PrizeTier {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrizeTier::ALL.iter().copied().find(|t| t.as_str() == s).ok_or(())
    }
}

/// Money in integer cents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cents(pub u64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    /// Whole-dollar constructor (table literals).
    pub const fn dollars(d: u64) -> Cents { Cents(d * 100) }

    pub fn checked_add(self, other: Cents) -> Option<Cents> {
        self.0.checked_add(other.0).map(Cents)
    }

    pub fn saturating_add(self, other: Cents) -> Cents {
        Cents(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Cents {
    /// `$1,234.05` style, integer-only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dollars = self.0 / 100;
        let cents = self.0 % 100;
        let digits = dollars.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        write!(f, "${grouped}.{cents:02}")
    }
}

/// One row of a prize table.
///
/// `base_amount` is ignored for [`PrizeTier::Jackpot`]; the draw's jackpot
/// amount applies instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeRule {
    pub main_matches: u8,
    pub bonus_matched: bool,
    pub tier: PrizeTier,
    #[serde(default)]
    pub base_amount: Cents,
}

impl PrizeRule {
    pub const fn new(main_matches: u8, bonus_matched: bool, tier: PrizeTier, base_amount: Cents) -> Self {
        Self { main_matches, bonus_matched, tier, base_amount }
    }

    #[inline]
    pub fn key(&self) -> (u8, bool) { (self.main_matches, self.bonus_matched) }
}

/// Ordered decision table, most specific rule first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PrizeRule>", into = "Vec<PrizeRule>")]
pub struct PrizeTable {
    rules: Vec<PrizeRule>,
}

impl From<Vec<PrizeRule>> for PrizeTable {
    fn from(rules: Vec<PrizeRule>) -> Self { PrizeTable::new(rules) }
}

impl From<PrizeTable> for Vec<PrizeRule> {
    fn from(t: PrizeTable) -> Self { t.rules }
}

impl PrizeTable {
    /// Build a table; rules are put into descending specificity
    /// (more main matches first, bonus-matched before not).
    pub fn new(mut rules: Vec<PrizeRule>) -> Self {
        rules.sort_by(|a, b| specificity(b).cmp(&specificity(a)));
        Self { rules }
    }

    pub fn rules(&self) -> &[PrizeRule] { &self.rules }

    /// Exact-tuple lookup. `None` means the ticket did not win.
    pub fn lookup(&self, main_matches: u8, bonus_matched: bool) -> Option<&PrizeRule> {
        self.rules
            .iter()
            .find(|r| r.main_matches == main_matches && r.bonus_matched == bonus_matched)
    }

    /// Every `(main_matches, bonus_matched)` pair for a game with `count`
    /// main numbers, paired with its outcome.
    pub fn outcome_grid(&self, count: u8) -> Vec<((u8, bool), Option<PrizeTier>)> {
        let mut out = Vec::with_capacity((count as usize + 1) * 2);
        for m in (0..=count).rev() {
            for b in [true, false] {
                out.push(((m, b), self.lookup(m, b).map(|r| r.tier)));
            }
        }
        out
    }
}

#[inline]
fn specificity(r: &PrizeRule) -> (u8, bool) {
    (r.main_matches, r.bonus_matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PrizeTable {
        PrizeTable::new(vec![
            PrizeRule::new(0, true, PrizeTier::Match0Bonus, Cents::dollars(4)),
            PrizeRule::new(5, true, PrizeTier::Jackpot, Cents::ZERO),
            PrizeRule::new(5, false, PrizeTier::Match5, Cents::dollars(1_000_000)),
        ])
    }

    #[test]
    fn rules_sorted_most_specific_first() {
        let t = table();
        let keys: Vec<(u8, bool)> = t.rules().iter().map(|r| r.key()).collect();
        assert_eq!(keys, vec![(5, true), (5, false), (0, true)]);
    }

    #[test]
    fn lookup_is_exact_only() {
        let t = table();
        assert_eq!(t.lookup(5, true).map(|r| r.tier), Some(PrizeTier::Jackpot));
        assert_eq!(t.lookup(0, true).map(|r| r.tier), Some(PrizeTier::Match0Bonus));
        assert!(t.lookup(4, true).is_none());
        assert!(t.lookup(0, false).is_none());
    }

    #[test]
    fn grid_covers_every_pair() {
        let grid = table().outcome_grid(5);
        assert_eq!(grid.len(), 12);
        assert_eq!(grid[0], ((5, true), Some(PrizeTier::Jackpot)));
        assert_eq!(grid[11], ((0, false), None));
    }

    #[test]
    fn cents_display_groups_thousands() {
        assert_eq!(Cents::dollars(1_000_000).to_string(), "$1,000,000.00");
        assert_eq!(Cents(405).to_string(), "$4.05");
        assert_eq!(Cents(0).to_string(), "$0.00");
    }

    #[test]
    fn tier_tokens_round_trip() {
        for t in PrizeTier::ALL {
            assert_eq!(t.as_str().parse::<PrizeTier>(), Ok(*t));
        }
        assert_eq!(serde_json::to_string(&PrizeTier::Match4Bonus).unwrap(), "\"match_4_bonus\"");
    }
}
