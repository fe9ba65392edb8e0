//! crates/lp_core/src/games.rs
//! Game definitions: number pools, allowed multipliers, draw days, prize tables.
//!
//! Adding a game or a tier is a data change: a new `GameRules` value (built in
//! here or loaded from a rule book file) and nothing else.

use std::collections::BTreeMap;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::errors::RuleError;
use crate::prize::{Cents, PrizeRule, PrizeTable, PrizeTier};

serde_enum!(
    /// Supported games (wire tokens are stable).
    GameType => {
        Powerball    = "powerball",
        MegaMillions = "mega_millions",
    }
);

impl core::str::FromStr for GameType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameType::ALL
            .iter()
            .copied()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| format!("unknown game: {s}"))
    }
}

/// Immutable rule set for one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GameRules {
    pub game: GameType,
    /// Main numbers are drawn from `1..=main_number_range`.
    pub main_number_range: u8,
    pub main_number_count: u8,
    /// Bonus number is drawn from `1..=bonus_number_range`.
    pub bonus_number_range: u8,
    /// Allowed multiplier values (Power Play / Megaplier). Empty = none offered.
    #[serde(default)]
    pub multipliers: Vec<u8>,
    /// Weekdays on which the game draws.
    pub draw_days: Vec<Weekday>,
    pub prize_table: PrizeTable,
}

impl GameRules {
    #[inline]
    pub fn main_range(&self) -> core::ops::RangeInclusive<u8> { 1..=self.main_number_range }

    #[inline]
    pub fn bonus_range(&self) -> core::ops::RangeInclusive<u8> { 1..=self.bonus_number_range }

    pub fn allows_multiplier(&self, m: u8) -> bool { self.multipliers.contains(&m) }

    pub fn draws_on(&self, day: Weekday) -> bool { self.draw_days.contains(&day) }

    /// Check the rule set's internal consistency.
    ///
    /// Every `(main_matches, bonus_matched)` pair maps to at most one rule (pairs
    /// without a rule are "no win"), so the table is total by construction once
    /// overlaps are excluded.
    pub fn validate(&self) -> Result<(), RuleError> {
        let game = self.game;
        if self.main_number_range == 0 {
            return Err(RuleError::ZeroRange { game, field: "main_number_range" });
        }
        if self.main_number_count == 0 {
            return Err(RuleError::ZeroRange { game, field: "main_number_count" });
        }
        if self.bonus_number_range == 0 {
            return Err(RuleError::ZeroRange { game, field: "bonus_number_range" });
        }
        if self.draw_days.is_empty() {
            return Err(RuleError::ZeroRange { game, field: "draw_days" });
        }
        if self.main_number_count > self.main_number_range {
            return Err(RuleError::CountExceedsRange {
                game,
                count: self.main_number_count,
                range: self.main_number_range,
            });
        }
        if let Some(&value) = self.multipliers.iter().find(|&&m| m < 2) {
            return Err(RuleError::BadMultiplier { game, value });
        }

        let mut seen_keys = BTreeMap::<(u8, bool), PrizeTier>::new();
        let mut seen_tiers = BTreeMap::<PrizeTier, (u8, bool)>::new();
        for rule in self.prize_table.rules() {
            if rule.main_matches > self.main_number_count {
                return Err(RuleError::MatchesExceedCount {
                    game,
                    main_matches: rule.main_matches,
                    count: self.main_number_count,
                });
            }
            if seen_keys.insert(rule.key(), rule.tier).is_some() {
                return Err(RuleError::OverlappingRule {
                    game,
                    main_matches: rule.main_matches,
                    bonus_matched: rule.bonus_matched,
                });
            }
            if seen_tiers.insert(rule.tier, rule.key()).is_some() {
                return Err(RuleError::DuplicateTier { game, tier: rule.tier.as_str() });
            }
        }
        match seen_tiers.get(&PrizeTier::Jackpot) {
            None => Err(RuleError::MissingJackpot { game }),
            Some(&key) if key != (self.main_number_count, true) => {
                Err(RuleError::MisplacedJackpot { game, count: self.main_number_count })
            }
            Some(_) => Ok(()),
        }
    }
}

/* ------------------------------- Built-in games ------------------------------- */

pub fn powerball() -> GameRules {
    use PrizeTier::*;
    GameRules {
        game: GameType::Powerball,
        main_number_range: 69,
        main_number_count: 5,
        bonus_number_range: 26,
        multipliers: vec![2, 3, 4, 5, 10],
        draw_days: vec![Weekday::Mon, Weekday::Wed, Weekday::Sat],
        prize_table: PrizeTable::new(vec![
            PrizeRule::new(5, true, Jackpot, Cents::ZERO),
            PrizeRule::new(5, false, Match5, Cents::dollars(1_000_000)),
            PrizeRule::new(4, true, Match4Bonus, Cents::dollars(50_000)),
            PrizeRule::new(4, false, Match4, Cents::dollars(100)),
            PrizeRule::new(3, true, Match3Bonus, Cents::dollars(100)),
            PrizeRule::new(3, false, Match3, Cents::dollars(7)),
            PrizeRule::new(2, true, Match2Bonus, Cents::dollars(7)),
            PrizeRule::new(1, true, Match1Bonus, Cents::dollars(4)),
            PrizeRule::new(0, true, Match0Bonus, Cents::dollars(4)),
        ]),
    }
}

pub fn mega_millions() -> GameRules {
    use PrizeTier::*;
    GameRules {
        game: GameType::MegaMillions,
        main_number_range: 70,
        main_number_count: 5,
        bonus_number_range: 25,
        multipliers: vec![2, 3, 4, 5],
        draw_days: vec![Weekday::Tue, Weekday::Fri],
        prize_table: PrizeTable::new(vec![
            PrizeRule::new(5, true, Jackpot, Cents::ZERO),
            PrizeRule::new(5, false, Match5, Cents::dollars(1_000_000)),
            PrizeRule::new(4, true, Match4Bonus, Cents::dollars(10_000)),
            PrizeRule::new(4, false, Match4, Cents::dollars(500)),
            PrizeRule::new(3, true, Match3Bonus, Cents::dollars(200)),
            PrizeRule::new(3, false, Match3, Cents::dollars(10)),
            PrizeRule::new(2, true, Match2Bonus, Cents::dollars(10)),
            PrizeRule::new(1, true, Match1Bonus, Cents::dollars(4)),
            PrizeRule::new(0, true, Match0Bonus, Cents::dollars(2)),
        ]),
    }
}

/* ---------------------------------- RuleBook ---------------------------------- */

/// All rule sets the engine knows about, keyed by game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleBook {
    games: BTreeMap<GameType, GameRules>,
}

impl Default for RuleBook {
    fn default() -> Self { Self::builtin() }
}

impl RuleBook {
    pub fn builtin() -> Self {
        let games = [powerball(), mega_millions()]
            .into_iter()
            .map(|r| (r.game, r))
            .collect();
        Self { games }
    }

    /// Replace (or add) rule sets. Each one is validated first; on error the
    /// book is left unchanged.
    pub fn with_overrides<I>(mut self, overrides: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = GameRules>,
    {
        let staged: Vec<GameRules> = overrides.into_iter().collect();
        for r in &staged {
            r.validate()?;
        }
        for r in staged {
            self.games.insert(r.game, r);
        }
        Ok(self)
    }

    pub fn get(&self, game: GameType) -> Result<&GameRules, RuleError> {
        self.games.get(&game).ok_or(RuleError::UnknownGame(game))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameRules> {
        self.games.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_valid() {
        for r in RuleBook::builtin().iter() {
            r.validate().unwrap();
        }
    }

    #[test]
    fn every_pair_has_exactly_one_outcome() {
        for r in RuleBook::builtin().iter() {
            let grid = r.prize_table.outcome_grid(r.main_number_count);
            assert_eq!(grid.len(), (r.main_number_count as usize + 1) * 2);
            for ((m, b), tier) in grid {
                let hits = r
                    .prize_table
                    .rules()
                    .iter()
                    .filter(|x| x.key() == (m, b))
                    .count();
                assert!(hits <= 1, "{}: ({m}, {b}) overlaps", r.game);
                assert_eq!(hits == 1, tier.is_some());
            }
        }
    }

    #[test]
    fn overlap_is_rejected() {
        let mut r = powerball();
        let mut rules = r.prize_table.rules().to_vec();
        rules.push(PrizeRule::new(3, false, PrizeTier::Match2Bonus, Cents::dollars(1)));
        r.prize_table = PrizeTable::new(rules);
        assert!(matches!(r.validate(), Err(RuleError::OverlappingRule { main_matches: 3, .. })));
    }

    #[test]
    fn jackpot_must_be_full_match_with_bonus() {
        let mut r = mega_millions();
        let rules = r
            .prize_table
            .rules()
            .iter()
            .map(|x| if x.tier == PrizeTier::Jackpot { PrizeRule { bonus_matched: false, ..*x } } else { *x })
            .filter(|x| x.tier != PrizeTier::Match5)
            .collect();
        r.prize_table = PrizeTable::new(rules);
        assert!(matches!(r.validate(), Err(RuleError::MisplacedJackpot { .. })));
    }

    #[test]
    fn override_is_all_or_nothing() {
        let mut bad = powerball();
        bad.main_number_count = 80;
        let book = RuleBook::builtin();
        assert!(book.clone().with_overrides([mega_millions(), bad]).is_err());

        let mut smaller = powerball();
        smaller.multipliers.clear();
        let book = book.with_overrides([smaller]).unwrap();
        assert!(book.get(GameType::Powerball).unwrap().multipliers.is_empty());
    }

    #[test]
    fn rules_deserialize_from_json() {
        let json = serde_json::to_value(powerball()).unwrap();
        assert_eq!(json["draw_days"][0], "Mon");
        let back: GameRules = serde_json::from_value(json).unwrap();
        assert_eq!(back, powerball());
    }
}
