//! lp_core: core types, game rule tables, and prize tiers.
//!
//! This crate is **I/O-free**. It defines stable types/APIs used across the
//! engine (`lp_algo`, `lp_io`, `lp_pipeline`, `lp_cli`).
//!
//! - Identifiers: `TicketId` (`TKT:`), `PoolId`, `UserId`
//! - Games: `GameType`, `GameRules`, built-in rule book
//! - Prize tiers: `PrizeTier`, `PrizeTable`, integer `Cents`
//! - Tickets, draw results, winning records
//! - Deterministic ordering helpers
//!
//! Money is integer cents end-to-end; nothing here touches floats.

#![forbid(unsafe_code)]

// Define a serde'd enum with explicit wire tokens and `as_str`.
macro_rules! serde_enum {
    ($(#[$m:meta])* $name:ident => { $($variant:ident = $token:expr),+ $(,)? }) => {
        $(#[$m])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $token)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $token,)+
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod ids;
pub mod prize;
pub mod games;
pub mod ticket;
pub mod draw;
pub mod record;
pub mod determinism;

pub mod errors {
    use thiserror::Error;

    use crate::games::GameType;

    /// Rule-book / game-definition problems. These are configuration errors,
    /// never user-input errors.
    #[derive(Clone, Debug, Eq, PartialEq, Error)]
    pub enum RuleError {
        #[error("{game}: {field} must be non-zero")]
        ZeroRange { game: GameType, field: &'static str },

        #[error("{game}: main_number_count {count} exceeds main_number_range {range}")]
        CountExceedsRange { game: GameType, count: u8, range: u8 },

        #[error("{game}: rule ({main_matches}, {bonus_matched}) listed more than once")]
        OverlappingRule { game: GameType, main_matches: u8, bonus_matched: bool },

        #[error("{game}: rule ({main_matches}, _) exceeds main_number_count {count}")]
        MatchesExceedCount { game: GameType, main_matches: u8, count: u8 },

        #[error("{game}: tier {tier} used by more than one rule")]
        DuplicateTier { game: GameType, tier: &'static str },

        #[error("{game}: jackpot rule must be ({count}, true)")]
        MisplacedJackpot { game: GameType, count: u8 },

        #[error("{game}: no jackpot rule")]
        MissingJackpot { game: GameType },

        #[error("{game}: multiplier {value} is not allowed (must be >= 2)")]
        BadMultiplier { game: GameType, value: u8 },

        #[error("no rules defined for game {0}")]
        UnknownGame(GameType),
    }

    /// Draw result is inconsistent with its game's rules.
    #[derive(Clone, Debug, Eq, PartialEq, Error)]
    pub enum DrawError {
        #[error("{game} {date}: expected {expected} winning numbers, got {got}")]
        WrongCount { game: GameType, date: chrono::NaiveDate, expected: u8, got: usize },

        #[error("{game} {date}: winning number {value} outside 1..={max}")]
        OutOfRange { game: GameType, date: chrono::NaiveDate, value: u8, max: u8 },

        #[error("{game} {date}: winning number {value} repeated")]
        Repeated { game: GameType, date: chrono::NaiveDate, value: u8 },

        #[error("{game} {date}: winning bonus {value} outside 1..={max}")]
        BonusOutOfRange { game: GameType, date: chrono::NaiveDate, value: u8, max: u8 },
    }

    /// A stored ticket's numbers do not fit its game's rules.
    #[derive(Clone, Debug, Eq, PartialEq, Error)]
    pub enum TicketError {
        #[error("expected {expected} main numbers, got {got}")]
        WrongCount { expected: u8, got: usize },

        #[error("main number {value} outside 1..={max}")]
        OutOfRange { value: u8, max: u8 },

        #[error("main number {value} repeated")]
        Repeated { value: u8 },

        #[error("bonus {value} outside 1..={max}")]
        BonusOutOfRange { value: u8, max: u8 },
    }
}

pub use errors::{DrawError, RuleError, TicketError};
pub use games::{GameRules, GameType, RuleBook};
pub use ids::{PoolId, TicketId, UserId};
pub use prize::{Cents, PrizeRule, PrizeTable, PrizeTier};
pub use record::WinningRecord;
pub use draw::DrawResult;
pub use ticket::{CombinationKey, EntryMethod, Ticket, TicketDraft};
