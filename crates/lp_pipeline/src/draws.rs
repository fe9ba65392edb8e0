//! Draw-result source consumed by both reconciliation paths.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;

use lp_core::{DrawResult, GameType};

#[derive(Debug, Error)]
pub enum DrawSourceError {
    #[error("conflicting results for {0} on {1}")]
    Conflict(GameType, NaiveDate),
    #[error("draw source unavailable: {0}")]
    Unavailable(String),
}

pub trait DrawSource: Send + Sync {
    /// Most recent concluded draw for `game`, if any.
    fn latest_draw(&self, game: GameType) -> Result<Option<DrawResult>, DrawSourceError>;

    fn draw_on(&self, game: GameType, date: NaiveDate) -> Result<Option<DrawResult>, DrawSourceError>;
}

/// Fixed set of results (a draw file, or test data).
#[derive(Clone, Debug, Default)]
pub struct StaticDrawSource {
    draws: BTreeMap<(GameType, NaiveDate), DrawResult>,
}

impl StaticDrawSource {
    /// At most one result per `(game, draw_date)`; identical repeats are tolerated.
    pub fn new<I: IntoIterator<Item = DrawResult>>(draws: I) -> Result<Self, DrawSourceError> {
        let mut map = BTreeMap::new();
        for d in draws {
            match map.get(&d.key()) {
                Some(existing) if existing != &d => return Err(DrawSourceError::Conflict(d.game, d.draw_date)),
                Some(_) => {}
                None => {
                    map.insert(d.key(), d);
                }
            }
        }
        Ok(Self { draws: map })
    }
}

impl DrawSource for StaticDrawSource {
    fn latest_draw(&self, game: GameType) -> Result<Option<DrawResult>, DrawSourceError> {
        Ok(self
            .draws
            .range((game, NaiveDate::MIN)..=(game, NaiveDate::MAX))
            .next_back()
            .map(|(_, d)| d.clone()))
    }

    fn draw_on(&self, game: GameType, date: NaiveDate) -> Result<Option<DrawResult>, DrawSourceError> {
        Ok(self.draws.get(&(game, date)).cloned())
    }
}
