//! Draw-schedule oracle: which dates a game draws on, and whether entry for a
//! draw is still open.
//!
//! The engine only consumes the [`DrawSchedule`] trait; [`WeeklySchedule`] is
//! the default implementation driven by each game's weekdays.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use thiserror::Error;

use lp_core::{GameType, RuleBook};

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("no draw schedule for game {0}")]
    UnknownGame(GameType),
    #[error("no upcoming draw for {0} within {1} days")]
    NoUpcomingDraw(GameType, i64),
    #[error("date arithmetic out of range for {0}")]
    OutOfRange(NaiveDate),
    #[error("schedule unavailable: {0}")]
    Unavailable(String),
}

/// Entry eligibility for one `(game, date)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eligibility {
    Open,
    NotDrawDay,
    /// Entry closed at `cutoff`.
    Closed { cutoff: DateTime<Utc> },
}

pub trait DrawSchedule: Send + Sync {
    /// Weekdays the game draws on.
    fn draw_schedule(&self, game: GameType) -> Result<Vec<Weekday>, ScheduleError>;

    /// Instant after which no more entries are accepted for the draw on `date`.
    fn entry_cutoff(&self, game: GameType, date: NaiveDate) -> Result<DateTime<Utc>, ScheduleError>;

    fn is_draw_day(&self, game: GameType, date: NaiveDate) -> Result<bool, ScheduleError> {
        Ok(self.draw_schedule(game)?.contains(&date.weekday()))
    }

    fn is_draw_closed(&self, game: GameType, date: NaiveDate, now: DateTime<Utc>) -> Result<bool, ScheduleError> {
        Ok(now >= self.entry_cutoff(game, date)?)
    }

    /// Earliest draw date whose entry cutoff is still in the future.
    fn next_draw_date(&self, game: GameType, now: DateTime<Utc>) -> Result<NaiveDate, ScheduleError> {
        const HORIZON_DAYS: i64 = 14;
        let today = now.date_naive();
        for offset in 0..=HORIZON_DAYS {
            let day = today
                .checked_add_signed(Duration::days(offset))
                .ok_or(ScheduleError::OutOfRange(today))?;
            if self.is_draw_day(game, day)? && !self.is_draw_closed(game, day, now)? {
                return Ok(day);
            }
        }
        Err(ScheduleError::NoUpcomingDraw(game, HORIZON_DAYS))
    }

    /// Both checks at once. A non-draw day reports `NotDrawDay` first.
    fn eligibility(&self, game: GameType, date: NaiveDate, now: DateTime<Utc>) -> Result<Eligibility, ScheduleError> {
        if !self.is_draw_day(game, date)? {
            return Ok(Eligibility::NotDrawDay);
        }
        let cutoff = self.entry_cutoff(game, date)?;
        Ok(if now >= cutoff { Eligibility::Closed { cutoff } } else { Eligibility::Open })
    }
}

/// Fixed weekdays per game, one draw time (UTC) for all games, and an entry
/// cutoff a fixed number of minutes before the draw.
#[derive(Clone, Debug)]
pub struct WeeklySchedule {
    days: BTreeMap<GameType, Vec<Weekday>>,
    draw_time_utc: NaiveTime,
    cutoff: Duration,
}

impl WeeklySchedule {
    pub fn new(days: BTreeMap<GameType, Vec<Weekday>>, draw_time_utc: NaiveTime, cutoff_minutes: u32) -> Self {
        Self { days, draw_time_utc, cutoff: Duration::minutes(i64::from(cutoff_minutes)) }
    }

    /// Weekdays taken from each game's rules.
    pub fn from_rules(rules: &RuleBook, draw_time_utc: NaiveTime, cutoff_minutes: u32) -> Self {
        let days = rules.iter().map(|r| (r.game, r.draw_days.clone())).collect();
        Self::new(days, draw_time_utc, cutoff_minutes)
    }
}

impl DrawSchedule for WeeklySchedule {
    fn draw_schedule(&self, game: GameType) -> Result<Vec<Weekday>, ScheduleError> {
        self.days.get(&game).cloned().ok_or(ScheduleError::UnknownGame(game))
    }

    fn entry_cutoff(&self, game: GameType, date: NaiveDate) -> Result<DateTime<Utc>, ScheduleError> {
        if !self.days.contains_key(&game) {
            return Err(ScheduleError::UnknownGame(game));
        }
        let draw_at = date.and_time(self.draw_time_utc).and_utc();
        draw_at
            .checked_sub_signed(self.cutoff)
            .ok_or(ScheduleError::OutOfRange(date))
    }
}
