//! Argument surface for `lp`.
//!
//! Offline only: every path flag is rejected if it carries a URL scheme, and
//! input files must exist before the engine is loaded.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};

use lp_core::{GameType, PoolId};
use lp_io::looks_like_url_strict;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "lp",
    disable_help_subcommand = true,
    about = "Lottery-pool ticket engine: validate, enter and reconcile tickets"
)]
pub struct Args {
    /// Engine config JSON (pools, schedule, rule book, state file).
    #[arg(long, global = true, default_value = "lp.json")]
    pub config: PathBuf,

    /// Evaluate time-dependent rules at this instant (RFC 3339) instead of the wall clock.
    #[arg(long, global = true, value_parser = parse_now)]
    pub now: Option<DateTime<Utc>>,

    /// Only warnings and errors on stderr.
    #[arg(long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the validator on a ticket draft; nothing is stored.
    Validate {
        #[arg(long)]
        ticket: PathBuf,
    },
    /// Validate, check for duplicates and store a ticket draft.
    Enter {
        #[arg(long)]
        ticket: PathBuf,
    },
    /// Score every unchecked ticket for a draw and record the outcomes.
    Reconcile {
        #[arg(long)]
        game: GameType,
        /// Draw results JSON (`{"draws": [...]}`).
        #[arg(long)]
        draws: PathBuf,
        /// Reconcile this draw date instead of the latest one in the file.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show a pool's tickets against the latest draw; unchecked ones are marked in the background.
    Results {
        #[arg(long)]
        pool: PoolId,
        #[arg(long)]
        draws: PathBuf,
        /// How long to wait for the background marker before exiting.
        #[arg(long, default_value_t = 5)]
        wait_secs: u64,
    },
}

#[derive(Debug)]
pub enum CliError {
    NonLocalPath(String),
    NotFound(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::NonLocalPath(p) => write!(f, "path must be a local file (no scheme): {p}"),
            CliError::NotFound(p) => write!(f, "file not found: {p}"),
        }
    }
}

impl std::error::Error for CliError {}

pub fn parse_now(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

fn ensure_local(p: &Path) -> Result<(), CliError> {
    match p.to_str() {
        Some(s) if looks_like_url_strict(s) => Err(CliError::NonLocalPath(s.to_string())),
        _ => Ok(()),
    }
}

fn ensure_local_file(p: &Path) -> Result<(), CliError> {
    ensure_local(p)?;
    if !p.is_file() {
        return Err(CliError::NotFound(p.display().to_string()));
    }
    Ok(())
}

impl Args {
    fn input_files(&self) -> Vec<&Path> {
        match &self.command {
            Command::Validate { ticket } | Command::Enter { ticket } => vec![ticket],
            Command::Reconcile { draws, .. } | Command::Results { draws, .. } => vec![draws],
        }
    }

    /// Mutating commands write the state file back on success.
    pub fn persists(&self) -> bool {
        !matches!(self.command, Command::Validate { .. })
    }

    /// Path checks clap cannot express.
    pub fn check(&self) -> Result<(), CliError> {
        ensure_local(&self.config)?;
        for p in self.input_files() {
            ensure_local_file(p)?;
        }
        Ok(())
    }
}

pub fn parse_and_validate() -> Result<Args, CliError> {
    let args = Args::parse();
    args.check()?;
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_accepts_offsets() {
        let t = parse_now("2024-01-06T18:30:00-05:00").unwrap();
        assert_eq!(t.to_rfc3339(), "2024-01-06T23:30:00+00:00");
        assert!(parse_now("yesterday").is_err());
    }

    #[test]
    fn subcommands_parse() {
        let a = Args::try_parse_from([
            "lp", "reconcile", "--game", "mega_millions", "--draws", "d.json", "--config", "c.json",
        ])
        .unwrap();
        assert_eq!(a.config, PathBuf::from("c.json"));
        assert!(matches!(a.command, Command::Reconcile { game: GameType::MegaMillions, date: None, .. }));
        assert!(a.persists());

        let a = Args::try_parse_from(["lp", "--quiet", "validate", "--ticket", "t.json"]).unwrap();
        assert!(a.quiet);
        assert!(!a.persists());

        assert!(Args::try_parse_from(["lp", "reconcile", "--game", "keno", "--draws", "d.json"]).is_err());
        assert!(Args::try_parse_from(["lp", "results", "--pool", "has space", "--draws", "d.json"]).is_err());
    }

    #[test]
    fn url_paths_are_rejected() {
        let a = Args::try_parse_from(["lp", "enter", "--ticket", "https://example.com/t.json"]).unwrap();
        assert!(matches!(a.check(), Err(CliError::NonLocalPath(_))));

        let a = Args::try_parse_from(["lp", "enter", "--ticket", "/definitely/not/here.json"]).unwrap();
        assert!(matches!(a.check(), Err(CliError::NotFound(_))));
    }
}
