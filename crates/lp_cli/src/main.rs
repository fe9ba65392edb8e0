//! `lp`: offline front end for the ticket engine.
//!
//! stdout carries one JSON document per run; logs go to stderr.

mod args;

mod exitcodes {
    pub const OK: i32 = 0;
    /// Ticket rejected by validation or the duplicate guard; also bad flags
    /// (including a pool that is not configured).
    pub const REJECTED: i32 = 2;
    /// Config, rule book or draw data inconsistent with the rules.
    pub const CONFIG: i32 = 3;
    /// File, state or collaborator failure; retrying may help.
    pub const IO: i32 = 4;
}

use std::process::ExitCode;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use args::{parse_and_validate as parse_cli, Args, Command};
use lp_io::{loader, IoError};
use lp_pipeline::{
    enter_ticket, load_engine, pool_results, reconcile_draw, reconcile_latest, validate_draft, DrawSource,
    EntryOutcome, LoadedEngine, PipelineError, StaticDrawSource,
};

#[derive(Debug)]
enum MainError {
    Input(String),
    Config(String),
    Io(String),
}

impl MainError {
    fn code(&self) -> i32 {
        match self {
            MainError::Input(_) => exitcodes::REJECTED,
            MainError::Config(_) => exitcodes::CONFIG,
            MainError::Io(_) => exitcodes::IO,
        }
    }
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Input(m) => write!(f, "{m}"),
            MainError::Config(m) => write!(f, "config: {m}"),
            MainError::Io(m) => write!(f, "{m}"),
        }
    }
}

impl From<PipelineError> for MainError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::UnknownPool(_) => MainError::Input(e.to_string()),
            PipelineError::Rules(_) | PipelineError::Draw(_) => MainError::Config(e.to_string()),
            PipelineError::Io(io) => io.into(),
            PipelineError::Infrastructure(m) => MainError::Io(m),
        }
    }
}

impl From<IoError> for MainError {
    fn from(e: IoError) -> Self {
        match e {
            IoError::Config(_) | IoError::Rules(_) | IoError::Invalid(_) => MainError::Config(e.to_string()),
            IoError::Path(_) | IoError::Json { .. } | IoError::Limit(_) => MainError::Io(e.to_string()),
        }
    }
}

fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_env("LP_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("lp: error: {e}");
            return ExitCode::from(exitcodes::REJECTED as u8);
        }
    };
    init_logging(args.quiet);

    let rc = match run(&args) {
        Ok(rc) => rc,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("lp: error: {e}");
            e.code()
        }
    };
    ExitCode::from(rc as u8)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), MainError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| MainError::Io(format!("stdout: {e}")))?;
    println!("{text}");
    Ok(())
}

fn draw_source(path: &std::path::Path) -> Result<StaticDrawSource, MainError> {
    let draws = loader::load_draws(path)?;
    StaticDrawSource::new(draws).map_err(|e| MainError::Config(e.to_string()))
}

fn run(args: &Args) -> Result<i32, MainError> {
    let engine = load_engine(&args.config)?;
    let now = args.now.unwrap_or_else(Utc::now);

    let rc = match &args.command {
        Command::Validate { ticket } => {
            let draft = loader::load_ticket_draft(ticket)?;
            let report = validate_draft(&engine.ctx, &draft, now)?;
            print_json(&report)?;
            if report.pass { exitcodes::OK } else { exitcodes::REJECTED }
        }
        Command::Enter { ticket } => {
            let draft = loader::load_ticket_draft(ticket)?;
            match enter_ticket(&engine.ctx, &draft, now)? {
                EntryOutcome::Accepted(t) => {
                    print_json(&json!({ "status": "accepted", "ticket": t }))?;
                    persist(args, &engine)?;
                    exitcodes::OK
                }
                EntryOutcome::Rejected(report) => {
                    print_json(&json!({ "status": "rejected", "report": report }))?;
                    exitcodes::REJECTED
                }
            }
        }
        Command::Reconcile { game, draws, date } => {
            let source = draw_source(draws)?;
            let report = match date {
                Some(d) => match source.draw_on(*game, *d).map_err(PipelineError::from)? {
                    Some(draw) => Some(reconcile_draw(&engine.ctx, &draw)?),
                    None => None,
                },
                None => reconcile_latest(&engine.ctx, *game, &source)?,
            };
            match report {
                Some(r) => {
                    print_json(&r)?;
                    persist(args, &engine)?;
                }
                None => print_json(&json!({ "status": "no_draw", "game": game }))?,
            }
            exitcodes::OK
        }
        Command::Results { pool, draws, wait_secs } => {
            let source = draw_source(draws)?;
            let (view, marker) = pool_results(&engine.ctx, pool, &source)?;
            print_json(&view)?;
            match marker.wait(Duration::from_secs(*wait_secs)) {
                Some(s) => info!(applied = s.applied, already_checked = s.already_checked, failed = s.failed, "background marks done"),
                None if view.pending_marks > 0 => warn!(pending = view.pending_marks, "background marks not confirmed"),
                None => {}
            }
            persist(args, &engine)?;
            exitcodes::OK
        }
    };
    Ok(rc)
}

fn persist(args: &Args, engine: &LoadedEngine) -> Result<(), MainError> {
    if !args.persists() {
        return Ok(());
    }
    engine.persist()?;
    info!(state = %engine.state_path.display(), "state saved");
    Ok(())
}
