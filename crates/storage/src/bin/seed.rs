use std::fmt;

use chrono::{DateTime, Duration, Utc};
use geoquest_core::model::{Level, SessionSummary};
use storage::Storage;
use storage::seed::seed_questions;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    summaries: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidSummaries { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSummaries { raw } => write!(f, "invalid --summaries value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("GEOQUEST_DB_URL")
            .unwrap_or_else(|_| "sqlite:geoquest.sqlite3?mode=rwc".into());
        let mut summaries = std::env::var("GEOQUEST_SEED_SUMMARIES")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(0);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--summaries" => {
                    let value = require_value(&mut args, "--summaries")?;
                    summaries = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidSummaries { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            summaries,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:geoquest.sqlite3?mode=rwc)");
    eprintln!("  --summaries <n>           Demo results to append per level (default: 0)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  GEOQUEST_DB_URL, GEOQUEST_SEED_SUMMARIES");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let questions = seed_questions(storage.question_writer.as_ref()).await?;

    for level in Level::catalog() {
        for i in 0..args.summaries {
            let started_at = now - Duration::days(i64::from(i) * 2) - Duration::minutes(10);
            let completed_at = started_at + Duration::minutes(2);
            let summary = SessionSummary::from_persisted(
                level.id,
                level.difficulty,
                started_at,
                completed_at,
                3,
                150 + (i % 5) * 20,
            )?;
            storage.session_summaries.append_summary(&summary).await?;
        }
    }

    println!(
        "Seeded {questions} questions and {} results per level into {}",
        args.summaries, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
