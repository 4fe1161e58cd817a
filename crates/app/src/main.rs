use std::fmt;
use std::sync::Arc;

use geoquest_core::model::{Level, LevelId};
use services::{
    Clock, FirestoreConfig, FirestoreQuestionRepository, GameConfig, GameLoopService,
    HistoryService,
};
use storage::repository::{QuestionRepository, Storage};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt as log_fmt};

mod play;

const HISTORY_LIMIT: u32 = 10;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidLevel { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidLevel { raw } => write!(f, "invalid --level value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  geoquest levels  [--db <sqlite_url>]");
    eprintln!("  geoquest play    [--db <sqlite_url>] [--level <id>] [--muted | --unmuted]");
    eprintln!("  geoquest history [--db <sqlite_url>] [--level <id>]");
    eprintln!("  geoquest seed    [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:geoquest.sqlite3");
    eprintln!("  --level 1");
    eprintln!("  --unmuted");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  GEOQUEST_DB_URL, GEOQUEST_LEVEL, GEOQUEST_MUTED");
    eprintln!("  GEOQUEST_FETCH_TIMEOUT_MS, GEOQUEST_REVEAL_DELAY_MS");
    eprintln!("  GEOQUEST_FIRESTORE_PROJECT, GEOQUEST_FIRESTORE_BASE_URL,");
    eprintln!("  GEOQUEST_FIRESTORE_API_KEY, GEOQUEST_FIRESTORE_COLLECTION");
    eprintln!("  RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Levels,
    Play,
    History,
    Seed,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "levels" => Some(Self::Levels),
            "play" => Some(Self::Play),
            "history" => Some(Self::History),
            "seed" => Some(Self::Seed),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    level: LevelId,
    muted: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("GEOQUEST_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://geoquest.sqlite3".into(), normalize_sqlite_url);
        let mut level = std::env::var("GEOQUEST_LEVEL")
            .ok()
            .and_then(|value| value.parse::<LevelId>().ok())
            .unwrap_or_else(|| LevelId::new(1));
        let mut muted = muted_from_env(std::env::var("GEOQUEST_MUTED").ok().as_deref());

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--level" => {
                    let value = require_value(args, "--level")?;
                    level = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLevel { raw: value.clone() })?;
                }
                "--muted" => muted = true,
                "--unmuted" => muted = false,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            level,
            muted,
        })
    }
}

/// The level list starts with music on; `GEOQUEST_MUTED` can flip that.
fn muted_from_env(raw: Option<&str>) -> bool {
    raw.and_then(parse_flag).unwrap_or(false)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(log_fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Questions come from the hosted store when one is configured, else from SQLite.
fn question_source(storage: &Storage) -> Arc<dyn QuestionRepository> {
    match FirestoreConfig::from_env() {
        Some(config) => {
            tracing::info!(project = %config.project_id, "using remote question store");
            Arc::new(FirestoreQuestionRepository::new(config))
        }
        None => Arc::clone(&storage.questions),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand lists the levels, like the start screen.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Levels,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Levels,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;
    let history = HistoryService::new(Arc::clone(&storage.session_summaries));

    match cmd {
        Command::Levels => {
            for level in Level::catalog() {
                let best = history
                    .best_score(level.id)
                    .await?
                    .map_or_else(|| "-".to_string(), |s| format!("{s} pts"));
                println!("Level {}  {}  best: {best}", level.id, level.difficulty.stars());
            }
            Ok(())
        }
        Command::Play => {
            let Some(level) = Level::find(parsed.level) else {
                return Err(ArgsError::InvalidLevel {
                    raw: parsed.level.to_string(),
                }
                .into());
            };
            let service = GameLoopService::new(
                Clock::default_clock(),
                question_source(&storage),
                Arc::clone(&storage.session_summaries),
            )
            .with_config(GameConfig::from_env());

            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            play::play(&service, level.launch(parsed.muted), stdin).await?;
            Ok(())
        }
        Command::History => {
            let items = history.recent(parsed.level, HISTORY_LIMIT).await?;
            if items.is_empty() {
                println!("Level {} has not been played yet.", parsed.level);
            }
            for item in items {
                println!(
                    "{}  {} questions  {} pts",
                    item.completed_at.format("%Y-%m-%d %H:%M"),
                    item.questions,
                    item.total_score
                );
            }
            Ok(())
        }
        Command::Seed => {
            let written = storage::seed::seed_questions(storage.question_writer.as_ref()).await?;
            println!("seeded {written} questions into {}", parsed.db_url);
            Ok(())
        }
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
