use anyhow::{Context, Result};
use chrono::{Duration, Local};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use rollcall_core::capture::FullFrameDetector;
use rollcall_core::classifier::Recognizer;
use rollcall_core::identity::Identity;
use rollcall_core::store::FeatureStore;
use rollcall_session::daily_log::DailyLog;
use rollcall_session::enroll::{run_enrollment, EnrollOutcome, EnrollmentConfig};
use rollcall_session::notify::ConsoleNotifier;
use rollcall_session::runner::run_recognition;
use rollcall_session::session::{AttendanceSession, SessionConfig};

mod config;
mod source;

use config::Config;
use source::ImageDirSource;

#[derive(Parser)]
#[command(name = "rollcall", about = "Camera-driven attendance logging")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll an identity from a directory of face frames
    Enroll {
        #[arg(long)]
        roll_number: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        department: String,
        #[arg(long)]
        semester: String,
        /// Directory of frames standing in for the live camera
        #[arg(long)]
        frames_dir: PathBuf,
    },
    /// Run a recognition session over a directory of frames
    Run {
        /// Directory of frames standing in for the live camera
        #[arg(long)]
        frames_dir: PathBuf,
    },
    /// List enrolled identities and their sample counts
    List,
    /// Print today's attendance log
    Today {
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Enroll {
            roll_number,
            name,
            department,
            semester,
            frames_dir,
        } => enroll(&config, &roll_number, &name, &department, &semester, &frames_dir),
        Commands::Run { frames_dir } => run(&config, &frames_dir),
        Commands::List => list(&config),
        Commands::Today { json } => today(&config, json),
    }
}

fn enroll(
    config: &Config,
    roll_number: &str,
    name: &str,
    department: &str,
    semester: &str,
    frames_dir: &std::path::Path,
) -> Result<()> {
    let identity = Identity::new(roll_number, name, department, semester)?;
    let mut store = FeatureStore::open(&config.store_path())
        .with_context(|| format!("opening feature store at {}", config.store_path().display()))?;
    let mut source = ImageDirSource::open(frames_dir)?;

    let enroll_config = EnrollmentConfig {
        sample_quota: config.sample_quota,
        decimation: config.decimation,
    };
    let outcome = run_enrollment(
        &mut source,
        &mut FullFrameDetector,
        &mut store,
        &identity,
        &enroll_config,
        || false, // stream end stands in for the operator's quit key
        |p| {
            if p.samples_collected % 10 == 0 {
                tracing::info!(
                    collected = p.samples_collected,
                    quota = p.sample_quota,
                    "collecting samples"
                );
            }
        },
    )?;

    match outcome {
        EnrollOutcome::Committed { samples } => {
            println!("Registration for {name} ({roll_number}) complete. Data points: {samples}");
        }
        EnrollOutcome::Abandoned { collected } => {
            println!(
                "Registration abandoned at {collected}/{} samples; nothing was written.",
                config.sample_quota
            );
        }
    }
    Ok(())
}

fn run(config: &Config, frames_dir: &std::path::Path) -> Result<()> {
    // Missing store is fatal before the loop starts.
    let store = FeatureStore::load(&config.store_path())
        .context("recognition requires an enrolled feature store")?;
    let recognizer = Recognizer::from_store(&store, config.reject_distance)?;

    let session_config = SessionConfig {
        attendance_dir: config.attendance_dir.clone(),
        snapshot_dir: config.snapshot_dir.clone(),
        debounce: Duration::seconds(config.debounce_secs),
    };
    let mut session = AttendanceSession::start(&session_config, Local::now().date_naive())?;
    let mut source = ImageDirSource::open(frames_dir)?;
    let mut notifier = ConsoleNotifier;

    let summary = run_recognition(
        &mut source,
        &mut FullFrameDetector,
        &recognizer,
        &mut session,
        &mut notifier,
        || false, // stream end stands in for the quit key
    )?;

    println!(
        "Session ended: {} frames, {} faces, {} logged, {} skipped. Today's count: {}",
        summary.frames,
        summary.faces,
        summary.logged,
        summary.skipped,
        session.logged_count()
    );
    Ok(())
}

fn list(config: &Config) -> Result<()> {
    let store = FeatureStore::load(&config.store_path())
        .context("no feature store yet — run `rollcall enroll` first")?;
    let identities = store.identities()?;
    if identities.is_empty() {
        println!("No identities enrolled.");
        return Ok(());
    }
    for entry in identities {
        println!(
            "{}  {}  ({} samples)",
            entry.roll_number, entry.name, entry.sample_count
        );
    }
    Ok(())
}

fn today(config: &Config, json: bool) -> Result<()> {
    let log = DailyLog::for_date(&config.attendance_dir, Local::now().date_naive());
    let rows = log.rows()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        println!("No attendance recorded yet for today.");
        return Ok(());
    }
    for (i, row) in rows.iter().enumerate() {
        println!(
            "{:>3}  {}  {}  {}  {}  {}  {}",
            i + 1,
            row.roll_number,
            row.name,
            row.department,
            row.semester,
            row.time,
            row.snapshot_path
        );
    }
    println!("Total entries: {}", rows.len());
    Ok(())
}
