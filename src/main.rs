//! Engagement Monitor CLI
//!
//! Replays recorded classifier output through the engagement engine.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use crossbeam_channel::Receiver;
use engagement_monitor::{
    alert_channel, analytics::AnalyticsReport, Alert, Config, Emotion, FrameStatus, ManualClock,
    Observation, SessionRegistry, VERSION,
};
use serde::Deserialize;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "engagement-monitor")]
#[command(version = VERSION)]
#[command(about = "Real-time classroom engagement monitoring", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON Lines file of classified frames through a session
    Replay {
        /// Input file, one record per line
        #[arg(long, short)]
        input: PathBuf,

        /// Session identifier
        #[arg(long)]
        session: Option<String>,

        /// Teacher identifier
        #[arg(long, default_value = "teacher")]
        teacher: String,

        /// Lesson subject
        #[arg(long, default_value = "General")]
        subject: String,

        /// Print the analytics report after the summary
        #[arg(long)]
        analytics: bool,
    },

    /// Show configuration
    Config,

    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// One line of a replay file.
#[derive(Debug, Deserialize)]
struct ReplayRecord {
    student_id: String,
    emotion: Emotion,
    #[serde(default)]
    confidence: f64,
    /// Derived from the emotion when absent
    engagement_score: Option<f64>,
    timestamp: DateTime<Utc>,
}

impl ReplayRecord {
    fn into_observation(self) -> (String, Observation) {
        let observation = if self.emotion == Emotion::NoFace {
            Observation::no_face(self.timestamp)
        } else {
            Observation::new(
                self.emotion,
                self.confidence,
                self.engagement_score
                    .unwrap_or_else(|| self.emotion.engagement_weight()),
                self.timestamp,
            )
        };
        (self.student_id, observation)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let directives = filter_directives(cli.verbose, std::env::var("RUST_LOG").ok());
    let filter =
        EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config_path = cli.config.unwrap_or_else(Config::config_path);

    match cli.command {
        Commands::Replay {
            input,
            session,
            teacher,
            subject,
            analytics,
        } => {
            let config = Config::load_from(&config_path)
                .with_context(|| format!("Failed to load config from {config_path:?}"))?;
            let session_id =
                session.unwrap_or_else(|| format!("SESS-{}", Utc::now().timestamp_millis()));
            cmd_replay(config, &input, &session_id, &teacher, &subject, analytics)
        }
        Commands::Config => cmd_config(&config_path),
        Commands::InitConfig { force } => cmd_init_config(&config_path, force),
    }
}

const DEFAULT_FILTER: &str = "engagement_monitor=info,warn";
const VERBOSE_FILTER: &str = "engagement_monitor=debug,warn";

/// Pick log directives: `--verbose` wins, then `RUST_LOG`, then the default.
fn filter_directives(verbose: bool, rust_log: Option<String>) -> String {
    if verbose {
        return VERBOSE_FILTER.to_string();
    }
    rust_log
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

fn read_records(path: &Path) -> Result<Vec<ReplayRecord>> {
    let file =
        std::fs::File::open(path).with_context(|| format!("Failed to open {path:?}"))?;

    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {path:?}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: ReplayRecord = serde_json::from_str(&line)
            .with_context(|| format!("Invalid record on line {}", index + 1))?;
        records.push(record);
    }
    Ok(records)
}

fn cmd_replay(
    config: Config,
    input: &Path,
    session_id: &str,
    teacher_id: &str,
    subject: &str,
    analytics: bool,
) -> Result<()> {
    let records = read_records(input)?;
    let Some(first) = records.first() else {
        bail!("No records found in {input:?}");
    };

    println!("Engagement Monitor v{VERSION}");
    println!("Replaying {} record(s) from {:?}", records.len(), input);
    println!();

    let clock = Arc::new(ManualClock::new(first.timestamp));
    let (sink, alerts) = alert_channel(config.alert_channel_capacity);
    let registry = SessionRegistry::new(config)
        .with_clock(clock.clone())
        .with_alert_sink(Arc::new(sink));

    registry.create_session(session_id, teacher_id, subject)?;

    let mut rejected = 0usize;
    for record in records {
        clock.set(record.timestamp);
        let (student_id, observation) = record.into_observation();
        match registry.ingest(session_id, &student_id, observation) {
            Ok(result) => {
                match result.status {
                    FrameStatus::Success => println!(
                        "[{}] {:<12} {:<8} focus {:>3}  {}",
                        result.timestamp.format("%H:%M:%S"),
                        student_id,
                        result.emotion,
                        result.focus_score,
                        result
                            .prediction
                            .map(|p| format!("{:?}/{:?}", p.state, p.trend))
                            .unwrap_or_default()
                    ),
                    FrameStatus::NoFace => println!(
                        "[{}] {:<12} no face",
                        result.timestamp.format("%H:%M:%S"),
                        student_id
                    ),
                }
                print_alerts(&alerts);
            }
            Err(e) => {
                rejected += 1;
                tracing::warn!(student_id = %student_id, "Record rejected: {}", e);
            }
        }
    }

    let summary = registry.end_session(session_id)?;
    println!();
    println!("Session Summary");
    println!("===============");
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if analytics {
        let history = registry.session_history(session_id)?;
        println!();
        println!("Analytics");
        println!("=========");
        println!(
            "{}",
            serde_json::to_string_pretty(&AnalyticsReport::build(&history))?
        );
    }

    println!();
    println!("Alerts: {:?}", registry.alert_summary().by_type);
    if rejected > 0 {
        println!("Rejected records: {rejected}");
    }
    println!("{}", registry.shared_stats().summary());
    Ok(())
}

fn print_alerts(alerts: &Receiver<Alert>) {
    for alert in alerts.try_iter() {
        println!(
            "    ALERT {:?} [{:?}] {} -> {}",
            alert.kind, alert.priority, alert.message, alert.action
        );
    }
}

fn cmd_config(path: &Path) -> Result<()> {
    let config = Config::load_from(path)
        .with_context(|| format!("Failed to load config from {path:?}"))?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {path:?}");
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("Config file already exists at {path:?} (use --force to overwrite)");
    }
    Config::default()
        .save_to(path)
        .with_context(|| format!("Failed to write config to {path:?}"))?;
    println!("Wrote default configuration to {path:?}");
    Ok(())
}
