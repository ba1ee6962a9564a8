use std::path::PathBuf;
use chrono::DateTime;
use structopt::StructOpt;

use wayfarer::config::Config;
use wayfarer::detection::TravelAnomalyEngine;
use wayfarer::output::{OutputFormat, OutputHandler};
use wayfarer::persistence::{LoginStore, SqliteLoginStore};

/// Impossible travel detection command line interface
#[derive(StructOpt, Debug)]
#[structopt(name = "travel", about = "Impossible travel detection CLI")]
pub enum Cli {
    /// Generate a default configuration file
    Config {
        /// Output path for the configuration file
        #[structopt(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
    /// List the recorded logins of a user
    History {
        /// Path to the login database
        #[structopt(short, long, default_value = "data.db")]
        database: PathBuf,
        /// Username to list
        #[structopt(short, long)]
        user: String,
    },
    /// Re-evaluate each recorded login of a user against its predecessor
    Replay {
        /// Path to the login database
        #[structopt(short, long, default_value = "data.db")]
        database: PathBuf,
        /// Username to replay
        #[structopt(short, long)]
        user: String,
        /// Maximum plausible travel speed in km/h
        #[structopt(short, long, default_value = "500")]
        max_velocity: f64,
        /// Output format: json, jsonl or console
        #[structopt(short, long, default_value = "console")]
        format: String,
        /// Only print suspicious transitions
        #[structopt(long)]
        suspicious_only: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let cli = Cli::from_args();

    match cli {
        Cli::Config { output } => {
            let config = Config::default();
            config.to_file(&output)?;
            println!("Default configuration written to: {:?}", output);
        }
        Cli::History { database, user } => {
            let store = open_store(&database)?;
            let logins = store.logins_by_username(&user)?;

            println!("{} login(s) recorded for '{}':\n", logins.len(), user);
            for login in &logins {
                let when = DateTime::from_timestamp(login.timestamp, 0)
                    .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_else(|| login.timestamp.to_string());
                println!(
                    "  {}  {:<15}  ({:.4}, {:.4}) ±{} km  [{}]",
                    when,
                    login.source_ip,
                    login.latitude,
                    login.longitude,
                    login.accuracy_radius,
                    login.event_id
                );
            }
        }
        Cli::Replay { database, user, max_velocity, format, suspicious_only } => {
            let store = open_store(&database)?;
            let logins = store.logins_by_username(&user)?;
            let engine = TravelAnomalyEngine::with_max_velocity(max_velocity);
            let format: OutputFormat = format.parse()?;
            let mut output = OutputHandler::new(format, None)?;

            let reports = engine.replay(&logins);
            let mut suspicious = 0usize;
            for report in &reports {
                if report.suspicious {
                    suspicious += 1;
                } else if suspicious_only {
                    continue;
                }
                output.write_report(report)?;
            }
            output.flush()?;

            eprintln!(
                "{} of {} transition(s) for '{}' exceed {:.0} km/h",
                suspicious,
                reports.len(),
                user,
                max_velocity
            );
        }
    }

    Ok(())
}

fn open_store(database: &PathBuf) -> Result<SqliteLoginStore, Box<dyn std::error::Error>> {
    if !database.exists() {
        eprintln!("Database not found: {:?}", database);
        std::process::exit(1);
    }
    Ok(SqliteLoginStore::new(database)?)
}
