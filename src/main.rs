//! Flareline CLI
//!
//! Command-line interface for the pain analytics engine:
//! - Analyze an entry file and print a snapshot
//! - Validate an entry file
//! - Generate a default config file

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use flareline::analytics::AnalyticsSnapshot;
use flareline::config::{generate_default_config, Config, LoggingConfig};
use flareline::import::{check_entries, load_entries};
use flareline::{AnalyticsEngine, TimeWindow};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "flareline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pain pattern and flare-risk analytics for personal pain logs")]
#[command(long_about = "Flareline turns a pain log into trends, correlations, flare episodes,\n\
forecasts and recommendations. Output is observational, not a diagnosis.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: user config dir, /etc/flareline, ./config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze an entry file
    Analyze {
        /// Path to a .json or .csv entry file
        file: PathBuf,
        /// Time window (7d, 30d, 90d, 1y, all)
        #[arg(short, long)]
        window: Option<String>,
        /// Reference instant (RFC 3339 or YYYY-MM-DD; default: now)
        #[arg(short, long)]
        now: Option<String>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Check an entry file for rows the engine would skip or clamp
    Validate {
        /// Path to a .json or .csv entry file
        file: PathBuf,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    init_tracing(&config.logging)?;

    match cli.command {
        Commands::Analyze {
            file,
            window,
            now,
            format,
        } => {
            let window: TimeWindow = match window {
                Some(w) => w.parse()?,
                None => config.engine.default_window,
            };
            let now = match now {
                Some(s) => parse_reference(&s)?,
                None => Utc::now(),
            };

            let import = load_entries(&file).with_context(|| format!("Failed to load {:?}", file))?;
            if import.rows_failed > 0 {
                eprintln!(
                    "Skipped {} invalid rows (run `flareline validate` for details)",
                    import.rows_failed
                );
            }

            let engine = AnalyticsEngine::new(config.analytics);
            let snapshot = engine.analyze(&import.entries, window, now);

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
                OutputFormat::Table => print_snapshot(&snapshot),
            }
        }

        Commands::Validate { file } => {
            let import = load_entries(&file).with_context(|| format!("Failed to load {:?}", file))?;
            let problems = check_entries(&import.entries);

            println!("Validation results:");
            println!("  Rows processed: {}", import.rows_processed);
            println!("  Rows failed: {}", import.rows_failed);
            println!("  Out-of-range values: {}", problems.len());

            if !import.errors.is_empty() || !problems.is_empty() {
                println!();
                println!("Problems (first 10):");
                for problem in import.errors.iter().chain(problems.iter()).take(10) {
                    println!("  {}", problem);
                }
            }

            if import.rows_failed > 0 || !problems.is_empty() {
                anyhow::bail!("{:?} has invalid entries", file);
            }
        }

        Commands::Config { output } => {
            let config = generate_default_config();

            match output {
                Some(path) => {
                    // Create parent directory if needed
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

/// Install the global subscriber; logs go to stderr or the configured file
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    let writer = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let (json_layer, pretty_layer) = if logging.format.eq_ignore_ascii_case("json") {
        (Some(tracing_subscriber::fmt::layer().json().with_writer(writer)), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer().with_writer(writer)))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}

/// Parse `--now`; a bare date means the end of that day
fn parse_reference(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map(|dt| dt.and_utc())
        .with_context(|| format!("Invalid reference time: {} (use RFC 3339 or YYYY-MM-DD)", s))
}

fn print_snapshot(snapshot: &AnalyticsSnapshot) {
    let summary = &snapshot.summary;

    println!("Flareline snapshot ({} window, as of {})", snapshot.window, snapshot.generated_for);
    println!();
    println!("{:<20} {}", "Entries", summary.entry_count);
    println!("{:<20} {:.1}", "Mean pain", summary.mean_pain);
    println!("{:<20} {:.2}", "Volatility", summary.volatility);
    println!("{:<20} {:+.3}/entry ({})", "Trend", summary.slope, summary.direction);
    println!("{:<20} {:.0}%", "Bad-entry ratio", summary.bad_day_ratio * 100.0);
    println!("{:<20} {:.0} ({})", "Risk score", snapshot.risk.score, snapshot.risk.level);
    println!(
        "{:<20} {:.1} ({:+.1}, {} confidence)",
        "Forecast", snapshot.forecast.projected_average, snapshot.forecast.delta_from_current,
        snapshot.forecast.confidence
    );

    if let Some(flare) = &snapshot.predicted_flare {
        println!();
        println!(
            "Possible flare: {}% within {} ({:?})",
            flare.probability, flare.timeframe, flare.severity
        );
        for action in &flare.recommended_actions {
            println!("  - {}", action);
        }
    }

    if !snapshot.correlations.is_empty() {
        println!();
        println!("{:<4} {:<20} {:<10} {:>6} {:>8}", "#", "Label", "Kind", "Count", "Delta");
        println!("{}", "-".repeat(52));
        for c in snapshot.correlations.iter().take(10) {
            println!(
                "{:<4} {:<20} {:<10} {:>6} {:>+8.2}{}",
                c.rank,
                c.label,
                c.kind.to_string(),
                c.occurrence_count,
                c.mean_delta,
                if c.low_confidence { " *" } else { "" }
            );
        }
    }

    if !snapshot.episodes.episodes.is_empty() {
        println!();
        println!("{:<12} {:<12} {:>6} {:>6} {:<10}", "Start", "End", "Days", "Peak", "Severity");
        println!("{}", "-".repeat(50));
        for e in &snapshot.episodes.episodes {
            println!(
                "{:<12} {:<12} {:>6} {:>6.1} {:<10}",
                e.start_date.to_string(),
                e.end_date.to_string(),
                e.duration_days,
                e.peak_pain,
                format!("{:?}", e.severity)
            );
        }
    }

    if let Some(report) = &snapshot.medication {
        if !report.medications.is_empty() {
            println!();
            println!("{:<20} {:>6} {:>10} {:>8}", "Medication", "Uses", "Avg relief", "Score");
            println!("{}", "-".repeat(48));
            for m in &report.medications {
                println!(
                    "{:<20} {:>6} {:>10.1} {:>8.0}",
                    m.name, m.uses, m.avg_reduction, m.effectiveness_score
                );
            }
        }
    }

    println!();
    println!("Recommendations:");
    for rec in &snapshot.recommendations {
        println!("  [{:?}] {}: {}", rec.emphasis, rec.title, rec.detail);
    }

    println!();
    println!("{}", snapshot.notice);
}
