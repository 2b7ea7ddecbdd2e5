//! # Enrollment CLI Tool
//!
//! Command-line interface for inspecting batch and competency views and running
//! bulk reassignments against the enrollment API.

mod cli;

use clap::{Parser, Subcommand, ValueEnum};
use enrollment_core::ClientConfig;
use tracing::info;

use cli::{handle_reassign_command, handle_roster_command};

#[derive(Parser, Debug)]
#[command(name = "enrollment-cli")]
#[command(about = "Command-line interface for enrollment batch and competency management")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file path (default: $ENROLLMENT_CONFIG or ./enrollment-client.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Bearer token; overrides api.auth_token from configuration
    #[arg(long, env = "ENROLLMENT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use environment-driven structured logging (RUST_LOG, ENROLLMENT_LOG_FORMAT) instead of -v
    #[arg(long)]
    structured_logs: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Subcommands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List every known batch with a per-batch competency summary
    Batches,

    /// List students matching the given filters
    Students {
        /// Name substring
        #[arg(long, default_value = "")]
        name: String,
        /// Course code or name substring
        #[arg(long, default_value = "")]
        course: String,
        /// Batch identifier substring
        #[arg(long, default_value = "")]
        batch: String,
        /// Exact status (case-insensitive)
        #[arg(long, default_value = "")]
        status: String,
        /// Competency name substring
        #[arg(long, default_value = "")]
        competency: String,
        /// Group the output by batch
        #[arg(long)]
        group: bool,
    },

    /// Batches the given students can be reassigned into
    AvailableBatches {
        /// Student identifiers
        #[arg(value_name = "STUDENT_ID", required = true)]
        student_ids: Vec<String>,
    },

    /// Enrolled competencies across the given students
    Competencies {
        /// Student identifiers
        #[arg(value_name = "STUDENT_ID", required = true)]
        student_ids: Vec<String>,
    },

    /// Move students into another batch
    ReassignBatch {
        /// Target batch identifier
        #[arg(short, long)]
        target: String,
        /// Student identifiers
        #[arg(value_name = "STUDENT_ID", required = true)]
        student_ids: Vec<String>,
    },

    /// Move students from one competency to another
    ReassignCompetency {
        /// Competency to move away from
        #[arg(long)]
        from: String,
        /// Competency to move to
        #[arg(long)]
        to: String,
        /// How progress carries over (transfer, reset, default)
        #[arg(short, long, default_value = "default")]
        mode: String,
        /// Student identifiers
        #[arg(value_name = "STUDENT_ID", required = true)]
        student_ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.structured_logs {
        enrollment_core::logging::init_structured_logging();
    } else {
        // Initialize tracing based on verbosity level
        let log_level = match cli.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let mut config = if let Some(config_path) = cli.config {
        ClientConfig::load_from_file(std::path::Path::new(&config_path))?
    } else {
        ClientConfig::load()?
    };
    if let Some(token) = cli.token {
        config.api.auth_token = Some(token);
    }

    info!(base_url = %config.api.base_url, "Enrollment CLI starting");

    match cli.command {
        command @ (Commands::Batches
        | Commands::Students { .. }
        | Commands::AvailableBatches { .. }
        | Commands::Competencies { .. }) => {
            handle_roster_command(command, &config, cli.format).await
        }
        command @ (Commands::ReassignBatch { .. } | Commands::ReassignCompetency { .. }) => {
            handle_reassign_command(command, &config, cli.format).await
        }
    }
}
