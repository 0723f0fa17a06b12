// lenswatch CLI - resolve shop and classified-ad listings against the
// Fujifilm catalog and print the grouped deals.

mod exit_codes;
mod watch;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::{EXIT_INVALID_CONFIG, EXIT_RUNTIME, EXIT_SUCCESS, EXIT_USAGE};

/// Env var holding a tracing filter directive; overrides `-v`.
const LOG_ENV: &str = "LENSWATCH_LOG";

#[derive(Parser)]
#[command(name = "lenswatch")]
#[command(about = "Match camera and lens listings to the canonical Fujifilm catalog")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the catalogs, resolve every source and merge the deal maps
    #[command(after_help = "\
Examples:
  lenswatch run watch.toml
  lenswatch run watch.toml --json
  lenswatch run watch.toml --output deals.json")]
    Run {
        /// Path to the watch config (TOML)
        config: PathBuf,

        /// Output JSON to stdout instead of the human summary only
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate a watch config without reading any data file
    #[command(after_help = "\
Examples:
  lenswatch validate watch.toml")]
    Validate {
        /// Path to the watch config (TOML)
        config: PathBuf,
    },

    /// Resolve ad-hoc titles the way a configured source would
    #[command(after_help = "\
Examples:
  lenswatch resolve watch.toml --source camara 'FUJIFILM XF 35MM F1.4 R'
  lenswatch resolve watch.toml -s lens_ads 'Fuji XF 23mm f2 R WR noir' --json")]
    Resolve {
        /// Path to the watch config (TOML)
        config: PathBuf,

        /// Source whose sanitizer and grammar are applied
        #[arg(long, short = 's')]
        source: String,

        /// Titles to resolve
        #[arg(required = true)]
        titles: Vec<String>,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  lenswatch-resolve ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run { config, json, output } => watch::cmd_run(config, json, output),
        Commands::Validate { config } => watch::cmd_validate(config),
        Commands::Resolve { config, source, titles, json } => {
            watch::cmd_resolve(config, &source, &titles, json)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INVALID_CONFIG, message: msg.into(), hint: None }
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        Self { code: EXIT_RUNTIME, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
