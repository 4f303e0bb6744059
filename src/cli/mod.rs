//! Command-line interface for arbor.
//!
//! Running `arbor` with no subcommand launches the interactive navigator.
//! The subcommands cover the scriptable surface:
//! - `new`: create a conversation tree
//! - `trees`: list conversation trees
//! - `bookmarks`: list or remove saved bookmarks
//! - `config`: inspect the configuration
//! - `completions`: generate shell completions

mod commands;

use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use tracing::warn;

use crate::config::{self, Config};
use crate::error::Result;

/// Interactive terminal navigator for branching LLM conversations.
#[derive(Debug, Parser)]
#[command(name = "arbor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run; the interactive navigator when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Data directory holding trees, bookmarks, and the saved position.
    #[arg(short = 'd', long, global = true, env = "ARBOR_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Path to custom configuration file.
    #[arg(long, global = true, env = "ARBOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn", env = "ARBOR_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Log format (text, json, compact, pretty).
    #[arg(long, global = true, default_value = "text", env = "ARBOR_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Log output file (default: stderr).
    #[arg(long, global = true, env = "ARBOR_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Show full error chains instead of top-level messages.
    #[arg(long, global = true, env = "ARBOR_DEBUG")]
    pub debug: bool,

    /// Run without a generation backend; replies are synthesized locally.
    #[arg(long, global = true, env = "ARBOR_OFFLINE")]
    pub offline: bool,
}

/// Log level options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    /// Only errors.
    Error,
    /// Errors and warnings.
    #[default]
    Warn,
    /// Errors, warnings, and informational messages.
    Info,
    /// All of the above plus debug messages.
    Debug,
    /// All messages including trace-level details.
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter level.
    #[must_use]
    pub fn to_filter_string(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format.
    #[default]
    Text,
    /// Structured JSON format for machine consumption.
    Json,
    /// Compact single-line format.
    Compact,
    /// Pretty format with full details.
    Pretty,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Launch the interactive navigator.
    #[command(alias = "ui")]
    Tui(TuiArgs),

    /// Create a new conversation tree.
    New(NewArgs),

    /// List conversation trees.
    #[command(alias = "ls")]
    Trees(TreesArgs),

    /// List or remove saved bookmarks.
    #[command(alias = "bm")]
    Bookmarks(BookmarksArgs),

    /// View configuration.
    #[command(alias = "cfg")]
    Config(ConfigArgs),

    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Arguments for the TUI command.
#[derive(Debug, Default, Parser)]
pub struct TuiArgs {
    /// Start at this node instead of the saved position.
    #[arg(short = 'n', long)]
    pub node: Option<String>,

    /// Theme to use.
    #[arg(long, env = "ARBOR_THEME")]
    pub theme: Option<String>,
}

/// Arguments for the new command.
#[derive(Debug, Parser)]
pub struct NewArgs {
    /// System prompt for the new tree.
    #[arg(short = 's', long, default_value = config::DEFAULT_SYSTEM_PROMPT)]
    pub system: String,

    /// Provider for the new tree (default from configuration).
    #[arg(long)]
    pub provider: Option<String>,

    /// Model for the new tree (default from configuration).
    #[arg(short = 'm', long)]
    pub model: Option<String>,
}

/// Arguments for the trees command.
#[derive(Debug, Parser)]
pub struct TreesArgs {
    /// Show full node ids instead of short ids.
    #[arg(long)]
    pub full_ids: bool,
}

/// Arguments for the bookmarks command.
#[derive(Debug, Parser)]
pub struct BookmarksArgs {
    /// Bookmark action to perform.
    #[command(subcommand)]
    pub action: BookmarkAction,
}

/// Bookmark subcommand actions.
#[derive(Debug, Subcommand)]
pub enum BookmarkAction {
    /// List saved bookmarks.
    List,

    /// Remove a bookmark by title.
    #[command(alias = "rm")]
    Remove {
        /// Title of the bookmark to remove.
        title: String,
    },
}

/// Arguments for the config command.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    /// Config action to perform.
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommand actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration.
    Show,

    /// Show the configuration file path.
    Path,

    /// Initialize a configuration file with defaults.
    Init,
}

/// Arguments for the completions command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: CompletionShell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// PowerShell.
    Powershell,
    /// Elvish shell.
    Elvish,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::Powershell => Shell::PowerShell,
            CompletionShell::Elvish => Shell::Elvish,
        }
    }
}

/// Generate shell completions and print to stdout.
pub fn generate_completions(shell: CompletionShell) {
    let mut cmd = Cli::command();
    let shell: Shell = shell.into();
    generate(shell, &mut cmd, "arbor", &mut io::stdout());
}

/// Initialize tracing/logging based on CLI options.
fn init_logging(cli: &Cli) {
    use std::sync::Arc;

    use tracing_subscriber::{
        fmt::{self, writer::BoxMakeWriter},
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_filter_string()));

    // Logs go to stderr unless a file is given. Inside the TUI, stderr output
    // garbles the alternate screen, so interactive runs should pass a file
    // when raising the level.
    let writer = match &cli.log_file {
        Some(path) => match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => BoxMakeWriter::new(Arc::new(file)),
            Err(e) => {
                eprintln!("Warning: cannot open log file {}: {e}", path.display());
                BoxMakeWriter::new(std::io::stderr)
            }
        },
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let result = match cli.log_format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_file(true)
                .with_line_number(true)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .pretty()
                .with_file(true)
                .with_line_number(true)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Text => {
            let layer = fmt::layer().with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
    };

    if let Err(e) = result {
        eprintln!("Warning: Could not initialize logging: {e}");
    }
}

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli);

    // An explicitly named config file must parse if present; `config init`
    // still has to run before the file exists. The implicit one may be
    // absent or broken without blocking startup.
    let conf = match &cli.config {
        Some(path) if path.exists() => Config::load_from(path)?,
        Some(_) => Config::default(),
        None => Config::load().unwrap_or_else(|e| {
            warn!("failed to load configuration: {e}");
            Config::default()
        }),
    };

    match &cli.command {
        Some(Commands::Tui(args)) => commands::tui::run(&cli, &conf, args).await,
        Some(Commands::New(args)) => commands::new::run(&cli, &conf, args).await,
        Some(Commands::Trees(args)) => commands::trees::run(&cli, &conf, args).await,
        Some(Commands::Bookmarks(args)) => commands::bookmarks::run(&cli, &conf, args),
        Some(Commands::Config(args)) => commands::config::run(&cli, &conf, args),
        Some(Commands::Completions(args)) => {
            generate_completions(args.shell);
            Ok(())
        }
        None => commands::tui::run(&cli, &conf, &TuiArgs::default()).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_log_level_to_filter() {
        assert_eq!(LogLevel::Error.to_filter_string(), "error");
        assert_eq!(LogLevel::Warn.to_filter_string(), "warn");
        assert_eq!(LogLevel::Info.to_filter_string(), "info");
        assert_eq!(LogLevel::Debug.to_filter_string(), "debug");
        assert_eq!(LogLevel::Trace.to_filter_string(), "trace");
    }

    #[test]
    fn test_default_command_is_navigator() {
        let cli = Cli::parse_from(["arbor"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_data_dir_flag_wins() {
        let cli = Cli::parse_from(["arbor", "--data-dir", "/tmp/arbor-test", "trees"]);
        assert_eq!(
            commands::data_dir(&cli).unwrap(),
            PathBuf::from("/tmp/arbor-test")
        );
    }
}
