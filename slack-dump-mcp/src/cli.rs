use std::{fmt, path::PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use rmcp::model::LoggingLevel;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Mode>,

    /// slackdump executable to invoke
    #[arg(long, env = "SLACKDUMP_BIN")]
    pub slackdump_bin: Option<String>,

    /// Directory for temporary dump archives
    #[arg(long, env = "SLACK_DUMP_MCP_TEMP_DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Abort a slackdump invocation after this many seconds
    #[arg(long, env = "SLACK_DUMP_MCP_TIMEOUT")]
    pub timeout_secs: Option<u64>,

    /// Log verbosity
    #[arg(short, long, value_name = "LEVEL", default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Mode {
    /// Serve the dump_slack_thread tool over MCP stdio (default)
    Serve,
    /// Dump a single thread and print it
    Dump {
        /// Slack thread URL, e.g. https://slack.com/archives/C0123456789/p1234567890
        url: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl From<LoggingLevel> for LogLevel {
    fn from(level: LoggingLevel) -> Self {
        match level {
            LoggingLevel::Debug => LogLevel::Debug,
            LoggingLevel::Info | LoggingLevel::Notice => LogLevel::Info,
            LoggingLevel::Warning => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

/// Installs env_logger on stderr, where it does not collide with MCP frames.
///
/// The logger itself lets everything through; `log::max_level` is the only gate,
/// so `logging/setLevel` can raise the level as well as lower it.
pub fn init_logging(log_level: LogLevel) {
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Trace)
        .format_timestamp_secs()
        .target(env_logger::Target::Stderr)
        .init();

    log::set_max_level(log_level.into());
}

impl From<LogLevel> for LevelFilter {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Off => LevelFilter::Off,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Off => write!(f, "off"),
        }
    }
}
