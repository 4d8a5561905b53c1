//! Configuration and CLI argument handling

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser)]
#[command(name = "keeptime")]
#[command(about = "A terminal stopwatch that survives restarts")]
#[command(version = "0.1.0")]
pub struct Config {
    /// File the timer state is persisted to between runs
    #[arg(short, long, default_value = "keeptime-state.json")]
    pub state_file: PathBuf,

    /// Display refresh period in milliseconds
    #[arg(short, long, default_value = "10")]
    pub tick_ms: u64,

    /// Keep state in memory only; nothing survives exit
    #[arg(long)]
    pub ephemeral: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Display refresh period, clamped to at least one millisecond
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}
