//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Load and workflow simulation driver for pipeline orchestration APIs", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a load scenario against the target API
    Run {
        /// Scenario name; the configured default applies when omitted
        #[arg(long, value_name = "NAME")]
        scenario: Option<String>,

        /// Override the target base URL
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },

    /// Load and validate the configuration, then exit
    ValidateConfig,

    /// List built-in and configured scenario profiles
    ListScenarios,
}
