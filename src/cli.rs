//! CLI definitions for packpilot.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// packpilot CLI.
#[derive(Parser)]
#[command(name = "packpilot")]
#[command(about = "Pack-opening automation over the Chrome DevTools Protocol")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "packpilot.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Open packs and dispose of their contents
    Run {
        /// Number of packs to open (default: `[run] runs`)
        #[arg(short, long)]
        runs: Option<u32>,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Check that the page answers scripts
    Ping {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Log every purchased-items payload until Ctrl-C
    Watch {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Classify a saved purchased-items payload
    Classify {
        /// Path to a JSON payload
        file: PathBuf,
    },
}

/// Overrides for the `[browser]` section.
#[derive(Args, Debug, Default)]
pub(crate) struct TargetArgs {
    /// Chrome DevTools HTTP endpoint
    #[arg(long, env = "PACKPILOT_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Substring of the URL of the tab to drive
    #[arg(long)]
    pub target: Option<String>,
}
