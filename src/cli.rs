//! Command-line interface definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// AI-assisted study plan generator
#[derive(Parser)]
#[command(name = "examplan")]
#[command(about = "Generate deterministic or AI-drafted study plans", version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "EXAMPLAN_CONFIG",
        default_value = "config/config.yaml"
    )]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a study plan from a request file
    Generate {
        /// Path to a JSON plan request
        #[arg(short, long)]
        input: PathBuf,

        /// Caller identity for usage gating
        #[arg(long, default_value = "cli")]
        caller: String,

        /// Override the configured proposer strategy
        #[arg(long, value_parser = ["deterministic", "gateway"])]
        proposer: Option<String>,

        /// Print the plan as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Run the HTTP planning server
    Serve {
        /// Override the configured bind address
        #[arg(short, long)]
        bind: Option<String>,
    },
}
