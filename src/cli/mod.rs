//! CLI Module
//!
//! Command-line interface for compiling and replaying mirrored graphs.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ugen-mirror - audio graph codegen and mirroring tools
#[derive(Parser, Debug)]
#[command(name = "ugen-mirror")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rebuild a graph from a node snapshot and print its expression
    #[command(name = "compile")]
    Compile {
        /// JSON file holding a full node snapshot or Create message
        path: PathBuf,

        /// Also evaluate this many samples
        #[arg(short, long, default_value_t = 0)]
        ticks: usize,
    },

    /// Apply newline-delimited mirror messages to a remote graph
    #[command(name = "replay")]
    Replay {
        /// File with one JSON message per line
        path: PathBuf,
    },

    /// Mirror a small tremolo graph and print each message as a JSON line
    #[command(name = "demo")]
    Demo {
        /// Mirror configuration file (defaults to worklet mode)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
