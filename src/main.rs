//! ugen-mirror CLI
//!
//! Command-line interface for the ugen-mirror codegen and mirroring tools.

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ugen_mirror::cli::{commands, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `demo` output stays valid JSON lines
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with_writer(std::io::stderr)
        .init();

    debug!("ugen-mirror v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("ugen-mirror v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Compile { path, ticks } => commands::compile(&path, ticks),
        Commands::Replay { path } => commands::replay(&path),
        Commands::Demo { config } => commands::demo(config.as_deref()),
    }
}
