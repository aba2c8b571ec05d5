//! Graphseed CLI
//!
//! - `seed`: generate a movie/user graph, snapshot it, and bulk-load it into
//!   the deployed tables
//! - `loadtest`: replay a named GraphQL query against the deployed APIs
//! - `env`: export deployment outputs as `.env` lines

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod deployment;
mod loadtest;
mod seed;

use deployment::{env_lines, read_state, DEFAULT_STATE_PATH};
use loadtest::LoadTestArgs;
use seed::SeedArgs;

#[derive(Parser)]
#[command(name = "graphseed")]
#[command(
    author,
    version,
    about = "Graphseed: fixture generator, bulk loader, and GraphQL load test"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate fixtures, write the snapshot, and load every table.
    Seed(SeedArgs),

    /// Run a query template against both GraphQL APIs.
    ///
    /// The user variable is sampled from the snapshot written by `seed`.
    Loadtest(LoadTestArgs),

    /// Print (or write) deployment outputs as `UPPER_SNAKE=value` lines.
    Env(EnvArgs),
}

#[derive(Args, Debug, Clone)]
struct EnvArgs {
    /// Deployment state document
    #[arg(long, default_value = DEFAULT_STATE_PATH)]
    state: PathBuf,
    /// Write to this file instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_env(args: EnvArgs) -> Result<()> {
    let state = read_state(&args.state)?;
    let mut text = env_lines(&state).join("\n");
    text.push('\n');

    match args.out {
        Some(out) => {
            fs::write(&out, &text)?;
            eprintln!("{} {}", "wrote".green().bold(), out.display().to_string().bold());
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Seed(args) => seed::cmd_seed(args),
        Commands::Loadtest(args) => loadtest::cmd_loadtest(args),
        Commands::Env(args) => cmd_env(args),
    }
}
