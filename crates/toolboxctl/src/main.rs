use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use toolboxctl::{cmd_flatten, cmd_parse, cmd_summary};

#[derive(Parser, Debug)]
#[command(name = "toolboxctl", version, about = "Block editor toolbox CLI")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Output JSON where applicable
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Normalize a toolbox into categories and block trees (JSON)
    Parse {
        /// Toolbox XML file, or `-` for stdin
        input: PathBuf,
        /// Single-line JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },
    /// Dump the generic flattened mapping (JSON)
    Flatten {
        /// XML file, or `-` for stdin
        input: PathBuf,
        #[arg(long)]
        compact: bool,
    },
    /// One line per category with block counts
    Summary {
        /// Toolbox XML file, or `-` for stdin
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let Cli { verbose, json, cmd } = Cli::parse();

    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| level.into()),
        ))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cmd {
        Cmd::Parse { input, compact } => cmd_parse::run(&input, compact)?,
        Cmd::Flatten { input, compact } => cmd_flatten::run(&input, compact)?,
        Cmd::Summary { input } => cmd_summary::run(&input, json)?,
    };

    Ok(())
}
