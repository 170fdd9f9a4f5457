//! PacketPress CLI — assemble ordered document packets from folder trees.
//!
//! Resolves a manifest of named slots against a source directory and merges
//! the winning files, cover pages included, into one output document.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
