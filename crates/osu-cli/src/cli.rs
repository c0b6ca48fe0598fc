//! CLI argument definitions for osu-tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use osu_model::Section;

#[derive(Parser, Debug)]
#[command(name = "osu-tool")]
#[command(about = "Inspect and rewrite beatmap and replay files", version)]
pub struct Args {
    /// Log decode details (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a beatmap or storyboard and print a summary
    Inspect {
        path: PathBuf,
        /// Only read this section (repeatable)
        #[arg(long, value_name = "SECTION", value_parser = parse_section)]
        only: Vec<Section>,
        /// Print the whole decoded model as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decode a replay and print a summary
    Replay {
        path: PathBuf,
        /// Print the whole decoded replay as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decode, re-encode and decode again, reporting any difference
    Roundtrip {
        path: PathBuf,
        /// Write the re-encoded file here
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn parse_section(name: &str) -> Result<Section, String> {
    match Section::from_name(name) {
        Section::Custom(name) => Err(format!("unknown section {name:?}")),
        section => Ok(section),
    }
}
