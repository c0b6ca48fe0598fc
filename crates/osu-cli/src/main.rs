// osu-tool: command-line front end for the beatmap and replay codecs.

mod cli;
mod commands;
mod fs_source;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use cli::{Args, Command};
use fs_source::FsSource;

fn main() -> Result<()> {
    let args = Args::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.verbose {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    let output = match &args.command {
        Command::Inspect { path, only, json } => commands::inspect(&FsSource, path, only, *json)?,
        Command::Replay { path, json } => commands::replay(&FsSource, path, *json)?,
        Command::Roundtrip { path, output } => {
            commands::roundtrip(&FsSource, path, output.as_deref())?
        }
    };
    print!("{output}");
    Ok(())
}
