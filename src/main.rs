mod cli;

use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::Parser;
use cli::{command, Cli, Commands};
use fmi_regions::RunConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    match driver(&cli) {
        Ok(files) => {
            for file in files {
                println!("File saved to `{}`", file.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn driver(cli: &Cli) -> Result<Vec<PathBuf>> {
    match &cli.command {
        Commands::InitConfig {
            path,
            preset,
            force,
        } => command::init_config(path, *preset, *force).map(|p| vec![p]),
        Commands::Aggregate {} => command::aggregate(&load_config(cli)?),
        Commands::Clean {} => command::clean(&load_config(cli)?),
        Commands::Normalize {} => command::normalize(&load_config(cli)?).map(|p| vec![p]),
        Commands::Reduce {} => command::reduce(&load_config(cli)?).map(|p| vec![p]),
        Commands::Run {} => command::run_all(&load_config(cli)?),
    }
}

fn load_config(cli: &Cli) -> Result<RunConfig> {
    let config = match &cli.config {
        Some(path) => RunConfig::read_from_path(path)?,
        None => RunConfig::default(),
    };
    config.validate()?;

    Ok(config)
}
