mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the protocol response
    gatehook_runtime::init_logging();

    let cli = Cli::parse();

    // Handle init command early (doesn't need config)
    if let Commands::Init { path } = &cli.command {
        return commands::init::run_init(path);
    }

    let project = config::project_dir();
    let config = config::load_config(cli.config.as_deref(), project.as_deref())?;

    if let Commands::Tools { file } = &cli.command {
        return commands::tools::execute(file, &config);
    }

    if let Some(event) = cli.command.event() {
        let code = commands::hook::execute(event, &config).await?;
        std::process::exit(code);
    }

    Ok(())
}
