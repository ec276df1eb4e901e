use clap::{Parser, Subcommand};
use gatehook_runtime::EventType;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gatehook")]
#[command(about = "Lifecycle hook dispatcher for AI coding agents", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file (default: <project>/.gatehook/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Handle a SessionStart event from stdin
    SessionStart,
    /// Handle a SessionEnd event from stdin
    SessionEnd,
    /// Handle a PreToolUse event from stdin
    PreToolUse,
    /// Handle a PostToolUse event from stdin
    PostToolUse,
    /// Handle a Stop event from stdin
    Stop,
    /// Handle a PreCompact event from stdin
    PreCompact,
    /// Handle a TaskCompleted event from stdin
    TaskCompleted,
    /// Handle a TeammateIdle event from stdin
    TeammateIdle,
    /// Show which quality tools apply to a file
    Tools {
        /// File to inspect
        file: PathBuf,
    },
    /// Write a default config file
    Init {
        /// Path for new config file
        #[arg(default_value = ".gatehook/config.toml")]
        path: PathBuf,
    },
}

impl Commands {
    /// Event handled by a hook subcommand
    pub fn event(&self) -> Option<EventType> {
        let event = match self {
            Commands::SessionStart => EventType::SessionStart,
            Commands::SessionEnd => EventType::SessionEnd,
            Commands::PreToolUse => EventType::PreToolUse,
            Commands::PostToolUse => EventType::PostToolUse,
            Commands::Stop => EventType::Stop,
            Commands::PreCompact => EventType::PreCompact,
            Commands::TaskCompleted => EventType::TaskCompleted,
            Commands::TeammateIdle => EventType::TeammateIdle,
            Commands::Tools { .. } | Commands::Init { .. } => return None,
        };
        Some(event)
    }
}
