use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Kanban-style task board CLI.
/// Storage defaults to ./tasks.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "tb", version, about = "Kanban task board CLI")]
pub struct Cli {
    /// Path to the JSON store file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
