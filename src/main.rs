//! # TB - Kanban Task Board CLI
//!
//! A command-line kanban board: tasks live in four status columns
//! (Backlog, In Progress, Blocked, Done) and are created, filtered,
//! reordered and bulk transferred from the terminal.
//!
//! ## Key Features
//!
//! - **Board reconciliation**: card moves diff the new arrangement
//!   against the stored rows and commit only the cards that actually
//!   moved, in one atomic batch
//! - **Composable filters**: status multi-select, assignee/tag/text
//!   substring search and an inclusive due-date window, all conjoined
//! - **CSV transfer**: export the filtered board, fail-fast import with
//!   an automatic pre-import backup
//! - **Local file storage**: a single JSON file with atomic writes
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a task
//! tb add "Write spec" --priority 2 --due 2026-09-15
//!
//! # Show the board
//! tb board
//!
//! # Move card 3 to the top of Done
//! tb move 3 --to done --pos 0
//!
//! # Export everything In Progress
//! tb export --status in-progress -o wip.csv
//! ```
//!
//! Data is stored in `./tasks.json` by default; pass `--db` to point at
//! another file.

use std::path::{Path, PathBuf};

use clap::Parser;

pub mod board;
pub mod cli;
pub mod cmd;
pub mod error;
pub mod fields;
pub mod filter;
pub mod store;
pub mod task;
pub mod transfer;

use cli::Cli;
use cmd::*;
use error::Result;
use store::Store;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    // Completions never touch the store.
    if let Commands::Completions { shell } = &cli.command {
        cmd_completions(*shell);
        return;
    }

    let db_path = cli.db.unwrap_or_else(|| PathBuf::from("tasks.json"));
    if let Err(e) = run(&db_path, cli.command) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(db_path: &Path, command: Commands) -> Result<()> {
    let mut store = Store::open(db_path)?;
    match command {
        Commands::Add {
            title,
            assignee,
            desc,
            tags,
            due,
            priority,
            status,
            hours,
        } => cmd_add(
            &mut store, title, assignee, desc, tags, due, priority, status, hours,
        ),
        Commands::List { filter, sort, limit } => cmd_list(&store, &filter, sort, limit),
        Commands::View { id } => cmd_view(&store, id),
        Commands::Update {
            id,
            title,
            desc,
            assignee,
            tags,
            due,
            priority,
            status,
            hours,
            clear_due,
        } => cmd_update(
            &mut store, id, title, desc, assignee, tags, due, priority, status, hours, clear_due,
        ),
        Commands::Delete { id } => cmd_delete(&mut store, id),
        Commands::Board { filter } => cmd_board(&store, &filter),
        Commands::Move { id, to, pos } => cmd_move(&mut store, id, to, pos),
        Commands::Export { output, filter } => cmd_export(&store, output, &filter),
        Commands::Import { input, no_backup } => cmd_import(&mut store, input, no_backup),
        Commands::Completions { .. } => Ok(()),
    }
}
