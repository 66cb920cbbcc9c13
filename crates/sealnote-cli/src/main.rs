//! Sealnote CLI - encrypted notes in a folder you can sync
//!
//! This is the command-line interface for Sealnote. It provides a thin,
//! scriptable front end over the core note store.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod output;

use clap::Parser;
use sealnote_core::VERSION;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{init, maintenance, notes, sync};
use crate::constants::LOG_ENV;
use crate::errors::{exit_code_for, hint_for};

fn main() {
    init_logging();

    let cli = Cli::parse();
    let ctx = AppContext::new(&cli);

    if let Err(e) = run(&ctx, &cli) {
        eprintln!("Error: {:#}", e);
        if let Some(hint) = hint_for(&e) {
            eprintln!("{}", hint);
        }
        std::process::exit(exit_code_for(&e));
    }
}

/// Diagnostics go to stderr, filtered by SEALNOTE_LOG (default: warnings only).
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn run(ctx: &AppContext, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Init(args)) => init::handle_init(ctx, args)?,
        Some(Commands::Add(args)) => notes::handle_add(ctx, args)?,
        Some(Commands::Edit(args)) => notes::handle_edit(ctx, args)?,
        Some(Commands::Show(args)) => notes::handle_show(ctx, args)?,
        Some(Commands::List(args)) => notes::handle_list(ctx, args)?,
        Some(Commands::Search(args)) => notes::handle_search(ctx, args)?,
        Some(Commands::Trash(args)) => notes::handle_trash(ctx, args)?,
        Some(Commands::Restore(args)) => notes::handle_restore(ctx, args)?,
        Some(Commands::Archive(args)) => notes::handle_archive(ctx, args)?,
        Some(Commands::Purge(args)) => notes::handle_purge(ctx, args)?,
        Some(Commands::Refresh(args)) => sync::handle_refresh(ctx, args)?,
        Some(Commands::Watch(args)) => sync::handle_watch(ctx, args)?,
        Some(Commands::Migrate) => maintenance::handle_migrate(ctx)?,
        Some(Commands::Status(args)) => maintenance::handle_status(ctx, args)?,
        None => {
            println!("Sealnote v{}", VERSION);
            println!("\nQuickstart:");
            println!("  sealnote init");
            println!("  sealnote add \"Hello\"");
            println!("  sealnote list");
            println!("  sealnote search hello");
            println!("  sealnote show <id>");
            println!("\nRun `sealnote --help` for full usage.");
        }
    }

    Ok(())
}
