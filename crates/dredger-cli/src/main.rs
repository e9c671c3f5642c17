//! dredger CLI
//!
//! Local driver for the configuration reconciler: records live in a
//! file-backed store and each `reconcile` runs one delivery pass.

mod cli;
mod commands;
mod context;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use context::Context;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: cannot initialise logging: {}", "warning".yellow(), e);
    }

    let ctx = Context::load(&cli)?;
    execute_command(&ctx, cli.command)
}

fn execute_command(ctx: &Context, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Apply { file } => commands::run_apply(ctx, &file),
        Commands::Delete { name, namespace } => {
            commands::run_delete(ctx, &name, namespace.as_deref())
        }
        Commands::Reconcile => commands::run_reconcile(ctx),
        Commands::Status { target } => commands::run_status(ctx, &target),
        Commands::Reset { names } => commands::run_reset(ctx, &names),
    }
}
