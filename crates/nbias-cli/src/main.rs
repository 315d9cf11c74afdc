//! nbias CLI - edit notes that only ever rest on disk encrypted.
//!
//! This is the command-line front end for `nbias-core`: argument parsing,
//! configuration, prompts, the editor process and output.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod editor;
mod helpers;
mod logging;
mod output;

use clap::error::ErrorKind;
use clap::Parser;
use nbias_core::NbiasError;

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{decrypt, edit, encrypt, info, misc};
use crate::constants::exit_codes;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                eprintln!("nbias: {}", usage_message(&e));
                std::process::exit(exit_codes::FAILURE);
            }
        },
    };
    logging::init(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("nbias: {}", error_message(&e, cli.verbose));
        std::process::exit(exit_codes::FAILURE);
    }
}

/// One line per failure. Internal detail only in verbose mode.
fn error_message(err: &anyhow::Error, verbose: bool) -> String {
    let Some(core) = err.downcast_ref::<NbiasError>() else {
        return if verbose {
            format!("{:#}", err)
        } else {
            err.to_string()
        };
    };
    match core.detail() {
        Some(detail) if verbose => format!("{} ({})", core, detail),
        _ => core.to_string(),
    }
}

/// First line of a clap error, without clap's own `error:` prefix.
fn usage_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let line = rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("invalid arguments");
    line.strip_prefix("error: ").unwrap_or(line).to_string()
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if let Commands::Completions(args) = &cli.command {
        return misc::handle_completions(args);
    }

    let ctx = AppContext::new(cli)?;
    match &cli.command {
        Commands::Edit(args) => edit::handle_edit(&ctx, args),
        Commands::Encrypt(args) => encrypt::handle_encrypt(&ctx, args),
        Commands::Decrypt(args) => decrypt::handle_decrypt(&ctx, args),
        Commands::Info(args) => info::handle_info(args),
        Commands::Completions(args) => misc::handle_completions(args),
    }
}
