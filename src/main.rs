use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod domain;
mod git;
mod services;

use cli::Cli;
use commands::handle_hook;
use services::output::print_failure;

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match handle_hook(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "hook failed");
            if let Err(print_err) = print_failure(cli.json, &e) {
                eprintln!("{:#}", print_err);
            }
            ExitCode::FAILURE
        }
    }
}
