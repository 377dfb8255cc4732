mod cache;
mod cli;
mod config;
mod dedup;
mod error;
mod feeds;
mod fmt;
mod importer;
mod ledger;
mod matcher;
mod models;
mod notify;
mod retry;
mod state;

use clap::{CommandFactory, Parser};

use cli::{Cli, Commands};

fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Init { force } => cli::init::run(config_path, force),
        Commands::Validate => cli::validate::run(config_path),
        Commands::Reconcile {
            purchases,
            source,
            transactions,
            days,
            dry_run,
        } => cli::reconcile::run(
            config_path,
            &purchases,
            &source,
            transactions.as_deref(),
            days,
            dry_run,
        ),
        Commands::Digest {
            input,
            days,
            dry_run,
        } => cli::digest::run(config_path, &input, days, dry_run),
        Commands::Status => cli::status::run(config_path),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "settle", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
