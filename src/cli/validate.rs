use colored::Colorize;

use crate::config;
use crate::error::{Result, SettleError};

pub fn run(config_path: Option<&str>) -> Result<()> {
    let path = config::resolve_path(config_path);
    let cfg = config::load(&path)?;

    let mut problems = cfg.validate();

    // Secrets are only required for the sections that need them.
    if cfg.ledger.is_some() && std::env::var(config::LEDGER_TOKEN_VAR).is_err() {
        problems.push(format!(
            "{} is not set (required by the ledger section)",
            config::LEDGER_TOKEN_VAR
        ));
    }
    if cfg.notify.is_some() && std::env::var(config::MAILER_TOKEN_VAR).is_err() {
        problems.push(format!(
            "{} is not set (required by the notify section)",
            config::MAILER_TOKEN_VAR
        ));
    }

    if problems.is_empty() {
        println!("{} {}", "OK".green().bold(), path.display());
        return Ok(());
    }

    println!("{} in {}:", "Problems".red().bold(), path.display());
    for problem in &problems {
        println!("  - {problem}");
    }
    Err(SettleError::Config(format!(
        "{} problem(s) found",
        problems.len()
    )))
}
