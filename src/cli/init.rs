use crate::config;
use crate::error::{Result, SettleError};

const ENV_EXAMPLE: &str = "\
# Secrets for settle. Copy to .env or export in your shell.
SETTLE_LEDGER_TOKEN=your-budget-api-token
SETTLE_MAILER_TOKEN=your-mailer-token
";

pub fn run(config_path: Option<&str>, force: bool) -> Result<()> {
    let path = config::resolve_path(config_path);
    if path.exists() && !force {
        return Err(SettleError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    let starter = config::starter();
    config::save(&starter, &path)?;

    let env_example = path
        .parent()
        .map(|dir| dir.join(".env.example"))
        .unwrap_or_else(|| ".env.example".into());
    std::fs::write(&env_example, ENV_EXAMPLE)?;

    println!("Wrote {}", path.display());
    println!("Wrote {}", env_example.display());
    println!("Edit the config, set SETTLE_LEDGER_TOKEN, then run `settle validate`.");
    Ok(())
}
