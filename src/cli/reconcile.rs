use std::path::PathBuf;

use chrono::{Duration, Local, Utc};
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::config;
use crate::error::{Result, SettleError};
use crate::fmt::{ellipsize, money};
use crate::importer;
use crate::ledger::LedgerClient;
use crate::matcher::{run_matching, MatchOutcome};
use crate::models::LedgerTxn;
use crate::state::MatchState;

pub fn run(
    config_path: Option<&str>,
    purchases_file: &str,
    source: &str,
    transactions_file: Option<&str>,
    days: Option<i64>,
    dry_run: bool,
) -> Result<()> {
    let cfg = config::load(&config::resolve_path(config_path))?;

    let purchases = importer::parse_purchases(&PathBuf::from(purchases_file), source)?;
    if purchases.is_empty() {
        println!("No purchases found in {purchases_file}; nothing to do.");
        return Ok(());
    }

    // Ledger txns come from a register CSV when one is given, otherwise
    // from the budget API. Memos can only be written back in API mode.
    let (txns, client) = match transactions_file {
        Some(file) => (importer::parse_ledger_csv(&PathBuf::from(file))?, None),
        None => {
            let ledger_cfg = cfg.ledger.as_ref().ok_or_else(|| {
                SettleError::Config(
                    "no ledger section in config and no --transactions file given".to_string(),
                )
            })?;
            let token = std::env::var(config::LEDGER_TOKEN_VAR).map_err(|_| {
                SettleError::Config(format!("{} is not set", config::LEDGER_TOKEN_VAR))
            })?;
            let mut client = LedgerClient::new(ledger_cfg, token)?;
            warn_on_unknown_hint_accounts(&mut client, &cfg);
            let since = Local::now().date_naive()
                - Duration::days(days.unwrap_or(ledger_cfg.since_days));
            (client.transactions_since(since)?, Some(client))
        }
    };

    let state_path = cfg.state_path();
    let mut state = MatchState::load(&state_path)?;
    let outcome = run_matching(purchases, &txns, &cfg.matching, &mut state, Utc::now());

    print_outcome(&outcome, &txns);

    if dry_run {
        println!("{}", "Dry run: no memos written, no state saved.".yellow());
        return Ok(());
    }

    if let Some(client) = client {
        for (record, purchase) in outcome.matches.iter().zip(&outcome.matched_purchases) {
            if let Some(txn) = txns.iter().find(|t| t.id == record.txn_id) {
                client.annotate_matched(txn, &format!("{}: {}", purchase.source, purchase.label))?;
            }
        }
        if !outcome.matches.is_empty() {
            println!("Annotated {} ledger transaction(s).", outcome.matches.len());
        }
    } else if !outcome.matches.is_empty() {
        println!("Offline mode: ledger memos not written.");
    }

    let pruned = state.save(&state_path, Utc::now(), cfg.matching.retention_days)?;
    if pruned > 0 {
        println!("Pruned {pruned} stale state entries.");
    }
    Ok(())
}

fn warn_on_unknown_hint_accounts(client: &mut LedgerClient, cfg: &config::Config) {
    match client.account_names() {
        Ok(names) => {
            for hint in &cfg.matching.hints {
                if !names.iter().any(|n| n.eq_ignore_ascii_case(&hint.account)) {
                    log::warn!("hint account '{}' is not in the budget", hint.account);
                }
            }
        }
        Err(e) => log::warn!("could not list budget accounts: {e}"),
    }
}

fn print_outcome(outcome: &MatchOutcome, txns: &[LedgerTxn]) {
    if outcome.matches.is_empty() {
        println!("No new matches.");
    } else {
        let mut table = Table::new();
        table.set_header(vec!["Purchase", "Amount", "Ledger Txn", "Drift", "Score"]);
        for (record, purchase) in outcome.matches.iter().zip(&outcome.matched_purchases) {
            let txn = txns.iter().find(|t| t.id == record.txn_id);
            table.add_row(vec![
                Cell::new(ellipsize(&purchase.label, 40)),
                Cell::new(money(purchase.amount_cents)),
                Cell::new(
                    txn.map(|t| format!("{} ({})", t.payee, t.date))
                        .unwrap_or_default(),
                ),
                Cell::new(format!(
                    "{}d / {}",
                    record.date_diff_days,
                    money(record.amount_diff_cents)
                )),
                Cell::new(format!("{:.0}", record.score)),
            ]);
        }
        println!("{table}");
    }

    println!(
        "{} matched, {} previously matched, {} purchases unmatched, {} ledger txns unmatched, {} already annotated",
        outcome.matches.len().to_string().green().bold(),
        outcome.previously_matched,
        outcome.unmatched_purchases.len(),
        outcome.unmatched_txns.len(),
        outcome.already_annotated,
    );

    for purchase in &outcome.unmatched_purchases {
        println!(
            "  {} {} {} ({})",
            "unmatched:".yellow(),
            purchase.date,
            ellipsize(&purchase.label, 50),
            money(purchase.amount_cents)
        );
    }
}
