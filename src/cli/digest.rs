use std::path::PathBuf;

use chrono::{Duration, Utc};
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::config;
use crate::dedup::dedupe;
use crate::error::{Result, SettleError};
use crate::feeds;
use crate::fmt::ellipsize;
use crate::models::FeedItem;
use crate::notify;

pub fn run(
    config_path: Option<&str>,
    inputs: &[String],
    days: Option<i64>,
    dry_run: bool,
) -> Result<()> {
    let cfg = config::load(&config::resolve_path(config_path))?;

    let mut items: Vec<FeedItem> = Vec::new();
    if inputs.is_empty() {
        if cfg.digest.feeds.is_empty() {
            return Err(SettleError::Config(
                "no feeds configured and no --input files given".to_string(),
            ));
        }
        // A broken feed degrades to a warning; the rest still make the digest.
        for feed in &cfg.digest.feeds {
            match feeds::fetch(feed) {
                Ok(mut fetched) => items.append(&mut fetched),
                Err(e) => log::warn!("feed {} failed, skipping: {e}", feed.name),
            }
        }
    } else {
        for input in inputs {
            items.append(&mut feeds::read_file(&PathBuf::from(input))?);
        }
    }

    let cutoff = Utc::now() - Duration::days(days.unwrap_or(cfg.digest.since_days));
    let total = items.len();
    items.retain(|item| item.published >= cutoff);
    log::debug!("{} of {total} items inside the window", items.len());

    let outcome = dedupe(items, cfg.digest.similarity_threshold);
    let shown: Vec<&FeedItem> = outcome.kept.iter().take(cfg.digest.max_items).collect();

    if shown.is_empty() {
        println!("Nothing new.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Feed", "Published", "Title"]);
    for item in &shown {
        table.add_row(vec![
            Cell::new(&item.feed),
            Cell::new(item.published.format("%Y-%m-%d %H:%M").to_string()),
            Cell::new(ellipsize(&item.title, 70)),
        ]);
    }
    println!("{table}");
    println!(
        "{} kept, {} dropped as near-duplicates",
        shown.len().to_string().green().bold(),
        outcome.dropped.len()
    );

    match (&cfg.notify, dry_run) {
        (Some(notify_cfg), false) => {
            let token = std::env::var(config::MAILER_TOKEN_VAR).map_err(|_| {
                SettleError::Config(format!("{} is not set", config::MAILER_TOKEN_VAR))
            })?;
            let subject = format!("Digest: {} items", shown.len());
            notify::send(notify_cfg, &token, &subject, &plain_text(&shown))?;
            println!("Emailed digest to {}.", notify_cfg.to);
        }
        (Some(_), true) => println!("{}", "Dry run: digest not emailed.".yellow()),
        (None, _) => {}
    }
    Ok(())
}

fn plain_text(items: &[&FeedItem]) -> String {
    let mut body = String::new();
    for item in items {
        body.push_str(&format!(
            "- {} ({})\n  {}\n",
            item.title,
            item.feed,
            item.url
        ));
    }
    body
}
