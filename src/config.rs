use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SettleError};
use crate::matcher::MatchSettings;

/// Env var carrying the budget API token. Secrets never live in the config
/// file; `dotenvy` loads a local `.env` at startup for convenience.
pub const LEDGER_TOKEN_VAR: &str = "SETTLE_LEDGER_TOKEN";
pub const MAILER_TOKEN_VAR: &str = "SETTLE_MAILER_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger: Option<LedgerConfig>,
    #[serde(default)]
    pub matching: MatchSettings,
    #[serde(default)]
    pub digest: DigestConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify: Option<NotifyConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub base_url: String,
    pub budget_id: String,
    #[serde(default = "default_since_days")]
    pub since_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestConfig {
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_digest_since_days")]
    pub since_days: i64,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default)]
    pub feeds: Vec<Feed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub mailer_url: String,
    pub from: String,
    pub to: String,
}

fn default_data_dir() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".local")
        .join("share")
        .join("settle")
        .to_string_lossy()
        .to_string()
}

fn default_since_days() -> i64 {
    30
}

fn default_similarity_threshold() -> f64 {
    0.7
}

fn default_digest_since_days() -> i64 {
    3
}

fn default_max_items() -> usize {
    25
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            since_days: default_digest_since_days(),
            max_items: default_max_items(),
            feeds: Vec::new(),
        }
    }
}

impl Config {
    pub fn state_path(&self) -> PathBuf {
        PathBuf::from(shellexpand_path(&self.data_dir)).join("match-state.json")
    }

    /// Collect every problem rather than failing at the first, so one
    /// `settle validate` run shows the full repair list.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let m = &self.matching;

        if m.date_tolerance_days < 0 {
            problems.push("matching.date_tolerance_days must be >= 0".to_string());
        }
        if m.amount_tolerance_cents < 0 {
            problems.push("matching.amount_tolerance_cents must be >= 0".to_string());
        }
        if !(0.0..=100.0).contains(&m.score_threshold) {
            problems.push("matching.score_threshold must be between 0 and 100".to_string());
        }
        if m.retention_days <= 0 {
            problems.push("matching.retention_days must be positive".to_string());
        }
        for (i, hint) in m.hints.iter().enumerate() {
            if hint.pattern.is_empty() {
                problems.push(format!("matching.hints[{i}].pattern is empty"));
            }
            if hint.account.is_empty() {
                problems.push(format!("matching.hints[{i}].account is empty"));
            }
            match hint.match_type.as_str() {
                "contains" => {}
                "regex" => {
                    if regex::Regex::new(&hint.pattern).is_err() {
                        problems
                            .push(format!("matching.hints[{i}].pattern is not a valid regex"));
                    }
                }
                other => problems.push(format!(
                    "matching.hints[{i}].match_type '{other}' is not 'contains' or 'regex'"
                )),
            }
        }

        if let Some(ledger) = &self.ledger {
            if ledger.base_url.is_empty() {
                problems.push("ledger.base_url is empty".to_string());
            }
            if ledger.budget_id.is_empty() {
                problems.push("ledger.budget_id is empty".to_string());
            }
            if ledger.since_days <= 0 {
                problems.push("ledger.since_days must be positive".to_string());
            }
        }

        let d = &self.digest;
        if !(0.0..=1.0).contains(&d.similarity_threshold) {
            problems.push("digest.similarity_threshold must be between 0.0 and 1.0".to_string());
        }
        if d.since_days <= 0 {
            problems.push("digest.since_days must be positive".to_string());
        }
        for (i, feed) in d.feeds.iter().enumerate() {
            if feed.name.is_empty() {
                problems.push(format!("digest.feeds[{i}].name is empty"));
            }
            if feed.url.is_empty() {
                problems.push(format!("digest.feeds[{i}].url is empty"));
            }
        }

        if let Some(notify) = &self.notify {
            if notify.mailer_url.is_empty() {
                problems.push("notify.mailer_url is empty".to_string());
            }
            if notify.from.is_empty() {
                problems.push("notify.from is empty".to_string());
            }
            if notify.to.is_empty() {
                problems.push("notify.to is empty".to_string());
            }
        }

        problems
    }
}

pub fn default_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("settle")
        .join("config.yaml")
}

pub fn resolve_path(explicit: Option<&str>) -> PathBuf {
    match explicit {
        Some(p) => PathBuf::from(shellexpand_path(p)),
        None => default_path(),
    }
}

pub fn load(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(SettleError::Config(format!(
            "{} not found. Run `settle init` to create one.",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

pub fn save(config: &Config, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Starter config written by `settle init`, with one example hint and feed
/// to edit rather than bare empty sections.
pub fn starter() -> Config {
    Config {
        data_dir: default_data_dir(),
        ledger: Some(LedgerConfig {
            base_url: "https://api.ynab.com/v1".to_string(),
            budget_id: "last-used".to_string(),
            since_days: default_since_days(),
        }),
        matching: MatchSettings {
            hints: vec![crate::matcher::Hint {
                pattern: "Visa ...1234".to_string(),
                match_type: "contains".to_string(),
                account: "Chase Visa".to_string(),
            }],
            ..MatchSettings::default()
        },
        digest: DigestConfig {
            feeds: vec![Feed {
                name: "example".to_string(),
                url: "https://example.org/feed.json".to_string(),
            }],
            ..DigestConfig::default()
        },
        notify: None,
    }
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
