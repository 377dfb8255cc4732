use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{LedgerTxn, MatchRecord, Purchase};
use crate::state::MatchState;

/// Tag appended to a ledger memo when a transaction is reconciled. Its
/// presence excludes the transaction from future candidate scans.
pub const MEMO_TAG: &str = "[settle]";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSettings {
    #[serde(default = "default_date_tolerance")]
    pub date_tolerance_days: i64,
    #[serde(default = "default_amount_tolerance")]
    pub amount_tolerance_cents: i64,
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    #[serde(default)]
    pub hints: Vec<Hint>,
}

/// Maps a payment-instrument pattern on the purchase side to a ledger
/// account name, worth a small score bonus when both line up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hint {
    pub pattern: String,
    #[serde(default = "default_match_type")]
    pub match_type: String,
    pub account: String,
}

fn default_date_tolerance() -> i64 {
    2
}

fn default_amount_tolerance() -> i64 {
    50
}

fn default_score_threshold() -> f64 {
    80.0
}

fn default_retention_days() -> i64 {
    90
}

fn default_match_type() -> String {
    "contains".to_string()
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            date_tolerance_days: default_date_tolerance(),
            amount_tolerance_cents: default_amount_tolerance(),
            score_threshold: default_score_threshold(),
            retention_days: default_retention_days(),
            hints: Vec::new(),
        }
    }
}

fn hint_matches(text: &str, pattern: &str, match_type: &str) -> bool {
    let text_upper = text.to_uppercase();
    let pat_upper = pattern.to_uppercase();
    match match_type {
        "contains" => text_upper.contains(&pat_upper),
        "regex" => Regex::new(pattern)
            .map(|re| re.is_match(text))
            .unwrap_or(false),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Confidence score (0-100) for pairing a purchase with a ledger txn.
/// 0 means the pair is outside tolerance and never eligible.
pub fn score_pair(purchase: &Purchase, txn: &LedgerTxn, settings: &MatchSettings) -> f64 {
    let date_diff = (txn.date - purchase.date).num_days().abs();
    let amount_diff = (txn.amount_cents.abs() - purchase.amount_cents.abs()).abs();

    if date_diff > settings.date_tolerance_days || amount_diff > settings.amount_tolerance_cents {
        return 0.0;
    }

    let mut score = 40.0 * (1.0 - date_diff as f64 / (settings.date_tolerance_days + 1) as f64)
        + 60.0 * (1.0 - amount_diff as f64 / (settings.amount_tolerance_cents + 1) as f64);

    if date_diff == 0 {
        score += 5.0;
    }
    if amount_diff == 0 {
        score += 5.0;
    }
    if let Some(method) = &purchase.payment_method {
        let hinted = settings.hints.iter().any(|h| {
            h.account.eq_ignore_ascii_case(&txn.account)
                && hint_matches(method, &h.pattern, &h.match_type)
        });
        if hinted {
            score += 10.0;
        }
    }

    score.min(100.0)
}

fn is_reconciled(txn: &LedgerTxn) -> bool {
    txn.memo.as_deref().is_some_and(|m| m.contains(MEMO_TAG))
}

// ---------------------------------------------------------------------------
// Matching run
// ---------------------------------------------------------------------------

pub struct MatchOutcome {
    pub matches: Vec<MatchRecord>,
    /// The purchases behind `matches`, in the same order.
    pub matched_purchases: Vec<Purchase>,
    pub unmatched_purchases: Vec<Purchase>,
    pub unmatched_txns: Vec<LedgerTxn>,
    /// Purchases skipped because the persisted state already maps them.
    pub previously_matched: usize,
    /// Txns excluded because their memo already carries the tag.
    pub already_annotated: usize,
}

/// Pair purchases with ledger transactions. Purchases are processed in
/// ascending date order; each is matched to its highest-scoring eligible
/// txn at or above the threshold, ties going to the first-encountered
/// candidate. Matched purchases are appended to `state`; no match is not
/// an error.
pub fn run_matching(
    mut purchases: Vec<Purchase>,
    txns: &[LedgerTxn],
    settings: &MatchSettings,
    state: &mut MatchState,
    now: DateTime<Utc>,
) -> MatchOutcome {
    purchases.sort_by_key(|p| p.date);

    let mut claimed = vec![false; txns.len()];
    let mut matches = Vec::new();
    let mut matched_purchases = Vec::new();
    let mut unmatched_purchases = Vec::new();
    let mut previously_matched = 0usize;

    for purchase in purchases {
        if state.contains(&purchase.id) {
            previously_matched += 1;
            continue;
        }

        let mut best: Option<(usize, f64)> = None;
        for (i, txn) in txns.iter().enumerate() {
            if claimed[i] || is_reconciled(txn) {
                continue;
            }
            let score = score_pair(&purchase, txn, settings);
            if score == 0.0 || score < settings.score_threshold {
                continue;
            }
            // strict > keeps the first-encountered txn on equal scores
            if best.is_none_or(|(_, b)| score > b) {
                best = Some((i, score));
            }
        }

        match best {
            Some((i, score)) => {
                let txn = &txns[i];
                claimed[i] = true;
                state.insert(&purchase.id, &txn.id, now);
                matches.push(MatchRecord {
                    purchase_id: purchase.id.clone(),
                    txn_id: txn.id.clone(),
                    score,
                    date_diff_days: (txn.date - purchase.date).num_days(),
                    amount_diff_cents: txn.amount_cents.abs() - purchase.amount_cents.abs(),
                });
                matched_purchases.push(purchase);
            }
            None => unmatched_purchases.push(purchase),
        }
    }

    let mut unmatched_txns = Vec::new();
    let mut already_annotated = 0usize;
    for (i, txn) in txns.iter().enumerate() {
        if is_reconciled(txn) {
            already_annotated += 1;
        } else if !claimed[i] {
            unmatched_txns.push(txn.clone());
        }
    }

    MatchOutcome {
        matches,
        matched_purchases,
        unmatched_purchases,
        unmatched_txns,
        previously_matched,
        already_annotated,
    }
}
