use chrono::{DateTime, NaiveDate, Utc};

/// A scraped purchase record from an external source (e.g. an order export).
#[derive(Debug, Clone)]
pub struct Purchase {
    pub id: String,
    pub date: NaiveDate,
    pub amount_cents: i64,
    pub label: String,
    pub source: String,
    /// Free-text payment instrument, e.g. "Visa ...1234". Secondary signal
    /// for hint-based account matching.
    pub payment_method: Option<String>,
}

/// A ledger transaction from the budget system. The memo is the mutable
/// annotation field; a `[settle]` tag in it marks the txn as reconciled.
#[derive(Debug, Clone)]
pub struct LedgerTxn {
    pub id: String,
    pub date: NaiveDate,
    pub amount_cents: i64,
    pub payee: String,
    pub memo: Option<String>,
    pub account: String,
}

/// One purchase paired with one ledger transaction. Created per run and
/// only retained via the persisted match state.
#[derive(Debug, Clone)]
pub struct MatchRecord {
    pub purchase_id: String,
    pub txn_id: String,
    pub score: f64,
    pub date_diff_days: i64,
    pub amount_diff_cents: i64,
}

/// An item fetched from a JSON feed.
#[derive(Debug, Clone)]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    pub url: String,
    pub published: DateTime<Utc>,
    pub feed: String,
}
