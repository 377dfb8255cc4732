use std::path::Path;

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use crate::error::{Result, SettleError};
use crate::models::{LedgerTxn, Purchase};

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// Parse a currency string into integer cents without a float round-trip.
/// Handles `$`, thousands commas, stray quotes, leading minus, and
/// parenthesized negatives. More than two decimal places is rejected.
pub fn parse_amount_cents(raw: &str) -> Option<i64> {
    let s = raw.replace(',', "").replace('"', "").replace('$', "");
    let mut s = s.trim();
    let mut negative = false;

    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        negative = true;
        s = inner.trim();
    }
    if let Some(rest) = s.strip_prefix('-') {
        negative = !negative;
        s = rest.trim();
    }
    if s.is_empty() {
        return None;
    }

    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };
    if frac_part.len() > 2 {
        return None;
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let dollars: i64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };
    let cents: i64 = if frac_part.is_empty() {
        0
    } else {
        // pad "5" to 50
        format!("{frac_part:0<2}").parse().ok()?
    };

    let total = dollars.checked_mul(100)?.checked_add(cents)?;
    Some(if negative { -total } else { total })
}

/// Accepts the two date shapes the exports actually use:
/// YYYY-MM-DD and MM/DD/YYYY.
pub fn parse_flex_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .ok()
}

/// Deterministic short id for rows whose export carries no identifier.
pub fn synthetic_id(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(b"|");
    }
    hex::encode(hasher.finalize())[..12].to_string()
}

fn find_column(header: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    header.iter().position(|field| {
        let f = field.trim();
        names.iter().any(|n| f.eq_ignore_ascii_case(n))
    })
}

// ---------------------------------------------------------------------------
// Purchase export (order report)
// ---------------------------------------------------------------------------

/// Parse an order-report CSV. The header row is located by column names, so
/// preamble lines above it are ignored; rows that fail to parse are skipped.
pub fn parse_purchases(file_path: &Path, source: &str) -> Result<Vec<Purchase>> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));

    let mut rows = Vec::new();
    let mut columns: Option<(Option<usize>, usize, usize, usize, Option<usize>)> = None;

    for result in rdr.records() {
        let Ok(record) = result else { continue };
        let Some((idx_id, idx_date, idx_label, idx_total, idx_payment)) = columns else {
            let date = find_column(&record, &["Order Date", "Date"]);
            let label = find_column(&record, &["Title", "Item", "Description"]);
            let total = find_column(&record, &["Item Total", "Total", "Amount"]);
            if let (Some(d), Some(l), Some(t)) = (date, label, total) {
                columns = Some((
                    find_column(&record, &["Order ID", "Order Id"]),
                    d,
                    l,
                    t,
                    find_column(&record, &["Payment Instrument Type", "Payment Method"]),
                ));
            }
            continue;
        };

        let Some(date) = record.get(idx_date).and_then(parse_flex_date_opt) else {
            continue;
        };
        let Some(amount_cents) = record.get(idx_total).and_then(|f| parse_amount_cents(f)) else {
            continue;
        };
        let label = record.get(idx_label).unwrap_or("").trim().to_string();
        if label.is_empty() {
            continue;
        }

        let id = idx_id
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                let date = date.to_string();
                let amount = amount_cents.to_string();
                synthetic_id(&[date.as_str(), amount.as_str(), label.as_str()])
            });

        let payment_method = idx_payment
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        rows.push(Purchase {
            id,
            date,
            amount_cents,
            label,
            source: source.to_string(),
            payment_method,
        });
    }

    if columns.is_none() {
        return Err(SettleError::Other(format!(
            "{}: no recognizable header row (need Date, Item, and Total columns)",
            file_path.display()
        )));
    }
    Ok(rows)
}

fn parse_flex_date_opt(field: &str) -> Option<NaiveDate> {
    parse_flex_date(field)
}

// ---------------------------------------------------------------------------
// Ledger register export
// ---------------------------------------------------------------------------

/// Parse a ledger register CSV, the offline stand-in for the budget API.
pub fn parse_ledger_csv(file_path: &Path) -> Result<Vec<LedgerTxn>> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));

    let mut rows = Vec::new();
    let mut columns: Option<(Option<usize>, usize, usize, Option<usize>, usize, Option<usize>)> =
        None;

    for result in rdr.records() {
        let Ok(record) = result else { continue };
        let Some((idx_id, idx_date, idx_payee, idx_memo, idx_amount, idx_account)) = columns
        else {
            let date = find_column(&record, &["Date"]);
            let payee = find_column(&record, &["Payee", "Description"]);
            let amount = find_column(&record, &["Amount"]);
            if let (Some(d), Some(p), Some(a)) = (date, payee, amount) {
                columns = Some((
                    find_column(&record, &["Id", "Transaction Id"]),
                    d,
                    p,
                    find_column(&record, &["Memo", "Notes"]),
                    a,
                    find_column(&record, &["Account", "Account Name"]),
                ));
            }
            continue;
        };

        let Some(date) = record.get(idx_date).and_then(parse_flex_date_opt) else {
            continue;
        };
        let Some(amount_cents) = record.get(idx_amount).and_then(|f| parse_amount_cents(f))
        else {
            continue;
        };
        let payee = record.get(idx_payee).unwrap_or("").trim().to_string();
        if payee.is_empty() {
            continue;
        }

        let memo = idx_memo
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        let account = idx_account
            .and_then(|i| record.get(i))
            .map(str::trim)
            .unwrap_or("")
            .to_string();
        let id = idx_id
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                let date = date.to_string();
                let amount = amount_cents.to_string();
                synthetic_id(&[date.as_str(), amount.as_str(), payee.as_str()])
            });

        rows.push(LedgerTxn {
            id,
            date,
            amount_cents,
            payee,
            memo,
            account,
        });
    }

    if columns.is_none() {
        return Err(SettleError::Other(format!(
            "{}: no recognizable header row (need Date, Payee, and Amount columns)",
            file_path.display()
        )));
    }
    Ok(rows)
}
