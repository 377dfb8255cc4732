use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::cache::TtlCache;
use crate::config::LedgerConfig;
use crate::error::{Result, SettleError};
use crate::matcher::MEMO_TAG;
use crate::models::LedgerTxn;
use crate::retry::{retry, Backoff};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const ACCOUNTS_TTL: Duration = Duration::from_secs(300);

/// Client for a YNAB-shaped budget API. All calls are sequential and
/// blocking; GETs go through the shared retry policy, mutations do not.
pub struct LedgerClient {
    http: reqwest::blocking::Client,
    base_url: String,
    budget_id: String,
    token: String,
    backoff: Backoff,
    accounts: TtlCache<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TxnListResponse {
    data: TxnListData,
}

#[derive(Debug, Deserialize)]
struct TxnListData {
    transactions: Vec<TxnDto>,
}

#[derive(Debug, Deserialize)]
struct TxnDto {
    id: String,
    date: String,
    /// Milliunits: 1000 per currency unit.
    amount: i64,
    payee_name: Option<String>,
    memo: Option<String>,
    account_name: String,
}

#[derive(Debug, Deserialize)]
struct AccountListResponse {
    data: AccountListData,
}

#[derive(Debug, Deserialize)]
struct AccountListData {
    accounts: Vec<AccountDto>,
}

#[derive(Debug, Deserialize)]
struct AccountDto {
    name: String,
}

pub fn milliunits_to_cents(milliunits: i64) -> i64 {
    // Milliunit amounts are whole numbers of cents times ten; round to be
    // safe against odd values.
    let (q, r) = (milliunits / 10, milliunits % 10);
    if r.abs() >= 5 {
        q + r.signum()
    } else {
        q
    }
}

fn txn_from_dto(dto: TxnDto) -> Option<LedgerTxn> {
    let date = NaiveDate::parse_from_str(&dto.date, "%Y-%m-%d").ok()?;
    Some(LedgerTxn {
        id: dto.id,
        date,
        amount_cents: milliunits_to_cents(dto.amount),
        payee: dto.payee_name.unwrap_or_default(),
        memo: dto.memo,
        account: dto.account_name,
    })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

impl LedgerClient {
    pub fn new(config: &LedgerConfig, token: String) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            budget_id: config.budget_id.clone(),
            token,
            backoff: Backoff::default(),
            accounts: TtlCache::new(ACCOUNTS_TTL),
        })
    }

    fn get_json<T: DeserializeOwned>(&self, label: &str, url: &str) -> Result<T> {
        retry(label, &self.backoff, || {
            let response = self
                .http
                .get(url)
                .bearer_auth(&self.token)
                .send()?;
            let status = response.status();
            if !status.is_success() {
                return Err(SettleError::Ledger {
                    status: status.as_u16(),
                    body: response.text().unwrap_or_default(),
                });
            }
            Ok(response.json::<T>()?)
        })
    }

    pub fn transactions_since(&self, since: NaiveDate) -> Result<Vec<LedgerTxn>> {
        let url = format!(
            "{}/budgets/{}/transactions?since_date={}",
            self.base_url, self.budget_id, since
        );
        let response: TxnListResponse = self.get_json("ledger transactions", &url)?;
        let total = response.data.transactions.len();
        let txns: Vec<LedgerTxn> = response
            .data
            .transactions
            .into_iter()
            .filter_map(txn_from_dto)
            .collect();
        if txns.len() < total {
            log::warn!("dropped {} ledger txns with unparseable dates", total - txns.len());
        }
        Ok(txns)
    }

    /// Account names, cached for the run so validate and reconcile don't
    /// each pay for the same lookup.
    pub fn account_names(&mut self) -> Result<Vec<String>> {
        let now = Instant::now();
        if let Some(cached) = self.accounts.get(now) {
            return Ok(cached.clone());
        }
        let url = format!("{}/budgets/{}/accounts", self.base_url, self.budget_id);
        let response: AccountListResponse = self.get_json("ledger accounts", &url)?;
        let names: Vec<String> = response.data.accounts.into_iter().map(|a| a.name).collect();
        self.accounts.put(names.clone(), now);
        Ok(names)
    }

    /// Write the reconciliation memo onto a matched transaction. Not
    /// retried: replaying a write after an ambiguous failure risks a
    /// double update.
    pub fn annotate_matched(&self, txn: &LedgerTxn, label: &str) -> Result<()> {
        let url = format!(
            "{}/budgets/{}/transactions/{}",
            self.base_url, self.budget_id, txn.id
        );
        let body = json!({
            "transaction": { "memo": format!("{label} {MEMO_TAG}") }
        });
        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(SettleError::Ledger {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_milliunits_to_cents() {
        assert_eq!(milliunits_to_cents(-49990), -4999);
        assert_eq!(milliunits_to_cents(49990), 4999);
        assert_eq!(milliunits_to_cents(0), 0);
        assert_eq!(milliunits_to_cents(-1500), -150);
    }

    #[test]
    fn test_milliunits_to_cents_rounds_odd_values() {
        assert_eq!(milliunits_to_cents(49995), 5000);
        assert_eq!(milliunits_to_cents(49994), 4999);
        assert_eq!(milliunits_to_cents(-49995), -5000);
    }

    #[test]
    fn test_txn_from_dto() {
        let dto = TxnDto {
            id: "t-1".to_string(),
            date: "2025-01-10".to_string(),
            amount: -49990,
            payee_name: Some("Amazon".to_string()),
            memo: None,
            account_name: "Chase Visa".to_string(),
        };
        let txn = txn_from_dto(dto).unwrap();
        assert_eq!(txn.amount_cents, -4999);
        assert_eq!(txn.payee, "Amazon");
        assert_eq!(txn.date, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
    }

    #[test]
    fn test_txn_from_dto_rejects_bad_date() {
        let dto = TxnDto {
            id: "t-1".to_string(),
            date: "01/10/2025".to_string(),
            amount: 0,
            payee_name: None,
            memo: None,
            account_name: String::new(),
        };
        assert!(txn_from_dto(dto).is_none());
    }

    #[test]
    fn test_transaction_list_response_shape() {
        let json = r#"{
            "data": {
                "transactions": [
                    {
                        "id": "t-1",
                        "date": "2025-01-10",
                        "amount": -49990,
                        "payee_name": "Amazon",
                        "memo": "prior note",
                        "account_name": "Chase Visa"
                    }
                ]
            }
        }"#;
        let parsed: TxnListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.data.transactions.len(), 1);
        assert_eq!(parsed.data.transactions[0].memo.as_deref(), Some("prior note"));
    }
}
