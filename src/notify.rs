use std::time::Duration;

use serde_json::json;

use crate::config::NotifyConfig;
use crate::error::{Result, SettleError};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Send a plain-text message through the configured transactional mailer.
/// Not retried: a duplicate email is worse than a missing one.
pub fn send(config: &NotifyConfig, token: &str, subject: &str, body: &str) -> Result<()> {
    let http = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()?;
    let payload = json!({
        "from": config.from,
        "to": config.to,
        "subject": subject,
        "text": body,
    });
    let response = http
        .post(&config.mailer_url)
        .bearer_auth(token)
        .json(&payload)
        .send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(SettleError::Other(format!(
            "mailer returned {}: {}",
            status.as_u16(),
            response.text().unwrap_or_default()
        )));
    }
    Ok(())
}
