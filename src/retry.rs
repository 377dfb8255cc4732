use std::fmt::Display;
use std::time::Duration;

use rand::Rng;

/// Retry policy shared by the API clients: a small attempt ceiling with
/// doubling delays, no transient/permanent distinction.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl Backoff {
    /// Delay before retrying after the given zero-based failed attempt,
    /// with up to 100ms of jitter.
    fn delay_after(&self, attempt: u32) -> Duration {
        let backoff = self.base_delay * 2u32.saturating_pow(attempt);
        let jitter = rand::thread_rng().gen_range(0..100);
        backoff + Duration::from_millis(jitter)
    }
}

/// Run `op` until it succeeds or the attempt ceiling is reached. Failed
/// attempts are logged; the last error is returned once the ceiling hits.
pub fn retry<T, E: Display>(
    label: &str,
    backoff: &Backoff,
    mut op: impl FnMut() -> std::result::Result<T, E>,
) -> std::result::Result<T, E> {
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if attempt + 1 < backoff.max_attempts => {
                log::warn!(
                    "{label}: attempt {}/{} failed: {err}",
                    attempt + 1,
                    backoff.max_attempts
                );
                std::thread::sleep(backoff.delay_after(attempt));
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
