use std::future::Future;
use std::time::Duration;

use crate::error::ProvisionerError;

/// Fixed delay between checks, fixed number of checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_attempts: 50,
        }
    }
}

impl PollPolicy {
    /// Upper bound on the sleeping done by one `poll_until` call.
    pub fn max_wait(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }
}

/// What one probe saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    Ready(T),
    Pending,
}

/// Run `probe` until it reports `Ready`, sleeping `interval` between checks.
///
/// A probe error ends the wait immediately. Running out of attempts yields
/// `ProvisionerError::TimedOut` instead of blocking forever.
pub async fn poll_until<T, F, Fut>(
    policy: &PollPolicy,
    what: &str,
    mut probe: F,
) -> Result<T, ProvisionerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Probe<T>, ProvisionerError>>,
{
    for attempt in 1..=policy.max_attempts {
        if attempt > 1 {
            tokio::time::sleep(policy.interval).await;
        }

        match probe().await? {
            Probe::Ready(value) => {
                tracing::debug!(what, attempt, "wait finished");
                return Ok(value);
            }
            Probe::Pending => {
                tracing::debug!(what, attempt, "still waiting");
            }
        }
    }

    Err(ProvisionerError::TimedOut {
        what: what.to_string(),
        attempts: policy.max_attempts,
    })
}
