//! Fixed-interval retry for remote calls that race with provisioning.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::clients::ApiResult;

/// Total attempts for enabling private networking on an instance.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 11;

/// Wait between attempts.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Bounded retry with a fixed sleep between attempts.
///
/// Conflicts are returned immediately: the requested state already holds and
/// repeating the call cannot change that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }

    /// Run `op` until it succeeds, conflicts, or the attempt budget is spent.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> ApiResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_conflict() => return Err(e),
                Err(e) if attempt >= self.max_attempts => {
                    warn!("{} failed after {} attempts: {}", what, attempt, e);
                    return Err(e);
                }
                Err(e) => {
                    debug!(
                        "{} failed (attempt {}/{}): {}",
                        what, attempt, self.max_attempts, e
                    );
                    tokio::time::sleep(self.interval).await;
                    attempt += 1;
                }
            }
        }
    }
}
