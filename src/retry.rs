//! Bounded retry with a fixed delay.
//!
//! Deletes on the documentation tree can hit transient locks (an index
//! rebuild still scanning files, the OS releasing handles after
//! extraction), so filesystem operations that may contend are retried a
//! fixed number of times before the failure is surfaced.

use std::io;
use std::time::Duration;

use tracing::{debug, warn};

/// Attempts used for contended filesystem deletes.
pub const DEFAULT_ATTEMPTS: u32 = 5;

/// Fixed delay between attempts.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Runs `op` up to `attempts` times, sleeping `delay` between failures.
/// Returns the last error once the bound is exhausted.
pub async fn retry<T, F>(attempts: u32, delay: Duration, mut op: F) -> io::Result<T>
where
    F: FnMut() -> io::Result<T>,
{
    debug_assert!(attempts > 0);
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                warn!(
                    attempt = attempt,
                    attempts = attempts,
                    error = ?e,
                    "Operation failed, retrying after fixed delay"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                debug!(attempts = attempts, error = ?e, "Retry bound exhausted");
                return Err(e);
            }
        }
    }
}
