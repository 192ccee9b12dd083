//! Bounded, fixed-delay retries for startup connectivity.

use log::*;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Retries an operation a fixed number of times with a constant pause between attempts.
#[derive(Clone, Copy, Debug)]
pub struct StartupRetry {
    max_attempts: u32,
    delay: Duration,
}

impl StartupRetry {
    /// `max_attempts` counts the first try; zero is treated as one.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Runs `op` until it succeeds or attempts are exhausted, returning the last error.
    pub async fn run<T, E, F, Fut>(&self, target: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts => {
                    warn!(
                        "retrying connection to {target} during initial startup ({attempt}/{}): {e}",
                        self.max_attempts
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
