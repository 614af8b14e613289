//! Exponential backoff for outbound calls.

use std::{fmt::Display, future::Future, time::Duration};

/// How often, and how patiently, to repeat a failed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total attempts including the first; values below 1 act as 1.
  pub max_attempts: u32,
  pub base_delay:   Duration,
  pub multiplier:   u32,
  pub max_delay:    Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      base_delay:   Duration::from_millis(250),
      multiplier:   2,
      max_delay:    Duration::from_secs(2),
    }
  }
}

impl RetryPolicy {
  /// A single attempt, no retries.
  pub fn none() -> Self { Self { max_attempts: 1, ..Self::default() } }

  /// Sleep before retrying after the `attempt`-th failure (1-based).
  pub fn delay_for(&self, attempt: u32) -> Duration {
    let factor = self.multiplier.saturating_pow(attempt.saturating_sub(1));
    self.base_delay.saturating_mul(factor).min(self.max_delay)
  }

  /// Run `op` until it succeeds, fails with an error `retryable` rejects, or
  /// the attempts run out. The last error is returned.
  pub async fn run<T, E, F, Fut>(
    &self,
    label: &str,
    retryable: impl Fn(&E) -> bool,
    mut op: F,
  ) -> Result<T, E>
  where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    let attempts = self.max_attempts.max(1);
    let mut attempt = 1;
    loop {
      match op().await {
        Ok(value) => return Ok(value),
        Err(e) if attempt < attempts && retryable(&e) => {
          let delay = self.delay_for(attempt);
          tracing::warn!(label, attempt, attempts, error = %e, ?delay, "retrying");
          tokio::time::sleep(delay).await;
          attempt += 1;
        }
        Err(e) => return Err(e),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicU32, Ordering};

  use super::*;

  fn quick(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
      max_attempts,
      base_delay: Duration::from_millis(1),
      multiplier: 2,
      max_delay: Duration::from_millis(4),
    }
  }

  #[test]
  fn delay_grows_and_caps() {
    let p = RetryPolicy::default();
    assert_eq!(p.delay_for(1), Duration::from_millis(250));
    assert_eq!(p.delay_for(2), Duration::from_millis(500));
    assert_eq!(p.delay_for(3), Duration::from_secs(1));
    assert_eq!(p.delay_for(10), Duration::from_secs(2));
  }

  #[tokio::test]
  async fn retries_until_success() {
    let counter = AtomicU32::new(0);
    let calls = &counter;
    let out: Result<u32, String> = quick(3)
      .run("test", |_| true, move || async move {
        match calls.fetch_add(1, Ordering::SeqCst) {
          0 | 1 => Err("flaky".to_owned()),
          n => Ok(n),
        }
      })
      .await;
    assert_eq!(out, Ok(2));
    assert_eq!(counter.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn gives_up_after_max_attempts() {
    let counter = AtomicU32::new(0);
    let calls = &counter;
    let out: Result<(), String> = quick(2)
      .run("test", |_| true, move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err("down".to_owned())
      })
      .await;
    assert_eq!(out, Err("down".to_owned()));
    assert_eq!(counter.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn non_retryable_errors_return_immediately() {
    let counter = AtomicU32::new(0);
    let calls = &counter;
    let out: Result<(), String> = quick(5)
      .run("test", |e: &String| *e != "fatal", move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err("fatal".to_owned())
      })
      .await;
    assert!(out.is_err());
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }
}
