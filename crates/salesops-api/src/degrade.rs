//! Turning failed sub-queries into empty results.
//!
//! Reports fan out several independent reads. A failed read is logged and
//! replaced by an empty value so the report keeps its full shape; the failure
//! is described in the report's `error` field.

use std::fmt::Display;

#[derive(Debug, Default)]
pub(crate) struct Degraded {
  failures: Vec<String>,
}

impl Degraded {
  /// The value on success, `T::default()` on failure.
  pub fn take<T: Default, E: Display>(&mut self, what: &str, result: Result<T, E>) -> T {
    match result {
      Ok(value) => value,
      Err(e) => {
        tracing::warn!(source = what, error = %e, "degrading to empty result");
        self.failures.push(format!("{what} unavailable: {e}"));
        T::default()
      }
    }
  }

  pub fn message(&self) -> Option<String> {
    if self.failures.is_empty() {
      None
    } else {
      Some(self.failures.join("; "))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn collects_every_failure() {
    let mut d = Degraded::default();
    let ok: Vec<u8> = d.take("a", Ok::<_, String>(vec![1]));
    let failed: Vec<u8> = d.take("b", Err("timeout"));
    let _: u32 = d.take("c", Err("502"));
    assert_eq!(ok, vec![1]);
    assert!(failed.is_empty());
    assert_eq!(d.message().as_deref(), Some("b unavailable: timeout; c unavailable: 502"));
  }

  #[test]
  fn no_failures_no_message() {
    assert_eq!(Degraded::default().message(), None);
  }
}
