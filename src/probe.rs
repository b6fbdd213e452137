//! Polling until the page shows what we are waiting for.

use std::future::Future;

use crate::clock::Sleeper;
use crate::config::ProbeConfig;

/// Whether a probe result counts as "found".
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl<T> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.is_some()
    }
}

impl<T> Truthy for Vec<T> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for &str {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

/// An error is never truthy, so a failing probe is simply retried.
impl<T: Truthy, E> Truthy for Result<T, E> {
    fn is_truthy(&self) -> bool {
        matches!(self, Ok(value) if value.is_truthy())
    }
}

/// Run `probe` until it returns something truthy or the retry budget runs out.
///
/// Waits `config.interval` between attempts (never after the last one) and
/// returns the last result either way. Callers check truthiness themselves.
pub async fn probe_till_true<T, F, Fut>(
    mut probe: F,
    config: &ProbeConfig,
    sleeper: &dyn Sleeper,
) -> T
where
    T: Truthy,
    F: FnMut() -> Fut,
    Fut: Future<Output = T>,
{
    let tries = config.tries.max(1);
    let mut attempt = 1;
    loop {
        let result = probe().await;
        if result.is_truthy() || attempt >= tries {
            if !result.is_truthy() {
                tracing::debug!(tries, "probe gave up");
            }
            return result;
        }
        tracing::trace!(attempt, tries, "probe not ready yet");
        sleeper.sleep(config.interval).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::RecordingSleeper;
    use std::cell::Cell;
    use std::time::Duration;

    fn config(tries: u32) -> ProbeConfig {
        ProbeConfig {
            tries,
            interval: Duration::from_millis(1000),
        }
    }

    #[tokio::test]
    async fn test_stops_at_first_truthy_result() {
        let sleeper = RecordingSleeper::new();
        let calls = Cell::new(0);

        let result = probe_till_true(
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { (n >= 3).then_some(n) }
            },
            &config(10),
            &sleeper,
        )
        .await;

        assert_eq!(result, Some(3));
        assert_eq!(calls.get(), 3);
        assert_eq!(sleeper.sleeps(), vec![Duration::from_millis(1000); 2]);
    }

    #[tokio::test]
    async fn test_immediate_success_does_not_sleep() {
        let sleeper = RecordingSleeper::new();
        let result = probe_till_true(|| async { true }, &config(10), &sleeper).await;

        assert!(result);
        assert!(sleeper.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_budget_returns_last_falsy_value() {
        let sleeper = RecordingSleeper::new();
        let calls = Cell::new(0);

        let result: Vec<u32> = probe_till_true(
            || {
                calls.set(calls.get() + 1);
                async { Vec::new() }
            },
            &config(10),
            &sleeper,
        )
        .await;

        assert!(result.is_empty());
        assert_eq!(calls.get(), 10);
        assert_eq!(sleeper.sleeps().len(), 9);
        assert_eq!(sleeper.total(), Duration::from_secs(9));
    }

    #[tokio::test]
    async fn test_errors_are_retried_and_last_error_returned() {
        let sleeper = RecordingSleeper::new();
        let calls = Cell::new(0);

        let result: Result<Option<u8>, String> = probe_till_true(
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { Err(format!("attempt {n}")) }
            },
            &config(3),
            &sleeper,
        )
        .await;

        assert_eq!(result, Err("attempt 3".to_string()));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_zero_budget_still_probes_once() {
        let sleeper = RecordingSleeper::new();
        let calls = Cell::new(0);

        let result = probe_till_true(
            || {
                calls.set(calls.get() + 1);
                async { None::<()> }
            },
            &config(0),
            &sleeper,
        )
        .await;

        assert_eq!(result, None);
        assert_eq!(calls.get(), 1);
        assert!(sleeper.sleeps().is_empty());
    }

    #[test]
    fn test_truthiness() {
        assert!(Some(0).is_truthy());
        assert!(!None::<u8>.is_truthy());
        assert!(!"".is_truthy());
        assert!(Ok::<_, ()>(Some(1)).is_truthy());
        assert!(!Ok::<Option<u8>, ()>(None).is_truthy());
        assert!(!Err::<bool, _>("x").is_truthy());
    }
}
