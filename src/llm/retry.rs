//! Exponential backoff retry for LLM calls.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use tracing::warn;

/// Total attempts, including the first.
pub const MAX_ATTEMPTS: u32 = 3;

/// Delay before the second attempt; doubles for each attempt after that.
pub const BASE_DELAY: Duration = Duration::from_millis(1000);

fn draft_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        current_interval: BASE_DELAY,
        initial_interval: BASE_DELAY,
        randomization_factor: 0.0,
        multiplier: 2.0,
        max_interval: Duration::from_secs(30),
        max_elapsed_time: None,
        ..Default::default()
    }
}

/// Retry an async operation with exponential backoff.
///
/// `attempt` is called up to [`MAX_ATTEMPTS`] times, sleeping 1s then 2s
/// between failures. `wrap_exhausted` turns the last error into the
/// caller's "retries exhausted" error.
pub async fn retry_with_backoff<T, E, Fut, F, W>(
    mut attempt: F,
    wrap_exhausted: W,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    W: FnOnce(E) -> E,
{
    let mut backoff = draft_backoff();
    let mut attempts = 0;

    loop {
        attempts += 1;

        let error = match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if attempts >= MAX_ATTEMPTS {
            return Err(wrap_exhausted(error));
        }

        let Some(wait) = backoff.next_backoff() else {
            return Err(wrap_exhausted(error));
        };

        warn!(
            "Attempt {}/{} failed ({}), retrying in {}ms",
            attempts,
            MAX_ATTEMPTS,
            error,
            wait.as_millis()
        );
        tokio::time::sleep(wait).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use std::cell::Cell;

    fn overloaded() -> LlmError {
        LlmError::Status {
            provider: "openai",
            status: 529,
            body: "overloaded".into(),
        }
    }

    fn exhausted(e: LlmError) -> LlmError {
        LlmError::RetriesExhausted(Box::new(e))
    }

    #[test]
    fn test_backoff_delays_are_exact() {
        let mut backoff = draft_backoff();
        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(1)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_never_sleeps() {
        let start = tokio::time::Instant::now();
        let reply = retry_with_backoff(|| async { Ok::<_, LlmError>("draft") }, exhausted).await;
        assert_eq!(reply.unwrap(), "draft");
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_three_calls() {
        let calls = Cell::new(0);
        let start = tokio::time::Instant::now();

        let reply: Result<String, LlmError> = retry_with_backoff(
            || {
                calls.set(calls.get() + 1);
                async { Err(overloaded()) }
            },
            exhausted,
        )
        .await;

        match reply {
            Err(LlmError::RetriesExhausted(last)) => {
                assert!(matches!(*last, LlmError::Status { status: 529, .. }))
            }
            other => panic!("expected RetriesExhausted, got {:?}", other),
        }
        assert_eq!(calls.get(), MAX_ATTEMPTS);
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_third_call_succeeds_after_three_seconds() {
        let calls = Cell::new(0u32);
        let start = tokio::time::Instant::now();

        let reply = retry_with_backoff(
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 3 {
                        Err(LlmError::EmptyResponse("google"))
                    } else {
                        Ok("{}".to_string())
                    }
                }
            },
            exhausted,
        )
        .await;

        assert_eq!(reply.unwrap(), "{}");
        assert_eq!(calls.get(), 3);
        assert!(start.elapsed() >= Duration::from_millis(3000));
    }
}
