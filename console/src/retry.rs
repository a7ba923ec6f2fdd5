use std::time::Duration;

/// Polls `predicate` up to `attempts` times, `interval` apart, returning as
/// soon as it holds. Returns `false` when every attempt came up empty.
pub async fn wait_until<F>(mut predicate: F, attempts: u32, interval: Duration) -> bool
where
    F: FnMut() -> bool,
{
    for attempt in 0..attempts {
        if predicate() {
            return true;
        }
        if attempt + 1 < attempts {
            tokio::time::sleep(interval).await;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn returns_true_once_predicate_holds() {
        let polls = AtomicU32::new(0);
        let outcome = wait_until(
            || polls.fetch_add(1, Ordering::SeqCst) >= 3,
            50,
            Duration::from_millis(50),
        )
        .await;

        assert!(outcome);
        assert_eq!(polls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_the_attempt_budget() {
        let polls = AtomicU32::new(0);
        let outcome = wait_until(
            || {
                polls.fetch_add(1, Ordering::SeqCst);
                false
            },
            5,
            Duration::from_millis(50),
        )
        .await;

        assert!(!outcome);
        assert_eq!(polls.load(Ordering::SeqCst), 5);
    }
}
