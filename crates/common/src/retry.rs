use std::future::Future;
use std::time::Duration;

/// Exponential backoff schedule shared by the router, the notifier and the
/// workflow's remediation retry loop.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter_fraction: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter_fraction: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after the given failed attempt (1-based).
    /// Doubles per attempt, capped at `max_delay`, with additive jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        let raw = self.base_delay.as_secs_f64() * 2f64.powi(exp as i32);
        let capped = raw.min(self.max_delay.as_secs_f64());
        apply_jitter(Duration::from_secs_f64(capped), self.jitter_fraction)
    }
}

pub async fn retry_async<F, Fut, T, E>(policy: &RetryPolicy, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut last_err = None;

    for attempt in 1..=policy.max_attempts {
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                tracing::warn!(attempt, max = policy.max_attempts, error = %e, "attempt failed");
                last_err = Some(e);
                if attempt < policy.max_attempts {
                    tokio::time::sleep(policy.delay_for(attempt)).await;
                }
            }
        }
    }

    Err(last_err.unwrap())
}

pub fn apply_jitter(base: Duration, jitter_fraction: f64) -> Duration {
    if jitter_fraction <= 0.0 {
        return base;
    }
    let jitter_max = base.as_secs_f64() * jitter_fraction.clamp(0.0, 1.0);
    let offset = rand_f64() * jitter_max;
    Duration::from_secs_f64(base.as_secs_f64() + offset)
}

fn rand_f64() -> f64 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};
    let s = RandomState::new();
    let mut h = s.build_hasher();
    h.write_u64(0);
    (h.finish() as f64) / (u64::MAX as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(8),
            jitter_fraction: 0.0,
        }
    }

    #[test]
    fn delay_doubles_until_cap() {
        let p = fast_policy(5);
        assert_eq!(p.delay_for(1), Duration::from_millis(1));
        assert_eq!(p.delay_for(2), Duration::from_millis(2));
        assert_eq!(p.delay_for(3), Duration::from_millis(4));
        assert_eq!(p.delay_for(4), Duration::from_millis(8));
        assert_eq!(p.delay_for(5), Duration::from_millis(8));
    }

    #[test]
    fn jitter_never_reduces_delay() {
        let base = Duration::from_secs(10);
        for _ in 0..100 {
            let d = apply_jitter(base, 0.5);
            assert!(d >= base);
            assert!(d.as_secs_f64() <= 15.0);
        }
    }

    #[tokio::test]
    async fn succeeds_on_first_try() {
        let result = retry_async(&fast_policy(3), || async { Ok::<_, String>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn succeeds_after_retries() {
        let counter = AtomicU32::new(0);
        let result: Result<u32, String> = retry_async(&fast_policy(3), || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if attempt < 3 {
                    Err("not yet".to_string())
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn exhausts_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let result: Result<(), String> = retry_async(&fast_policy(2), || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err("always fails".to_string()) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
