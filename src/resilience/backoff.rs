//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Delay before retry `attempt` (1-based): `base * 2^(attempt-1)`, capped at
/// `max_ms`, plus up to 10% jitter. Attempt 0 never waits.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exponential = 2u64.saturating_pow(attempt - 1);
    let capped = base_ms.saturating_mul(exponential).min(max_ms);

    let jitter_range = capped / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 100, 110)]
    #[case(2, 200, 220)]
    #[case(3, 400, 440)]
    #[case(10, 1000, 1100)]
    fn test_backoff_bounds(#[case] attempt: u32, #[case] low: u128, #[case] high: u128) {
        let delay = calculate_backoff(attempt, 100, 1000).as_millis();
        assert!(delay >= low && delay < high, "attempt {attempt}: {delay}ms");
    }

    #[test]
    fn test_first_attempt_has_no_delay() {
        assert_eq!(calculate_backoff(0, 100, 1000), Duration::ZERO);
    }

    #[test]
    fn test_huge_attempt_saturates() {
        let delay = calculate_backoff(200, 100, 2000);
        assert!(delay.as_millis() >= 2000);
    }
}
