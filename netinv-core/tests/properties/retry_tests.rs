//! Property tests for connect retry backoff

use netinv_core::collector::{RetryConfig, RetryState};
use proptest::prelude::*;
use std::time::Duration;

/// Strategy for generating valid retry configurations
fn retry_config_strategy() -> impl Strategy<Value = RetryConfig> {
    (
        0u32..10,          // max_attempts
        1u64..10_000,      // initial_delay_ms
        1_000u64..120_000, // max_delay_ms
        1.0f64..5.0,       // backoff_multiplier
        any::<bool>(),     // enabled
    )
        .prop_map(
            |(max_attempts, initial_delay_ms, max_delay_ms, backoff_multiplier, enabled)| RetryConfig {
                max_attempts,
                initial_delay_ms,
                max_delay_ms: max_delay_ms.max(initial_delay_ms),
                backoff_multiplier,
                enabled,
            },
        )
}

proptest! {
    /// Property: Delay is always capped at max_delay_ms
    #[test]
    fn delay_never_exceeds_max(
        config in retry_config_strategy(),
        attempt in 0u32..20,
    ) {
        if let Some(delay) = config.delay_for_attempt(attempt) {
            prop_assert!(delay.as_millis() <= u128::from(config.max_delay_ms));
        }
    }

    /// Property: Delay does not decrease between attempts
    #[test]
    fn delay_increases_monotonically(config in retry_config_strategy()) {
        let mut prev_delay = Duration::ZERO;
        for attempt in 0..config.max_attempts {
            if let Some(delay) = config.delay_for_attempt(attempt) {
                prop_assert!(delay >= prev_delay, "Delay should not decrease");
                prev_delay = delay;
            }
        }
    }

    /// Property: A device is tried exactly total_attempts() times
    #[test]
    fn retry_state_allows_total_attempts(config in retry_config_strategy()) {
        let mut state = RetryState::new(config.clone());
        let mut tries = 1;
        while state.next_delay().is_some() {
            state.record_failure();
            tries += 1;
        }
        prop_assert_eq!(tries, config.total_attempts());
    }

    /// Property: Disabled retry never yields a delay
    #[test]
    fn disabled_retry_has_no_delay(
        config in retry_config_strategy(),
        attempt in 0u32..20,
    ) {
        let config = RetryConfig { enabled: false, ..config };
        prop_assert!(config.delay_for_attempt(attempt).is_none());
        prop_assert_eq!(config.total_attempts(), 1);
    }
}
