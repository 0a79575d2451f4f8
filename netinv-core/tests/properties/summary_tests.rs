//! Property tests for run summaries

use std::time::Duration;

use netinv_core::{
    CollectionSummary, DeviceFailure, DeviceId, DeviceResult, FailureKind, InventoryRecord, Stage, Vendor,
};
use proptest::prelude::*;

const KINDS: [FailureKind; 9] = [
    FailureKind::ConnectError,
    FailureKind::AuthError,
    FailureKind::CommandTimeout,
    FailureKind::TransportError,
    FailureKind::ParseError,
    FailureKind::UnsupportedVendor,
    FailureKind::Cancelled,
    FailureKind::Timeout,
    FailureKind::Internal,
];

/// `None` is a success with the given vendor, `Some` a failure
fn outcome_strategy() -> impl Strategy<Value = (Option<FailureKind>, Vendor)> {
    (
        prop::option::of(prop::sample::select(KINDS.to_vec())),
        prop::sample::select(Vendor::ALL.to_vec()),
    )
}

fn build(outcomes: &[(Option<FailureKind>, Vendor)]) -> Vec<DeviceResult> {
    outcomes
        .iter()
        .enumerate()
        .map(|(i, (kind, vendor))| {
            let id = DeviceId::new(format!("dev-{i}"));
            match kind {
                None => {
                    let record = InventoryRecord::new(id.clone(), format!("sw{i}"), *vendor);
                    DeviceResult::success(id, "10.0.0.1", record, Duration::from_millis(10))
                }
                Some(kind) => {
                    let failure = DeviceFailure::new(*kind, Stage::Command, "failed");
                    DeviceResult::failure(id, "10.0.0.1", failure, Duration::from_millis(10))
                }
            }
        })
        .collect()
}

proptest! {
    /// Property: Every result is counted exactly once
    #[test]
    fn summary_counts_every_result(outcomes in prop::collection::vec(outcome_strategy(), 0..40)) {
        let results = build(&outcomes);
        let summary = CollectionSummary::from_results(&results, Duration::from_secs(1));

        prop_assert_eq!(summary.total, results.len());
        prop_assert_eq!(summary.succeeded + summary.failed, summary.total);
        prop_assert_eq!(summary.by_vendor.values().sum::<usize>(), summary.succeeded);
        prop_assert_eq!(summary.by_failure.values().sum::<usize>(), summary.failed);
        prop_assert_eq!(
            summary.cancelled,
            summary.by_failure.get(&FailureKind::Cancelled).copied().unwrap_or(0)
        );
    }

    /// Property: Success rate stays within 0..=100
    #[test]
    fn success_rate_is_a_percentage(outcomes in prop::collection::vec(outcome_strategy(), 0..40)) {
        let results = build(&outcomes);
        let summary = CollectionSummary::from_results(&results, Duration::ZERO);
        let rate = summary.success_rate();

        prop_assert!((0.0..=100.0).contains(&rate));
        prop_assert_eq!(summary.all_succeeded(), !summary.has_failures());
    }
}
