//! Property-based tests for band ordering

use functional_scb::prelude::*;
use proptest::prelude::*;

/// Samples of 3..12 realizations on 2..15 grid points
fn sample_strategy() -> impl Strategy<Value = FunctionalSample> {
    (3usize..12, 2usize..15).prop_flat_map(|(n, k)| {
        proptest::collection::vec(proptest::collection::vec(-100.0f64..100.0, k), n)
            .prop_map(|curves| FunctionalSample::from_curves(&curves).unwrap())
    })
}

fn assert_ordered(result: &ScbResult) -> std::result::Result<(), TestCaseError> {
    for i in 0..result.estimate.len() {
        prop_assert!(result.lower()[i] <= result.estimate[i]);
        prop_assert!(result.estimate[i] <= result.upper()[i]);
    }
    prop_assert!(result.quantile >= 0.0);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn band_contains_estimate(
        sample in sample_strategy(),
        level in 0.5f64..0.99,
        method in prop::sample::select(vec!["GKF", "tGKF", "MultiplierBootstrap"]),
    ) {
        let options = QuantileOptions::new().with_mboots(200).with_seed(1);
        match scb_mean(&sample, level, method, &options) {
            Ok(result) => assert_ordered(&result)?,
            // Degenerate random inputs may legitimately fail numerically
            Err(Error::Numerical { .. }) => {}
            Err(e) => prop_assert!(false, "unexpected error: {e}"),
        }
    }

    #[test]
    fn snr_band_contains_estimate(sample in sample_strategy(), level in 0.5f64..0.99) {
        match scb_snr(&sample, level, "GKF", &QuantileOptions::new()) {
            Ok(result) => assert_ordered(&result)?,
            Err(Error::Numerical { .. }) => {}
            Err(e) => prop_assert!(false, "unexpected error: {e}"),
        }
    }

    #[test]
    fn band_is_symmetric_about_estimate(sample in sample_strategy()) {
        if let Ok(result) = scb_mean(&sample, 0.9, "GKF", &QuantileOptions::new()) {
            for i in 0..result.estimate.len() {
                let up = result.upper()[i] - result.estimate[i];
                let down = result.estimate[i] - result.lower()[i];
                prop_assert!((up - down).abs() <= 1e-9 * (1.0 + up.abs()));
            }
        }
    }
}
