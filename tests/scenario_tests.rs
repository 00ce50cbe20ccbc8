//! End-to-end scenarios on simulated smooth fields

use approx::assert_relative_eq;
use functional_scb::prelude::*;
use functional_scb::scb_fields::{zero_mean, FieldGenerator, LinearSd};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Once;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[test]
fn test_large_sample_gkf_band() {
    init_tracing();
    let mut rng = ChaCha8Rng::seed_from_u64(500);
    let field = SinCosField::new(100, vec![1.5]).unwrap();
    let sample = sample_field(&field, 500, zero_mean, &ConstantSd(1.0), &mut rng).unwrap();

    for method in ["GKF", "tGKF"] {
        let result = scb_mean(&sample, 0.95, method, &QuantileOptions::new()).unwrap();
        assert!(
            result.quantile > 2.2 && result.quantile < 2.45,
            "{method}: q = {}",
            result.quantile
        );

        let mean = sample.pointwise_mean();
        let var = sample.pointwise_variance(&mean);
        for p in 0..100 {
            let expected = result.quantile * var[p].sqrt() / 500f64.sqrt();
            assert_relative_eq!(result.upper()[p] - result.estimate[p], expected, epsilon = 1e-10);
            assert_relative_eq!(result.estimate[p] - result.lower()[p], expected, epsilon = 1e-10);
        }
    }
}

#[test]
fn test_mean_band_coverage() {
    init_tracing();
    let field = SinCosField::new(50, vec![1.5, 4.0]).unwrap();
    let sd = LinearSd { start: 0.5, end: 2.0 };
    let mean = |t: &[f64]| (4.0 * t[0]).cos();
    let truth: Vec<f64> = functional_scb::scb_fields::grid_coordinates(field.grid())
        .iter()
        .map(|x| mean(x))
        .collect();

    let trials = 200;
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let mut covered = 0;
    for _ in 0..trials {
        let sample = sample_field(&field, 100, mean, &sd, &mut rng).unwrap();
        let result = scb_mean(&sample, 0.95, "tGKF", &QuantileOptions::new()).unwrap();
        if result.covers(&truth) {
            covered += 1;
        }
    }
    let coverage = covered as f64 / trials as f64;
    assert!(coverage > 0.89 && coverage <= 0.995, "coverage = {coverage}");
}

#[test]
fn test_bootstrap_seed_reproducibility() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let field = GaussDensityField::new(GridDims::OneD(60), 8, 0.1).unwrap();
    let sample = sample_field(&field, 40, zero_mean, &ConstantSd(1.0), &mut rng).unwrap();

    for method in ["NonParametricBootstrap", "MultiplierBootstrap"] {
        let options = QuantileOptions::new().with_mboots(800).with_seed(99);
        let first = scb_mean(&sample, 0.9, method, &options).unwrap();
        let second = scb_mean(&sample, 0.9, method, &options.clone().with_execution(ExecutionStrategy::Parallel))
            .unwrap();
        assert_eq!(first.quantile.to_bits(), second.quantile.to_bits(), "{method}");
        assert_eq!(first.band, second.band);
    }
}

#[test]
fn test_invalid_inputs_rejected_by_every_entry_point() {
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let field = SinCosField::new(20, vec![2.0]).unwrap();
    let sample = sample_field(&field, 10, zero_mean, &ConstantSd(1.0), &mut rng).unwrap();
    let other = sample_field(&field, 12, zero_mean, &ConstantSd(1.0), &mut rng).unwrap();
    let design = nalgebra::DMatrix::from_element(10, 1, 1.0);
    let contrast = nalgebra::DVector::from_element(1, 1.0);

    let run = |level: f64, method: &str, options: &QuantileOptions| -> Vec<Result<ScbResult>> {
        vec![
            scb_mean(&sample, level, method, options),
            scb_meandiff(&sample, &other, level, method, options),
            scb_snr(&sample, level, method, options),
            scb_delta(&sample, &Skewness, level, method, options),
            scb_contrast(&sample, &design, &contrast, ContrastGrid::Raw, level, method, options),
        ]
    };

    for level in [1.0, 0.0, -0.1] {
        for result in run(level, "tGKF", &QuantileOptions::new()) {
            assert!(matches!(result, Err(Error::InvalidParameter(_))));
        }
    }
    for mboots in [0.0, 2.5] {
        let options = QuantileOptions::new().with_mboots(mboots);
        for result in run(0.95, "NonParametricBootstrap", &options) {
            assert!(matches!(result, Err(Error::InvalidParameter(_))));
        }
    }
    for result in run(0.95, "bogus", &QuantileOptions::new()) {
        assert!(matches!(result, Err(Error::UnsupportedMethod(_))));
    }
    for result in run(0.95, "gkf", &QuantileOptions::new()) {
        assert!(result.is_ok());
    }
}

#[test]
fn test_options_from_json_end_to_end() {
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let field = SinCosField::new(30, vec![2.0, 3.0]).unwrap();
    let sample = sample_field(&field, 25, zero_mean, &ConstantSd(1.0), &mut rng).unwrap();

    let options = QuantileOptions::from_json(
        r#"{"Mboots": 600, "seed": 3, "bootstrap": "regular", "multiplier": "rademacher"}"#,
    )
    .unwrap();
    let result = scb_mean(&sample, 0.95, "MultiplierBootstrap", &options).unwrap();
    assert_eq!(result.method, QuantileMethod::MultiplierBootstrap);

    let built = QuantileOptions::new()
        .with_mboots(600)
        .with_seed(3)
        .with_bootstrap_variant(BootstrapVariant::Regular)
        .with_multiplier(MultiplierKind::Rademacher);
    let expected = scb_mean(&sample, 0.95, "MultiplierBootstrap", &built).unwrap();
    assert_eq!(result.quantile, expected.quantile);
}

#[test]
fn test_cancelled_bootstrap() {
    let mut rng = ChaCha8Rng::seed_from_u64(10);
    let field = SinCosField::new(30, vec![2.0]).unwrap();
    let sample = sample_field(&field, 25, zero_mean, &ConstantSd(1.0), &mut rng).unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let options = QuantileOptions::new().with_mboots(1000).with_cancellation(token);
    let result = scb_mean(&sample, 0.95, "NonParametricBootstrap", &options);
    assert!(matches!(result, Err(Error::Cancelled(_))));
}
