//! Mean band for a simulated smooth field, with every quantile method
//!
//! Run with `RUST_LOG=debug` to see curvature estimates and bootstrap runs.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use scb_bands::scb_mean;
use scb_fields::{grid_coordinates, sample_field, FieldGenerator, LinearSd, SinCosField};
use scb_quantile::{QuantileMethod, QuantileOptions};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mean = |t: &[f64]| (2.0 * std::f64::consts::PI * t[0]).sin();
    let field = SinCosField::new(100, vec![1.5, 4.0])?;
    let mut rng = StdRng::seed_from_u64(2024);
    let sample = sample_field(&field, 80, mean, &LinearSd { start: 0.5, end: 1.5 }, &mut rng)?;
    let truth: Vec<f64> = grid_coordinates(field.grid()).iter().map(|x| mean(x)).collect();

    let options = QuantileOptions::new().with_mboots(5000).with_seed(7);
    for method in QuantileMethod::ALL {
        let result = scb_mean(&sample, 0.95, method.tag(), &options)?;
        println!("{result}");
        println!("  covers true mean: {}", result.covers(&truth));
    }
    Ok(())
}
