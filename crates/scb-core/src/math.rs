//! Mathematical utilities shared across the band crates

/// Empirical quantile using Hyndman-Fan definition 8 (median-unbiased)
///
/// Non-finite values sort with `f64::total_cmp`, so `+inf` lands at the top.
/// Returns `None` for empty input or `p` outside `[0, 1]`.
pub fn empirical_quantile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(quantile_sorted(&sorted, p))
}

/// Type-8 quantile of already sorted, non-empty data
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    let h = (n as f64 + 1.0 / 3.0) * p + 1.0 / 3.0;
    if h <= 1.0 {
        return sorted[0];
    }
    if h >= n as f64 {
        return sorted[n - 1];
    }
    let lo = h.floor();
    let frac = h - lo;
    let i = lo as usize - 1;
    if frac == 0.0 {
        sorted[i]
    } else {
        sorted[i] + frac * (sorted[i + 1] - sorted[i])
    }
}

/// Linearly interpolate `(x, y)` onto `x_new`
///
/// `x` must be strictly increasing; points outside its range are clamped to
/// the boundary values.
pub fn interpolate_linear(x: &[f64], y: &[f64], x_new: &[f64]) -> Vec<f64> {
    debug_assert_eq!(x.len(), y.len());
    x_new
        .iter()
        .map(|&t| {
            if t <= x[0] {
                return y[0];
            }
            let last = x.len() - 1;
            if t >= x[last] {
                return y[last];
            }
            // First index with x[k] > t; 1 <= k <= last
            let k = x.partition_point(|&xi| xi <= t);
            let w = (t - x[k - 1]) / (x[k] - x[k - 1]);
            y[k - 1] + w * (y[k] - y[k - 1])
        })
        .collect()
}

/// Check a grid is finite and strictly increasing
pub fn is_strictly_increasing(x: &[f64]) -> bool {
    x.iter().all(|v| v.is_finite()) && x.windows(2).all(|w| w[0] < w[1])
}
