//! Quantiles of posterior draws.
//!
//! All quantiles use the "R-7" definition (linear interpolation between order
//! statistics at `h = (n - 1) p`). Empty input yields `NaN`.

/// Compute a single quantile from a mutable slice.
///
/// Uses `select_nth_unstable()` for O(n) expected time complexity.
/// The slice is partially reordered as a side effect.
///
/// # Panics
///
/// Panics if `p` is outside [0, 1].
pub fn compute_quantile(data: &mut [f64], p: f64) -> f64 {
    assert!((0.0..=1.0).contains(&p), "Quantile probability must be in [0, 1]");

    let n = data.len();
    match n {
        0 => return f64::NAN,
        1 => return data[0],
        _ => {}
    }

    let h = (n - 1) as f64 * p;
    let h_floor = h.floor() as usize;
    let h_frac = h - h.floor();

    if h_floor >= n - 1 {
        let (_, &mut max, _) = data.select_nth_unstable_by(n - 1, |a, b| a.total_cmp(b));
        return max;
    }

    let (_, &mut lower, upper) = data.select_nth_unstable_by(h_floor, |a, b| a.total_cmp(b));
    if h_frac == 0.0 {
        return lower;
    }

    // Next order statistic is the minimum of the upper partition
    let upper_min = upper.iter().copied().min_by(|a, b| a.total_cmp(b)).unwrap_or(lower);

    lower + h_frac * (upper_min - lower)
}

/// Quantile at `p` of data already sorted in ascending order.
///
/// No verification of the ordering is performed.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }

    let h = (n - 1) as f64 * p.clamp(0.0, 1.0);
    let h_floor = h.floor() as usize;
    let h_frac = h - h.floor();

    if h_floor >= n - 1 {
        sorted[n - 1]
    } else if h_frac == 0.0 {
        sorted[h_floor]
    } else {
        sorted[h_floor] + h_frac * (sorted[h_floor + 1] - sorted[h_floor])
    }
}

/// Quantiles of `data` at each probability in `probabilities`.
///
/// Sorts a copy once and reads every quantile from it.
pub fn compute_quantiles(data: &[f64], probabilities: &[f64]) -> Vec<f64> {
    let mut sorted = data.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    probabilities.iter().map(|&p| quantile_sorted(&sorted, p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_quantile_median() {
        let mut data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((compute_quantile(&mut data, 0.5) - 3.0).abs() < 1e-10);

        let mut even = vec![4.0, 1.0, 3.0, 2.0];
        assert!((compute_quantile(&mut even, 0.5) - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_compute_quantile_extremes() {
        let mut data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let min = compute_quantile(&mut data.clone(), 0.0);
        let max = compute_quantile(&mut data, 1.0);
        assert!((min - 1.0).abs() < 1e-10);
        assert!((max - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_empty_is_nan() {
        assert!(compute_quantile(&mut [], 0.5).is_nan());
        assert!(quantile_sorted(&[], 0.5).is_nan());
    }

    #[test]
    fn test_selection_matches_sorted() {
        let data = vec![
            3.7, 1.2, 9.5, 2.1, 7.3, 4.8, 6.2, 8.9, 1.5, 5.4, 2.7, 9.1, 3.3, 6.8, 4.5, 7.9, 2.4,
            8.3, 5.7, 1.9,
        ];
        let probabilities = [0.05, 0.25, 0.5, 0.75, 0.95];
        let batch = compute_quantiles(&data, &probabilities);

        for (&p, &q) in probabilities.iter().zip(&batch) {
            let single = compute_quantile(&mut data.clone(), p);
            assert!((single - q).abs() < 1e-10, "p={}: select={}, sorted={}", p, single, q);
        }
        for pair in batch.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn test_linear_interpolation() {
        // h = 9 * 0.05 = 0.45 between 1 and 2
        let data: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let q = compute_quantiles(&data, &[0.05]);
        assert!((q[0] - 1.45).abs() < 1e-10);
    }
}
