//! Small statistics helpers shared by the trend and attention trackers.
//!
//! All helpers return 0.0 for empty input rather than NaN.

use statrs::statistics::Statistics;

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().mean()
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values.iter().population_std_dev()
}

/// Smallest value.
pub fn min(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Largest value.
pub fn max(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Slope of the least-squares line through `(index, value)` pairs.
pub fn linear_slope(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let n = values.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = mean(values);

    let (covariance, variance) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(cov, var), (i, &y)| {
            let dx = i as f64 - mean_x;
            (cov + dx * (y - mean_y), var + dx * dx)
        });

    if variance.abs() < 1e-12 {
        return 0.0;
    }
    covariance / variance
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std_dev() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values) - 5.0).abs() < 1e-9);
        assert!((std_dev(&values) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(std_dev(&[0.4]), 0.0);
        assert_eq!(min(&[]), 0.0);
        assert_eq!(max(&[]), 0.0);
        assert_eq!(linear_slope(&[0.5]), 0.0);
    }

    #[test]
    fn test_min_max() {
        let values = [0.4, 0.9, 0.1, 0.5];
        assert_eq!(min(&values), 0.1);
        assert_eq!(max(&values), 0.9);
    }

    #[test]
    fn test_linear_slope() {
        assert!((linear_slope(&[0.0, 1.0, 2.0, 3.0]) - 1.0).abs() < 1e-12);
        assert!(linear_slope(&[0.5, 0.5, 0.5]).abs() < 1e-12);
        assert!((linear_slope(&[0.9, 0.9, 0.9, 0.2, 0.1]) + 0.23).abs() < 1e-9);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(53.456, 1), 53.5);
        assert_eq!(round_to(0.12345, 2), 0.12);
    }
}
