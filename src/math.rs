use num_traits::Float;

/// Scale factor making the median absolute deviation a consistent estimator of the standard
/// deviation for normally distributed data
pub const MAD_SCALE: f64 = 1.4826;

/// Compute the median of `values`
///
/// The median of an even-length slice is the mean of the two central elements. Returns `None`
/// for an empty slice. NaN values are ordered last.
///
/// `[3, 1, 2]` has median 2 and `[4, 1, 2, 3]` has median 2.5.
pub fn median<T: Float>(values: &[T]) -> Option<T> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or_else(|| a.is_nan().cmp(&b.is_nan())));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        let two = T::one() + T::one();
        Some((sorted[mid - 1] + sorted[mid]) / two)
    } else {
        Some(sorted[mid])
    }
}

/// The median and scaled median absolute deviation of `values`
pub fn median_and_scale<T: Float>(values: &[T]) -> Option<(T, T)> {
    let centre = median(values)?;
    let deviations = values.iter().map(|v| (*v - centre).abs()).collect::<Vec<_>>();
    let mad = median(&deviations)?;
    let scale = T::from(MAD_SCALE)? * mad;
    Some((centre, scale))
}

/// Median of the slice `values[floor(start * n)..floor(end * n)]`
///
/// The truncation matches integer conversion of the fractional bounds, so a window of 60 with
/// fractions 0.3 and 0.95 keeps indices 18 through 56.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn trimmed_median<T: Float>(values: &[T], start: f64, end: f64) -> Option<T> {
    let n = values.len() as f64;
    let lower = (n * start) as usize;
    let upper = ((n * end) as usize).min(values.len());
    if lower >= upper {
        return None;
    }
    median(&values[lower..upper])
}

/// Round half away from zero to `decimals` places
///
/// Values are returned unchanged when `10^decimals` or the scaled value is not representable.
pub fn round_to<T: Float>(value: T, decimals: i32) -> T {
    let Some(ten) = T::from(10.0) else {
        return value;
    };
    let factor = ten.powi(decimals);
    let scaled = value * factor;
    if !factor.is_normal() || !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// Linear interpolation between `(x0, y0)` and `(x1, y1)` evaluated at `x`
pub fn lerp<T: Float>(x0: T, y0: T, x1: T, y1: T, x: T) -> T {
    if x1 == x0 {
        return y0;
    }
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// Sample mean and unbiased variance, the variance is `None` below two samples
#[allow(clippy::cast_precision_loss)]
pub fn mean_and_variance(values: &[f64]) -> Option<(f64, Option<f64>)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = (values.len() > 1)
        .then(|| values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0));
    Some((mean, variance))
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use ndarray_rand::rand::{Rng, SeedableRng};
    use proptest::prelude::*;
    use rand_isaac::Isaac64Rng;

    use super::{lerp, mean_and_variance, median, median_and_scale, round_to, trimmed_median};

    #[test]
    fn median_of_odd_and_even_length_slices() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median::<f64>(&[]), None);
    }

    #[test]
    fn median_is_independent_of_input_order() {
        let seed = 40;
        let mut rng = Isaac64Rng::seed_from_u64(seed);
        let values = (0..101).map(|_| rng.gen::<f64>()).collect::<Vec<_>>();
        let sorted = values
            .iter()
            .copied()
            .sorted_by(|a, b| a.partial_cmp(b).unwrap())
            .collect::<Vec<_>>();

        assert_eq!(median(&values), Some(sorted[50]));
    }

    #[test]
    fn scale_of_constant_series_is_zero() {
        let (centre, scale) = median_and_scale(&[400.0; 11]).unwrap();
        approx::assert_relative_eq!(centre, 400.0);
        approx::assert_relative_eq!(scale, 0.0);
    }

    #[test]
    fn scale_is_robust_to_a_single_outlier() {
        let values = [1.0, 2.0, 3.0, 4.0, 1000.0];
        let (centre, scale) = median_and_scale(&values).unwrap();
        // deviations from 3 are [2, 1, 0, 1, 997], median 1
        approx::assert_relative_eq!(centre, 3.0);
        approx::assert_relative_eq!(scale, 1.4826);
    }

    #[test]
    fn trimmed_median_uses_truncated_bounds() {
        let values = (0..60).map(f64::from).collect::<Vec<_>>();
        // indices 18..57 hold 18..=56, median 37
        approx::assert_relative_eq!(trimmed_median(&values, 0.3, 0.95).unwrap(), 37.0);
        assert_eq!(trimmed_median(&values[..1], 0.3, 0.95), None);
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        approx::assert_relative_eq!(round_to(400.125_f64, 2), 400.13);
        approx::assert_relative_eq!(round_to(-2.5_f64, 0), -3.0);
        approx::assert_relative_eq!(round_to(399.994_f64, 2), 399.99);
    }

    #[test]
    fn unrepresentable_precision_leaves_the_value_unchanged() {
        approx::assert_relative_eq!(round_to(412.345_f64, 400), 412.345);
        approx::assert_relative_eq!(round_to(412.345_f64, 308), 412.345);
        approx::assert_relative_eq!(round_to(412.345_f64, -400), 412.345);
        assert!(!round_to(412.345_f64, 400).is_nan());
    }

    #[test]
    fn variance_needs_two_samples() {
        assert_eq!(mean_and_variance(&[]), None);
        assert_eq!(mean_and_variance(&[2.0]), Some((2.0, None)));
        let (mean, variance) = mean_and_variance(&[1.0, 2.0, 3.0]).unwrap();
        approx::assert_relative_eq!(mean, 2.0);
        approx::assert_relative_eq!(variance.unwrap(), 1.0);
    }

    proptest! {
        #[test]
        fn interpolation_reproduces_endpoints(
            x0 in -1e6..1e6f64,
            dx in 1e-3..1e6f64,
            y0 in -1e3..1e3f64,
            y1 in -1e3..1e3f64,
        ) {
            let x1 = x0 + dx;
            approx::assert_relative_eq!(lerp(x0, y0, x1, y1, x0), y0, max_relative = 1e-9);
            approx::assert_relative_eq!(lerp(x0, y0, x1, y1, x1), y1, max_relative = 1e-6, epsilon = 1e-6);
        }
    }
}
