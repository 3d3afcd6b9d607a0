// Robust summary statistics for feature reduction
//
// Each segment's feature matrix is reduced to one value pair per channel:
// the median across sub-frames and the median absolute deviation, a
// robust dispersion summary.

/// Median of a sequence
///
/// Even-length input averages the two middle values. Empty input yields 0.
pub fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Median absolute deviation: median(|x - median(x)|)
pub fn median_absolute_deviation(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }

    let center = median(values);
    let deviations: Vec<f32> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd_length() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
    }

    #[test]
    fn test_median_even_length_averages_middle() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_median_single_value() {
        assert_eq!(median(&[7.5]), 7.5);
    }

    #[test]
    fn test_median_empty_is_zero() {
        assert_eq!(median(&[]), 0.0);
        assert_eq!(median_absolute_deviation(&[]), 0.0);
    }

    #[test]
    fn test_median_absolute_deviation() {
        // median = 3, |x - 3| = [2, 1, 0, 1, 2], mad = 1
        assert_eq!(median_absolute_deviation(&[1.0, 2.0, 3.0, 4.0, 5.0]), 1.0);
    }

    #[test]
    fn test_mad_of_constant_is_zero() {
        assert_eq!(median_absolute_deviation(&[2.0, 2.0, 2.0, 2.0]), 0.0);
    }
}
