//! Mean and sample standard deviation with defined-zero fallbacks.
//!
//! Both the live and the batch feature extractors go through these two
//! functions so the two paths produce identical numbers for identical input.

use statrs::statistics::Statistics;

/// Arithmetic mean, or 0.0 for an empty sequence.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().mean()
}

/// Unbiased (n-1) sample standard deviation, or 0.0 for fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let sd = values.iter().std_dev();
    if sd.is_nan() {
        0.0
    } else {
        sd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_single() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(std_dev(&[42.0]), 0.0);
        assert_eq!(mean(&[42.0]), 42.0);
    }

    #[test]
    fn test_mean() {
        assert!((mean(&[1.0, 2.0, 3.0, 4.0]) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_std_dev_uses_sample_formula() {
        // Population sd of this set is 2.0; sample sd is sqrt(32/7).
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let expected = (32.0_f64 / 7.0).sqrt();
        assert!((std_dev(&values) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_std_dev_non_negative() {
        let sets: [&[f64]; 4] = [
            &[1.0, 1.0],
            &[-5.0, 5.0, -5.0],
            &[1e9, 1e9 + 1.0, 1e9 - 1.0],
            &[0.0, 0.0, 0.0, 0.0],
        ];
        for set in sets {
            assert!(std_dev(set) >= 0.0);
        }
        assert_eq!(std_dev(&[3.0, 3.0, 3.0]), 0.0);
    }
}
