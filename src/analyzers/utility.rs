//! NaN-aware statistics. Missing orbital fields are NaN and must never poison a result.

fn finite(values: &[f64]) -> impl Iterator<Item = f64> + '_ {
    values.iter().copied().filter(|v| v.is_finite())
}

/// Largest finite value, `None` when there is none.
pub fn finite_max(values: &[f64]) -> Option<f64> {
    finite(values).reduce(f64::max)
}

/// Smallest finite value, `None` when there is none.
pub fn finite_min(values: &[f64]) -> Option<f64> {
    finite(values).reduce(f64::min)
}

/// Arithmetic mean of the finite values, `None` when there is none.
pub fn finite_mean(values: &[f64]) -> Option<f64> {
    let (sum, count) = finite(values).fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_ignores_nan() {
        assert_eq!(finite_max(&[f64::NAN, 3.0, 35786.0, f64::NAN]), Some(35786.0));
        assert_eq!(finite_max(&[f64::NAN]), None);
        assert_eq!(finite_max(&[]), None);
    }

    #[test]
    fn test_min_ignores_nan() {
        assert_eq!(finite_min(&[f64::NAN, 3.0, -1.0]), Some(-1.0));
    }

    #[test]
    fn test_mean_ignores_nan() {
        assert_eq!(finite_mean(&[1.0, f64::NAN, 3.0]), Some(2.0));
        assert_eq!(finite_mean(&[f64::NAN]), None);
        assert_eq!(finite_mean(&[]), None);
    }
}
