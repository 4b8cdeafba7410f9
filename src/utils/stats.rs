//! Small numeric helpers shared by the SQI scorers

/// Min-mean combination: `(min + mean(rest)) / 2`
///
/// NaN members are ignored. One value returns itself; no values returns NaN.
pub fn min_mean(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    match finite.len() {
        0 => f64::NAN,
        1 => finite[0],
        n => {
            let (min_idx, min) = finite
                .iter()
                .copied()
                .enumerate()
                .fold((0, f64::INFINITY), |acc, (i, v)| if v < acc.1 { (i, v) } else { acc });
            let rest: f64 = finite
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != min_idx)
                .map(|(_, v)| v)
                .sum();
            (min + rest / (n - 1) as f64) / 2.0
        }
    }
}

/// Weighted mean over layers that produced a score
///
/// `None` and NaN layers drop out of both numerator and denominator. NaN when
/// the remaining weight is zero.
pub fn weighted_mean(weights: &[f64], scores: &[Option<f64>]) -> f64 {
    let (num, den) = weights
        .iter()
        .zip(scores)
        .filter_map(|(w, s)| s.filter(|v| !v.is_nan()).map(|v| (*w, v)))
        .fold((0.0, 0.0), |(num, den), (w, v)| (num + w * v, den + w));
    if den > 0.0 {
        num / den
    } else {
        f64::NAN
    }
}

/// Minimum ignoring NaN; NaN if every member is NaN (or the slice is empty)
pub fn nan_min(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f64::NAN, |acc, v| if acc.is_nan() || v < acc { v } else { acc })
}

/// NaN and infinities become 0.0 at the response boundary
pub fn safe_float(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_min_mean() {
        assert_relative_eq!(min_mean(&[40.0, 80.0, 100.0]), 65.0);
        assert_relative_eq!(min_mean(&[70.0]), 70.0);
        assert!(min_mean(&[]).is_nan());
        // Duplicate minimum: only one copy is removed
        assert_relative_eq!(min_mean(&[50.0, 50.0, 100.0]), 62.5);
        assert_relative_eq!(min_mean(&[f64::NAN, 60.0, 100.0]), 80.0);
    }

    #[test]
    fn test_weighted_mean_excludes_missing_layers() {
        let w = [0.5, 0.3, 0.2];
        assert_relative_eq!(weighted_mean(&w, &[Some(80.0), None, Some(30.0)]), 460.0 / 7.0, epsilon = 1e-9);
        assert_relative_eq!(weighted_mean(&w, &[Some(80.0), Some(f64::NAN), Some(80.0)]), 80.0);
        assert!(weighted_mean(&w, &[None, None, None]).is_nan());
        assert!(weighted_mean(&[0.0, 0.0], &[Some(50.0), Some(60.0)]).is_nan());
    }

    #[test]
    fn test_nan_min_and_safe_float() {
        assert_relative_eq!(nan_min(&[f64::NAN, 70.0, 40.0]), 40.0);
        assert!(nan_min(&[f64::NAN]).is_nan());
        assert_eq!(safe_float(f64::NAN), 0.0);
        assert_eq!(safe_float(f64::NEG_INFINITY), 0.0);
        assert_eq!(safe_float(12.5), 12.5);
    }
}
