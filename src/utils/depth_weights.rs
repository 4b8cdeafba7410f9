//! Horizon depth weighting
//!
//! Normalised exponential-cumulative rooting model. For rooting class `t` with
//! decay constant `k`, the share of roots above depth `d` (cm, clamped to
//! 0-200) is
//!
//! ```text
//! F(d) = (1 - exp(-k d)) / (1 - exp(-200 k))
//! ```
//!
//! A horizon's raw weight is `F(bottom) - F(top)`; weights are normalised to sum
//! to 1 and returned in input order, so the result depends on depths only and
//! never on row position.

use crate::types::RootingClass;

/// Maximum rooting depth covered by the curve (cm)
pub const MAX_ROOTING_DEPTH_CM: f64 = 200.0;

/// Cumulative share of roots between the surface and `depth_cm`
pub fn cumulative_root_share(class: RootingClass, depth_cm: f64) -> f64 {
    let k = class.decay();
    let d = depth_cm.clamp(0.0, MAX_ROOTING_DEPTH_CM);
    (1.0 - (-k * d).exp()) / (1.0 - (-k * MAX_ROOTING_DEPTH_CM).exp())
}

/// Normalised weights for `(top_cm, bottom_cm)` intervals
///
/// Zero-thickness (or inverted) horizons get weight 0. If nothing carries
/// weight (every horizon below 200 cm, or non-finite depths), all weights are 0
/// and scorers will report NaN for depth-weighted indices.
pub fn depth_weights(intervals: &[(f64, f64)], class: RootingClass) -> Vec<f64> {
    let raw: Vec<f64> = intervals
        .iter()
        .map(|&(top, bottom)| {
            if bottom > top {
                cumulative_root_share(class, bottom) - cumulative_root_share(class, top)
            } else {
                0.0
            }
        })
        .collect();

    let total: f64 = raw.iter().sum();
    if total > 0.0 {
        raw.iter().map(|w| w / total).collect()
    } else {
        vec![0.0; raw.len()]
    }
}
