//! Constraint Curve
//!
//! Maps a measured soil property onto a 0-100 suitability score from a sparse
//! breakpoint table. Monotone tables use a shape-preserving piecewise cubic
//! Hermite interpolant (Fritsch-Carlson derivatives, PCHIP); anything else
//! (pH optima, U-shapes) is interpolated linearly. Outside the breakpoint range
//! the boundary score is returned.

use crate::error::{SqiError, SqiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    MonotoneCubic,
    Linear,
}

#[derive(Debug, Clone)]
pub struct ConstraintCurve {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Hermite derivatives at each breakpoint (empty for linear curves)
    slopes: Vec<f64>,
    interpolation: Interpolation,
}

impl ConstraintCurve {
    /// Build from `(property_value, score)` pairs
    ///
    /// Pairs are sorted by property value; duplicate values keep the first pair.
    pub fn new(breakpoints: &[(f64, f64)]) -> SqiResult<Self> {
        if breakpoints.is_empty() {
            return Err(SqiError::InvalidCurve("breakpoint table is empty".into()));
        }
        if breakpoints.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(SqiError::InvalidCurve(
                "breakpoints must have finite property_value and score".into(),
            ));
        }

        let mut sorted = breakpoints.to_vec();
        // Stable sort keeps caller order among equal values, so dedup keeps the first
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
        sorted.dedup_by(|later, earlier| later.0 == earlier.0);

        if sorted.len() < 2 {
            return Err(SqiError::InvalidCurve(format!(
                "need at least two distinct property values, got {}",
                sorted.len()
            )));
        }

        let xs: Vec<f64> = sorted.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = sorted.iter().map(|p| p.1).collect();

        let non_decreasing = ys.windows(2).all(|w| w[1] >= w[0]);
        let non_increasing = ys.windows(2).all(|w| w[1] <= w[0]);

        let (interpolation, slopes) = if non_decreasing || non_increasing {
            (Interpolation::MonotoneCubic, pchip_slopes(&xs, &ys))
        } else {
            (Interpolation::Linear, Vec::new())
        };

        Ok(Self { xs, ys, slopes, interpolation })
    }

    /// Build from parallel `property_value` / `score` columns
    pub fn from_columns(values: &[f64], scores: &[f64]) -> SqiResult<Self> {
        if values.len() != scores.len() {
            return Err(SqiError::InvalidCurve(format!(
                "property_value has {} rows but score has {}",
                values.len(),
                scores.len()
            )));
        }
        let pairs: Vec<(f64, f64)> = values.iter().copied().zip(scores.iter().copied()).collect();
        Self::new(&pairs)
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn breakpoints(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }

    /// Score at `x`; NaN in, NaN out
    pub fn eval(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        let n = self.xs.len();
        if x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1];
        }

        // Interval k with xs[k] <= x < xs[k + 1]
        let k = self.xs.partition_point(|&v| v <= x).saturating_sub(1).min(n - 2);
        let (x0, x1) = (self.xs[k], self.xs[k + 1]);
        let (y0, y1) = (self.ys[k], self.ys[k + 1]);
        let h = x1 - x0;
        let t = (x - x0) / h;

        let value = match self.interpolation {
            Interpolation::Linear => y0 + t * (y1 - y0),
            Interpolation::MonotoneCubic => {
                let t2 = t * t;
                let t3 = t2 * t;
                let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
                let h10 = t3 - 2.0 * t2 + t;
                let h01 = -2.0 * t3 + 3.0 * t2;
                let h11 = t3 - t2;
                h00 * y0 + h10 * h * self.slopes[k] + h01 * y1 + h11 * h * self.slopes[k + 1]
            }
        };

        // Rounding guard: a monotone segment never leaves its end-point range
        value.clamp(y0.min(y1), y0.max(y1))
    }

    pub fn eval_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }
}

fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Fritsch-Carlson derivative estimates (same scheme as scipy's PchipInterpolator)
fn pchip_slopes(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    let m: Vec<f64> = (0..n - 1).map(|k| (ys[k + 1] - ys[k]) / h[k]).collect();

    if n == 2 {
        return vec![m[0], m[0]];
    }

    let mut d = vec![0.0; n];
    for k in 1..n - 1 {
        if sign(m[k - 1]) != sign(m[k]) || m[k - 1] == 0.0 || m[k] == 0.0 {
            d[k] = 0.0;
        } else {
            let w1 = 2.0 * h[k] + h[k - 1];
            let w2 = h[k] + 2.0 * h[k - 1];
            d[k] = (w1 + w2) / (w1 / m[k - 1] + w2 / m[k]);
        }
    }

    d[0] = edge_slope(h[0], h[1], m[0], m[1]);
    d[n - 1] = edge_slope(h[n - 2], h[n - 3], m[n - 2], m[n - 3]);
    d
}

/// One-sided three-point end derivative, limited to keep the end segment monotone
fn edge_slope(h0: f64, h1: f64, m0: f64, m1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if sign(d) != sign(m0) {
        0.0
    } else if sign(m0) != sign(m1) && d.abs() > 3.0 * m0.abs() {
        3.0 * m0
    } else {
        d
    }
}
