//! Legacy six-layer profile path
//!
//! The older pipeline collapsed every property into a 120-element per-centimetre
//! series, averaged it over six 20 cm buckets (`sl1..sl6`) and weighted the
//! buckets with fixed factors. The evaluator no longer uses any of this; it
//! scores SSURGO horizons directly with rooting-depth weights. Kept for callers
//! that still consume six-layer profiles.

#![allow(deprecated)]

use crate::horizon::HorizonRecord;
use crate::integration::PlotHorizon;

/// Depth covered by the per-centimetre series
pub const LEGACY_PROFILE_DEPTH_CM: usize = 120;

pub const LEGACY_BUCKET_CM: usize = 20;

/// Fixed weights of the six 20 cm buckets (sum to 1)
pub const LEGACY_LAYER_WEIGHTS: [f64; 6] = [0.30, 0.25, 0.20, 0.12, 0.08, 0.05];

/// Expand `(top, bottom, value)` intervals to one value per centimetre
///
/// Centimetres not covered by any interval are NaN; later intervals win on
/// overlap.
#[deprecated(since = "0.1.0", note = "Score horizons directly with SoilQualityEvaluator")]
pub fn per_cm_series(intervals: &[(f64, f64, Option<f64>)]) -> Vec<f64> {
    let mut series = vec![f64::NAN; LEGACY_PROFILE_DEPTH_CM];
    for &(top, bottom, value) in intervals {
        let Some(value) = value else { continue };
        if !(top.is_finite() && bottom.is_finite()) {
            continue;
        }
        let start = top.max(0.0).floor() as usize;
        let end = (bottom.max(0.0).ceil() as usize).min(LEGACY_PROFILE_DEPTH_CM);
        for cm in series.iter_mut().take(end).skip(start) {
            *cm = value;
        }
    }
    series
}

/// Mean of each 20 cm bucket (`sl1..sl6`) down to `bottom_cm`
///
/// Buckets starting at or below `bottom_cm`, or without any value, are `None`.
#[deprecated(since = "0.1.0", note = "Score horizons directly with SoilQualityEvaluator")]
pub fn aggregate_standard_layers(series: &[f64], bottom_cm: f64) -> [Option<f64>; 6] {
    let limit = (bottom_cm.max(0.0).ceil() as usize)
        .min(series.len())
        .min(LEGACY_PROFILE_DEPTH_CM);

    std::array::from_fn(|bucket| {
        let start = bucket * LEGACY_BUCKET_CM;
        let end = (start + LEGACY_BUCKET_CM).min(limit);
        if start >= end {
            return None;
        }
        let values: Vec<f64> = series[start..end].iter().copied().filter(|v| !v.is_nan()).collect();
        (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
    })
}

/// Canonical six-layer profile from user plot horizons
///
/// Each property is bucketed separately; texture and derived chemistry are
/// recomputed on every layer.
#[deprecated(since = "0.1.0", note = "Overlay plot horizons with integrate_user_data")]
pub fn build_six_layer_profile(plots: &[PlotHorizon]) -> Vec<HorizonRecord> {
    let bottom = plots.iter().map(|p| p.bottom_depth).fold(0.0, f64::max);
    let bucket = |value: fn(&PlotHorizon) -> Option<f64>| {
        let intervals: Vec<(f64, f64, Option<f64>)> =
            plots.iter().map(|p| (p.top_depth, p.bottom_depth, value(p))).collect();
        aggregate_standard_layers(&per_cm_series(&intervals), bottom)
    };

    let sand = bucket(|p| p.sand_pct);
    let silt = bucket(|p| p.silt_pct);
    let clay = bucket(|p| p.clay_pct);
    let om = bucket(|p| p.organic_matter_pct);
    let ph = bucket(|p| p.ph);
    let db = bucket(|p| p.bulk_density);
    let fragments = bucket(|p| p.coarse_fragments_pct);
    let cecs = bucket(|p| p.cec_soil);
    let ec = bucket(|p| p.ec);
    let caco3 = bucket(|p| p.caco3_pct);
    let gypsum = bucket(|p| p.gypsum_pct);

    (0..LEGACY_LAYER_WEIGHTS.len())
        .filter(|&i| ((i * LEGACY_BUCKET_CM) as f64) < bottom)
        .map(|i| {
            let top = (i * LEGACY_BUCKET_CM) as f64;
            let mut layer = HorizonRecord::new(top, (top + LEGACY_BUCKET_CM as f64).min(bottom));
            layer.sand_pct = sand[i];
            layer.silt_pct = silt[i];
            layer.clay_pct = clay[i];
            if let Some(v) = om[i] {
                layer.set_organic_matter(v);
            }
            layer.ph = ph[i];
            layer.db_measured = db[i];
            layer.fragvol = fragments[i].unwrap_or(0.0);
            layer.cecs = cecs[i];
            layer.ec = ec[i];
            layer.caco3 = caco3[i];
            layer.gypsum = gypsum[i];
            layer.recompute_texture();
            layer.refresh_derived();
            layer
        })
        .collect()
}

/// Profile mean with the fixed bucket weights
///
/// The weights are already normalised; missing layers contribute nothing and
/// the remaining weights are not rescaled.
#[deprecated(since = "0.1.0", note = "Use rooting-depth weights from utils::depth_weights")]
pub fn weighted_profile_mean(layers: &[Option<f64>; 6]) -> f64 {
    layers
        .iter()
        .zip(LEGACY_LAYER_WEIGHTS)
        .filter_map(|(v, w)| v.filter(|x| !x.is_nan()).map(|x| x * w))
        .sum()
}
