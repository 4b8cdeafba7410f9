//! Soil quality index scorers
//!
//! One module per index. Every scorer reads the same `ScoringContext` (the
//! integrated profile, the crop's requirements at the request's input level
//! and the rooting-depth weights of the horizons) and is pure: no I/O, no
//! shared state, so the seven scorers can run in parallel.

pub mod rooting;
pub mod sq1_nutrient_availability;
pub mod sq2_nutrient_retention;
pub mod sq3_rooting_conditions;
pub mod sq4_oxygen_availability;
pub mod sq5_salinity_sodicity;
pub mod sq6_calcareousness;
pub mod sq7_workability;

// Re-export scorer functions
pub use rooting::{rooting_scalars, RootingScalars};
pub use sq1_nutrient_availability::{calculate_sq1, Sq1Result};
pub use sq2_nutrient_retention::{calculate_sq2, Sq2Result};
pub use sq3_rooting_conditions::{calculate_sq3, Sq3Result};
pub use sq4_oxygen_availability::{calculate_sq4, Sq4Result};
pub use sq5_salinity_sodicity::{calculate_sq5, Sq5Result};
pub use sq6_calcareousness::{calculate_sq6, Sq6Result};
pub use sq7_workability::{calculate_sq7, Sq7Result};

use crate::catalogue::CropRequirements;
use crate::horizon::SoilProfile;
use crate::types::{InputLevel, SqiCode, SqiValue};
use crate::utils::stats::weighted_mean;
use serde::Serialize;

/// Everything a scorer needs for one evaluation
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub profile: &'a SoilProfile,
    pub requirements: &'a CropRequirements,
    /// One weight per horizon, in `profile.horizons` order
    pub weights: &'a [f64],
    pub input_level: InputLevel,
}

/// Final value of one index with its per-horizon scores
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexScore {
    pub code: SqiCode,
    pub value: SqiValue,
    /// Empty for profile-level indices (SQ4) and for NA
    pub layer_scores: Vec<Option<f64>>,
}

impl IndexScore {
    pub fn not_applicable(code: SqiCode) -> Self {
        Self { code, value: SqiValue::NotApplicable, layer_scores: Vec::new() }
    }

    /// No requirement data to score against
    pub fn undetermined(code: SqiCode) -> Self {
        Self { code, value: SqiValue::Score(f64::NAN), layer_scores: Vec::new() }
    }
}

/// Depth-weighted mean of layer scores; NaN when no layer has a score
pub(crate) fn aggregate_layers(weights: &[f64], layer_scores: &[Option<f64>]) -> f64 {
    weighted_mean(weights, layer_scores)
}

/// Layer score from a combination result, dropping NaN
pub(crate) fn layer_value(score: f64) -> Option<f64> {
    (!score.is_nan()).then_some(score)
}
