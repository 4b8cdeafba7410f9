//! SQ5: SALINITY AND SODICITY
//!
//! Per horizon the product of the electrical-conductivity and exchangeable
//! sodium scores, capped by the component's phase score (saline and sodic
//! phases). A horizon missing either measurement is left out.

use super::{aggregate_layers, IndexScore, ScoringContext};
use crate::catalogue::ProfileProperty;
use crate::types::{SqiCode, SqiValue};

const SQI: SqiCode = SqiCode::Sq5;

#[derive(Debug, Clone)]
pub struct Sq5Result {
    pub score: f64,
    pub phase_score: f64,
    pub layer_scores: Vec<Option<f64>>,
}

impl From<Sq5Result> for IndexScore {
    fn from(result: Sq5Result) -> Self {
        IndexScore { code: SQI, value: SqiValue::Score(result.score), layer_scores: result.layer_scores }
    }
}

pub fn calculate_sq5(ctx: &ScoringContext) -> Sq5Result {
    let req = ctx.requirements;
    let phase_score = req.phase_list_score(SQI, &ctx.profile.attributes.phases);

    let layer_scores: Vec<Option<f64>> = ctx
        .profile
        .horizons
        .iter()
        .map(|h| {
            let ec = req.property_score(SQI, ProfileProperty::Ec, h.ec)?;
            let esp = req.property_score(SQI, ProfileProperty::Esp, h.esp)?;
            Some((ec * esp / 100.0).min(phase_score))
        })
        .collect();

    Sq5Result { score: aggregate_layers(ctx.weights, &layer_scores), phase_score, layer_scores }
}
