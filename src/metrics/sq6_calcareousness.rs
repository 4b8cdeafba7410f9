//! SQ6: CALCAREOUSNESS AND GYPSUM
//!
//! Same shape as SQ5 over calcium carbonate and gypsum content.

use super::{aggregate_layers, IndexScore, ScoringContext};
use crate::catalogue::ProfileProperty;
use crate::types::{SqiCode, SqiValue};

const SQI: SqiCode = SqiCode::Sq6;

#[derive(Debug, Clone)]
pub struct Sq6Result {
    pub score: f64,
    pub phase_score: f64,
    pub layer_scores: Vec<Option<f64>>,
}

impl From<Sq6Result> for IndexScore {
    fn from(result: Sq6Result) -> Self {
        IndexScore { code: SQI, value: SqiValue::Score(result.score), layer_scores: result.layer_scores }
    }
}

pub fn calculate_sq6(ctx: &ScoringContext) -> Sq6Result {
    let req = ctx.requirements;
    let phase_score = req.phase_list_score(SQI, &ctx.profile.attributes.phases);

    let layer_scores: Vec<Option<f64>> = ctx
        .profile
        .horizons
        .iter()
        .map(|h| {
            let ca = req.property_score(SQI, ProfileProperty::Ca, h.caco3)?;
            let gy = req.property_score(SQI, ProfileProperty::Gy, h.gypsum)?;
            Some((ca * gy / 100.0).min(phase_score))
        })
        .collect();

    Sq6Result { score: aggregate_layers(ctx.weights, &layer_scores), phase_score, layer_scores }
}
