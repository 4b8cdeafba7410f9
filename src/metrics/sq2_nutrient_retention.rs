//! SQ2: NUTRIENT RETENTION
//!
//! Base saturation everywhere; CEC of the whole soil in the topsoil, CEC of the
//! clay fraction and pH below it. Texture joins only at input level H.

use super::{aggregate_layers, layer_value, IndexScore, ScoringContext};
use crate::catalogue::ProfileProperty;
use crate::types::{InputLevel, SqiCode, SqiValue};
use crate::utils::stats::min_mean;

const SQI: SqiCode = SqiCode::Sq2;

#[derive(Debug, Clone)]
pub struct Sq2Result {
    pub score: f64,
    pub layer_scores: Vec<Option<f64>>,
}

impl From<Sq2Result> for IndexScore {
    fn from(result: Sq2Result) -> Self {
        IndexScore { code: SQI, value: SqiValue::Score(result.score), layer_scores: result.layer_scores }
    }
}

pub fn calculate_sq2(ctx: &ScoringContext) -> Sq2Result {
    let req = ctx.requirements;
    let with_texture = ctx.input_level == InputLevel::High;

    let layer_scores: Vec<Option<f64>> = ctx
        .profile
        .horizons
        .iter()
        .map(|h| {
            let mut subs: Vec<Option<f64>> = vec![req.property_score(SQI, ProfileProperty::Bs, h.bs)];
            if h.is_topsoil() {
                subs.push(req.property_score(SQI, ProfileProperty::Cecs, h.cecs));
            } else {
                subs.push(req.property_score(SQI, ProfileProperty::Cecc, h.cecc));
                subs.push(req.property_score(SQI, ProfileProperty::Ph, h.ph));
            }
            if with_texture {
                subs.push(Some(req.texture_score(SQI, h.texture)));
            }
            let subs: Vec<f64> = subs.into_iter().flatten().collect();
            layer_value(min_mean(&subs))
        })
        .collect();

    Sq2Result { score: aggregate_layers(ctx.weights, &layer_scores), layer_scores }
}
