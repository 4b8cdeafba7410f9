//! SQ1: NUTRIENT AVAILABILITY
//!
//! Per horizon: organic carbon, pH and texture, plus total exchangeable bases
//! in the topsoil. Sub-scores combine by the min-mean rule and horizons
//! aggregate by rooting-depth weight.
//!
//! The index is `NA` at input level H.

use super::{aggregate_layers, layer_value, IndexScore, ScoringContext};
use crate::catalogue::ProfileProperty;
use crate::types::{InputLevel, SqiCode, SqiValue};
use crate::utils::stats::min_mean;

const SQI: SqiCode = SqiCode::Sq1;

#[derive(Debug, Clone)]
pub struct Sq1Result {
    /// `None` at input level H
    pub score: Option<f64>,
    pub layer_scores: Vec<Option<f64>>,
}

impl From<Sq1Result> for IndexScore {
    fn from(result: Sq1Result) -> Self {
        match result.score {
            Some(score) => IndexScore { code: SQI, value: SqiValue::Score(score), layer_scores: result.layer_scores },
            None => IndexScore::not_applicable(SQI),
        }
    }
}

pub fn calculate_sq1(ctx: &ScoringContext) -> Sq1Result {
    if ctx.input_level == InputLevel::High {
        return Sq1Result { score: None, layer_scores: Vec::new() };
    }

    let req = ctx.requirements;
    let layer_scores: Vec<Option<f64>> = ctx
        .profile
        .horizons
        .iter()
        .map(|h| {
            let mut subs: Vec<f64> = [
                req.property_score(SQI, ProfileProperty::Oc, h.soc),
                req.property_score(SQI, ProfileProperty::Ph, h.ph),
                Some(req.texture_score(SQI, h.texture)),
            ]
            .into_iter()
            .flatten()
            .collect();
            if h.is_topsoil() {
                subs.extend(req.property_score(SQI, ProfileProperty::Teb, h.teb));
            }
            layer_value(min_mean(&subs))
        })
        .collect();

    Sq1Result {
        score: Some(aggregate_layers(ctx.weights, &layer_scores)),
        layer_scores,
    }
}
