//! SQ3: ROOTING CONDITIONS
//!
//! Per horizon the most limiting of texture, coarse fragments, degree of
//! compactness (topsoil or subsoil), the profile's vertic, gelic and petric
//! traits, its phases, the rooting-restriction code and the impermeable-layer
//! code. The limiting score is then scaled by the rooting-depth score:
//!
//! `layer = rd_score x min(...) / 100`

use super::rooting::{rooting_scalars, RootingScalars};
use super::{aggregate_layers, IndexScore, ScoringContext};
use crate::catalogue::ProfileProperty;
use crate::types::{SqiCode, SqiValue};

const SQI: SqiCode = SqiCode::Sq3;

#[derive(Debug, Clone)]
pub struct Sq3Result {
    pub score: f64,
    pub scalars: RootingScalars,
    pub layer_scores: Vec<Option<f64>>,
}

impl From<Sq3Result> for IndexScore {
    fn from(result: Sq3Result) -> Self {
        IndexScore { code: SQI, value: SqiValue::Score(result.score), layer_scores: result.layer_scores }
    }
}

pub fn calculate_sq3(ctx: &ScoringContext) -> Sq3Result {
    let req = ctx.requirements;
    let scalars = rooting_scalars(ctx, SQI);

    let layer_scores: Vec<Option<f64>> = ctx
        .profile
        .horizons
        .iter()
        .map(|h| {
            let limiting = [
                req.texture_score(SQI, h.texture),
                req.property_score(SQI, ProfileProperty::Cf, Some(h.fragvol)).unwrap_or(100.0),
                scalars.db_for(h.is_topsoil()),
                scalars.vertic,
                scalars.gelic,
                scalars.petric,
                scalars.phase,
                scalars.roots,
                scalars.il,
            ]
            .into_iter()
            .fold(f64::INFINITY, f64::min);
            Some(scalars.rd * limiting / 100.0)
        })
        .collect();

    Sq3Result { score: aggregate_layers(ctx.weights, &layer_scores), scalars, layer_scores }
}
