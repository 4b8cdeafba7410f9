//! SQ7: WORKABILITY
//!
//! Uses the same profile-level constraints as SQ3, read from the SQ7 rows of
//! the crop tables, combined per horizon by the min-mean rule instead of the
//! minimum. Texture is looked up in the SQ3 texture table.

use super::rooting::{rooting_scalars, RootingScalars};
use super::{aggregate_layers, layer_value, IndexScore, ScoringContext};
use crate::catalogue::ProfileProperty;
use crate::types::{SqiCode, SqiValue};
use crate::utils::stats::min_mean;

const SQI: SqiCode = SqiCode::Sq7;

#[derive(Debug, Clone)]
pub struct Sq7Result {
    pub score: f64,
    pub scalars: RootingScalars,
    pub layer_scores: Vec<Option<f64>>,
}

impl From<Sq7Result> for IndexScore {
    fn from(result: Sq7Result) -> Self {
        IndexScore { code: SQI, value: SqiValue::Score(result.score), layer_scores: result.layer_scores }
    }
}

pub fn calculate_sq7(ctx: &ScoringContext) -> Sq7Result {
    let req = ctx.requirements;
    let scalars = rooting_scalars(ctx, SQI);

    let layer_scores: Vec<Option<f64>> = ctx
        .profile
        .horizons
        .iter()
        .map(|h| {
            let subs = [
                scalars.rd,
                req.texture_score(SqiCode::Sq3, h.texture),
                req.property_score(SQI, ProfileProperty::Cf, Some(h.fragvol)).unwrap_or(100.0),
                scalars.db_for(h.is_topsoil()),
                scalars.vertic,
                scalars.gelic,
                scalars.petric,
                scalars.phase,
                scalars.roots,
                scalars.il,
            ];
            layer_value(min_mean(&subs))
        })
        .collect();

    Sq7Result { score: aggregate_layers(ctx.weights, &layer_scores), scalars, layer_scores }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::RequirementTables;
    use crate::metrics::test_support::*;
    use crate::types::InputLevel;
    use approx::assert_relative_eq;

    #[test]
    fn test_min_mean_over_ten_constraints() {
        let mut tables = RequirementTables::default();
        tables.profile.extend(curve(7, ProfileProperty::Gel, &[(0.0, 100.0), (1.0, 50.0)]));
        tables.texture.push(texture(3, 8, 85.0));
        // SQ7 texture rows are not consulted
        tables.texture.push(texture(7, 8, 10.0));
        let req = requirements(tables, InputLevel::Low);

        let mut profile = profile(vec![horizon(0.0, 20.0)]);
        profile.attributes.gelic = true;
        let ctx = ScoringContext { profile: &profile, requirements: &req, weights: &[1.0], input_level: InputLevel::Low };
        let result = calculate_sq7(&ctx);
        // min 50, others: txt 85 and seven 100s
        let expected = (50.0 + (85.0 + 7.0 * 100.0) / 8.0) / 2.0;
        assert_relative_eq!(result.score, expected, epsilon = 1e-9);
    }
}
