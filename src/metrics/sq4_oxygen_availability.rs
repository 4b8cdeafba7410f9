//! SQ4: OXYGEN AVAILABILITY
//!
//! Profile-level minimum of surface-water retention, impermeable layer,
//! drainage class (looked up with the particle-size class of the shallowest
//! horizon) and phase scores. No depth weighting.

use super::{IndexScore, ScoringContext};
use crate::catalogue::PhaseProperty;
use crate::types::{SqiCode, SqiValue};

const SQI: SqiCode = SqiCode::Sq4;

#[derive(Debug, Clone)]
pub struct Sq4Result {
    pub score: f64,
    pub swr_score: f64,
    pub il_score: f64,
    pub drainage_score: f64,
    pub phase_score: f64,
}

impl From<Sq4Result> for IndexScore {
    fn from(result: Sq4Result) -> Self {
        IndexScore { code: SQI, value: SqiValue::Score(result.score), layer_scores: Vec::new() }
    }
}

pub fn calculate_sq4(ctx: &ScoringContext) -> Sq4Result {
    let req = ctx.requirements;
    let attributes = &ctx.profile.attributes;

    let swr_score = req.phase_score(SQI, PhaseProperty::Swr, attributes.swr);
    let il_score = req.phase_score(SQI, PhaseProperty::Il, attributes.il);
    let drainage_score = req.drainage_score(SQI, ctx.profile.profile_pscl(), attributes.drainage);
    let phase_score = req.phase_list_score(SQI, &attributes.phases);

    Sq4Result {
        score: swr_score.min(il_score).min(drainage_score).min(phase_score),
        swr_score,
        il_score,
        drainage_score,
        phase_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::RequirementTables;
    use crate::metrics::test_support::*;
    use crate::phase::Phase;
    use crate::types::{DrainageClass, InputLevel};

    fn tables() -> RequirementTables {
        let mut tables = RequirementTables::default();
        tables.drainage = vec![drainage(4, 2, 5, 100.0), drainage(4, 2, 4, 90.0), drainage(4, 2, 2, 50.0)];
        tables.phase = vec![phase(4, PhaseProperty::Swr, 3, 60.0), phase(4, PhaseProperty::Phase, 7, 40.0)];
        tables
    }

    #[test]
    fn test_minimum_of_drainage_and_water_codes() {
        let req = requirements(tables(), InputLevel::Low);
        let mut profile = profile(vec![horizon(0.0, 20.0)]);
        profile.attributes.drainage = Some(DrainageClass::Poorly);
        profile.attributes.swr = 3;
        let ctx = ScoringContext { profile: &profile, requirements: &req, weights: &[1.0], input_level: InputLevel::Low };
        let result = calculate_sq4(&ctx);
        assert_eq!(result.drainage_score, 50.0);
        assert_eq!(result.swr_score, 60.0);
        assert_eq!(result.score, 50.0);
    }

    #[test]
    fn test_phreatic_phase_and_unknown_drainage() {
        let req = requirements(tables(), InputLevel::Low);
        let mut profile = profile(vec![horizon(0.0, 20.0)]);
        profile.attributes.phases.push(Phase::Phreatic);
        let ctx = ScoringContext { profile: &profile, requirements: &req, weights: &[1.0], input_level: InputLevel::Low };
        let result = calculate_sq4(&ctx);
        assert_eq!(result.drainage_score, 100.0);
        assert_eq!(result.score, 40.0);
    }
}
