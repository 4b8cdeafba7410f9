//! Profile-level sub-scores shared by SQ3 (rooting conditions) and SQ7 (workability)
//!
//! These are computed once per index from the profile attributes, then combined
//! with the per-horizon texture and coarse-fragment scores.

use super::ScoringContext;
use crate::catalogue::{PhaseProperty, ProfileProperty};
use crate::horizon::NO_RESTRICTION_DEPTH_CM;
use crate::phase::{AdditionalProperty, Phase};
use crate::types::SqiCode;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RootingScalars {
    /// Rooting depth (restrictive layer) score
    pub rd: f64,
    /// Topsoil degree-of-compactness score
    pub db_top: f64,
    /// Subsoil degree-of-compactness score
    pub db_sub: f64,
    pub vertic: f64,
    pub gelic: f64,
    pub petric: f64,
    /// Most limiting phase of the component
    pub phase: f64,
    pub roots: f64,
    pub il: f64,
}

impl RootingScalars {
    pub fn db_for(&self, topsoil: bool) -> f64 {
        if topsoil {
            self.db_top
        } else {
            self.db_sub
        }
    }
}

pub fn rooting_scalars(ctx: &ScoringContext, sqi: SqiCode) -> RootingScalars {
    let req = ctx.requirements;
    let attributes = &ctx.profile.attributes;

    let rd = if attributes.rd.is_nan() { NO_RESTRICTION_DEPTH_CM } else { attributes.rd };
    let curve = |property: ProfileProperty, value: Option<f64>| {
        req.property_score(sqi, property, value).unwrap_or(100.0)
    };

    let petric = if attributes.add_prop == AdditionalProperty::Petric {
        req.phase_score(sqi, PhaseProperty::Phase, Phase::Petric.id())
    } else {
        100.0
    };

    RootingScalars {
        rd: curve(ProfileProperty::Rd, Some(rd)),
        db_top: curve(ProfileProperty::Db, attributes.t_dc),
        db_sub: curve(ProfileProperty::Db, attributes.s_dc),
        vertic: req.flag_penalty(sqi, ProfileProperty::Ver, attributes.vertic),
        gelic: req.flag_penalty(sqi, ProfileProperty::Gel, attributes.gelic),
        petric,
        phase: req.phase_list_score(sqi, &attributes.phases),
        roots: req.phase_score(sqi, PhaseProperty::Roots, attributes.roots),
        il: req.phase_score(sqi, PhaseProperty::Il, attributes.il),
    }
}
