//! Soil profile data model
//!
//! `SsurgoHorizon` is a raw row from a soil data source. The phase classifier
//! turns a component's rows into a `SoilProfile`: scorer-ready
//! `HorizonRecord`s plus the `ProfileAttributes` that are constant across the
//! component (restrictive depth, phase list, drainage, compaction).

use crate::phase::{AdditionalProperty, Phase, PhaseList};
use crate::types::{DrainageClass, Pscl};
use crate::utils::texture::{classify_texture, TextureClass, TextureComponents};
use serde::{Deserialize, Serialize};

/// Horizons starting above this depth are topsoil, the rest subsoil (cm)
pub const TOPSOIL_DEPTH_CM: f64 = 30.0;

/// Restrictive depth used when no restriction is recorded (cm)
pub const NO_RESTRICTION_DEPTH_CM: f64 = 200.0;

/// Van Bemmelen factor: organic matter = organic carbon x 1.724
pub const OC_TO_OM: f64 = 1.724;

/// Organic carbon share of organic matter
pub const OM_TO_OC: f64 = 0.58;

/// CEC contributed per % organic carbon, removed before expressing CEC per clay
const CEC_PER_OC: f64 = 3.5;

// ============================================================================
// Raw SSURGO rows
// ============================================================================

/// One horizon row of a SSURGO map-unit component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SsurgoHorizon {
    pub mukey: String,
    pub cokey: String,
    pub compname: String,
    pub comppct_r: Option<f64>,
    pub top_depth_cm: f64,
    pub bottom_depth_cm: f64,
    pub sand: Option<f64>,
    pub silt: Option<f64>,
    pub clay: Option<f64>,
    /// Organic matter (%)
    pub om: Option<f64>,
    pub ph: Option<f64>,
    pub cecs: Option<f64>,
    pub teb: Option<f64>,
    pub bs: Option<f64>,
    pub ec: Option<f64>,
    pub esp: Option<f64>,
    pub caco3: Option<f64>,
    pub gypsum: Option<f64>,
    /// Bulk density (g/cm3)
    pub db_measured: Option<f64>,
    pub fragvol: Option<f64>,
    pub drainagecl: Option<String>,
    pub restrictive_depth_cm: Option<f64>,
    /// Restrictive feature kind ("Lithic bedrock", "Duripan", ...)
    pub restriction_kind: Option<String>,
    /// Flooding frequency class
    pub flooding: Option<String>,
    pub temperature_class: Option<String>,
    pub taxonomy: Option<String>,
    #[serde(default)]
    pub cracks: bool,
    pub slope_pct: Option<f64>,
    pub elevation_m: Option<f64>,
    /// Suffixes of the `phase_*` columns set on this row ("lithic", "3", ...)
    #[serde(default)]
    pub phase_flags: Vec<String>,
}

// ============================================================================
// Horizon records
// ============================================================================

/// Scorer-ready horizon with derived chemistry and texture ids
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorizonRecord {
    pub top_depth_cm: f64,
    pub bottom_depth_cm: f64,
    pub sand_pct: Option<f64>,
    pub silt_pct: Option<f64>,
    pub clay_pct: Option<f64>,
    pub texture: Option<TextureClass>,
    pub pscl: Option<Pscl>,
    /// Organic matter (%)
    pub om: Option<f64>,
    /// Organic carbon (%)
    pub soc: Option<f64>,
    pub ph: Option<f64>,
    pub cecs: Option<f64>,
    /// CEC of the clay fraction (cmol/kg clay)
    pub cecc: Option<f64>,
    pub teb: Option<f64>,
    pub bs: Option<f64>,
    pub ec: Option<f64>,
    pub esp: Option<f64>,
    pub caco3: Option<f64>,
    pub gypsum: Option<f64>,
    pub db_measured: Option<f64>,
    /// Measured over texture reference bulk density
    pub db: Option<f64>,
    pub fragvol: f64,
    #[serde(skip)]
    bs_derived: bool,
}

impl HorizonRecord {
    /// Empty horizon covering `top..bottom`
    pub fn new(top_depth_cm: f64, bottom_depth_cm: f64) -> Self {
        Self {
            top_depth_cm,
            bottom_depth_cm,
            sand_pct: None,
            silt_pct: None,
            clay_pct: None,
            texture: None,
            pscl: None,
            om: None,
            soc: None,
            ph: None,
            cecs: None,
            cecc: None,
            teb: None,
            bs: None,
            ec: None,
            esp: None,
            caco3: None,
            gypsum: None,
            db_measured: None,
            db: None,
            fragvol: 0.0,
            bs_derived: true,
        }
    }

    pub fn from_ssurgo(row: &SsurgoHorizon) -> Self {
        let mut record = Self::new(row.top_depth_cm, row.bottom_depth_cm);
        record.sand_pct = row.sand;
        record.silt_pct = row.silt;
        record.clay_pct = row.clay;
        record.ph = row.ph;
        record.cecs = row.cecs;
        record.teb = row.teb;
        record.ec = row.ec;
        record.esp = row.esp;
        record.caco3 = row.caco3;
        record.gypsum = row.gypsum;
        record.db_measured = row.db_measured;
        record.fragvol = row.fragvol.filter(|v| v.is_finite()).unwrap_or(0.0);
        if let Some(om) = row.om {
            record.set_organic_matter(om);
        }
        if let Some(bs) = row.bs {
            record.set_base_saturation(bs);
        }
        record.recompute_texture();
        record.refresh_derived();
        record
    }

    pub fn thickness(&self) -> f64 {
        (self.bottom_depth_cm - self.top_depth_cm).max(0.0)
    }

    pub fn is_topsoil(&self) -> bool {
        self.top_depth_cm < TOPSOIL_DEPTH_CM
    }

    pub fn contains_depth(&self, depth_cm: f64) -> bool {
        depth_cm >= self.top_depth_cm && depth_cm < self.bottom_depth_cm
    }

    pub fn overlaps(&self, top_cm: f64, bottom_cm: f64) -> bool {
        self.top_depth_cm < bottom_cm && top_cm < self.bottom_depth_cm
    }

    pub fn texture_class_id(&self) -> Option<u8> {
        self.texture.map(|t| t.id())
    }

    /// Organic matter; organic carbon follows as `om x 0.58`
    pub fn set_organic_matter(&mut self, om: f64) {
        self.om = Some(om);
        self.soc = Some(om * OM_TO_OC);
    }

    /// Reported organic carbon is kept as is; organic matter becomes `oc x 1.724`
    pub fn set_organic_carbon(&mut self, oc: f64) {
        self.soc = Some(oc);
        self.om = Some(oc * OC_TO_OM);
    }

    /// Measured base saturation; stops deriving it from TEB / CEC
    pub fn set_base_saturation(&mut self, bs: f64) {
        self.bs = Some(bs);
        self.bs_derived = false;
    }

    /// Reclassify texture and PSCL from the current sand/silt/clay
    pub fn recompute_texture(&mut self) -> Option<TextureClass> {
        self.texture = self.texture_class();
        self.pscl = self.texture.map(|t| t.pscl());
        self.texture
    }

    /// Recompute fields derived from other columns: bs (unless measured), cecc, db ratio
    pub fn refresh_derived(&mut self) {
        if self.bs_derived {
            self.bs = match (self.teb, self.cecs) {
                (Some(teb), Some(cecs)) if cecs > 0.0 => Some((teb * 100.0 / cecs).min(100.0)),
                _ => None,
            };
        }

        self.cecc = match (self.cecs, self.soc, self.clay_pct) {
            (Some(cecs), Some(soc), Some(clay)) if clay > 0.0 => {
                Some((cecs - CEC_PER_OC * soc).max(0.0) * 100.0 / clay)
            }
            _ => None,
        };

        self.db = match (self.db_measured, self.texture) {
            (Some(db), Some(texture)) => Some(db / texture.reference_bulk_density()),
            _ => None,
        };
    }
}

impl TextureComponents for HorizonRecord {
    fn sand_pct(&self) -> Option<f64> {
        self.sand_pct
    }
    fn silt_pct(&self) -> Option<f64> {
        self.silt_pct
    }
    fn clay_pct(&self) -> Option<f64> {
        self.clay_pct
    }
}

// ============================================================================
// Profile attributes
// ============================================================================

/// Shallowest restrictive feature of a component
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Restriction {
    pub depth_cm: f64,
    pub kind: Option<String>,
}

/// Component-level attributes shared by all horizons
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileAttributes {
    /// Restrictive depth (cm), 200 when unrestricted
    pub rd: f64,
    pub restriction: Option<Restriction>,
    pub vertic: bool,
    pub gelic: bool,
    pub add_prop: AdditionalProperty,
    /// Empty when the component has no phase
    pub phases: PhaseList,
    pub roots: u8,
    pub il: u8,
    pub swr: u8,
    pub drainage: Option<DrainageClass>,
    pub drainagecl: Option<String>,
    pub flooding: Option<String>,
    /// Topsoil degree of compactness (thickness-weighted db ratio)
    pub t_dc: Option<f64>,
    /// Subsoil degree of compactness
    pub s_dc: Option<f64>,
    pub slope_pct: Option<f64>,
    pub elevation_m: Option<f64>,
}

impl ProfileAttributes {
    /// Phase ids as stored in the phase requirement table; `[0]` when none
    pub fn phase_ids(&self) -> Vec<u8> {
        if self.phases.is_empty() {
            vec![0]
        } else {
            self.phases.iter().map(Phase::id).collect()
        }
    }

    pub fn drain_id(&self) -> Option<u8> {
        self.drainage.map(|d| d.id())
    }
}

impl Default for ProfileAttributes {
    fn default() -> Self {
        Self {
            rd: NO_RESTRICTION_DEPTH_CM,
            restriction: None,
            vertic: false,
            gelic: false,
            add_prop: AdditionalProperty::None,
            phases: PhaseList::new(),
            roots: 1,
            il: 1,
            swr: 1,
            drainage: None,
            drainagecl: None,
            flooding: None,
            t_dc: None,
            s_dc: None,
            slope_pct: None,
            elevation_m: None,
        }
    }
}

// ============================================================================
// Soil profile
// ============================================================================

/// The dominant component at a point, ready for scoring
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoilProfile {
    pub mukey: String,
    pub cokey: String,
    pub compname: String,
    pub attributes: ProfileAttributes,
    pub horizons: Vec<HorizonRecord>,
}

impl SoilProfile {
    pub fn intervals(&self) -> Vec<(f64, f64)> {
        self.horizons
            .iter()
            .map(|h| (h.top_depth_cm, h.bottom_depth_cm))
            .collect()
    }

    /// Recompute topsoil and subsoil degree of compactness from horizon db ratios
    pub fn refresh_compaction(&mut self) {
        self.attributes.t_dc = thickness_weighted_db(self.horizons.iter().filter(|h| h.is_topsoil()));
        self.attributes.s_dc = thickness_weighted_db(self.horizons.iter().filter(|h| !h.is_topsoil()));
    }

    /// PSCL of the shallowest horizon that has one
    pub fn profile_pscl(&self) -> Option<Pscl> {
        self.horizons
            .iter()
            .filter(|h| h.pscl.is_some())
            .min_by(|a, b| a.top_depth_cm.total_cmp(&b.top_depth_cm))
            .and_then(|h| h.pscl)
    }

    /// Horizon holding a point depth; the profile bottom belongs to the deepest horizon
    pub fn horizon_at_depth_mut(&mut self, depth_cm: f64) -> Option<&mut HorizonRecord> {
        if let Some(i) = self.horizons.iter().position(|h| h.contains_depth(depth_cm)) {
            return self.horizons.get_mut(i);
        }
        self.horizons
            .iter_mut()
            .max_by(|a, b| a.bottom_depth_cm.total_cmp(&b.bottom_depth_cm))
            .filter(|h| h.bottom_depth_cm == depth_cm)
    }

    pub fn sort_by_depth(&mut self) {
        self.horizons
            .sort_by(|a, b| a.top_depth_cm.total_cmp(&b.top_depth_cm));
    }
}

fn thickness_weighted_db<'a>(horizons: impl Iterator<Item = &'a HorizonRecord>) -> Option<f64> {
    let (num, den) = horizons
        .filter_map(|h| h.db.filter(|v| v.is_finite()).map(|db| (h.thickness(), db)))
        .fold((0.0, 0.0), |(num, den), (t, db)| (num + t * db, den + t));
    (den > 0.0).then(|| num / den)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn loam_row() -> SsurgoHorizon {
        SsurgoHorizon {
            top_depth_cm: 0.0,
            bottom_depth_cm: 20.0,
            sand: Some(25.0),
            silt: Some(55.0),
            clay: Some(20.0),
            om: Some(3.0),
            ph: Some(6.5),
            teb: Some(14.0),
            cecs: Some(18.0),
            db_measured: Some(1.35),
            ..Default::default()
        }
    }

    #[test]
    fn test_derived_chemistry() {
        let h = HorizonRecord::from_ssurgo(&loam_row());
        assert_eq!(h.texture, Some(TextureClass::SiltLoam));
        assert_eq!(h.pscl, Some(Pscl::Medium));
        assert_relative_eq!(h.soc.unwrap(), 1.74, epsilon = 1e-9);
        assert_relative_eq!(h.bs.unwrap(), 14.0 * 100.0 / 18.0, epsilon = 1e-9);
        // (18 - 3.5 * 1.74) * 100 / 20
        assert_relative_eq!(h.cecc.unwrap(), 59.55, epsilon = 1e-9);
        assert_relative_eq!(h.db.unwrap(), 1.35 / 1.60, epsilon = 1e-9);
        assert_eq!(h.fragvol, 0.0);
    }

    #[test]
    fn test_measured_bs_is_kept() {
        let row = SsurgoHorizon { bs: Some(85.0), ..loam_row() };
        let mut h = HorizonRecord::from_ssurgo(&row);
        h.cecs = Some(30.0);
        h.refresh_derived();
        assert_eq!(h.bs, Some(85.0));
    }

    #[test]
    fn test_organic_carbon_is_not_round_tripped() {
        let mut h = HorizonRecord::from_ssurgo(&loam_row());
        h.set_organic_carbon(1.5);
        assert_eq!(h.soc, Some(1.5));
        assert_relative_eq!(h.om.unwrap(), 2.586, epsilon = 1e-9);
    }

    #[test]
    fn test_compaction_is_thickness_weighted() {
        let mut top = HorizonRecord::new(0.0, 10.0);
        top.db = Some(0.8);
        let mut top2 = HorizonRecord::new(10.0, 30.0);
        top2.db = Some(1.1);
        let mut sub = HorizonRecord::new(30.0, 60.0);
        sub.db = None;
        let mut profile = SoilProfile {
            mukey: "1".into(),
            cokey: "1".into(),
            compname: "Test".into(),
            attributes: ProfileAttributes::default(),
            horizons: vec![sub, top2, top],
        };
        profile.refresh_compaction();
        assert_relative_eq!(profile.attributes.t_dc.unwrap(), (8.0 + 22.0) / 30.0, epsilon = 1e-9);
        assert_eq!(profile.attributes.s_dc, None);
        assert_eq!(profile.attributes.phase_ids(), vec![0]);
    }

    #[test]
    fn test_profile_bottom_belongs_to_deepest_horizon() {
        let mut profile = SoilProfile {
            mukey: "1".into(),
            cokey: "1".into(),
            compname: "Test".into(),
            attributes: ProfileAttributes::default(),
            horizons: vec![HorizonRecord::new(50.0, 120.0), HorizonRecord::new(0.0, 50.0)],
        };
        assert_eq!(profile.horizon_at_depth_mut(50.0).map(|h| h.top_depth_cm), Some(50.0));
        assert_eq!(profile.horizon_at_depth_mut(120.0).map(|h| h.top_depth_cm), Some(50.0));
        assert!(profile.horizon_at_depth_mut(120.5).is_none());
        assert!(profile.horizon_at_depth_mut(-1.0).is_none());
    }

    #[test]
    fn test_depth_predicates() {
        let h = HorizonRecord::new(20.0, 50.0);
        assert!(h.is_topsoil());
        assert!(h.contains_depth(20.0));
        assert!(!h.contains_depth(50.0));
        assert!(h.overlaps(0.0, 25.0));
        assert!(!h.overlaps(50.0, 80.0));
        assert!(!HorizonRecord::new(30.0, 50.0).is_topsoil());
    }
}
