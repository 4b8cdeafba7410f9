//! Crop requirement catalogue
//!
//! Typed reference tables keyed by crop and input level:
//!
//! - **profile_req**: constraint-curve breakpoints per (SQI, numeric property)
//! - **texture_req**: score per (SQI, texture class id)
//! - **phase_req**: score per (SQI, phase property, code)
//! - **drainage_req**: score per (SQI, PSCL id, drainage id)
//! - **terrain_req**: slope breakpoints (loaded and queryable, not scored)
//!
//! `RequirementCatalogue` is an immutable snapshot. `CropRequirements` is the
//! per-request view filtered to one crop and input level, with curves built
//! once. `CatalogueHandle` shares a snapshot across threads and publishes
//! reloads atomically.

pub mod loader;

pub use loader::load_catalogue;

use crate::error::{SqiError, SqiResult};
use crate::phase::Phase;
use crate::types::{DrainageClass, InputLevel, Pscl, RootingClass, SqiCode};
use crate::utils::constraint_curve::ConstraintCurve;
use crate::utils::texture::TextureClass;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

// ============================================================================
// Property keys
// ============================================================================

/// Numeric property with a constraint curve in profile_req
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileProperty {
    Oc,
    Ph,
    Teb,
    Bs,
    Cecs,
    Cecc,
    Esp,
    Ec,
    Ca,
    Gy,
    Rd,
    Db,
    Ver,
    Gel,
    Cf,
}

impl ProfileProperty {
    pub fn code(&self) -> &'static str {
        match self {
            ProfileProperty::Oc => "oc",
            ProfileProperty::Ph => "ph",
            ProfileProperty::Teb => "teb",
            ProfileProperty::Bs => "bs",
            ProfileProperty::Cecs => "cecs",
            ProfileProperty::Cecc => "cecc",
            ProfileProperty::Esp => "esp",
            ProfileProperty::Ec => "ec",
            ProfileProperty::Ca => "ca",
            ProfileProperty::Gy => "gy",
            ProfileProperty::Rd => "rd",
            ProfileProperty::Db => "db",
            ProfileProperty::Ver => "ver",
            ProfileProperty::Gel => "gel",
            ProfileProperty::Cf => "cf",
        }
    }
}

impl FromStr for ProfileProperty {
    type Err = SqiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oc" => Ok(ProfileProperty::Oc),
            "ph" => Ok(ProfileProperty::Ph),
            "teb" => Ok(ProfileProperty::Teb),
            "bs" => Ok(ProfileProperty::Bs),
            "cecs" => Ok(ProfileProperty::Cecs),
            "cecc" => Ok(ProfileProperty::Cecc),
            "esp" => Ok(ProfileProperty::Esp),
            "ec" => Ok(ProfileProperty::Ec),
            "ca" => Ok(ProfileProperty::Ca),
            "gy" => Ok(ProfileProperty::Gy),
            "rd" => Ok(ProfileProperty::Rd),
            "db" => Ok(ProfileProperty::Db),
            "ver" => Ok(ProfileProperty::Ver),
            "gel" => Ok(ProfileProperty::Gel),
            "cf" => Ok(ProfileProperty::Cf),
            other => Err(SqiError::Catalogue(format!("unknown profile property '{}'", other))),
        }
    }
}

impl fmt::Display for ProfileProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Categorical property in phase_req
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseProperty {
    Phase,
    Roots,
    Il,
    Swr,
}

impl FromStr for PhaseProperty {
    type Err = SqiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "phase" => Ok(PhaseProperty::Phase),
            "roots" => Ok(PhaseProperty::Roots),
            "il" => Ok(PhaseProperty::Il),
            "swr" => Ok(PhaseProperty::Swr),
            other => Err(SqiError::Catalogue(format!("unknown phase property '{}'", other))),
        }
    }
}

/// Requirement table selector for catalogue queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementKind {
    Profile,
    Texture,
    Phase,
    Drainage,
    Terrain,
    All,
}

impl FromStr for RequirementKind {
    type Err = SqiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "profile" => Ok(RequirementKind::Profile),
            "texture" => Ok(RequirementKind::Texture),
            "phase" => Ok(RequirementKind::Phase),
            "drainage" => Ok(RequirementKind::Drainage),
            "terrain" => Ok(RequirementKind::Terrain),
            "all" => Ok(RequirementKind::All),
            other => Err(SqiError::Validation(format!("unknown requirement kind '{}'", other))),
        }
    }
}

// ============================================================================
// Table rows
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileRequirement {
    pub crop_id: String,
    pub input_level: u8,
    pub sqi: u8,
    pub property: ProfileProperty,
    pub property_value: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextureRequirement {
    pub crop_id: String,
    pub input_level: u8,
    pub sqi: u8,
    pub texture_class_id: u8,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseRequirement {
    pub crop_id: String,
    pub input_level: u8,
    pub sqi: u8,
    pub property: PhaseProperty,
    pub phase_id: u8,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrainageRequirement {
    pub crop_id: String,
    pub input_level: u8,
    pub sqi: u8,
    pub pscl_id: u8,
    pub drain_num: u8,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerrainRequirement {
    pub crop_id: String,
    pub input_level: u8,
    pub slope_pct: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropInfo {
    pub crop_id: String,
    pub crop_name: String,
    pub rooting_class: RootingClass,
}

/// Rows of one crop and input level, as returned by catalogue queries
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequirementTables {
    pub profile: Vec<ProfileRequirement>,
    pub texture: Vec<TextureRequirement>,
    pub phase: Vec<PhaseRequirement>,
    pub drainage: Vec<DrainageRequirement>,
    pub terrain: Vec<TerrainRequirement>,
}

impl RequirementTables {
    pub fn is_empty(&self) -> bool {
        self.profile.is_empty()
            && self.texture.is_empty()
            && self.phase.is_empty()
            && self.drainage.is_empty()
            && self.terrain.is_empty()
    }
}

// ============================================================================
// Per-crop requirements
// ============================================================================

/// A numeric property's score function
#[derive(Debug, Clone)]
enum PropertyCurve {
    /// Only one distinct breakpoint
    Constant(f64),
    Curve(ConstraintCurve),
}

impl PropertyCurve {
    fn build(points: &[(f64, f64)]) -> SqiResult<Self> {
        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
        sorted.dedup_by(|later, earlier| later.0 == earlier.0);
        match sorted.as_slice() {
            [] => Err(SqiError::InvalidCurve("breakpoint table is empty".into())),
            [(_, score)] => Ok(PropertyCurve::Constant(*score)),
            _ => Ok(PropertyCurve::Curve(ConstraintCurve::new(&sorted)?)),
        }
    }

    fn eval(&self, x: f64) -> f64 {
        match self {
            PropertyCurve::Constant(score) => *score,
            PropertyCurve::Curve(curve) => curve.eval(x),
        }
    }
}

/// Requirements of one crop at one input level, ready for scoring
///
/// Within a populated set, a lookup without a matching row means "no
/// constraint" and scores 100. An entirely empty set is not scored
/// (see `is_empty`).
#[derive(Debug, Clone)]
pub struct CropRequirements {
    pub crop_id: String,
    pub input_level: InputLevel,
    breakpoints: FxHashMap<(SqiCode, ProfileProperty), Vec<(f64, f64)>>,
    curves: FxHashMap<(SqiCode, ProfileProperty), PropertyCurve>,
    texture: FxHashMap<(SqiCode, u8), f64>,
    phase: FxHashMap<(SqiCode, PhaseProperty, u8), f64>,
    drainage: FxHashMap<(SqiCode, u8, u8), f64>,
    terrain: Option<PropertyCurve>,
}

impl CropRequirements {
    pub fn from_tables(crop_id: &str, input_level: InputLevel, tables: &RequirementTables) -> SqiResult<Self> {
        let mut breakpoints: FxHashMap<(SqiCode, ProfileProperty), Vec<(f64, f64)>> = FxHashMap::default();
        for row in &tables.profile {
            if let Some(sqi) = SqiCode::from_id(row.sqi) {
                breakpoints
                    .entry((sqi, row.property))
                    .or_default()
                    .push((row.property_value, row.score));
            }
        }

        let curves = breakpoints
            .iter()
            .map(|(key, points)| {
                PropertyCurve::build(points)
                    .map(|curve| (*key, curve))
                    .map_err(|e| {
                        SqiError::InvalidCurve(format!(
                            "crop {} SQ{} {}: {}",
                            crop_id,
                            key.0.id(),
                            key.1,
                            e
                        ))
                    })
            })
            .collect::<SqiResult<FxHashMap<_, _>>>()?;

        let texture = tables
            .texture
            .iter()
            .filter_map(|r| SqiCode::from_id(r.sqi).map(|sqi| ((sqi, r.texture_class_id), r.score)))
            .collect();
        let phase = tables
            .phase
            .iter()
            .filter_map(|r| SqiCode::from_id(r.sqi).map(|sqi| ((sqi, r.property, r.phase_id), r.score)))
            .collect();
        let drainage = tables
            .drainage
            .iter()
            .filter_map(|r| SqiCode::from_id(r.sqi).map(|sqi| ((sqi, r.pscl_id, r.drain_num), r.score)))
            .collect();

        let terrain_points: Vec<(f64, f64)> = tables.terrain.iter().map(|r| (r.slope_pct, r.score)).collect();
        let terrain = if terrain_points.is_empty() {
            None
        } else {
            Some(PropertyCurve::build(&terrain_points)?)
        };

        Ok(Self {
            crop_id: crop_id.to_string(),
            input_level,
            breakpoints,
            curves,
            texture,
            phase,
            drainage,
            terrain,
        })
    }

    /// True when no profile, texture, phase or drainage row applies
    ///
    /// Such a crop cannot be scored at all, which is different from a crop
    /// that simply sets no constraint on one property.
    pub fn is_empty(&self) -> bool {
        self.curves.is_empty() && self.texture.is_empty() && self.phase.is_empty() && self.drainage.is_empty()
    }

    pub fn has_property(&self, sqi: SqiCode, property: ProfileProperty) -> bool {
        self.curves.contains_key(&(sqi, property))
    }

    /// Curve score for a measured value
    ///
    /// None when the value is missing (the sub-score drops out); 100 when the
    /// crop sets no requirement for the property.
    pub fn property_score(&self, sqi: SqiCode, property: ProfileProperty, value: Option<f64>) -> Option<f64> {
        let value = value.filter(|v| !v.is_nan())?;
        Some(
            self.curves
                .get(&(sqi, property))
                .map_or(100.0, |curve| curve.eval(value)),
        )
    }

    /// Penalty for a present/absent trait (`ver`, `gel`)
    ///
    /// Reads the row at property value 1, or the property's lowest score.
    pub fn flag_penalty(&self, sqi: SqiCode, property: ProfileProperty, present: bool) -> f64 {
        if !present {
            return 100.0;
        }
        let Some(points) = self.breakpoints.get(&(sqi, property)) else {
            return 100.0;
        };
        points
            .iter()
            .find(|(value, _)| *value == 1.0)
            .map(|(_, score)| *score)
            .unwrap_or_else(|| points.iter().map(|(_, s)| *s).fold(100.0, f64::min))
    }

    pub fn texture_score(&self, sqi: SqiCode, texture: Option<TextureClass>) -> f64 {
        texture
            .and_then(|t| self.texture.get(&(sqi, t.id())).copied())
            .unwrap_or(100.0)
    }

    pub fn phase_score(&self, sqi: SqiCode, property: PhaseProperty, code: u8) -> f64 {
        self.phase.get(&(sqi, property, code)).copied().unwrap_or(100.0)
    }

    /// Most limiting phase-table score among the given phases; 100 for none
    pub fn phase_list_score(&self, sqi: SqiCode, phases: &[Phase]) -> f64 {
        phases
            .iter()
            .map(|p| self.phase_score(sqi, PhaseProperty::Phase, p.id()))
            .fold(100.0, f64::min)
    }

    pub fn drainage_score(&self, sqi: SqiCode, pscl: Option<Pscl>, drainage: Option<DrainageClass>) -> f64 {
        match (pscl, drainage) {
            (Some(pscl), Some(drainage)) => self
                .drainage
                .get(&(sqi, pscl.id(), drainage.id()))
                .copied()
                .unwrap_or(100.0),
            _ => 100.0,
        }
    }

    /// Slope suitability; None when the crop has no terrain requirement
    pub fn terrain_score(&self, slope_pct: f64) -> Option<f64> {
        self.terrain.as_ref().map(|curve| curve.eval(slope_pct))
    }
}

// ============================================================================
// Catalogue snapshot
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct RequirementCatalogue {
    profile: Vec<ProfileRequirement>,
    texture: Vec<TextureRequirement>,
    phase: Vec<PhaseRequirement>,
    drainage: Vec<DrainageRequirement>,
    terrain: Vec<TerrainRequirement>,
    crops: FxHashMap<String, CropInfo>,
}

/// Keep, per key, only the rows of the most preferred admitted input level
fn select_level<'a, T, K: Hash + Eq>(
    rows: impl Iterator<Item = &'a T>,
    level: InputLevel,
    input_level: impl Fn(&T) -> u8,
    key: impl Fn(&T) -> K,
) -> Vec<T>
where
    T: Clone + 'a,
{
    let admitted: Vec<&T> = rows
        .filter(|r| level.level_rank(input_level(r)).is_some())
        .collect();

    let mut best: FxHashMap<K, usize> = FxHashMap::default();
    for row in &admitted {
        let rank = level.level_rank(input_level(row)).unwrap_or(usize::MAX);
        best.entry(key(row))
            .and_modify(|b| *b = (*b).min(rank))
            .or_insert(rank);
    }

    admitted
        .into_iter()
        .filter(|row| best.get(&key(row)) == level.level_rank(input_level(row)).as_ref())
        .cloned()
        .collect()
}

impl RequirementCatalogue {
    pub fn from_rows(
        profile: Vec<ProfileRequirement>,
        texture: Vec<TextureRequirement>,
        phase: Vec<PhaseRequirement>,
        drainage: Vec<DrainageRequirement>,
        terrain: Vec<TerrainRequirement>,
        crops: Vec<CropInfo>,
    ) -> Self {
        let crops = crops.into_iter().map(|c| (c.crop_id.clone(), c)).collect();
        Self { profile, texture, phase, drainage, terrain, crops }
    }

    pub fn row_count(&self) -> usize {
        self.profile.len() + self.texture.len() + self.phase.len() + self.drainage.len() + self.terrain.len()
    }

    pub fn has_crop(&self, crop_id: &str) -> bool {
        self.crops.contains_key(crop_id) || self.profile.iter().any(|r| r.crop_id == crop_id)
    }

    /// Crop name and rooting class; unknown crops get "Crop <id>" rooting deep
    pub fn crop_info(&self, crop_id: &str) -> CropInfo {
        self.crops.get(crop_id).cloned().unwrap_or_else(|| {
            debug!(crop_id, "Crop not in crop table, defaulting to deep rooting");
            CropInfo {
                crop_id: crop_id.to_string(),
                crop_name: format!("Crop {}", crop_id),
                rooting_class: RootingClass::default(),
            }
        })
    }

    /// Rows for a crop filtered to the input level's admitted catalogue levels
    ///
    /// Where a property (or lookup key) is defined at several admitted levels,
    /// the rows of the most specific level are kept.
    pub fn tables(&self, crop_id: &str, level: InputLevel, kind: RequirementKind) -> RequirementTables {
        let want = |k: RequirementKind| kind == RequirementKind::All || kind == k;
        let mut tables = RequirementTables::default();

        if want(RequirementKind::Profile) {
            tables.profile = select_level(
                self.profile.iter().filter(|r| r.crop_id == crop_id),
                level,
                |r| r.input_level,
                |r| (r.sqi, r.property),
            );
        }
        if want(RequirementKind::Texture) {
            tables.texture = select_level(
                self.texture.iter().filter(|r| r.crop_id == crop_id),
                level,
                |r| r.input_level,
                |r| (r.sqi, r.texture_class_id),
            );
        }
        if want(RequirementKind::Phase) {
            tables.phase = select_level(
                self.phase.iter().filter(|r| r.crop_id == crop_id),
                level,
                |r| r.input_level,
                |r| (r.sqi, r.property, r.phase_id),
            );
        }
        if want(RequirementKind::Drainage) {
            tables.drainage = select_level(
                self.drainage.iter().filter(|r| r.crop_id == crop_id),
                level,
                |r| r.input_level,
                |r| (r.sqi, r.pscl_id, r.drain_num),
            );
        }
        if want(RequirementKind::Terrain) {
            tables.terrain = select_level(
                self.terrain.iter().filter(|r| r.crop_id == crop_id),
                level,
                |r| r.input_level,
                |_| (),
            );
        }
        tables
    }

    /// Scoring view of one crop at one input level
    ///
    /// An unknown crop yields empty requirements, which score as NaN.
    pub fn requirements(&self, crop_id: &str, level: InputLevel) -> SqiResult<CropRequirements> {
        let tables = self.tables(crop_id, level, RequirementKind::All);
        if tables.is_empty() {
            debug!(crop_id, level = %level, "No requirement rows for crop");
        }
        CropRequirements::from_tables(crop_id, level, &tables)
    }
}

// ============================================================================
// Shared handle
// ============================================================================

/// Process-wide catalogue snapshot with atomic reload
#[derive(Debug)]
pub struct CatalogueHandle {
    current: RwLock<Arc<RequirementCatalogue>>,
    source_dir: Option<PathBuf>,
}

impl CatalogueHandle {
    pub fn new(catalogue: RequirementCatalogue) -> Self {
        Self { current: RwLock::new(Arc::new(catalogue)), source_dir: None }
    }

    /// Load from a directory of requirement CSVs and remember it for reloads
    pub fn load_dir(dir: &Path) -> SqiResult<Self> {
        let catalogue = load_catalogue(dir).map_err(|e| SqiError::Catalogue(format!("{:#}", e)))?;
        info!(dir = %dir.display(), rows = catalogue.row_count(), "Loaded crop requirement catalogue");
        Ok(Self {
            current: RwLock::new(Arc::new(catalogue)),
            source_dir: Some(dir.to_path_buf()),
        })
    }

    /// Current immutable snapshot
    pub fn snapshot(&self) -> Arc<RequirementCatalogue> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn publish(&self, catalogue: RequirementCatalogue) {
        let next = Arc::new(catalogue);
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Re-read the source directory and publish the result; the old snapshot
    /// stays active if loading fails
    pub fn reload(&self) -> SqiResult<usize> {
        let dir = self
            .source_dir
            .as_ref()
            .ok_or_else(|| SqiError::Catalogue("catalogue was not loaded from a directory".into()))?;
        let catalogue = load_catalogue(dir).map_err(|e| SqiError::Catalogue(format!("{:#}", e)))?;
        let rows = catalogue.row_count();
        self.publish(catalogue);
        info!(dir = %dir.display(), rows, "Reloaded crop requirement catalogue");
        Ok(rows)
    }
}
