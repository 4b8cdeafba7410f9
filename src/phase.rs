//! Phase Classifier
//!
//! Enriches a component's SSURGO horizon rows with the categorical codes the
//! rooting, oxygen and workability indices look up in the phase requirement
//! table:
//!
//! - **phases**: union of the `phase_*` flags set on any row, plus petric when a
//!   cemented restriction lies within 100 cm
//! - **rd**: shallowest restrictive depth, 200 cm when none is recorded
//! - **il**: impermeable-layer code from restriction kind and depth
//! - **roots**: rooting-restriction code from `rd`
//! - **swr**: surface-water-retention code from drainage and flooding
//! - **gelic / vertic / add_prop**: petric dominates gelic, both dominate vertic

use crate::error::{SqiError, SqiResult};
use crate::horizon::{
    HorizonRecord, ProfileAttributes, Restriction, SoilProfile, SsurgoHorizon,
    NO_RESTRICTION_DEPTH_CM,
};
use crate::types::DrainageClass;
use serde::{Serialize, Serializer};
use smallvec::SmallVec;
use tracing::{debug, warn};

/// Depth (cm) within which a cemented restriction counts as a petric phase
const PETRIC_DEPTH_CM: f64 = 100.0;

/// Vertic properties need a clayey horizon starting above this depth (cm)
const VERTIC_DEPTH_CM: f64 = 100.0;
const VERTIC_MIN_CLAY: f64 = 30.0;
const VERTIC_MAX_SAND: f64 = 45.0;

/// Restriction kinds treated as impermeable to water
const IMPERMEABLE_KINDS: &[&str] = &[
    "bedrock",
    "duripan",
    "petrocalcic",
    "petrogypsic",
    "petroferric",
    "fragipan",
    "ortstein",
    "densic",
    "placic",
    "permafrost",
    "cemented",
];

// ============================================================================
// Phase codes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Stony = 1,
    Lithic = 2,
    Petric = 3,
    Petrocalcic = 4,
    Petrogypsic = 5,
    Petroferric = 6,
    Phreatic = 7,
    Duripan = 8,
    Fragipan = 9,
    Rudic = 10,
    Saline = 11,
    Sodic = 12,
    Skeletic = 13,
    Gelundic = 14,
}

pub type PhaseList = SmallVec<[Phase; 4]>;

impl Phase {
    pub const ALL: [Phase; 14] = [
        Phase::Stony,
        Phase::Lithic,
        Phase::Petric,
        Phase::Petrocalcic,
        Phase::Petrogypsic,
        Phase::Petroferric,
        Phase::Phreatic,
        Phase::Duripan,
        Phase::Fragipan,
        Phase::Rudic,
        Phase::Saline,
        Phase::Sodic,
        Phase::Skeletic,
        Phase::Gelundic,
    ];

    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(usize::from(id).checked_sub(1)?).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Stony => "stony",
            Phase::Lithic => "lithic",
            Phase::Petric => "petric",
            Phase::Petrocalcic => "petrocalcic",
            Phase::Petrogypsic => "petrogypsic",
            Phase::Petroferric => "petroferric",
            Phase::Phreatic => "phreatic",
            Phase::Duripan => "duripan",
            Phase::Fragipan => "fragipan",
            Phase::Rudic => "rudic",
            Phase::Saline => "saline",
            Phase::Sodic => "sodic",
            Phase::Skeletic => "skeletic",
            Phase::Gelundic => "gelundic",
        }
    }

    /// Parse a phase flag column suffix: a name ("lithic") or a numeric id ("2")
    pub fn from_flag(flag: &str) -> Option<Self> {
        let key = flag.trim().to_ascii_lowercase();
        let key = key.strip_prefix("phase_").unwrap_or(&key);
        match key.parse::<u8>() {
            Ok(id) => Self::from_id(id),
            Err(_) => Self::ALL.iter().copied().find(|p| p.name() == key),
        }
    }
}

impl Serialize for Phase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.id())
    }
}

/// Dominant additional soil property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdditionalProperty {
    None = 0,
    Petric = 1,
    Gelic = 2,
    Vertic = 3,
}

impl AdditionalProperty {
    pub fn id(&self) -> u8 {
        *self as u8
    }
}

impl Serialize for AdditionalProperty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.id())
    }
}

// ============================================================================
// Code tables
// ============================================================================

fn is_impermeable(kind: Option<&str>) -> bool {
    match kind {
        // An unspecified restriction is assumed to block water
        None => true,
        Some(kind) => {
            let kind = kind.to_ascii_lowercase();
            kind.trim().is_empty() || IMPERMEABLE_KINDS.iter().any(|k| kind.contains(k))
        }
    }
}

fn is_cemented(kind: Option<&str>) -> bool {
    kind.map(|k| k.to_ascii_lowercase())
        .is_some_and(|k| k.contains("petro") || k.contains("duripan"))
}

/// Impermeable-layer code: 1 none or deeper than 150 cm, 2 at 80-150, 3 at 40-80, 4 above 40
pub fn impermeable_layer_code(restriction: Option<&Restriction>) -> u8 {
    match restriction {
        Some(r) if is_impermeable(r.kind.as_deref()) => {
            if r.depth_cm >= 150.0 {
                1
            } else if r.depth_cm >= 80.0 {
                2
            } else if r.depth_cm >= 40.0 {
                3
            } else {
                4
            }
        }
        _ => 1,
    }
}

/// Rooting-restriction code from the restrictive depth
pub fn root_restriction_code(rd: f64) -> u8 {
    if rd.is_nan() || rd >= 80.0 {
        1
    } else if rd >= 60.0 {
        2
    } else if rd >= 40.0 {
        3
    } else if rd >= 20.0 {
        4
    } else {
        6
    }
}

/// Surface-water-retention code: 1 free draining ... 4 ponded
pub fn surface_water_code(drainage: Option<DrainageClass>, flooding: Option<&str>) -> u8 {
    let from_drainage = match drainage {
        Some(DrainageClass::VeryPoorly) => 4,
        Some(DrainageClass::Poorly) => 3,
        Some(DrainageClass::SomewhatPoorly) => 2,
        _ => 1,
    };
    let flooding = flooding.map(|f| f.to_ascii_lowercase()).unwrap_or_default();
    let from_flooding = if flooding.contains("frequent") {
        3
    } else if flooding.contains("occasional") {
        2
    } else {
        1
    };
    from_drainage.max(from_flooding)
}

/// Gelic when the soil temperature class is gelic or pergelic
pub fn is_gelic(temperature_class: Option<&str>) -> bool {
    temperature_class.is_some_and(|t| t.to_ascii_lowercase().contains("gelic"))
}

/// Vertisol great groups end in "-erts" (Hapluderts, Haplusterts, ...)
fn is_vertic_taxonomy(taxonomy: &str) -> bool {
    let taxonomy = taxonomy.to_ascii_lowercase();
    taxonomy.contains("vert")
        || taxonomy
            .split(|c: char| !c.is_ascii_alphabetic())
            .any(|word| word.ends_with("erts"))
}

/// Shallowest valid restrictive depth across rows
fn shallowest_restriction(rows: &[SsurgoHorizon]) -> Option<Restriction> {
    rows.iter()
        .filter_map(|row| {
            row.restrictive_depth_cm
                .filter(|d| d.is_finite() && *d >= 0.0)
                .map(|depth_cm| Restriction { depth_cm, kind: row.restriction_kind.clone() })
        })
        .min_by(|a, b| a.depth_cm.total_cmp(&b.depth_cm))
}

/// Recompute the codes that depend on restriction, drainage and flooding
pub fn refresh_site_codes(attributes: &mut ProfileAttributes) {
    attributes.rd = attributes
        .restriction
        .as_ref()
        .map(|r| r.depth_cm.min(NO_RESTRICTION_DEPTH_CM))
        .unwrap_or(NO_RESTRICTION_DEPTH_CM);
    attributes.il = impermeable_layer_code(attributes.restriction.as_ref());
    attributes.roots = root_restriction_code(attributes.rd);
    attributes.swr = surface_water_code(attributes.drainage, attributes.flooding.as_deref());
}

// ============================================================================
// Profile classification
// ============================================================================

/// Build a scorer-ready profile from one component's horizon rows
///
/// Rows with non-finite depths are dropped; the rest are sorted by top depth.
pub fn classify_profile(rows: &[SsurgoHorizon]) -> SqiResult<SoilProfile> {
    let mut rows: Vec<&SsurgoHorizon> = rows
        .iter()
        .filter(|row| {
            let valid = row.top_depth_cm.is_finite() && row.bottom_depth_cm.is_finite();
            if !valid {
                warn!(cokey = %row.cokey, "Dropping horizon with non-finite depths");
            }
            valid
        })
        .collect();
    if rows.is_empty() {
        return Err(SqiError::SoilData("component has no usable horizons".into()));
    }
    rows.sort_by(|a, b| a.top_depth_cm.total_cmp(&b.top_depth_cm));
    let owned: Vec<SsurgoHorizon> = rows.iter().map(|r| (*r).clone()).collect();

    let first = owned[0].clone();
    let horizons: Vec<HorizonRecord> = owned.iter().map(HorizonRecord::from_ssurgo).collect();

    let mut phases = PhaseList::new();
    for flag in owned.iter().flat_map(|row| row.phase_flags.iter()) {
        match Phase::from_flag(flag) {
            Some(phase) if !phases.contains(&phase) => phases.push(phase),
            Some(_) => {}
            None => debug!(flag = %flag, "Ignoring unknown phase flag"),
        }
    }

    let restriction = shallowest_restriction(&owned);
    if let Some(r) = &restriction {
        if r.depth_cm < PETRIC_DEPTH_CM && is_cemented(r.kind.as_deref()) && !phases.contains(&Phase::Petric) {
            phases.push(Phase::Petric);
        }
    }
    phases.sort();

    let drainagecl = owned.iter().find_map(|row| row.drainagecl.clone());
    let drainage = drainagecl.as_deref().and_then(DrainageClass::from_ssurgo);
    if drainagecl.is_some() && drainage.is_none() {
        debug!(drainagecl = ?drainagecl, "Unrecognised drainage class");
    }

    let petric = phases.contains(&Phase::Petric);
    let gelic = owned.iter().any(|row| is_gelic(row.temperature_class.as_deref()));
    let vertic_hint = owned.iter().any(|row| {
        row.cracks
            || row.taxonomy.as_deref().is_some_and(is_vertic_taxonomy)
    });
    let vertic_horizon = horizons.iter().any(|h| {
        h.top_depth_cm < VERTIC_DEPTH_CM
            && h.clay_pct.is_some_and(|c| c > VERTIC_MIN_CLAY)
            && h.sand_pct.is_some_and(|s| s < VERTIC_MAX_SAND)
    });

    let add_prop = if petric {
        AdditionalProperty::Petric
    } else if gelic {
        AdditionalProperty::Gelic
    } else if vertic_hint && vertic_horizon {
        AdditionalProperty::Vertic
    } else {
        AdditionalProperty::None
    };

    let mut attributes = ProfileAttributes {
        restriction,
        vertic: add_prop == AdditionalProperty::Vertic,
        gelic,
        add_prop,
        phases,
        drainage,
        drainagecl,
        flooding: owned.iter().find_map(|row| row.flooding.clone()),
        slope_pct: first.slope_pct,
        elevation_m: first.elevation_m,
        ..ProfileAttributes::default()
    };
    refresh_site_codes(&mut attributes);

    let mut profile = SoilProfile {
        mukey: first.mukey.clone(),
        cokey: first.cokey.clone(),
        compname: first.compname.clone(),
        attributes,
        horizons,
    };
    profile.refresh_compaction();
    Ok(profile)
}
