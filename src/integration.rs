//! User data integration
//!
//! Overlays user observations on the SSURGO baseline, in rising priority:
//! plot horizons, then site observations, then lab samples. The overlays run
//! on a copy of the profile; if any of them fails the baseline is returned
//! untouched and no source flag is raised.

use crate::error::{SqiError, SqiResult};
use crate::horizon::{HorizonRecord, Restriction, SoilProfile, NO_RESTRICTION_DEPTH_CM};
use crate::phase::refresh_site_codes;
use crate::types::DrainageClass;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

// ============================================================================
// User data
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default)]
    pub plot_data: Vec<PlotHorizon>,
    #[serde(default)]
    pub site_data: Option<SiteData>,
    #[serde(default)]
    pub lab_data: Vec<LabSample>,
}

impl UserData {
    pub fn is_empty(&self) -> bool {
        self.plot_data.is_empty() && self.site_data.is_none() && self.lab_data.is_empty()
    }
}

/// Field-described horizon
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotHorizon {
    pub top_depth: f64,
    pub bottom_depth: f64,
    pub sand_pct: Option<f64>,
    pub silt_pct: Option<f64>,
    pub clay_pct: Option<f64>,
    pub organic_matter_pct: Option<f64>,
    pub ph: Option<f64>,
    /// g/cm³
    pub bulk_density: Option<f64>,
    pub coarse_fragments_pct: Option<f64>,
    pub cec_soil: Option<f64>,
    pub ec: Option<f64>,
    pub caco3_pct: Option<f64>,
    pub gypsum_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteData {
    /// SSURGO drainage label, e.g. "Moderately well drained"
    pub drainage_class: Option<String>,
    #[serde(default, alias = "slope_pct")]
    pub slope: Option<Slope>,
    pub elevation_m: Option<f64>,
    pub bedrock_depth_cm: Option<f64>,
}

/// Slope as observed: a measured percent or a field class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Slope {
    Percent(f64),
    Class(SlopeClass),
}

impl Slope {
    pub fn percent(&self) -> f64 {
        match self {
            Slope::Percent(pct) => *pct,
            Slope::Class(class) => class.midpoint_pct(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlopeClass {
    /// 0-2 %
    #[serde(alias = "flat", alias = "Level", alias = "Flat")]
    Level,
    /// 2-5 %
    #[serde(alias = "Gentle", alias = "gently_sloping")]
    Gentle,
    /// 5-10 %
    #[serde(alias = "Moderate", alias = "moderately_sloping")]
    Moderate,
    /// 10-15 %
    #[serde(alias = "Strong", alias = "strongly_sloping")]
    Strong,
    /// 15-30 %
    #[serde(alias = "Steep")]
    Steep,
    /// > 30 %
    #[serde(alias = "Very steep", alias = "very steep")]
    VerySteep,
}

impl SlopeClass {
    pub fn midpoint_pct(&self) -> f64 {
        match self {
            SlopeClass::Level => 1.0,
            SlopeClass::Gentle => 3.5,
            SlopeClass::Moderate => 7.5,
            SlopeClass::Strong => 12.5,
            SlopeClass::Steep => 22.5,
            SlopeClass::VerySteep => 40.0,
        }
    }
}

/// Laboratory analysis of a sample taken at one depth
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabSample {
    pub depth_cm: f64,
    pub ph_h2o: Option<f64>,
    pub organic_carbon_pct: Option<f64>,
    pub cec_cmol_kg: Option<f64>,
    pub ec_ds_m: Option<f64>,
    pub esp_pct: Option<f64>,
    pub base_saturation_pct: Option<f64>,
    pub caco3_pct: Option<f64>,
    pub gypsum_pct: Option<f64>,
    pub sand_pct: Option<f64>,
    pub silt_pct: Option<f64>,
    pub clay_pct: Option<f64>,
    pub bulk_density_g_cm3: Option<f64>,
}

impl LabSample {
    fn changes_texture(&self) -> bool {
        self.sand_pct.is_some() || self.silt_pct.is_some() || self.clay_pct.is_some()
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// Which overlays changed the profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AppliedOverlays {
    pub plot: bool,
    pub site: bool,
    pub lab: bool,
}

#[derive(Debug, Clone)]
pub struct IntegrationOutcome {
    pub profile: SoilProfile,
    pub applied: AppliedOverlays,
}

/// Overlay user data on the baseline profile
///
/// Never fails: an overlay error is logged and the baseline comes back with
/// all flags down.
pub fn integrate_user_data(baseline: &SoilProfile, user: &UserData) -> IntegrationOutcome {
    if user.is_empty() {
        return IntegrationOutcome { profile: baseline.clone(), applied: AppliedOverlays::default() };
    }

    let mut profile = baseline.clone();
    match apply_overlays(&mut profile, user) {
        Ok(applied) => {
            debug!(?applied, horizons = profile.horizons.len(), "Integrated user data");
            IntegrationOutcome { profile, applied }
        }
        Err(e) => {
            warn!(error = %e, "User data rejected, keeping SSURGO baseline");
            IntegrationOutcome { profile: baseline.clone(), applied: AppliedOverlays::default() }
        }
    }
}

fn apply_overlays(profile: &mut SoilProfile, user: &UserData) -> SqiResult<AppliedOverlays> {
    let mut applied = AppliedOverlays::default();
    for plot in &user.plot_data {
        applied.plot |= apply_plot(profile, plot)?;
    }
    if let Some(site) = &user.site_data {
        applied.site = apply_site(profile, site)?;
    }
    for sample in &user.lab_data {
        applied.lab |= apply_lab(profile, sample)?;
    }
    profile.refresh_compaction();
    Ok(applied)
}

fn recompute_or_reject(horizon: &mut HorizonRecord) -> SqiResult<()> {
    if horizon.recompute_texture().is_none() {
        error!(
            top = horizon.top_depth_cm,
            bottom = horizon.bottom_depth_cm,
            sand = ?horizon.sand_pct,
            silt = ?horizon.silt_pct,
            clay = ?horizon.clay_pct,
            "Texture class could not be recomputed after overlay"
        );
        return Err(SqiError::Integration(format!(
            "no texture class for horizon {}-{} cm",
            horizon.top_depth_cm, horizon.bottom_depth_cm
        )));
    }
    Ok(())
}

fn apply_plot(profile: &mut SoilProfile, plot: &PlotHorizon) -> SqiResult<bool> {
    let changes_texture = plot.sand_pct.is_some() || plot.silt_pct.is_some() || plot.clay_pct.is_some();
    let mut touched = false;

    for horizon in profile
        .horizons
        .iter_mut()
        .filter(|h| h.overlaps(plot.top_depth, plot.bottom_depth))
    {
        touched = true;
        if let Some(v) = plot.sand_pct {
            horizon.sand_pct = Some(v);
        }
        if let Some(v) = plot.silt_pct {
            horizon.silt_pct = Some(v);
        }
        if let Some(v) = plot.clay_pct {
            horizon.clay_pct = Some(v);
        }
        if let Some(v) = plot.organic_matter_pct {
            horizon.set_organic_matter(v);
        }
        if let Some(v) = plot.ph {
            horizon.ph = Some(v);
        }
        if let Some(v) = plot.bulk_density {
            horizon.db_measured = Some(v);
        }
        if let Some(v) = plot.coarse_fragments_pct {
            horizon.fragvol = v;
        }
        if let Some(v) = plot.cec_soil {
            horizon.cecs = Some(v);
        }
        if let Some(v) = plot.ec {
            horizon.ec = Some(v);
        }
        if let Some(v) = plot.caco3_pct {
            horizon.caco3 = Some(v);
        }
        if let Some(v) = plot.gypsum_pct {
            horizon.gypsum = Some(v);
        }
        if changes_texture {
            recompute_or_reject(horizon)?;
        }
        horizon.refresh_derived();
    }

    if !touched {
        warn!(top = plot.top_depth, bottom = plot.bottom_depth, "Plot horizon overlaps no SSURGO horizon");
    }
    Ok(touched)
}

fn apply_site(profile: &mut SoilProfile, site: &SiteData) -> SqiResult<bool> {
    let mut touched = false;
    let attributes = &mut profile.attributes;

    if let Some(label) = &site.drainage_class {
        let drainage = DrainageClass::from_ssurgo(label)
            .ok_or_else(|| SqiError::Integration(format!("unknown drainage class '{}'", label)))?;
        attributes.drainage = Some(drainage);
        attributes.drainagecl = Some(label.clone());
        touched = true;
    }
    if let Some(slope) = site.slope {
        attributes.slope_pct = Some(slope.percent());
        touched = true;
    }
    if let Some(elevation) = site.elevation_m {
        attributes.elevation_m = Some(elevation);
        touched = true;
    }
    if let Some(depth) = site.bedrock_depth_cm.filter(|d| *d < NO_RESTRICTION_DEPTH_CM) {
        truncate_at_bedrock(profile, depth)?;
        touched = true;
    }

    refresh_site_codes(&mut profile.attributes);
    Ok(touched)
}

/// Drop horizons below the bedrock contact and make it the restriction
fn truncate_at_bedrock(profile: &mut SoilProfile, depth: f64) -> SqiResult<()> {
    profile.horizons.retain(|h| h.top_depth_cm < depth);
    if profile.horizons.is_empty() {
        return Err(SqiError::Integration(format!(
            "bedrock at {} cm leaves no horizon",
            depth
        )));
    }
    for horizon in profile.horizons.iter_mut() {
        horizon.bottom_depth_cm = horizon.bottom_depth_cm.min(depth);
    }

    let shallower = profile
        .attributes
        .restriction
        .as_ref()
        .map_or(true, |r| depth < r.depth_cm);
    if shallower {
        profile.attributes.restriction = Some(Restriction {
            depth_cm: depth,
            kind: Some("Lithic bedrock".to_string()),
        });
    }
    Ok(())
}

fn apply_lab(profile: &mut SoilProfile, sample: &LabSample) -> SqiResult<bool> {
    let Some(horizon) = profile.horizon_at_depth_mut(sample.depth_cm) else {
        warn!(depth_cm = sample.depth_cm, "Lab sample depth outside every horizon, skipping");
        return Ok(false);
    };

    if let Some(v) = sample.ph_h2o {
        horizon.ph = Some(v);
    }
    if let Some(v) = sample.organic_carbon_pct {
        horizon.set_organic_carbon(v);
    }
    if let Some(v) = sample.cec_cmol_kg {
        horizon.cecs = Some(v);
    }
    if let Some(v) = sample.ec_ds_m {
        horizon.ec = Some(v);
    }
    if let Some(v) = sample.esp_pct {
        horizon.esp = Some(v);
    }
    if let Some(v) = sample.base_saturation_pct {
        horizon.set_base_saturation(v);
    }
    if let Some(v) = sample.caco3_pct {
        horizon.caco3 = Some(v);
    }
    if let Some(v) = sample.gypsum_pct {
        horizon.gypsum = Some(v);
    }
    if let Some(v) = sample.bulk_density_g_cm3 {
        horizon.db_measured = Some(v);
    }
    if sample.changes_texture() {
        if let Some(v) = sample.sand_pct {
            horizon.sand_pct = Some(v);
        }
        if let Some(v) = sample.silt_pct {
            horizon.silt_pct = Some(v);
        }
        if let Some(v) = sample.clay_pct {
            horizon.clay_pct = Some(v);
        }
        recompute_or_reject(horizon)?;
    }
    horizon.refresh_derived();
    Ok(true)
}
