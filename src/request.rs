//! Evaluation request and its validation
//!
//! Requests arrive loosely typed (JSON body, query string, CLI arguments) and
//! are checked here once, before any soil data is fetched.

use crate::error::{SqiError, SqiResult};
use crate::integration::{LabSample, PlotHorizon, SiteData, Slope, UserData};
use crate::soil_source::GeoPoint;
use crate::types::{DrainageClass, InputLevel, RootingClass};
use serde::{Deserialize, Serialize};

/// Texture fractions must add up to 100 within this tolerance
const TEXTURE_SUM_TOLERANCE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub lat: f64,
    pub lon: f64,
    pub crop_id: String,
    pub input_level: String,
    /// Rooting class override (1-4)
    #[serde(default)]
    pub depth_weight_type: Option<u8>,
    #[serde(default)]
    pub user_data: Option<UserData>,
}

/// A request that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub point: GeoPoint,
    pub crop_id: String,
    pub input_level: InputLevel,
    pub rooting_override: Option<RootingClass>,
    pub user_data: Option<UserData>,
}

impl EvaluationRequest {
    pub fn new(lat: f64, lon: f64, crop_id: &str, input_level: &str) -> Self {
        Self {
            lat,
            lon,
            crop_id: crop_id.to_string(),
            input_level: input_level.to_string(),
            depth_weight_type: None,
            user_data: None,
        }
    }

    pub fn validate(&self) -> SqiResult<ValidatedRequest> {
        let point = GeoPoint::new(self.lat, self.lon);
        point.validate()?;

        let crop_id = self.crop_id.trim();
        if crop_id.is_empty() {
            return Err(SqiError::Validation("crop_id is required".into()));
        }

        let input_level: InputLevel = self.input_level.parse()?;

        let rooting_override = self
            .depth_weight_type
            .map(|t| {
                RootingClass::from_id(t)
                    .ok_or_else(|| SqiError::Validation(format!("depth_weight_type must be 1-4, got {}", t)))
            })
            .transpose()?;

        if let Some(user) = &self.user_data {
            validate_user_data(user)?;
        }

        Ok(ValidatedRequest {
            point,
            crop_id: crop_id.to_string(),
            input_level,
            rooting_override,
            user_data: self.user_data.clone().filter(|u| !u.is_empty()),
        })
    }
}

pub fn validate_user_data(user: &UserData) -> SqiResult<()> {
    for (i, plot) in user.plot_data.iter().enumerate() {
        validate_plot(plot).map_err(|e| SqiError::Validation(format!("plot_data[{}]: {}", i, e)))?;
    }
    if let Some(site) = &user.site_data {
        validate_site(site).map_err(|e| SqiError::Validation(format!("site_data: {}", e)))?;
    }
    for (i, sample) in user.lab_data.iter().enumerate() {
        validate_lab(sample).map_err(|e| SqiError::Validation(format!("lab_data[{}]: {}", i, e)))?;
    }
    Ok(())
}

fn check_percent(name: &str, value: Option<f64>) -> Result<(), String> {
    match value {
        Some(v) if !(0.0..=100.0).contains(&v) => Err(format!("{} must be within 0-100, got {}", name, v)),
        _ => Ok(()),
    }
}

fn check_ph(value: Option<f64>) -> Result<(), String> {
    match value {
        Some(v) if !(0.0..=14.0).contains(&v) => Err(format!("pH must be within 0-14, got {}", v)),
        _ => Ok(()),
    }
}

fn check_non_negative(name: &str, value: Option<f64>) -> Result<(), String> {
    match value {
        Some(v) if !(v.is_finite() && v >= 0.0) => Err(format!("{} must be a non-negative number, got {}", name, v)),
        _ => Ok(()),
    }
}

fn check_texture(sand: Option<f64>, silt: Option<f64>, clay: Option<f64>) -> Result<(), String> {
    check_percent("sand_pct", sand)?;
    check_percent("silt_pct", silt)?;
    check_percent("clay_pct", clay)?;
    if let (Some(sand), Some(silt), Some(clay)) = (sand, silt, clay) {
        let total = sand + silt + clay;
        if (total - 100.0).abs() > TEXTURE_SUM_TOLERANCE {
            return Err(format!("sand + silt + clay must be 100 +/- 1, got {}", total));
        }
    }
    Ok(())
}

fn validate_plot(plot: &PlotHorizon) -> Result<(), String> {
    if !(plot.top_depth.is_finite() && plot.bottom_depth.is_finite()) || plot.top_depth < 0.0 || plot.top_depth >= plot.bottom_depth {
        return Err(format!(
            "depths must satisfy 0 <= top < bottom, got {}-{}",
            plot.top_depth, plot.bottom_depth
        ));
    }
    check_texture(plot.sand_pct, plot.silt_pct, plot.clay_pct)?;
    check_percent("organic_matter_pct", plot.organic_matter_pct)?;
    check_percent("coarse_fragments_pct", plot.coarse_fragments_pct)?;
    check_percent("caco3_pct", plot.caco3_pct)?;
    check_percent("gypsum_pct", plot.gypsum_pct)?;
    check_ph(plot.ph)?;
    check_non_negative("bulk_density", plot.bulk_density)?;
    check_non_negative("cec_soil", plot.cec_soil)?;
    check_non_negative("ec", plot.ec)
}

fn validate_site(site: &SiteData) -> Result<(), String> {
    if let Some(label) = &site.drainage_class {
        if DrainageClass::from_ssurgo(label).is_none() {
            return Err(format!("unknown drainage_class '{}'", label));
        }
    }
    if let Some(Slope::Percent(pct)) = site.slope {
        check_non_negative("slope", Some(pct))?;
    }
    check_non_negative("bedrock_depth_cm", site.bedrock_depth_cm)?;
    match site.elevation_m {
        Some(e) if !e.is_finite() => Err("elevation_m must be finite".into()),
        _ => Ok(()),
    }
}

fn validate_lab(sample: &LabSample) -> Result<(), String> {
    check_non_negative("depth_cm", Some(sample.depth_cm))?;
    check_texture(sample.sand_pct, sample.silt_pct, sample.clay_pct)?;
    check_ph(sample.ph_h2o)?;
    check_percent("organic_carbon_pct", sample.organic_carbon_pct)?;
    check_percent("esp_pct", sample.esp_pct)?;
    check_percent("base_saturation_pct", sample.base_saturation_pct)?;
    check_percent("caco3_pct", sample.caco3_pct)?;
    check_percent("gypsum_pct", sample.gypsum_pct)?;
    check_non_negative("cec_cmol_kg", sample.cec_cmol_kg)?;
    check_non_negative("ec_ds_m", sample.ec_ds_m)?;
    check_non_negative("bulk_density_g_cm3", sample.bulk_density_g_cm3)
}
