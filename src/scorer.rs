//! Soil Quality Evaluator - Main coordinator for evaluating a point
//!
//! Runs the full pipeline for one request:
//!
//! 1. Resolve the rooting class (request override, else the crop table)
//! 2. Fetch SSURGO horizons at the point; none is `NoSoilData`
//! 3. Classify phases and profile attributes
//! 4. Overlay user plot, site and lab data
//! 5. Filter the crop requirements to the input level
//! 6. Weight horizons by rooting depth
//! 7. Score SQ1-SQ7 (in parallel with Rayon) and compose SR
//!
//! Only step 2 touches I/O. `score_profile` is the pure core and can be called
//! directly with an already-built profile.

use crate::catalogue::{CatalogueHandle, CropRequirements};
use crate::error::{SqiError, SqiResult};
use crate::horizon::{SoilProfile, SsurgoHorizon};
use crate::integration::{integrate_user_data, AppliedOverlays};
use crate::metrics::*;
use crate::phase::classify_profile;
use crate::rating::{compose, RatingClass, ScoreVector, SoilRating};
use crate::request::{EvaluationRequest, ValidatedRequest};
use crate::soil_source::{GeoPoint, SoilDataSource};
use crate::types::{InputLevel, RootingClass, SqiCode};
use crate::utils::depth_weights::depth_weights;
use crate::utils::stats::safe_float;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize)]
pub struct CropInfoResponse {
    pub crop_id: String,
    pub crop_name: String,
    pub input_level: InputLevel,
    pub rooting_class: u8,
    pub rooting_description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataSources {
    pub ssurgo_used: bool,
    pub ssurgo_component: String,
    pub ssurgo_map_unit: String,
    pub user_plot_data_used: bool,
    pub user_site_data_used: bool,
    pub user_lab_data_used: bool,
    pub horizons_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseMetadata {
    pub timestamp: String,
    pub version: String,
    pub processing_time_seconds: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResponse {
    pub status: &'static str,
    pub location: GeoPoint,
    pub crop_info: CropInfoResponse,
    pub soil_quality_indices: ScoreVector,
    pub rating_class: RatingClass,
    pub data_sources: DataSources,
    pub metadata: ResponseMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Main evaluator; cheap to clone and share across threads
#[derive(Debug, Clone)]
pub struct SoilQualityEvaluator {
    catalogue: Arc<CatalogueHandle>,
}

impl SoilQualityEvaluator {
    pub fn new(catalogue: Arc<CatalogueHandle>) -> Self {
        Self { catalogue }
    }

    pub fn catalogue(&self) -> &CatalogueHandle {
        &self.catalogue
    }

    /// Validate, fetch SSURGO horizons and evaluate
    pub fn evaluate(&self, request: &EvaluationRequest, source: &dyn SoilDataSource) -> SqiResult<EvaluationResponse> {
        let started = Instant::now();
        let request = request.validate()?;
        let rows = source.horizons_at(request.point)?;
        self.evaluate_rows(&request, &rows, started)
    }

    /// Evaluate a validated request against horizons already fetched for its point
    pub fn evaluate_rows(
        &self,
        request: &ValidatedRequest,
        rows: &[SsurgoHorizon],
        started: Instant,
    ) -> SqiResult<EvaluationResponse> {
        let catalogue = self.catalogue.snapshot();
        let crop = catalogue.crop_info(&request.crop_id);
        let rooting = request.rooting_override.unwrap_or(crop.rooting_class);

        if rows.is_empty() {
            return Err(SqiError::NoSoilData { lat: request.point.lat, lon: request.point.lon });
        }
        let baseline = classify_profile(rows)?;

        let (profile, applied) = match &request.user_data {
            Some(user) => {
                let outcome = integrate_user_data(&baseline, user);
                (outcome.profile, outcome.applied)
            }
            None => (baseline, AppliedOverlays::default()),
        };

        let requirements = catalogue.requirements(&request.crop_id, request.input_level)?;
        let rating = score_profile(&profile, &requirements, rooting, request.input_level);
        let scores = rating.scores.sanitized();

        info!(
            crop_id = %request.crop_id,
            input_level = %request.input_level,
            cokey = %profile.cokey,
            sr = scores.sr,
            "Evaluated point"
        );

        let mut message = format!(
            "{} at input level {}: {} (SR {:.1}); {}",
            crop.crop_name,
            request.input_level,
            rating.rating,
            scores.sr,
            describe_sources(&applied)
        );
        if requirements.is_empty() {
            message.push_str("; no requirement data for this crop and input level");
        }

        Ok(EvaluationResponse {
            status: "success",
            location: request.point,
            crop_info: CropInfoResponse {
                crop_id: request.crop_id.clone(),
                crop_name: crop.crop_name,
                input_level: request.input_level,
                rooting_class: rooting.id(),
                rooting_description: rooting.description().to_string(),
            },
            soil_quality_indices: scores,
            rating_class: rating.rating,
            data_sources: DataSources {
                ssurgo_used: true,
                ssurgo_component: profile.compname.clone(),
                ssurgo_map_unit: profile.mukey.clone(),
                user_plot_data_used: applied.plot,
                user_site_data_used: applied.site,
                user_lab_data_used: applied.lab,
                horizons_count: profile.horizons.len(),
            },
            metadata: ResponseMetadata {
                timestamp: chrono::Utc::now().to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                processing_time_seconds: safe_float(started.elapsed().as_secs_f64()),
            },
            message: Some(message),
        })
    }
}

/// Which inputs fed the profile, for the response message
fn describe_sources(applied: &AppliedOverlays) -> String {
    let used: Vec<&str> = [(applied.plot, "plot"), (applied.site, "site"), (applied.lab, "lab")]
        .into_iter()
        .filter_map(|(flag, name)| flag.then_some(name))
        .collect();
    if used.is_empty() {
        "SSURGO only".to_string()
    } else {
        format!("SSURGO with user {} data", used.join(", "))
    }
}

/// Score all seven indices of a profile in parallel
///
/// The scorers only read the profile and the requirements, so each runs on
/// its own Rayon task; results are returned in SQ1..SQ7 order.
pub fn score_indices(
    profile: &SoilProfile,
    requirements: &CropRequirements,
    rooting: RootingClass,
    input_level: InputLevel,
) -> Vec<IndexScore> {
    if requirements.is_empty() {
        debug!(crop_id = %requirements.crop_id, level = %input_level, "Empty requirement set, indices are NaN");
        return SqiCode::ALL
            .iter()
            .map(|&code| match (code, input_level) {
                (SqiCode::Sq1, InputLevel::High) => IndexScore::not_applicable(code),
                _ => IndexScore::undetermined(code),
            })
            .collect();
    }

    let weights = depth_weights(&profile.intervals(), rooting);
    let ctx = ScoringContext { profile, requirements, weights: &weights, input_level };

    SqiCode::ALL[..]
        .par_iter()
        .map(|code| -> IndexScore {
            match code {
                SqiCode::Sq1 => calculate_sq1(&ctx).into(),
                SqiCode::Sq2 => calculate_sq2(&ctx).into(),
                SqiCode::Sq3 => calculate_sq3(&ctx).into(),
                SqiCode::Sq4 => calculate_sq4(&ctx).into(),
                SqiCode::Sq5 => calculate_sq5(&ctx).into(),
                SqiCode::Sq6 => calculate_sq6(&ctx).into(),
                SqiCode::Sq7 => calculate_sq7(&ctx).into(),
            }
        })
        .collect()
}

/// Score a profile and compose its rating (no I/O)
pub fn score_profile(
    profile: &SoilProfile,
    requirements: &CropRequirements,
    rooting: RootingClass,
    input_level: InputLevel,
) -> SoilRating {
    let indices = score_indices(profile, requirements, rooting, input_level);
    debug!(
        cokey = %profile.cokey,
        scores = ?indices.iter().map(|i| (i.code.id(), i.value.as_f64())).collect::<Vec<_>>(),
        "Scored indices"
    );
    compose(input_level, &indices, &profile.cokey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::RequirementCatalogue;
    use crate::soil_source::{MapUnitExtent, SsurgoExtract};
    use crate::types::SqiValue;

    fn rows() -> Vec<SsurgoHorizon> {
        [(0.0, 20.0), (20.0, 50.0), (50.0, 120.0)]
            .iter()
            .map(|&(top, bottom)| SsurgoHorizon {
                mukey: "M1".into(),
                cokey: "M1:1".into(),
                compname: "Drummer".into(),
                comppct_r: Some(85.0),
                top_depth_cm: top,
                bottom_depth_cm: bottom,
                sand: Some(25.0),
                silt: Some(55.0),
                clay: Some(20.0),
                om: Some(2.0),
                ph: Some(6.5),
                teb: Some(14.0),
                cecs: Some(18.0),
                ec: Some(0.3),
                esp: Some(1.0),
                caco3: Some(0.0),
                gypsum: Some(0.0),
                ..Default::default()
            })
            .collect()
    }

    fn source() -> SsurgoExtract {
        SsurgoExtract::from_parts(
            vec![MapUnitExtent { mukey: "M1".into(), min_lat: 40.0, max_lat: 41.0, min_lon: -90.0, max_lon: -89.0 }],
            rows(),
        )
    }

    fn evaluator() -> SoilQualityEvaluator {
        SoilQualityEvaluator::new(Arc::new(CatalogueHandle::new(RequirementCatalogue::default())))
    }

    #[test]
    fn test_empty_requirements_are_undetermined() {
        let request = EvaluationRequest::new(40.5, -89.5, "99", "L");
        let response = evaluator().evaluate(&request, &source()).unwrap();
        let scores = response.soil_quality_indices;
        // NaN at the core, 0 at the boundary
        for code in SqiCode::ALL {
            assert_eq!(scores.get(code), SqiValue::Score(0.0), "{}", code);
        }
        assert_eq!(scores.sr, 0.0);
        assert_eq!(response.rating_class, RatingClass::VeryPoor);
        assert_eq!(response.crop_info.crop_name, "Crop 99");
        assert_eq!(response.crop_info.rooting_class, 3);
        assert_eq!(response.data_sources.horizons_count, 3);
        assert_eq!(response.data_sources.ssurgo_map_unit, "M1");
        let message = response.message.unwrap();
        assert!(message.contains("no requirement data"), "{}", message);
        assert!(message.contains("SSURGO only"), "{}", message);
    }

    #[test]
    fn test_empty_requirements_keep_na_at_high_input() {
        let profile = classify_profile(&rows()).unwrap();
        let req = RequirementCatalogue::default().requirements("99", InputLevel::High).unwrap();
        assert!(req.is_empty());
        let rating = score_profile(&profile, &req, RootingClass::Deep, InputLevel::High);
        assert!(rating.scores.sq1.is_na());
        assert!(rating.scores.sq2.as_f64().is_nan());
        assert!(rating.scores.sr.is_nan());
    }

    #[test]
    fn test_message_names_integrated_sources() {
        assert_eq!(describe_sources(&AppliedOverlays::default()), "SSURGO only");
        let applied = AppliedOverlays { plot: true, site: false, lab: true };
        assert_eq!(describe_sources(&applied), "SSURGO with user plot, lab data");
    }

    #[test]
    fn test_point_without_soil_data() {
        let request = EvaluationRequest::new(10.0, 10.0, "4", "L");
        let err = evaluator().evaluate(&request, &source()).unwrap_err();
        assert!(matches!(err, SqiError::NoSoilData { .. }));
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn test_indices_returned_in_code_order() {
        let profile = classify_profile(&rows()).unwrap();
        let req = RequirementCatalogue::default().requirements("4", InputLevel::High).unwrap();
        let indices = score_indices(&profile, &req, RootingClass::Deep, InputLevel::High);
        let codes: Vec<u8> = indices.iter().map(|i| i.code.id()).collect();
        assert_eq!(codes, vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(indices[0].value.is_na());
    }
}
