// End-to-end evaluation scenarios
//
// Reference soils from tests/common scored against the maize and wheat tables.
// Expected values were worked out by hand from the breakpoint tables.

mod common;

use approx::assert_relative_eq;
use common::*;
use soil_quality_rust::integration::{integrate_user_data, LabSample, PlotHorizon, UserData};
use soil_quality_rust::phase::classify_profile;
use soil_quality_rust::utils::texture::TextureClass;
use soil_quality_rust::{
    CatalogueHandle, EvaluationRequest, EvaluationResponse, RatingClass, SoilQualityEvaluator, SqiCode, SqiValue,
    SsurgoHorizon,
};
use std::sync::Arc;

fn evaluator() -> SoilQualityEvaluator {
    SoilQualityEvaluator::new(Arc::new(CatalogueHandle::new(catalogue())))
}

fn evaluate(rows: Vec<SsurgoHorizon>, crop: &str, level: &str, user: Option<UserData>) -> EvaluationResponse {
    let (lat, lon) = S1_POINT;
    let mut request = EvaluationRequest::new(lat, lon, crop, level);
    request.user_data = user;
    evaluator().evaluate(&request, &extract(rows)).unwrap()
}

fn score(response: &EvaluationResponse, code: SqiCode) -> f64 {
    response.soil_quality_indices.get(code).as_f64()
}

#[test]
fn test_s1_deep_prairie_soil_maize_low_input() {
    let response = evaluate(s1_rows(), MAIZE, "L", None);

    assert_relative_eq!(score(&response, SqiCode::Sq1), 84.43161394668095, epsilon = 1e-6);
    assert_relative_eq!(score(&response, SqiCode::Sq2), 100.0, epsilon = 1e-9);
    assert_relative_eq!(score(&response, SqiCode::Sq3), 85.0, epsilon = 1e-9);
    assert_relative_eq!(score(&response, SqiCode::Sq4), 100.0);
    assert_relative_eq!(score(&response, SqiCode::Sq5), 100.0, epsilon = 1e-9);
    assert_relative_eq!(score(&response, SqiCode::Sq6), 100.0, epsilon = 1e-9);
    assert_relative_eq!(score(&response, SqiCode::Sq7), 92.46946509707274, epsilon = 1e-6);
    assert_relative_eq!(response.soil_quality_indices.sr, 66.36244252092314, epsilon = 1e-6);

    for code in SqiCode::ALL {
        assert!(score(&response, code) > 60.0, "{} should exceed 60", code);
    }
    assert_eq!(response.rating_class, RatingClass::Good);
    assert_eq!(response.crop_info.crop_name, "Maize");
    assert_eq!(response.crop_info.rooting_class, 3);
    assert_eq!(response.data_sources.horizons_count, 3);
    assert_eq!(response.data_sources.ssurgo_component, "Clarion");
    assert!(!response.data_sources.user_plot_data_used);
}

#[test]
fn test_s2_shallow_skeletal_soil() {
    let response = evaluate(s2_rows(), MAIZE, "L", None);

    // rd = 25 cm scores 38 on the rooting-depth curve; silt loam texture caps the rest at 85
    assert_relative_eq!(score(&response, SqiCode::Sq3), 38.0 * 0.85, epsilon = 1e-9);
    assert_relative_eq!(response.soil_quality_indices.sr, 23.719978168752437, epsilon = 1e-6);
    assert!(response.soil_quality_indices.sr < 30.0);
    assert_eq!(response.rating_class, RatingClass::Poor);
}

#[test]
fn test_s3_saline_sodic_profile_wheat_intermediate() {
    let response = evaluate(s3_rows(), WHEAT, "I", None);

    // ec 8 -> 50, esp 20 -> 55 in every horizon
    assert_relative_eq!(score(&response, SqiCode::Sq5), 27.5, epsilon = 1e-9);
    assert!(score(&response, SqiCode::Sq1) > 90.0);
    assert!(score(&response, SqiCode::Sq2) > 90.0);
    assert!(score(&response, SqiCode::Sq3) > 90.0);
    assert_relative_eq!(response.soil_quality_indices.sr, 26.55148572148515, epsilon = 1e-6);
    assert_eq!(response.rating_class, RatingClass::Poor);
}

#[test]
fn test_s4_lab_overlay_raises_sq1() {
    let baseline = evaluate(s4_rows(), MAIZE, "L", None);
    assert_relative_eq!(score(&baseline, SqiCode::Sq1), 65.98941720174456, epsilon = 1e-6);

    let lab = UserData {
        lab_data: vec![LabSample {
            depth_cm: 15.0,
            ph_h2o: Some(6.2),
            organic_carbon_pct: Some(1.5),
            ..Default::default()
        }],
        ..Default::default()
    };
    let overlaid = evaluate(s4_rows(), MAIZE, "L", Some(lab.clone()));

    assert_relative_eq!(score(&overlaid, SqiCode::Sq1), 75.8529238040133, epsilon = 1e-6);
    assert!(score(&overlaid, SqiCode::Sq1) > score(&baseline, SqiCode::Sq1));
    assert!(overlaid.data_sources.user_lab_data_used);
    assert!(!overlaid.data_sources.user_plot_data_used);
    assert!(!overlaid.data_sources.user_site_data_used);

    let profile = classify_profile(&s4_rows()).unwrap();
    let outcome = integrate_user_data(&profile, &lab);
    let top = &outcome.profile.horizons[0];
    assert_relative_eq!(top.om.unwrap(), 2.586, epsilon = 1e-9);
    assert_eq!(top.soc, Some(1.5));
    assert_eq!(top.ph, Some(6.2));
}

#[test]
fn test_s5_plot_overlay_changes_texture_class() {
    let baseline_profile = classify_profile(&s5_rows()).unwrap();
    assert_eq!(baseline_profile.horizons[0].texture, Some(TextureClass::Loam));

    let plot = UserData {
        plot_data: vec![PlotHorizon {
            top_depth: 0.0,
            bottom_depth: 20.0,
            sand_pct: Some(85.0),
            silt_pct: Some(10.0),
            clay_pct: Some(5.0),
            ..Default::default()
        }],
        ..Default::default()
    };

    let outcome = integrate_user_data(&baseline_profile, &plot);
    assert!(outcome.applied.plot);
    let top = &outcome.profile.horizons[0];
    // 85/10/5 falls inside the USDA loamy sand polygon
    assert_eq!(top.texture_class_id(), Some(TextureClass::LoamySand.id()));
    assert_eq!(top.pscl.map(|p| p.id()), Some(1));

    let baseline = evaluate(s5_rows(), MAIZE, "L", None);
    let overlaid = evaluate(s5_rows(), MAIZE, "L", Some(plot));
    assert!(overlaid.data_sources.user_plot_data_used);
    assert!(score(&overlaid, SqiCode::Sq3) < score(&baseline, SqiCode::Sq3));
    assert!(score(&overlaid, SqiCode::Sq7) < score(&baseline, SqiCode::Sq7));
}

#[test]
fn test_s6_high_input_on_s1_soil() {
    let response = evaluate(s1_rows(), MAIZE, "H", None);
    let scores = &response.soil_quality_indices;

    assert_eq!(scores.sq1, SqiValue::NotApplicable);
    assert_relative_eq!(scores.sq2.as_f64(), 95.0, epsilon = 1e-9);
    assert_relative_eq!(scores.sq3.as_f64(), 85.0, epsilon = 1e-9);
    assert_relative_eq!(scores.sr, 74.66909306588626, epsilon = 1e-6);

    let expected = scores.sq2.as_f64() * scores.sq3.as_f64() / 100.0 * scores.sq4.as_f64().min(scores.sq7.as_f64())
        / 100.0;
    assert_relative_eq!(scores.sr, expected, epsilon = 1e-9);

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["soil_quality_indices"]["SQ1"], "NA");
}

#[test]
fn test_s6_sr_ignores_salinity_at_high_input() {
    let clean = evaluate(s1_rows(), MAIZE, "H", None);
    let saline = evaluate(
        s1_rows().into_iter().map(|row| SsurgoHorizon { ec: Some(8.0), ..row }).collect(),
        MAIZE,
        "H",
        None,
    );
    assert!(score(&saline, SqiCode::Sq5) < score(&clean, SqiCode::Sq5));
    assert_relative_eq!(saline.soil_quality_indices.sr, clean.soil_quality_indices.sr, epsilon = 1e-9);
}

#[test]
fn test_lab_value_wins_over_plot_at_same_depth() {
    let profile = classify_profile(&s1_rows()).unwrap();
    let user = UserData {
        plot_data: vec![PlotHorizon { top_depth: 0.0, bottom_depth: 20.0, ph: Some(7.4), ..Default::default() }],
        lab_data: vec![LabSample { depth_cm: 10.0, ph_h2o: Some(6.1), ..Default::default() }],
        ..Default::default()
    };
    let outcome = integrate_user_data(&profile, &user);
    assert_eq!(outcome.profile.horizons[0].ph, Some(6.1));
    assert!(outcome.applied.plot && outcome.applied.lab);
}

#[test]
fn test_unknown_crop_is_not_rated_as_perfect_soil() {
    let response = evaluate(s1_rows(), "999", "L", None);
    assert_eq!(response.crop_info.crop_name, "Crop 999");
    assert_eq!(response.crop_info.rooting_class, 3);
    assert_eq!(response.soil_quality_indices.sr, 0.0);
    assert_eq!(score(&response, SqiCode::Sq1), 0.0);
    assert_eq!(response.rating_class, RatingClass::VeryPoor);

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["soil_quality_indices"]["SR"], 0.0);
}

#[test]
fn test_message_reports_integrated_user_data() {
    let baseline = evaluate(s1_rows(), MAIZE, "L", None);
    assert!(baseline.message.as_deref().unwrap().ends_with("SSURGO only"));

    let user = UserData {
        plot_data: vec![PlotHorizon { top_depth: 0.0, bottom_depth: 20.0, ph: Some(6.8), ..Default::default() }],
        lab_data: vec![LabSample { depth_cm: 30.0, organic_carbon_pct: Some(1.2), ..Default::default() }],
        ..Default::default()
    };
    let response = evaluate(s1_rows(), MAIZE, "L", Some(user));
    assert!(response.data_sources.user_plot_data_used);
    assert!(response.data_sources.user_lab_data_used);
    let message = response.message.unwrap();
    assert!(message.starts_with("Maize at input level L"), "{}", message);
    assert!(message.contains("SSURGO with user plot, lab data"), "{}", message);
}
