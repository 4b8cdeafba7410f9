// Shared fixtures for integration tests
//
// Two crops with hand-built requirement tables (maize "4", wheat "15") and
// the reference soils used by the end-to-end scenarios. All requirement rows
// sit at catalogue level 4, which every input level admits.

#![allow(dead_code)]

use soil_quality_rust::catalogue::{
    CropInfo, DrainageRequirement, ProfileProperty, ProfileRequirement, RequirementCatalogue, TextureRequirement,
};
use soil_quality_rust::soil_source::MapUnitExtent;
use soil_quality_rust::{RootingClass, SsurgoExtract, SsurgoHorizon};

pub const MAIZE: &str = "4";
pub const WHEAT: &str = "15";

/// Inside the S1 map unit
pub const S1_POINT: (f64, f64) = (41.5, -93.5);

type Curve = (u8, ProfileProperty, &'static [(f64, f64)]);

const DB_MAIZE: &[(f64, f64)] = &[(0.8, 100.0), (1.0, 90.0), (1.1, 60.0), (1.2, 30.0)];
const DB_WHEAT: &[(f64, f64)] = &[(0.8, 100.0), (1.0, 95.0), (1.15, 60.0), (1.3, 30.0)];

const MAIZE_CURVES: &[Curve] = &[
    (1, ProfileProperty::Oc, &[(0.3, 40.0), (1.0, 70.0), (2.0, 90.0), (3.0, 100.0)]),
    (1, ProfileProperty::Ph, &[(4.5, 20.0), (5.5, 60.0), (6.2, 100.0), (7.3, 100.0), (8.2, 60.0), (9.0, 20.0)]),
    (1, ProfileProperty::Teb, &[(2.0, 40.0), (5.0, 70.0), (10.0, 90.0), (15.0, 100.0)]),
    (2, ProfileProperty::Bs, &[(20.0, 40.0), (50.0, 75.0), (80.0, 100.0)]),
    (2, ProfileProperty::Cecs, &[(4.0, 40.0), (10.0, 80.0), (16.0, 100.0)]),
    (2, ProfileProperty::Cecc, &[(8.0, 50.0), (16.0, 80.0), (24.0, 100.0)]),
    (2, ProfileProperty::Ph, &[(4.5, 30.0), (5.5, 70.0), (6.2, 100.0), (7.5, 100.0), (8.5, 70.0)]),
    (3, ProfileProperty::Rd, &[(10.0, 15.0), (25.0, 38.0), (50.0, 65.0), (75.0, 85.0), (100.0, 100.0)]),
    (3, ProfileProperty::Db, DB_MAIZE),
    (3, ProfileProperty::Cf, &[(0.0, 100.0), (35.0, 100.0), (70.0, 80.0), (90.0, 40.0)]),
    (3, ProfileProperty::Ver, &[(0.0, 100.0), (1.0, 70.0)]),
    (3, ProfileProperty::Gel, &[(0.0, 100.0), (1.0, 40.0)]),
    (5, ProfileProperty::Ec, &[(0.0, 100.0), (2.0, 100.0), (4.0, 80.0), (8.0, 40.0), (16.0, 10.0)]),
    (5, ProfileProperty::Esp, &[(0.0, 100.0), (6.0, 100.0), (15.0, 60.0), (25.0, 30.0), (40.0, 10.0)]),
    (6, ProfileProperty::Ca, &[(0.0, 100.0), (5.0, 100.0), (15.0, 80.0), (25.0, 50.0), (40.0, 20.0)]),
    (6, ProfileProperty::Gy, &[(0.0, 100.0), (3.0, 100.0), (10.0, 70.0), (20.0, 40.0)]),
    (7, ProfileProperty::Rd, &[(10.0, 40.0), (25.0, 65.0), (50.0, 85.0), (100.0, 100.0)]),
    (7, ProfileProperty::Db, DB_MAIZE),
    (7, ProfileProperty::Cf, &[(0.0, 100.0), (35.0, 95.0), (55.0, 80.0), (80.0, 40.0)]),
    (7, ProfileProperty::Ver, &[(0.0, 100.0), (1.0, 60.0)]),
    (7, ProfileProperty::Gel, &[(0.0, 100.0), (1.0, 50.0)]),
];

const MAIZE_TEXTURE: &[(u8, u8, f64)] = &[
    (1, 8, 90.0),
    (1, 7, 100.0),
    (1, 9, 80.0),
    (1, 11, 60.0),
    (1, 12, 50.0),
    (2, 8, 90.0),
    (2, 7, 100.0),
    (2, 11, 60.0),
    (3, 8, 85.0),
    (3, 7, 100.0),
    (3, 9, 90.0),
    (3, 11, 70.0),
    (3, 12, 60.0),
];

const MAIZE_DRAINAGE: &[(u8, u8, f64)] = &[
    (2, 5, 100.0),
    (2, 4, 90.0),
    (2, 3, 70.0),
    (2, 2, 50.0),
    (2, 1, 30.0),
    (1, 5, 100.0),
    (1, 6, 95.0),
    (1, 7, 80.0),
];

const WHEAT_CURVES: &[Curve] = &[
    (1, ProfileProperty::Oc, &[(0.3, 60.0), (1.0, 85.0), (2.0, 100.0)]),
    (1, ProfileProperty::Ph, &[(4.5, 30.0), (5.5, 75.0), (6.0, 100.0), (8.0, 100.0), (8.8, 60.0)]),
    (1, ProfileProperty::Teb, &[(2.0, 60.0), (8.0, 100.0)]),
    (2, ProfileProperty::Bs, &[(20.0, 50.0), (50.0, 85.0), (75.0, 100.0)]),
    (2, ProfileProperty::Cecs, &[(4.0, 50.0), (12.0, 100.0)]),
    (2, ProfileProperty::Cecc, &[(8.0, 60.0), (20.0, 100.0)]),
    (2, ProfileProperty::Ph, &[(4.5, 40.0), (5.5, 80.0), (6.0, 100.0), (8.0, 100.0)]),
    (3, ProfileProperty::Rd, &[(10.0, 15.0), (25.0, 40.0), (50.0, 70.0), (100.0, 100.0)]),
    (3, ProfileProperty::Db, DB_WHEAT),
    (3, ProfileProperty::Cf, &[(0.0, 100.0), (35.0, 100.0), (70.0, 75.0)]),
    (5, ProfileProperty::Ec, &[(0.0, 100.0), (4.0, 100.0), (8.0, 50.0), (12.0, 25.0), (20.0, 5.0)]),
    (5, ProfileProperty::Esp, &[(0.0, 100.0), (10.0, 100.0), (20.0, 55.0), (30.0, 30.0), (45.0, 10.0)]),
    (6, ProfileProperty::Ca, &[(0.0, 100.0), (10.0, 100.0), (30.0, 60.0)]),
    (6, ProfileProperty::Gy, &[(0.0, 100.0), (5.0, 100.0), (15.0, 60.0)]),
    (7, ProfileProperty::Rd, &[(10.0, 40.0), (25.0, 60.0), (50.0, 85.0), (100.0, 100.0)]),
    (7, ProfileProperty::Db, DB_WHEAT),
    (7, ProfileProperty::Cf, &[(0.0, 100.0), (35.0, 95.0), (70.0, 60.0)]),
];

const WHEAT_TEXTURE: &[(u8, u8, f64)] = &[(1, 8, 100.0), (1, 7, 100.0), (2, 8, 100.0), (3, 8, 100.0), (3, 7, 100.0)];

const WHEAT_DRAINAGE: &[(u8, u8, f64)] = &[(2, 5, 100.0), (2, 4, 90.0)];

const LEVEL: u8 = 4;

fn profile_rows(crop: &str, curves: &[Curve]) -> Vec<ProfileRequirement> {
    curves
        .iter()
        .flat_map(|&(sqi, property, points)| {
            points.iter().map(move |&(value, score)| ProfileRequirement {
                crop_id: crop.to_string(),
                input_level: LEVEL,
                sqi,
                property,
                property_value: value,
                score,
            })
        })
        .collect()
}

fn texture_rows(crop: &str, rows: &[(u8, u8, f64)]) -> Vec<TextureRequirement> {
    rows.iter()
        .map(|&(sqi, texture_class_id, score)| TextureRequirement {
            crop_id: crop.to_string(),
            input_level: LEVEL,
            sqi,
            texture_class_id,
            score,
        })
        .collect()
}

fn drainage_rows(crop: &str, rows: &[(u8, u8, f64)]) -> Vec<DrainageRequirement> {
    rows.iter()
        .map(|&(pscl_id, drain_num, score)| DrainageRequirement {
            crop_id: crop.to_string(),
            input_level: LEVEL,
            sqi: 4,
            pscl_id,
            drain_num,
            score,
        })
        .collect()
}

/// Maize and wheat requirement tables
pub fn catalogue() -> RequirementCatalogue {
    let mut profile = profile_rows(MAIZE, MAIZE_CURVES);
    profile.extend(profile_rows(WHEAT, WHEAT_CURVES));
    let mut texture = texture_rows(MAIZE, MAIZE_TEXTURE);
    texture.extend(texture_rows(WHEAT, WHEAT_TEXTURE));
    let mut drainage = drainage_rows(MAIZE, MAIZE_DRAINAGE);
    drainage.extend(drainage_rows(WHEAT, WHEAT_DRAINAGE));

    let crops = vec![
        CropInfo { crop_id: MAIZE.into(), crop_name: "Maize".into(), rooting_class: RootingClass::Deep },
        CropInfo { crop_id: WHEAT.into(), crop_name: "Wheat".into(), rooting_class: RootingClass::Deep },
    ];

    RequirementCatalogue::from_rows(profile, texture, Vec::new(), drainage, Vec::new(), crops)
}

// ============================================================================
// Soils
// ============================================================================

/// Well-drained silt loam horizon with good chemistry
pub fn horizon(top: f64, bottom: f64) -> SsurgoHorizon {
    SsurgoHorizon {
        mukey: "MU1".into(),
        cokey: "MU1:1".into(),
        compname: "Clarion".into(),
        comppct_r: Some(85.0),
        top_depth_cm: top,
        bottom_depth_cm: bottom,
        sand: Some(25.0),
        silt: Some(55.0),
        clay: Some(20.0),
        om: Some(3.0),
        ph: Some(6.5),
        cecs: Some(18.0),
        teb: Some(14.0),
        bs: Some(85.0),
        ec: Some(0.3),
        esp: Some(1.0),
        caco3: Some(0.0),
        gypsum: Some(0.0),
        db_measured: Some(1.35),
        fragvol: Some(2.0),
        drainagecl: Some("Well drained".into()),
        ..Default::default()
    }
}

/// Deep prairie soil: three horizons to 120 cm, no restriction
pub fn s1_rows() -> Vec<SsurgoHorizon> {
    vec![
        horizon(0.0, 20.0),
        SsurgoHorizon { om: Some(2.0), ph: Some(6.8), bs: Some(88.0), ..horizon(20.0, 50.0) },
        SsurgoHorizon { om: Some(0.5), ph: Some(7.2), bs: Some(92.0), caco3: Some(1.0), ..horizon(50.0, 120.0) },
    ]
}

/// Shallow skeletal soil over bedrock at 25 cm
pub fn s2_rows() -> Vec<SsurgoHorizon> {
    vec![SsurgoHorizon {
        fragvol: Some(55.0),
        restrictive_depth_cm: Some(25.0),
        restriction_kind: Some("Lithic bedrock".into()),
        ..horizon(0.0, 25.0)
    }]
}

/// The S1 soil with saline-sodic chemistry throughout
pub fn s3_rows() -> Vec<SsurgoHorizon> {
    s1_rows()
        .into_iter()
        .map(|row| SsurgoHorizon { ec: Some(8.0), esp: Some(20.0), ..row })
        .collect()
}

/// Acid, low-carbon baseline
pub fn s4_rows() -> Vec<SsurgoHorizon> {
    vec![
        SsurgoHorizon { ph: Some(5.4), om: Some(1.0), ..horizon(0.0, 20.0) },
        SsurgoHorizon { ph: Some(5.4), om: Some(1.0), ..horizon(20.0, 50.0) },
        SsurgoHorizon { ph: Some(5.6), om: Some(0.3 / 0.58), ..horizon(50.0, 120.0) },
    ]
}

/// Loam topsoil over the S1 subsoil
pub fn s5_rows() -> Vec<SsurgoHorizon> {
    let mut rows = s1_rows();
    rows[0].sand = Some(40.0);
    rows[0].silt = Some(40.0);
    rows[0].clay = Some(20.0);
    rows
}

/// Extract with one map unit around `S1_POINT`
pub fn extract(rows: Vec<SsurgoHorizon>) -> SsurgoExtract {
    SsurgoExtract::from_parts(
        vec![MapUnitExtent { mukey: "MU1".into(), min_lat: 41.0, max_lat: 42.0, min_lon: -94.0, max_lon: -93.0 }],
        rows,
    )
}
