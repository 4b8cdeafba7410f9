// Property tests over randomly generated profiles
//
// Profiles are drawn from a seeded StdRng so failures reproduce. Each test
// checks one invariant across a few hundred profiles.

mod common;

use approx::assert_relative_eq;
use common::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use soil_quality_rust::catalogue::RequirementCatalogue;
use soil_quality_rust::integration::{integrate_user_data, UserData};
use soil_quality_rust::phase::classify_profile;
use soil_quality_rust::rating::compose;
use soil_quality_rust::utils::constraint_curve::ConstraintCurve;
use soil_quality_rust::utils::depth_weights::depth_weights;
use soil_quality_rust::{score_indices, InputLevel, RootingClass, SoilProfile, SqiCode, SqiValue, SsurgoHorizon};

const CASES: usize = 200;
const LEVELS: [InputLevel; 3] = [InputLevel::Low, InputLevel::Intermediate, InputLevel::High];
const ROOTING: [RootingClass; 4] = [
    RootingClass::Shallow,
    RootingClass::Moderate,
    RootingClass::Deep,
    RootingClass::VeryDeep,
];
const DRAINAGE: [&str; 7] = [
    "Very poorly drained",
    "Poorly drained",
    "Somewhat poorly drained",
    "Moderately well drained",
    "Well drained",
    "Somewhat excessively drained",
    "Excessively drained",
];

fn maybe(rng: &mut StdRng, lo: f64, hi: f64) -> Option<f64> {
    rng.gen_bool(0.9).then(|| rng.gen_range(lo..hi))
}

/// Contiguous horizons from the surface with random but valid properties
fn random_rows(rng: &mut StdRng) -> Vec<SsurgoHorizon> {
    let n = rng.gen_range(1..=6);
    let drainage = DRAINAGE.choose(rng).map(|d| d.to_string());
    let restriction = rng.gen_bool(0.3).then(|| rng.gen_range(15.0..150.0));

    let mut top = 0.0;
    (0..n)
        .map(|_| {
            let bottom = top + rng.gen_range(5.0..50.0);
            let sand = rng.gen_range(0.0..95.0);
            let clay = rng.gen_range(0.0..(100.0 - sand));
            let row = SsurgoHorizon {
                mukey: "MU1".into(),
                cokey: "MU1:1".into(),
                compname: "Random".into(),
                top_depth_cm: top,
                bottom_depth_cm: bottom,
                sand: Some(sand),
                silt: Some(100.0 - sand - clay),
                clay: Some(clay),
                om: maybe(rng, 0.0, 8.0),
                ph: maybe(rng, 3.5, 10.0),
                cecs: maybe(rng, 1.0, 60.0),
                teb: maybe(rng, 0.0, 40.0),
                ec: maybe(rng, 0.0, 25.0),
                esp: maybe(rng, 0.0, 50.0),
                caco3: maybe(rng, 0.0, 50.0),
                gypsum: maybe(rng, 0.0, 30.0),
                db_measured: maybe(rng, 0.9, 1.9),
                fragvol: maybe(rng, 0.0, 90.0),
                drainagecl: drainage.clone(),
                restrictive_depth_cm: restriction,
                ..Default::default()
            };
            top = bottom;
            row
        })
        .collect()
}

fn random_case(rng: &mut StdRng) -> (SoilProfile, &'static str, InputLevel, RootingClass) {
    let profile = classify_profile(&random_rows(rng)).unwrap();
    let crop = if rng.gen_bool(0.5) { MAIZE } else { WHEAT };
    let level = *LEVELS.choose(rng).unwrap();
    let rooting = *ROOTING.choose(rng).unwrap();
    (profile, crop, level, rooting)
}

fn scores(catalogue: &RequirementCatalogue, profile: &SoilProfile, crop: &str, level: InputLevel, rooting: RootingClass) -> Vec<SqiValue> {
    let requirements = catalogue.requirements(crop, level).unwrap();
    score_indices(profile, &requirements, rooting, level).into_iter().map(|i| i.value).collect()
}

#[test]
fn test_p1_scores_within_range() {
    let mut rng = StdRng::seed_from_u64(1);
    let catalogue = catalogue();

    for _ in 0..CASES {
        let (profile, crop, level, rooting) = random_case(&mut rng);
        let requirements = catalogue.requirements(crop, level).unwrap();
        let indices = score_indices(&profile, &requirements, rooting, level);
        let rating = compose(level, &indices, &profile.cokey);
        let clean = rating.scores.sanitized();

        for code in SqiCode::ALL {
            match clean.get(code) {
                SqiValue::Score(v) => assert!(v >= 0.0 && v <= 100.0 + 1e-9, "{} = {} out of range", code, v),
                SqiValue::NotApplicable => {
                    assert_eq!(code, SqiCode::Sq1);
                    assert_eq!(level, InputLevel::High);
                }
            }
        }
        assert!(clean.sr >= 0.0 && clean.sr <= 100.0 + 1e-9, "SR = {}", clean.sr);

        // SR never exceeds its nutrient x rooting factor
        let s = &rating.scores;
        let bound = match level {
            InputLevel::Low => s.sq1.as_f64() * s.sq3.as_f64() / 100.0,
            InputLevel::Intermediate => 0.5 * (s.sq1.as_f64() + s.sq2.as_f64()) * s.sq3.as_f64() / 100.0,
            InputLevel::High => s.sq2.as_f64() * s.sq3.as_f64() / 100.0,
        };
        if !s.sr.is_nan() {
            assert!(s.sr <= bound + 1e-9, "SR {} above bound {}", s.sr, bound);
        }
    }
}

#[test]
fn test_p2_weights_sum_to_one() {
    let mut rng = StdRng::seed_from_u64(2);

    for _ in 0..CASES {
        let profile = classify_profile(&random_rows(&mut rng)).unwrap();
        let mut intervals = profile.intervals();
        // A zero-thickness horizon carries no weight
        intervals.push((10.0, 10.0));
        let rooting = *ROOTING.choose(&mut rng).unwrap();
        let weights = depth_weights(&intervals, rooting);

        assert_relative_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-6);
        assert_eq!(*weights.last().unwrap(), 0.0);
        assert!(weights.iter().all(|w| *w >= 0.0));
    }
}

#[test]
fn test_p3_monotone_curves_preserve_order() {
    let mut rng = StdRng::seed_from_u64(3);

    for _ in 0..CASES {
        let n = rng.gen_range(2..=7);
        let mut x: f64 = rng.gen_range(-10.0..10.0);
        let mut y: f64 = rng.gen_range(0.0..30.0);
        let mut points = Vec::with_capacity(n);
        for _ in 0..n {
            points.push((x, y));
            x += rng.gen_range(0.1..20.0);
            y = (y + rng.gen_range(0.0..40.0)).min(100.0);
        }
        let decreasing = rng.gen_bool(0.5);
        if decreasing {
            points.iter_mut().for_each(|p| p.1 = 100.0 - p.1);
        }

        let curve = ConstraintCurve::new(&points).unwrap();
        let lo = points[0].0 - 5.0;
        let hi = points[n - 1].0 + 5.0;
        let mut xs: Vec<f64> = (0..50).map(|_| rng.gen_range(lo..hi)).collect();
        xs.sort_by(f64::total_cmp);
        let ys = curve.eval_many(&xs);

        let (min, max) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), p| (a.min(p.1), b.max(p.1)));
        for pair in ys.windows(2) {
            if decreasing {
                assert!(pair[1] <= pair[0] + 1e-9);
            } else {
                assert!(pair[1] >= pair[0] - 1e-9);
            }
        }
        assert!(ys.iter().all(|y| *y >= min - 1e-9 && *y <= max + 1e-9));
    }
}

#[test]
fn test_p4_empty_overlay_is_identity() {
    let mut rng = StdRng::seed_from_u64(4);

    for _ in 0..CASES {
        let profile = classify_profile(&random_rows(&mut rng)).unwrap();
        let outcome = integrate_user_data(&profile, &UserData::default());
        assert_eq!(outcome.profile, profile);
        assert!(!outcome.applied.plot && !outcome.applied.site && !outcome.applied.lab);
    }
}

#[test]
fn test_p5_horizon_order_does_not_matter() {
    let mut rng = StdRng::seed_from_u64(5);
    let catalogue = catalogue();

    for _ in 0..CASES {
        let (profile, crop, level, rooting) = random_case(&mut rng);
        let mut shuffled = profile.clone();
        shuffled.horizons.shuffle(&mut rng);

        let expected = scores(&catalogue, &profile, crop, level, rooting);
        let actual = scores(&catalogue, &shuffled, crop, level, rooting);
        for (a, b) in expected.iter().zip(&actual) {
            match (a, b) {
                (SqiValue::Score(a), SqiValue::Score(b)) if a.is_nan() => assert!(b.is_nan()),
                (SqiValue::Score(a), SqiValue::Score(b)) => assert_relative_eq!(*a, *b, epsilon = 1e-9),
                _ => assert_eq!(a, b),
            }
        }
    }
}

#[test]
fn test_p5_row_order_does_not_matter_end_to_end() {
    let mut rng = StdRng::seed_from_u64(6);
    let catalogue = catalogue();

    for _ in 0..50 {
        let rows = random_rows(&mut rng);
        let mut shuffled = rows.clone();
        shuffled.shuffle(&mut rng);

        let a = scores(&catalogue, &classify_profile(&rows).unwrap(), MAIZE, InputLevel::Low, RootingClass::Deep);
        let b = scores(&catalogue, &classify_profile(&shuffled).unwrap(), MAIZE, InputLevel::Low, RootingClass::Deep);
        for (a, b) in a.iter().zip(&b) {
            assert_eq!(a.as_f64().to_bits(), b.as_f64().to_bits());
        }
    }
}
