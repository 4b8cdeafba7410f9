//! Overall soil rating (SR)
//!
//! Combines the seven indices multiplicatively per input level:
//!
//! - **L**: `SQ1 x SQ3/100 x min(SQ4, SQ5, SQ6, SQ7)/100`
//! - **I**: `(SQ1 + SQ2)/2 x SQ3/100 x min(SQ4, SQ5, SQ6, SQ7)/100`
//! - **H**: `SQ2 x SQ3/100 x min(SQ4, SQ7)/100`
//!
//! The limiting-factor minimum ignores NaN members.

use crate::error::SqiResult;
use crate::metrics::IndexScore;
use crate::types::{InputLevel, SqiCode, SqiValue};
use crate::utils::stats::{nan_min, safe_float};
use serde::Serialize;
use std::fmt;

/// The seven indices and the overall rating
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreVector {
    #[serde(rename = "SQ1")]
    pub sq1: SqiValue,
    #[serde(rename = "SQ2")]
    pub sq2: SqiValue,
    #[serde(rename = "SQ3")]
    pub sq3: SqiValue,
    #[serde(rename = "SQ4")]
    pub sq4: SqiValue,
    #[serde(rename = "SQ5")]
    pub sq5: SqiValue,
    #[serde(rename = "SQ6")]
    pub sq6: SqiValue,
    #[serde(rename = "SQ7")]
    pub sq7: SqiValue,
    #[serde(rename = "SR")]
    pub sr: f64,
}

impl ScoreVector {
    pub fn get(&self, code: SqiCode) -> SqiValue {
        match code {
            SqiCode::Sq1 => self.sq1,
            SqiCode::Sq2 => self.sq2,
            SqiCode::Sq3 => self.sq3,
            SqiCode::Sq4 => self.sq4,
            SqiCode::Sq5 => self.sq5,
            SqiCode::Sq6 => self.sq6,
            SqiCode::Sq7 => self.sq7,
        }
    }

    /// NaN and infinities become 0; `NA` is kept
    pub fn sanitized(&self) -> Self {
        let clean = |v: SqiValue| match v {
            SqiValue::Score(s) => SqiValue::Score(safe_float(s)),
            SqiValue::NotApplicable => SqiValue::NotApplicable,
        };
        Self {
            sq1: clean(self.sq1),
            sq2: clean(self.sq2),
            sq3: clean(self.sq3),
            sq4: clean(self.sq4),
            sq5: clean(self.sq5),
            sq6: clean(self.sq6),
            sq7: clean(self.sq7),
            sr: safe_float(self.sr),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RatingClass {
    #[serde(rename = "Very Poor")]
    VeryPoor,
    Poor,
    Moderate,
    Good,
    Excellent,
}

impl RatingClass {
    pub fn from_score(sr: f64) -> Self {
        if sr.is_nan() || sr < 20.0 {
            RatingClass::VeryPoor
        } else if sr < 40.0 {
            RatingClass::Poor
        } else if sr < 60.0 {
            RatingClass::Moderate
        } else if sr < 80.0 {
            RatingClass::Good
        } else {
            RatingClass::Excellent
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RatingClass::VeryPoor => "Very Poor",
            RatingClass::Poor => "Poor",
            RatingClass::Moderate => "Moderate",
            RatingClass::Good => "Good",
            RatingClass::Excellent => "Excellent",
        }
    }
}

impl fmt::Display for RatingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Composer output for one component
#[derive(Debug, Clone, Serialize)]
pub struct SoilRating {
    pub scores: ScoreVector,
    pub input_level: InputLevel,
    pub component: String,
    pub rating: RatingClass,
}

/// SR from the seven index values
pub fn overall_rating(level: InputLevel, v: &[f64; 7]) -> f64 {
    let [sq1, sq2, sq3, sq4, sq5, sq6, sq7] = *v;
    let r = sq3 / 100.0;
    match level {
        InputLevel::Low => sq1 * r * nan_min(&[sq4, sq5, sq6, sq7]) / 100.0,
        InputLevel::Intermediate => 0.5 * (sq1 + sq2) * r * nan_min(&[sq4, sq5, sq6, sq7]) / 100.0,
        InputLevel::High => sq2 * r * nan_min(&[sq4, sq7]) / 100.0,
    }
}

/// Assemble the score vector from the scorer outputs (any order)
pub fn compose(level: InputLevel, indices: &[IndexScore], component: &str) -> SoilRating {
    let value = |code: SqiCode| {
        indices
            .iter()
            .find(|i| i.code == code)
            .map_or(SqiValue::Score(f64::NAN), |i| i.value)
    };

    let values = SqiCode::ALL.map(|code| value(code).as_f64());
    let sr = overall_rating(level, &values);

    let scores = ScoreVector {
        sq1: value(SqiCode::Sq1),
        sq2: value(SqiCode::Sq2),
        sq3: value(SqiCode::Sq3),
        sq4: value(SqiCode::Sq4),
        sq5: value(SqiCode::Sq5),
        sq6: value(SqiCode::Sq6),
        sq7: value(SqiCode::Sq7),
        sr,
    };

    SoilRating {
        scores,
        input_level: level,
        component: component.to_string(),
        rating: RatingClass::from_score(safe_float(sr)),
    }
}

/// `compose` for a textual input level; anything but L, I or H is rejected
pub fn compose_for_level(level: &str, indices: &[IndexScore], component: &str) -> SqiResult<SoilRating> {
    let level: InputLevel = level.parse()?;
    Ok(compose(level, indices, component))
}
