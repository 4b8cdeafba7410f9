//! Closed enumerations shared across the engine
//!
//! The integer encodings are stable: they are the keys used by the crop
//! requirement tables.

use crate::error::SqiError;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Input level
// ============================================================================

/// Management-input regime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputLevel {
    #[serde(rename = "L")]
    Low,
    #[serde(rename = "I")]
    Intermediate,
    #[serde(rename = "H")]
    High,
}

impl InputLevel {
    pub fn code(&self) -> &'static str {
        match self {
            InputLevel::Low => "L",
            InputLevel::Intermediate => "I",
            InputLevel::High => "H",
        }
    }

    /// Catalogue `input_level` values admitted by this regime, most specific first
    ///
    /// 1, 2 and 5 belong to a single regime, 3 is shared by L and I, 4 by all.
    pub fn catalogue_levels(&self) -> &'static [u8] {
        match self {
            InputLevel::Low => &[1, 3, 4],
            InputLevel::Intermediate => &[2, 3, 4],
            InputLevel::High => &[5, 4],
        }
    }

    /// Preference rank of a catalogue level (lower wins), None if not admitted
    pub fn level_rank(&self, catalogue_level: u8) -> Option<usize> {
        self.catalogue_levels()
            .iter()
            .position(|&level| level == catalogue_level)
    }
}

impl FromStr for InputLevel {
    type Err = SqiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(InputLevel::Low),
            "I" => Ok(InputLevel::Intermediate),
            "H" => Ok(InputLevel::High),
            _ => Err(SqiError::InvalidInputLevel(s.to_string())),
        }
    }
}

impl fmt::Display for InputLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// SQI codes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SqiCode {
    /// Nutrient availability
    Sq1 = 1,
    /// Nutrient retention
    Sq2 = 2,
    /// Rooting conditions
    Sq3 = 3,
    /// Oxygen availability
    Sq4 = 4,
    /// Salinity and sodicity
    Sq5 = 5,
    /// Calcareousness and gypsum
    Sq6 = 6,
    /// Workability
    Sq7 = 7,
}

impl SqiCode {
    pub const ALL: [SqiCode; 7] = [
        SqiCode::Sq1,
        SqiCode::Sq2,
        SqiCode::Sq3,
        SqiCode::Sq4,
        SqiCode::Sq5,
        SqiCode::Sq6,
        SqiCode::Sq7,
    ];

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(usize::from(id).checked_sub(1)?).copied()
    }

    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            SqiCode::Sq1 => "Nutrient availability",
            SqiCode::Sq2 => "Nutrient retention",
            SqiCode::Sq3 => "Rooting conditions",
            SqiCode::Sq4 => "Oxygen availability",
            SqiCode::Sq5 => "Salinity and sodicity",
            SqiCode::Sq6 => "Calcareousness and gypsum",
            SqiCode::Sq7 => "Workability",
        }
    }
}

impl fmt::Display for SqiCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SQ{}", self.id())
    }
}

impl Serialize for SqiCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ============================================================================
// Particle size class
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pscl {
    Coarse = 1,
    Medium = 2,
    Fine = 3,
}

impl Pscl {
    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Pscl::Coarse),
            2 => Some(Pscl::Medium),
            3 => Some(Pscl::Fine),
            _ => None,
        }
    }

    /// From the texture group character (C/M/F)
    pub fn from_group(group: char) -> Option<Self> {
        match group.to_ascii_uppercase() {
            'C' => Some(Pscl::Coarse),
            'M' => Some(Pscl::Medium),
            'F' => Some(Pscl::Fine),
            _ => None,
        }
    }

    pub fn group(&self) -> char {
        match self {
            Pscl::Coarse => 'C',
            Pscl::Medium => 'M',
            Pscl::Fine => 'F',
        }
    }
}

impl fmt::Display for Pscl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

// ============================================================================
// Drainage class
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DrainageClass {
    VeryPoorly = 1,
    Poorly = 2,
    SomewhatPoorly = 3,
    ModeratelyWell = 4,
    Well = 5,
    SomewhatExcessively = 6,
    Excessively = 7,
}

impl DrainageClass {
    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(DrainageClass::VeryPoorly),
            2 => Some(DrainageClass::Poorly),
            3 => Some(DrainageClass::SomewhatPoorly),
            4 => Some(DrainageClass::ModeratelyWell),
            5 => Some(DrainageClass::Well),
            6 => Some(DrainageClass::SomewhatExcessively),
            7 => Some(DrainageClass::Excessively),
            _ => None,
        }
    }

    /// Parse a SSURGO `drainagecl` label ("Well drained", "somewhat-poorly", ...)
    ///
    /// Unrecognised labels return None; scorers treat that as no constraint.
    pub fn from_ssurgo(label: &str) -> Option<Self> {
        let normalized = label
            .trim()
            .to_lowercase()
            .replace(['-', '_'], " ")
            .replace(" drained", "");
        match normalized.trim() {
            "very poorly" => Some(DrainageClass::VeryPoorly),
            "poorly" => Some(DrainageClass::Poorly),
            "somewhat poorly" => Some(DrainageClass::SomewhatPoorly),
            "moderately well" => Some(DrainageClass::ModeratelyWell),
            "well" => Some(DrainageClass::Well),
            "somewhat excessively" => Some(DrainageClass::SomewhatExcessively),
            "excessively" => Some(DrainageClass::Excessively),
            _ => None,
        }
    }
}

// ============================================================================
// Rooting class
// ============================================================================

/// Rooting depth class indexing the exponential root-distribution curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RootingClass {
    Shallow = 1,
    Moderate = 2,
    Deep = 3,
    VeryDeep = 4,
}

impl RootingClass {
    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(RootingClass::Shallow),
            2 => Some(RootingClass::Moderate),
            3 => Some(RootingClass::Deep),
            4 => Some(RootingClass::VeryDeep),
            _ => None,
        }
    }

    /// Decay constant k (per cm)
    pub fn decay(&self) -> f64 {
        match self {
            RootingClass::Shallow => 0.10,
            RootingClass::Moderate => 0.05,
            RootingClass::Deep => 0.03,
            RootingClass::VeryDeep => 0.015,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RootingClass::Shallow => "Shallow rooting (most roots in the top 30 cm)",
            RootingClass::Moderate => "Moderate rooting (most roots in the top 60 cm)",
            RootingClass::Deep => "Deep rooting (roots active to about 100 cm)",
            RootingClass::VeryDeep => "Very deep rooting (roots active below 150 cm)",
        }
    }
}

impl Default for RootingClass {
    fn default() -> Self {
        RootingClass::Deep
    }
}

// ============================================================================
// SQI value
// ============================================================================

/// A soil quality index: a score, or `NA` when undefined for the input level
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SqiValue {
    Score(f64),
    NotApplicable,
}

impl SqiValue {
    pub fn score(&self) -> Option<f64> {
        match self {
            SqiValue::Score(v) => Some(*v),
            SqiValue::NotApplicable => None,
        }
    }

    /// Score for arithmetic; NA counts as NaN
    pub fn as_f64(&self) -> f64 {
        self.score().unwrap_or(f64::NAN)
    }

    pub fn is_na(&self) -> bool {
        matches!(self, SqiValue::NotApplicable)
    }
}

impl Serialize for SqiValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SqiValue::Score(v) => serializer.serialize_f64(*v),
            SqiValue::NotApplicable => serializer.serialize_str("NA"),
        }
    }
}
