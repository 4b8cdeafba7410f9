//! USDA Soil Texture Classification
//!
//! Polygon-based classification on the USDA texture triangle, using transformed
//! coordinates `x = 0.5 * clay + silt`, `y = clay` and a ray-casting
//! point-in-polygon test. Points that land exactly on a shared polygon edge are
//! resolved with the USDA textural rules.
//!
//! Class ids are the keys of the crop texture requirement table
//! (1 = Clay ... 12 = Sand). Each class also carries its particle-size group
//! (coarse / medium / fine) and the reference bulk density used to express
//! measured bulk density as a degree of compactness.

use crate::types::Pscl;
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureClass {
    Clay = 1,
    SiltyClay = 2,
    SandyClay = 3,
    ClayLoam = 4,
    SiltyClayLoam = 5,
    SandyClayLoam = 6,
    Loam = 7,
    SiltLoam = 8,
    SandyLoam = 9,
    Silt = 10,
    LoamySand = 11,
    Sand = 12,
}

impl TextureClass {
    pub const ALL: [TextureClass; 12] = [
        TextureClass::Clay,
        TextureClass::SiltyClay,
        TextureClass::SandyClay,
        TextureClass::ClayLoam,
        TextureClass::SiltyClayLoam,
        TextureClass::SandyClayLoam,
        TextureClass::Loam,
        TextureClass::SiltLoam,
        TextureClass::SandyLoam,
        TextureClass::Silt,
        TextureClass::LoamySand,
        TextureClass::Sand,
    ];

    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(usize::from(id).checked_sub(1)?).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            TextureClass::Clay => "Clay",
            TextureClass::SiltyClay => "Silty Clay",
            TextureClass::SandyClay => "Sandy Clay",
            TextureClass::ClayLoam => "Clay Loam",
            TextureClass::SiltyClayLoam => "Silty Clay Loam",
            TextureClass::SandyClayLoam => "Sandy Clay Loam",
            TextureClass::Loam => "Loam",
            TextureClass::SiltLoam => "Silt Loam",
            TextureClass::SandyLoam => "Sandy Loam",
            TextureClass::Silt => "Silt",
            TextureClass::LoamySand => "Loamy Sand",
            TextureClass::Sand => "Sand",
        }
    }

    /// Case- and separator-insensitive name lookup ("silty_clay", "Silty Clay")
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL.iter().copied().find(|class| {
            class
                .name()
                .chars()
                .filter(|c| c.is_ascii_alphabetic())
                .map(|c| c.to_ascii_lowercase())
                .eq(key.chars())
        })
    }

    /// Particle-size group character: C (coarse), M (medium), F (fine)
    pub fn group(&self) -> char {
        match self {
            TextureClass::Sand | TextureClass::LoamySand | TextureClass::SandyLoam => 'C',
            TextureClass::Clay | TextureClass::SiltyClay | TextureClass::SandyClay => 'F',
            _ => 'M',
        }
    }

    pub fn pscl(&self) -> Pscl {
        match self.group() {
            'C' => Pscl::Coarse,
            'F' => Pscl::Fine,
            _ => Pscl::Medium,
        }
    }

    /// Reference bulk density (g/cm3) for the degree-of-compactness ratio
    pub fn reference_bulk_density(&self) -> f64 {
        match self {
            TextureClass::Clay => 1.39,
            TextureClass::SiltyClay | TextureClass::SandyClay => 1.49,
            TextureClass::SiltyClayLoam => 1.55,
            TextureClass::ClayLoam
            | TextureClass::SandyClayLoam
            | TextureClass::SiltLoam
            | TextureClass::Silt => 1.60,
            TextureClass::Loam | TextureClass::SandyLoam => 1.63,
            TextureClass::LoamySand | TextureClass::Sand => 1.69,
        }
    }
}

impl Serialize for TextureClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl fmt::Display for TextureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// USDA Polygon Definitions (12 classes)
// Corner points as (clay, sand, silt)
// ============================================================================

/// A vertex in the texture triangle (ternary + transformed Cartesian coordinates)
#[derive(Clone, Copy, Debug)]
pub struct TextureVertex {
    pub clay: f64,
    pub sand: f64,
    pub silt: f64,
    pub x: f64,
    pub y: f64,
}

impl TextureVertex {
    const fn new(clay: f64, sand: f64, silt: f64) -> Self {
        Self { clay, sand, silt, x: 0.5 * clay + silt, y: clay }
    }
}

struct TexturePolygon {
    class: TextureClass,
    vertices: &'static [TextureVertex],
}

static SAND_VERTICES: [TextureVertex; 3] = [
    TextureVertex::new(10.0, 90.0, 0.0),
    TextureVertex::new(0.0, 100.0, 0.0),
    TextureVertex::new(0.0, 85.0, 15.0),
];

static LOAMY_SAND_VERTICES: [TextureVertex; 4] = [
    TextureVertex::new(15.0, 85.0, 0.0),
    TextureVertex::new(10.0, 90.0, 0.0),
    TextureVertex::new(0.0, 85.0, 15.0),
    TextureVertex::new(0.0, 70.0, 30.0),
];

static SANDY_LOAM_VERTICES: [TextureVertex; 7] = [
    TextureVertex::new(20.0, 80.0, 0.0),
    TextureVertex::new(15.0, 85.0, 0.0),
    TextureVertex::new(0.0, 70.0, 30.0),
    TextureVertex::new(0.0, 50.0, 50.0),
    TextureVertex::new(7.0, 43.0, 50.0),
    TextureVertex::new(7.0, 52.0, 41.0),
    TextureVertex::new(20.0, 52.0, 28.0),
];

static LOAM_VERTICES: [TextureVertex; 5] = [
    TextureVertex::new(27.0, 45.0, 28.0),
    TextureVertex::new(20.0, 52.0, 28.0),
    TextureVertex::new(7.0, 52.0, 41.0),
    TextureVertex::new(7.0, 43.0, 50.0),
    TextureVertex::new(27.0, 23.0, 50.0),
];

static SILT_LOAM_VERTICES: [TextureVertex; 7] = [
    TextureVertex::new(27.0, 23.0, 50.0),
    TextureVertex::new(7.0, 43.0, 50.0),
    TextureVertex::new(0.0, 50.0, 50.0),
    TextureVertex::new(0.0, 20.0, 80.0),
    TextureVertex::new(12.0, 8.0, 80.0),
    TextureVertex::new(12.0, 0.0, 88.0),
    TextureVertex::new(27.0, 0.0, 73.0),
];

static SILT_VERTICES: [TextureVertex; 4] = [
    TextureVertex::new(12.0, 8.0, 80.0),
    TextureVertex::new(0.0, 20.0, 80.0),
    TextureVertex::new(0.0, 0.0, 100.0),
    TextureVertex::new(12.0, 0.0, 88.0),
];

static SANDY_CLAY_LOAM_VERTICES: [TextureVertex; 5] = [
    TextureVertex::new(35.0, 65.0, 0.0),
    TextureVertex::new(20.0, 80.0, 0.0),
    TextureVertex::new(20.0, 52.0, 28.0),
    TextureVertex::new(27.0, 45.0, 28.0),
    TextureVertex::new(35.0, 45.0, 20.0),
];

static CLAY_LOAM_VERTICES: [TextureVertex; 4] = [
    TextureVertex::new(40.0, 45.0, 15.0),
    TextureVertex::new(27.0, 45.0, 28.0),
    TextureVertex::new(27.0, 20.0, 53.0),
    TextureVertex::new(40.0, 20.0, 40.0),
];

static SILTY_CLAY_LOAM_VERTICES: [TextureVertex; 4] = [
    TextureVertex::new(40.0, 20.0, 40.0),
    TextureVertex::new(27.0, 20.0, 53.0),
    TextureVertex::new(27.0, 0.0, 73.0),
    TextureVertex::new(40.0, 0.0, 60.0),
];

static SANDY_CLAY_VERTICES: [TextureVertex; 3] = [
    TextureVertex::new(55.0, 45.0, 0.0),
    TextureVertex::new(35.0, 65.0, 0.0),
    TextureVertex::new(35.0, 45.0, 20.0),
];

static SILTY_CLAY_VERTICES: [TextureVertex; 3] = [
    TextureVertex::new(60.0, 0.0, 40.0),
    TextureVertex::new(40.0, 20.0, 40.0),
    TextureVertex::new(40.0, 0.0, 60.0),
];

static CLAY_VERTICES: [TextureVertex; 5] = [
    TextureVertex::new(100.0, 0.0, 0.0),
    TextureVertex::new(55.0, 45.0, 0.0),
    TextureVertex::new(40.0, 45.0, 15.0),
    TextureVertex::new(40.0, 20.0, 40.0),
    TextureVertex::new(60.0, 0.0, 40.0),
];

/// Checked first to last
static USDA_POLYGONS: [TexturePolygon; 12] = [
    TexturePolygon { class: TextureClass::Sand, vertices: &SAND_VERTICES },
    TexturePolygon { class: TextureClass::LoamySand, vertices: &LOAMY_SAND_VERTICES },
    TexturePolygon { class: TextureClass::SandyLoam, vertices: &SANDY_LOAM_VERTICES },
    TexturePolygon { class: TextureClass::Loam, vertices: &LOAM_VERTICES },
    TexturePolygon { class: TextureClass::SiltLoam, vertices: &SILT_LOAM_VERTICES },
    TexturePolygon { class: TextureClass::Silt, vertices: &SILT_VERTICES },
    TexturePolygon { class: TextureClass::SandyClayLoam, vertices: &SANDY_CLAY_LOAM_VERTICES },
    TexturePolygon { class: TextureClass::ClayLoam, vertices: &CLAY_LOAM_VERTICES },
    TexturePolygon { class: TextureClass::SiltyClayLoam, vertices: &SILTY_CLAY_LOAM_VERTICES },
    TexturePolygon { class: TextureClass::SandyClay, vertices: &SANDY_CLAY_VERTICES },
    TexturePolygon { class: TextureClass::SiltyClay, vertices: &SILTY_CLAY_VERTICES },
    TexturePolygon { class: TextureClass::Clay, vertices: &CLAY_VERTICES },
];

/// Polygon vertices for a texture class (for plotting the triangle)
pub fn class_vertices(class: TextureClass) -> &'static [TextureVertex] {
    USDA_POLYGONS
        .iter()
        .find(|p| p.class == class)
        .map(|p| p.vertices)
        .unwrap_or(&[])
}

// ============================================================================
// Point-in-Polygon Algorithm (Ray Casting)
// ============================================================================

fn point_in_polygon(x: f64, y: f64, vertices: &[TextureVertex]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (vertices[i].x, vertices[i].y);
        let (xj, yj) = (vertices[j].x, vertices[j].y);
        if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// USDA textural rules; total over the whole triangle, used for edge points
fn classify_by_rules(sand: f64, silt: f64, clay: f64) -> TextureClass {
    if silt + 1.5 * clay < 15.0 {
        TextureClass::Sand
    } else if silt + 2.0 * clay < 30.0 {
        TextureClass::LoamySand
    } else if (clay >= 7.0 && clay < 20.0 && sand > 52.0) || (clay < 7.0 && silt < 50.0) {
        TextureClass::SandyLoam
    } else if clay >= 7.0 && clay < 27.0 && silt >= 28.0 && silt < 50.0 && sand <= 52.0 {
        TextureClass::Loam
    } else if (silt >= 50.0 && clay >= 12.0 && clay < 27.0) || (silt >= 50.0 && silt < 80.0 && clay < 12.0) {
        TextureClass::SiltLoam
    } else if silt >= 80.0 && clay < 12.0 {
        TextureClass::Silt
    } else if clay >= 20.0 && clay < 35.0 && silt < 28.0 && sand > 45.0 {
        TextureClass::SandyClayLoam
    } else if clay >= 27.0 && clay < 40.0 && sand > 20.0 && sand <= 45.0 {
        TextureClass::ClayLoam
    } else if clay >= 27.0 && clay < 40.0 && sand <= 20.0 {
        TextureClass::SiltyClayLoam
    } else if clay >= 35.0 && sand > 45.0 {
        TextureClass::SandyClay
    } else if clay >= 40.0 && silt >= 40.0 {
        TextureClass::SiltyClay
    } else if clay >= 40.0 {
        TextureClass::Clay
    } else {
        TextureClass::Loam
    }
}

// ============================================================================
// Public Classification Functions
// ============================================================================

/// Classify from sand, silt and clay percentages
///
/// Returns None when any fraction is missing, negative or non-finite, or when
/// all three are zero. Fractions are rescaled to sum to 100 first.
pub fn classify_texture(sand: Option<f64>, silt: Option<f64>, clay: Option<f64>) -> Option<TextureClass> {
    let (sand, silt, clay) = (sand?, silt?, clay?);
    if [sand, silt, clay].iter().any(|v| !v.is_finite() || *v < 0.0) {
        return None;
    }
    let total = sand + silt + clay;
    if total <= 0.0 {
        return None;
    }
    let scale = 100.0 / total;
    let (sand, silt, clay) = (sand * scale, silt * scale, clay * scale);

    let (x, y) = (0.5 * clay + silt, clay);
    USDA_POLYGONS
        .iter()
        .find(|p| point_in_polygon(x, y, p.vertices))
        .map(|p| p.class)
        .or_else(|| Some(classify_by_rules(sand, silt, clay)))
}

/// Anything carrying a sand/silt/clay triple can be classified directly
pub trait TextureComponents {
    fn sand_pct(&self) -> Option<f64>;
    fn silt_pct(&self) -> Option<f64>;
    fn clay_pct(&self) -> Option<f64>;

    fn texture_class(&self) -> Option<TextureClass> {
        classify_texture(self.sand_pct(), self.silt_pct(), self.clay_pct())
    }
}

/// `(sand, silt, clay)`
impl TextureComponents for (f64, f64, f64) {
    fn sand_pct(&self) -> Option<f64> {
        Some(self.0)
    }
    fn silt_pct(&self) -> Option<f64> {
        Some(self.1)
    }
    fn clay_pct(&self) -> Option<f64> {
        Some(self.2)
    }
}

/// FAO particle-size class
///
/// Numeric rule when clay and sand are both known: coarse if clay < 18 and
/// sand > 65, fine if clay > 35, medium otherwise. Falls back to the group of
/// the named texture class; None ("unknown") if neither resolves.
pub fn classify_pscl(texture: Option<&str>, clay: Option<f64>, sand: Option<f64>) -> Option<Pscl> {
    match (clay.filter(|v| v.is_finite()), sand.filter(|v| v.is_finite())) {
        (Some(clay), Some(sand)) => Some(if clay < 18.0 && sand > 65.0 {
            Pscl::Coarse
        } else if clay > 35.0 {
            Pscl::Fine
        } else {
            Pscl::Medium
        }),
        _ => texture.and_then(TextureClass::from_name).map(|class| class.pscl()),
    }
}

/// PSCL id as reported downstream: "1", "2", "3" or "unknown"
pub fn pscl_label(pscl: Option<Pscl>) -> String {
    pscl.map(|p| p.id().to_string()).unwrap_or_else(|| "unknown".to_string())
}
