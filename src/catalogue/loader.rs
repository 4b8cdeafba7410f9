//! Requirement table loading
//!
//! Each table is one CSV (or Parquet) file in the catalogue directory. Rows
//! with an unknown property code or a missing score are skipped with a
//! warning; a missing mandatory file or column is an error.

use super::{
    CropInfo, DrainageRequirement, PhaseProperty, PhaseRequirement, ProfileProperty,
    ProfileRequirement, RequirementCatalogue, TerrainRequirement, TextureRequirement,
};
use crate::types::RootingClass;
use crate::utils::frame::{f64_column, read_table, str_column, u8_codes};
use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use tracing::warn;

const PROFILE_FILE: &str = "profile_req";
const TEXTURE_FILE: &str = "texture_req";
const PHASE_FILE: &str = "phase_req";
const DRAINAGE_FILE: &str = "drainage_req";
const TERRAIN_FILE: &str = "terrain_req";
const CROPS_FILE: &str = "crops";

/// Load every requirement table found in `dir`
pub fn load_catalogue(dir: &Path) -> Result<RequirementCatalogue> {
    let required = |stem: &str| -> Result<DataFrame> {
        let path = find_table(dir, stem)
            .with_context(|| format!("Missing {}.csv in {}", stem, dir.display()))?;
        read_table(&path)
    };
    let optional = |stem: &str| -> Result<Option<DataFrame>> {
        find_table(dir, stem).map(|path| read_table(&path)).transpose()
    };

    let profile = profile_rows(&required(PROFILE_FILE)?).context("Invalid profile_req table")?;
    let texture = texture_rows(&required(TEXTURE_FILE)?).context("Invalid texture_req table")?;
    let phase = phase_rows(&required(PHASE_FILE)?).context("Invalid phase_req table")?;
    let drainage = drainage_rows(&required(DRAINAGE_FILE)?).context("Invalid drainage_req table")?;
    let terrain = match optional(TERRAIN_FILE)? {
        Some(df) => terrain_rows(&df).context("Invalid terrain_req table")?,
        None => Vec::new(),
    };
    let crops = match optional(CROPS_FILE)? {
        Some(df) => crop_rows(&df).context("Invalid crops table")?,
        None => Vec::new(),
    };

    Ok(RequirementCatalogue::from_rows(profile, texture, phase, drainage, terrain, crops))
}

fn find_table(dir: &Path, stem: &str) -> Option<PathBuf> {
    ["csv", "parquet"]
        .iter()
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .find(|path| path.is_file())
}

/// Crop ids and scores shared by every requirement table
struct KeyColumns {
    crop_id: Vec<Option<String>>,
    input_level: Vec<u8>,
    score: Vec<Option<f64>>,
}

impl KeyColumns {
    fn read(df: &DataFrame) -> Result<Self> {
        Ok(Self {
            crop_id: str_column(df, "crop_id")?,
            input_level: u8_codes(df, "input_level")?,
            score: f64_column(df, "score")?,
        })
    }

    /// Crop id and score of a usable row
    fn row(&self, table: &str, i: usize) -> Option<(String, f64)> {
        match (&self.crop_id[i], self.score[i]) {
            (Some(crop), Some(score)) if !crop.is_empty() && score.is_finite() => Some((crop.clone(), score)),
            _ => {
                warn!(table, row = i, "Skipping requirement row without crop id or score");
                None
            }
        }
    }
}

pub fn profile_rows(df: &DataFrame) -> Result<Vec<ProfileRequirement>> {
    let keys = KeyColumns::read(df)?;
    let sqi = u8_codes(df, "sqi_code")?;
    let property = str_column(df, "property")?;
    let value = f64_column(df, "property_value")?;

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let Some((crop_id, score)) = keys.row(PROFILE_FILE, i) else { continue };
        let parsed = property[i].as_deref().map(str::parse::<ProfileProperty>);
        let property = match parsed {
            Some(Ok(p)) => p,
            _ => {
                warn!(row = i, property = ?property[i], "Skipping profile requirement with unknown property");
                continue;
            }
        };
        let Some(property_value) = value[i].filter(|v| v.is_finite()) else {
            warn!(row = i, %property, "Skipping profile requirement without property value");
            continue;
        };
        rows.push(ProfileRequirement {
            crop_id,
            input_level: keys.input_level[i],
            sqi: sqi[i],
            property,
            property_value,
            score,
        });
    }
    Ok(rows)
}

pub fn texture_rows(df: &DataFrame) -> Result<Vec<TextureRequirement>> {
    let keys = KeyColumns::read(df)?;
    let sqi = u8_codes(df, "sqi_code")?;
    let class_id = u8_codes(df, "texture_class_id")?;

    Ok((0..df.height())
        .filter_map(|i| {
            keys.row(TEXTURE_FILE, i).map(|(crop_id, score)| TextureRequirement {
                crop_id,
                input_level: keys.input_level[i],
                sqi: sqi[i],
                texture_class_id: class_id[i],
                score,
            })
        })
        .collect())
}

pub fn phase_rows(df: &DataFrame) -> Result<Vec<PhaseRequirement>> {
    let keys = KeyColumns::read(df)?;
    let sqi = u8_codes(df, "sqi_code")?;
    let property = str_column(df, "property")?;
    let phase_id = u8_codes(df, "phase_id")?;

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let Some((crop_id, score)) = keys.row(PHASE_FILE, i) else { continue };
        match property[i].as_deref().map(str::parse::<PhaseProperty>) {
            Some(Ok(property)) => rows.push(PhaseRequirement {
                crop_id,
                input_level: keys.input_level[i],
                sqi: sqi[i],
                property,
                phase_id: phase_id[i],
                score,
            }),
            _ => warn!(row = i, property = ?property[i], "Skipping phase requirement with unknown property"),
        }
    }
    Ok(rows)
}

pub fn drainage_rows(df: &DataFrame) -> Result<Vec<DrainageRequirement>> {
    let keys = KeyColumns::read(df)?;
    let sqi = u8_codes(df, "sqi_code")?;
    let pscl_id = u8_codes(df, "pscl_id")?;
    let drain_num = u8_codes(df, "drain_num")?;

    Ok((0..df.height())
        .filter_map(|i| {
            keys.row(DRAINAGE_FILE, i).map(|(crop_id, score)| DrainageRequirement {
                crop_id,
                input_level: keys.input_level[i],
                sqi: sqi[i],
                pscl_id: pscl_id[i],
                drain_num: drain_num[i],
                score,
            })
        })
        .collect())
}

pub fn terrain_rows(df: &DataFrame) -> Result<Vec<TerrainRequirement>> {
    let keys = KeyColumns::read(df)?;
    let slope = f64_column(df, "slope_pct")?;

    Ok((0..df.height())
        .filter_map(|i| {
            let (crop_id, score) = keys.row(TERRAIN_FILE, i)?;
            let slope_pct = slope[i].filter(|v| v.is_finite())?;
            Some(TerrainRequirement { crop_id, input_level: keys.input_level[i], slope_pct, score })
        })
        .collect())
}

pub fn crop_rows(df: &DataFrame) -> Result<Vec<CropInfo>> {
    let crop_id = str_column(df, "crop_id")?;
    let crop_name = str_column(df, "crop_name")?;
    let rooting = f64_column(df, "rooting_class")?;

    Ok((0..df.height())
        .filter_map(|i| {
            let id = crop_id[i].clone().filter(|s| !s.is_empty())?;
            let rooting_class = rooting[i]
                .filter(|v| v.fract() == 0.0 && (1.0..=4.0).contains(v))
                .and_then(|v| RootingClass::from_id(v as u8))
                .unwrap_or_else(|| {
                    warn!(crop_id = %id, "Invalid rooting class, defaulting to deep rooting");
                    RootingClass::default()
                });
            Some(CropInfo {
                crop_name: crop_name[i].clone().unwrap_or_else(|| format!("Crop {}", id)),
                crop_id: id,
                rooting_class,
            })
        })
        .collect())
}
