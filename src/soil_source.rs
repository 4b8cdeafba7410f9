//! SSURGO horizon source
//!
//! `SoilDataSource` is the seam to the soil survey: given a point it returns
//! the horizon rows of the dominant component of the map unit under it.
//! `SsurgoExtract` implements it over a local extract:
//!
//! - `mapunits.csv`: `mukey, min_lat, max_lat, min_lon, max_lon`
//! - `horizons.csv`: one row per horizon with `mukey, cokey, compname,
//!   comppct_r, top_depth_cm, bottom_depth_cm` and the soil properties;
//!   boolean columns named `phase_*` carry the component's phases

use crate::error::{SqiError, SqiResult};
use crate::horizon::SsurgoHorizon;
use crate::utils::frame::{column_names, f64_column, flag_column, has_column, opt_f64_column, opt_str_column, read_table, str_column};
use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn validate(&self) -> SqiResult<()> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(SqiError::Validation(format!("latitude {} outside [-90, 90]", self.lat)));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(SqiError::Validation(format!("longitude {} outside [-180, 180]", self.lon)));
        }
        Ok(())
    }

    /// Point rounded to ~10 m, for caching horizon lookups
    pub fn cache_key(&self) -> (i64, i64) {
        ((self.lat * 1e4).round() as i64, (self.lon * 1e4).round() as i64)
    }
}

pub trait SoilDataSource: Send + Sync {
    /// Horizons of the dominant component at `point`; empty when the survey has
    /// no data there
    fn horizons_at(&self, point: GeoPoint) -> SqiResult<Vec<SsurgoHorizon>>;
}

/// Bounding box of one map unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapUnitExtent {
    pub mukey: String,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl MapUnitExtent {
    fn contains(&self, point: GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat) && (self.min_lon..=self.max_lon).contains(&point.lon)
    }

    fn area(&self) -> f64 {
        (self.max_lat - self.min_lat) * (self.max_lon - self.min_lon)
    }
}

/// File-backed SSURGO extract held in memory
#[derive(Debug, Clone, Default)]
pub struct SsurgoExtract {
    mapunits: Vec<MapUnitExtent>,
    horizons: FxHashMap<String, Vec<SsurgoHorizon>>,
}

impl SsurgoExtract {
    pub fn from_parts(mapunits: Vec<MapUnitExtent>, horizons: Vec<SsurgoHorizon>) -> Self {
        let mut by_mukey: FxHashMap<String, Vec<SsurgoHorizon>> = FxHashMap::default();
        for row in horizons {
            by_mukey.entry(row.mukey.clone()).or_default().push(row);
        }
        Self { mapunits, horizons: by_mukey }
    }

    pub fn load_dir(dir: &Path) -> SqiResult<Self> {
        let extract = Self::try_load(dir).map_err(|e| SqiError::SoilData(format!("{:#}", e)))?;
        info!(
            dir = %dir.display(),
            mapunits = extract.mapunits.len(),
            horizons = extract.horizon_count(),
            "Loaded SSURGO extract"
        );
        Ok(extract)
    }

    fn try_load(dir: &Path) -> Result<Self> {
        let mapunits = read_table(&dir.join("mapunits.csv")).context("Failed to read map unit index")?;
        let horizons = read_table(&dir.join("horizons.csv")).context("Failed to read horizon table")?;
        Ok(Self::from_parts(mapunit_rows(&mapunits)?, horizon_rows(&horizons)?))
    }

    pub fn horizon_count(&self) -> usize {
        self.horizons.values().map(Vec::len).sum()
    }

    /// Smallest map unit whose extent contains the point
    fn mapunit_at(&self, point: GeoPoint) -> Option<&MapUnitExtent> {
        self.mapunits
            .iter()
            .filter(|m| m.contains(point))
            .min_by(|a, b| a.area().total_cmp(&b.area()))
    }
}

impl SoilDataSource for SsurgoExtract {
    fn horizons_at(&self, point: GeoPoint) -> SqiResult<Vec<SsurgoHorizon>> {
        let Some(mapunit) = self.mapunit_at(point) else {
            debug!(lat = point.lat, lon = point.lon, "No map unit at point");
            return Ok(Vec::new());
        };
        let Some(rows) = self.horizons.get(&mapunit.mukey) else {
            return Ok(Vec::new());
        };

        // Dominant component: largest comppct_r, ties to the smaller cokey
        let mut share: FxHashMap<&str, f64> = FxHashMap::default();
        for row in rows {
            let pct = row.comppct_r.unwrap_or(0.0);
            let entry = share.entry(row.cokey.as_str()).or_insert(pct);
            *entry = entry.max(pct);
        }
        let dominant = share
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(cokey, _)| cokey.to_string());

        let mut component: Vec<SsurgoHorizon> = rows
            .iter()
            .filter(|row| Some(&row.cokey) == dominant.as_ref())
            .cloned()
            .collect();
        component.sort_by(|a, b| a.top_depth_cm.total_cmp(&b.top_depth_cm));
        debug!(mukey = %mapunit.mukey, cokey = ?dominant, horizons = component.len(), "Resolved dominant component");
        Ok(component)
    }
}

fn mapunit_rows(df: &DataFrame) -> Result<Vec<MapUnitExtent>> {
    let mukey = str_column(df, "mukey")?;
    let min_lat = f64_column(df, "min_lat")?;
    let max_lat = f64_column(df, "max_lat")?;
    let min_lon = f64_column(df, "min_lon")?;
    let max_lon = f64_column(df, "max_lon")?;

    Ok((0..df.height())
        .filter_map(|i| {
            Some(MapUnitExtent {
                mukey: mukey[i].clone()?,
                min_lat: min_lat[i]?,
                max_lat: max_lat[i]?,
                min_lon: min_lon[i]?,
                max_lon: max_lon[i]?,
            })
        })
        .collect())
}

fn horizon_rows(df: &DataFrame) -> Result<Vec<SsurgoHorizon>> {
    let text = |name: &str| opt_str_column(df, name);
    let num = |name: &str| opt_f64_column(df, name);

    let mukey = str_column(df, "mukey")?;
    let cokey = str_column(df, "cokey")?;
    let compname = text("compname")?;
    let comppct_r = num("comppct_r")?;
    let top = f64_column(df, "top_depth_cm")?;
    let bottom = f64_column(df, "bottom_depth_cm")?;
    let sand = num("sand")?;
    let silt = num("silt")?;
    let clay = num("clay")?;
    let om = num("om")?;
    let ph = num("ph")?;
    let cecs = num("cecs")?;
    let teb = num("teb")?;
    let bs = num("bs")?;
    let ec = num("ec")?;
    let esp = num("esp")?;
    let caco3 = num("caco3")?;
    let gypsum = num("gypsum")?;
    let db_measured = num("db_measured")?;
    let fragvol = num("fragvol")?;
    let drainagecl = text("drainagecl")?;
    let restrictive_depth = num("restrictive_depth_cm")?;
    let restriction_kind = text("restriction_kind")?;
    let flooding = text("flooding")?;
    let temperature_class = text("temperature_class")?;
    let taxonomy = text("taxonomy")?;
    let cracks = if has_column(df, "cracks") {
        flag_column(df, "cracks")?
    } else {
        vec![false; df.height()]
    };
    let slope = num("slope_pct")?;
    let elevation = num("elevation_m")?;

    let phase_columns: Vec<(String, Vec<bool>)> = column_names(df)
        .into_iter()
        .filter(|name| name.starts_with("phase_"))
        .map(|name| flag_column(df, &name).map(|flags| (name, flags)))
        .collect::<Result<_>>()?;

    let present = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());

    Ok((0..df.height())
        .filter_map(|i| {
            let (mukey, cokey) = (present(&mukey[i])?, present(&cokey[i])?);
            Some(SsurgoHorizon {
                mukey,
                cokey,
                compname: compname[i].clone().unwrap_or_default(),
                comppct_r: comppct_r[i],
                top_depth_cm: top[i].unwrap_or(f64::NAN),
                bottom_depth_cm: bottom[i].unwrap_or(f64::NAN),
                sand: sand[i],
                silt: silt[i],
                clay: clay[i],
                om: om[i],
                ph: ph[i],
                cecs: cecs[i],
                teb: teb[i],
                bs: bs[i],
                ec: ec[i],
                esp: esp[i],
                caco3: caco3[i],
                gypsum: gypsum[i],
                db_measured: db_measured[i],
                fragvol: fragvol[i],
                drainagecl: present(&drainagecl[i]),
                restrictive_depth_cm: restrictive_depth[i],
                restriction_kind: present(&restriction_kind[i]),
                flooding: present(&flooding[i]),
                temperature_class: present(&temperature_class[i]),
                taxonomy: present(&taxonomy[i]),
                cracks: cracks[i],
                slope_pct: slope[i],
                elevation_m: elevation[i],
                phase_flags: phase_columns
                    .iter()
                    .filter(|(_, flags)| flags[i])
                    .map(|(name, _)| name.clone())
                    .collect(),
            })
        })
        .collect())
}
