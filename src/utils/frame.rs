//! DataFrame loading and column extraction helpers
//!
//! Requirement tables and SSURGO extracts arrive as CSV (or Parquet) files with
//! loosely typed columns: integers where floats are expected, "True"/"1"/"yes"
//! for flags. These helpers read a table with Polars and cast each column into
//! plain Rust vectors so the rest of the crate works on typed rows.

use anyhow::{anyhow, Context, Result};
use polars::prelude::*;
use std::path::Path;

/// Read a CSV or Parquet file (chosen by extension) into a DataFrame
pub fn read_table(path: &Path) -> Result<DataFrame> {
    let is_parquet = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"));

    if is_parquet {
        LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to scan parquet: {}", path.display()))?
            .collect()
            .with_context(|| format!("Failed to load parquet: {}", path.display()))
    } else {
        CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .with_context(|| format!("Failed to create CSV reader: {}", path.display()))?
            .finish()
            .with_context(|| format!("Failed to load CSV: {}", path.display()))
    }
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

/// Required numeric column, cast to f64
pub fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let casted = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' is not numeric", name))?;
    Ok(casted.f64()?.into_iter().collect())
}

/// Optional numeric column; all `None` when absent
pub fn opt_f64_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    if has_column(df, name) {
        f64_column(df, name)
    } else {
        Ok(vec![None; df.height()])
    }
}

/// Required column read as text (numbers are formatted)
pub fn str_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let casted = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .cast(&DataType::String)
        .with_context(|| format!("Column '{}' cannot be read as text", name))?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.trim().to_string()))
        .collect())
}

pub fn opt_str_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    if has_column(df, name) {
        str_column(df, name)
    } else {
        Ok(vec![None; df.height()])
    }
}

/// Flag column: booleans, 0/1 numbers, or yes/no/true/false text
pub fn flag_column(df: &DataFrame, name: &str) -> Result<Vec<bool>> {
    let column = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?;

    match column.dtype() {
        DataType::String => Ok(column
            .str()?
            .into_iter()
            .map(|v| v.is_some_and(parse_flag))
            .collect()),
        _ => {
            let casted = column
                .cast(&DataType::Float64)
                .map_err(|e| anyhow!("Column '{}' is not a flag column: {}", name, e))?;
            Ok(casted
                .f64()?
                .into_iter()
                .map(|v| v.is_some_and(|x| x != 0.0 && !x.is_nan()))
                .collect())
        }
    }
}

fn parse_flag(text: &str) -> bool {
    matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "t" | "yes" | "y"
    )
}

/// Integer code column that must be present on every row
pub fn u8_codes(df: &DataFrame, name: &str) -> Result<Vec<u8>> {
    f64_column(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, v)| match v {
            Some(x) if x.fract() == 0.0 && (0.0..=255.0).contains(&x) => Ok(x as u8),
            other => Err(anyhow!("Column '{}' row {}: invalid code {:?}", name, row, other)),
        })
        .collect()
}
