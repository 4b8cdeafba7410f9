//! Error types for soil quality evaluation
//!
//! Every failure that can leave the core maps to a stable error code and an
//! HTTP status so the API layer can build its error envelope without matching
//! on message text.

use thiserror::Error;

pub const CALCULATION_ERROR: &str = "CALCULATION_ERROR";
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const SSURGO_DATA_ERROR: &str = "SSURGO_DATA_ERROR";
pub const SERVICE_ERROR: &str = "SERVICE_ERROR";
pub const TIMEOUT_ERROR: &str = "TIMEOUT_ERROR";

#[derive(Debug, Error)]
pub enum SqiError {
    /// Breakpoint table cannot define a constraint curve
    #[error("Invalid constraint curve: {0}")]
    InvalidCurve(String),

    #[error("Invalid input level '{0}' (expected L, I or H)")]
    InvalidInputLevel(String),

    #[error("No SSURGO soil data at ({lat:.5}, {lon:.5})")]
    NoSoilData { lat: f64, lon: f64 },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Crop requirement catalogue error: {0}")]
    Catalogue(String),

    #[error("SSURGO data source error: {0}")]
    SoilData(String),

    /// User-data overlay rejected; the baseline profile is kept
    #[error("User data integration failed: {0}")]
    Integration(String),

    #[error("External call exceeded {seconds:.1}s deadline ({operation})")]
    Timeout { operation: &'static str, seconds: f64 },
}

impl SqiError {
    pub fn error_code(&self) -> &'static str {
        match self {
            SqiError::InvalidCurve(_) | SqiError::Integration(_) => CALCULATION_ERROR,
            SqiError::InvalidInputLevel(_) | SqiError::Validation(_) => VALIDATION_ERROR,
            SqiError::NoSoilData { .. } | SqiError::SoilData(_) => SSURGO_DATA_ERROR,
            SqiError::Catalogue(_) => SERVICE_ERROR,
            SqiError::Timeout { .. } => TIMEOUT_ERROR,
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            SqiError::InvalidInputLevel(_) | SqiError::Validation(_) => 400,
            SqiError::NoSoilData { .. } => 404,
            SqiError::Timeout { .. } => 504,
            SqiError::InvalidCurve(_)
            | SqiError::Catalogue(_)
            | SqiError::SoilData(_)
            | SqiError::Integration(_) => 500,
        }
    }
}

pub type SqiResult<T> = std::result::Result<T, SqiError>;
