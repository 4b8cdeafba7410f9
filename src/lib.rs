//! Soil Quality Evaluation Engine
//!
//! Scores the soil at a point for a crop and a management-input level.
//!
//! Layout:
//! - `soil_source/`, `horizon/`, `phase/`: SSURGO horizons and the profile built from them
//! - `integration/`: user plot, site and lab overlays on the SSURGO baseline
//! - `catalogue/`: crop requirement tables, filtered per input level
//! - `utils/`: constraint curves, depth weights, texture, statistics, table loading
//! - `metrics/`: the seven soil quality indices (SQ1-SQ7)
//! - `rating/`: overall rating (SR) and rating classes
//! - `scorer/`: the evaluation pipeline for one request
//!
//! The HTTP surface lives in `api_server` behind the `api` feature.

pub mod catalogue;
pub mod error;
pub mod horizon;
pub mod integration;
pub mod legacy;
pub mod metrics;
pub mod phase;
pub mod rating;
pub mod request;
pub mod scorer;
pub mod soil_source;
pub mod types;
pub mod utils;

#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use catalogue::{CatalogueHandle, CropRequirements, RequirementCatalogue, RequirementKind};
pub use error::{SqiError, SqiResult};
pub use horizon::{HorizonRecord, SoilProfile, SsurgoHorizon};
pub use integration::{integrate_user_data, LabSample, PlotHorizon, SiteData, UserData};
pub use metrics::{IndexScore, ScoringContext};
pub use rating::{compose, compose_for_level, RatingClass, ScoreVector, SoilRating};
pub use request::EvaluationRequest;
pub use scorer::{score_indices, score_profile, EvaluationResponse, SoilQualityEvaluator};
pub use soil_source::{GeoPoint, SoilDataSource, SsurgoExtract};
pub use types::{InputLevel, RootingClass, SqiCode, SqiValue};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
