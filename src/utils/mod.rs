//! Utility modules for soil quality scoring
//!
//! Contains shared functionality used across multiple SQI scorers:
//! - Constraint curve: property value to 0-100 score interpolation
//! - Depth weights: normalised rooting-depth weights per horizon
//! - Texture: USDA texture triangle and particle-size classes
//! - Stats: min-mean and weighted-mean combination rules
//! - Frame: Polars table loading with typed column extraction

pub mod constraint_curve;
pub mod depth_weights;
pub mod frame;
pub mod stats;
pub mod texture;

// Re-export commonly used types
pub use constraint_curve::{ConstraintCurve, Interpolation};
pub use depth_weights::{cumulative_root_share, depth_weights};
pub use stats::{min_mean, nan_min, safe_float, weighted_mean};
pub use texture::{classify_pscl, classify_texture, TextureClass, TextureComponents};
