//! Features Module - Feature Layout & Scaling
//!
//! The layout is fixed per session by the loaded dataset; the scaler is fit
//! once over that dataset and shared read-only by every reading.

pub mod layout;
pub mod scaler;

// Re-export common types
pub use layout::{FeatureLayout, LayoutMismatchError};
pub use scaler::{ScaledReading, ScalerParams};
