//! Potability - water potability prediction service
//!
//! This library provides the inference pipeline behind the potability
//! service: raw measurements are validated into a fixed-order feature vector,
//! classified by a pre-trained tree ensemble and mapped to a verdict.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{InferenceError, InputValidator, LoadError, PotabilityModel, PotabilityPredictor, ValidationError};
pub use models::{FeatureVector, Field, Verdict};
