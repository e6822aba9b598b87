use crate::core::{InferenceError, ValidationError};
use crate::models::domain::{FeatureVector, FieldSpec, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Response for the predict endpoint
#[derive(Debug, Clone, Serialize)]
pub struct PredictResponse {
    pub prediction_id: String,
    pub verdict: Verdict,
    pub label: &'static str,
    /// Measurements as they were fed to the classifier
    pub features: BTreeMap<&'static str, f64>,
}

impl PredictResponse {
    pub fn new(verdict: Verdict, features: &FeatureVector) -> Self {
        Self {
            prediction_id: uuid::Uuid::new_v4().to_string(),
            verdict,
            label: verdict.label(),
            features: features.iter().map(|(f, v)| (f.key(), v)).collect(),
        }
    }
}

/// Outcome for one sample of a batch
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchItemResult {
    #[serde(rename = "ok")]
    Classified {
        verdict: Verdict,
        label: &'static str,
    },
    Invalid {
        errors: Vec<ValidationError>,
    },
    Failed {
        message: String,
    },
}

impl From<Verdict> for BatchItemResult {
    fn from(verdict: Verdict) -> Self {
        BatchItemResult::Classified {
            verdict,
            label: verdict.label(),
        }
    }
}

impl From<InferenceError> for BatchItemResult {
    fn from(err: InferenceError) -> Self {
        BatchItemResult::Failed {
            message: err.to_string(),
        }
    }
}

/// Response for the batch predict endpoint
#[derive(Debug, Clone, Serialize)]
pub struct BatchPredictResponse {
    pub results: Vec<BatchItemResult>,
    pub total: usize,
    pub safe: usize,
    pub unsafe_count: usize,
    pub rejected: usize,
}

impl BatchPredictResponse {
    pub fn new(results: Vec<BatchItemResult>) -> Self {
        let (mut safe, mut unsafe_count) = (0, 0);
        for r in &results {
            if let BatchItemResult::Classified { verdict, .. } = r {
                if verdict.is_safe() {
                    safe += 1;
                } else {
                    unsafe_count += 1;
                }
            }
        }
        Self {
            total: results.len(),
            rejected: results.len() - safe - unsafe_count,
            safe,
            unsafe_count,
            results,
        }
    }
}

/// Field table for building an input form
#[derive(Debug, Clone, Serialize)]
pub struct ParametersResponse {
    pub parameters: &'static [FieldSpec],
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model_loaded: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Rejected submission, listing every failing field
#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
    pub errors: Vec<ValidationError>,
}

impl ValidationErrorResponse {
    pub fn new(errors: Vec<ValidationError>) -> Self {
        let message = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            error: "Validation failed".to_string(),
            message,
            status_code: 422,
            errors,
        }
    }
}
