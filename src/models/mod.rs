// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{AllowedRange, FeatureVector, Field, FieldSpec, Verdict, FEATURE_COUNT, FIELD_SPECS};
pub use requests::{BatchPredictRequest, PredictRequest};
pub use responses::{
    BatchItemResult, BatchPredictResponse, ErrorResponse, HealthResponse, ParametersResponse,
    PredictResponse, ValidationErrorResponse,
};
