// Core inference pipeline exports
pub mod classifier;
pub mod model;
pub mod predictor;
pub mod validator;

pub use classifier::Classifier;
pub use model::{LoadError, PotabilityModel};
pub use predictor::{InferenceError, PotabilityPredictor, PredictionError};
pub use validator::{check_value, InputValidator, ValidationError};
