use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::{PotabilityPredictor, ValidationError};
use crate::models::{
    BatchItemResult, BatchPredictRequest, BatchPredictResponse, ErrorResponse, FeatureVector,
    HealthResponse, ParametersResponse, PredictRequest, PredictResponse, ValidationErrorResponse,
    FIELD_SPECS,
};
use crate::services::ModelStore;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<ModelStore>,
    pub max_batch_size: usize,
}

/// Configure all prediction-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/parameters", web::get().to(parameters))
        .route("/predict", web::post().to(predict))
        .route("/predict/batch", web::post().to(predict_batch));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let model_loaded = state.model.is_loaded();
    let status = if model_loaded { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_loaded,
        timestamp: chrono::Utc::now(),
    })
}

/// Measurement table for rendering an input form
///
/// GET /api/v1/parameters
async fn parameters() -> impl Responder {
    HttpResponse::Ok().json(ParametersResponse {
        parameters: &FIELD_SPECS,
    })
}

fn model_unavailable(e: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::ServiceUnavailable().json(ErrorResponse {
        error: "Model unavailable".to_string(),
        message: e.to_string(),
        status_code: 503,
    })
}

/// Run one submission through validation, collecting every field error
fn validate_sample(
    predictor: &PotabilityPredictor,
    req: &PredictRequest,
) -> Result<FeatureVector, Vec<ValidationError>> {
    let values = req.numeric_measurements()?;
    predictor.validator().validate_all(values)
}

/// Predict potability for one sample
///
/// POST /api/v1/predict
///
/// Request body:
/// ```json
/// {
///   "ph": 7.5,
///   "hardness": 120.0,
///   "solids": 250.0,
///   "chloramines": 2.0,
///   "sulfate": 180.0,
///   "conductivity": 400.0,
///   "organic_carbon": 5.0,
///   "trihalomethanes": 40.0,
///   "turbidity": 2.0
/// }
/// ```
async fn predict(
    state: web::Data<AppState>,
    req: web::Json<PredictRequest>,
) -> impl Responder {
    let predictor = match state.model.get_or_load() {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("Prediction requested but model is unavailable: {}", e);
            return model_unavailable(e);
        }
    };

    let features = match validate_sample(predictor, &req) {
        Ok(features) => features,
        Err(errors) => {
            tracing::warn!("Rejected sample with {} invalid field(s): {:?}", errors.len(), errors);
            return HttpResponse::UnprocessableEntity().json(ValidationErrorResponse::new(errors));
        }
    };

    match predictor.predict(&features) {
        Ok(verdict) => {
            let response = PredictResponse::new(verdict, &features);
            tracing::info!("Prediction {}: {}", response.prediction_id, verdict.label());
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            tracing::error!("Inference failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Inference failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Predict potability for several samples
///
/// POST /api/v1/predict/batch
///
/// Request body:
/// ```json
/// { "samples": [ { "ph": 7.5, ... }, { "ph": 6.9, ... } ] }
/// ```
async fn predict_batch(
    state: web::Data<AppState>,
    req: web::Json<BatchPredictRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    if req.samples.len() > state.max_batch_size {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Batch too large".to_string(),
            message: format!(
                "batch has {} samples, maximum is {}",
                req.samples.len(),
                state.max_batch_size
            ),
            status_code: 400,
        });
    }

    let predictor = match state.model.get_or_load() {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("Batch prediction requested but model is unavailable: {}", e);
            return model_unavailable(e);
        }
    };

    let mut results: Vec<Option<BatchItemResult>> = Vec::with_capacity(req.samples.len());
    let mut valid = Vec::new();
    let mut valid_positions = Vec::new();

    for (i, sample) in req.samples.iter().enumerate() {
        match validate_sample(predictor, sample) {
            Ok(features) => {
                valid.push(features);
                valid_positions.push(i);
                results.push(None);
            }
            Err(errors) => results.push(Some(BatchItemResult::Invalid { errors })),
        }
    }

    let worker = predictor.clone();
    let outcomes = match web::block(move || worker.predict_many(&valid)).await {
        Ok(outcomes) => outcomes,
        Err(e) => {
            tracing::error!("Batch classification did not complete: {}", e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Inference failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    for (pos, outcome) in valid_positions.into_iter().zip(outcomes) {
        results[pos] = Some(match outcome {
            Ok(verdict) => verdict.into(),
            Err(e) => {
                tracing::error!("Inference failed for batch sample {}: {}", pos, e);
                e.into()
            }
        });
    }

    let response = BatchPredictResponse::new(results.into_iter().flatten().collect());

    tracing::info!(
        "Batch of {} samples: {} safe, {} unsafe, {} rejected",
        response.total,
        response.safe,
        response.unsafe_count,
        response.rejected
    );

    HttpResponse::Ok().json(response)
}
