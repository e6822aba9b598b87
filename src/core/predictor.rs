use crate::core::classifier::Classifier;
use crate::core::model::{LoadError, PotabilityModel};
use crate::core::validator::{InputValidator, ValidationError};
use crate::models::{FeatureVector, Verdict, FEATURE_COUNT};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::{mpsc, Arc, Mutex};
use thiserror::Error;
use threadpool::ThreadPool;

/// Errors raised when the loaded model misbehaves during a prediction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("classifier returned unexpected label {label}; expected 0 or 1")]
    UnexpectedLabel { label: i64 },

    #[error("classifier expects {expected} features, sample has {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("prediction worker stopped before returning a result")]
    WorkerLost,
}

/// Either half of the validate-then-predict pipeline failing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("invalid sample: {0}")]
    Validation(#[from] ValidationError),

    #[error("inference failed: {0}")]
    Inference(#[from] InferenceError),
}

/// Owns the shared classifier and turns validated samples into verdicts
///
/// Cloning is cheap and every clone shares the same read-only model and
/// batch worker pool.
#[derive(Clone)]
pub struct PotabilityPredictor {
    model: Arc<dyn Classifier>,
    validator: InputValidator,
    // Started on the first batch, one worker per CPU
    pool: Arc<OnceCell<Mutex<ThreadPool>>>,
}

impl std::fmt::Debug for PotabilityPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PotabilityPredictor")
            .field("n_features", &self.model.n_features())
            .finish()
    }
}

impl PotabilityPredictor {
    /// Wrap an already constructed classifier.
    ///
    /// Fails if the classifier was trained on a different number of features.
    pub fn new(model: Arc<dyn Classifier>) -> Result<Self, LoadError> {
        if model.n_features() != FEATURE_COUNT {
            return Err(LoadError::Incompatible(format!(
                "classifier expects {} features, samples have {}",
                model.n_features(),
                FEATURE_COUNT
            )));
        }
        Ok(Self {
            model,
            validator: InputValidator::new(),
            pool: Arc::new(OnceCell::new()),
        })
    }

    /// Load the model artifact and build a predictor around it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let model = PotabilityModel::load(path)?;
        Self::new(Arc::new(model))
    }

    /// Classify a validated sample
    pub fn predict(&self, features: &FeatureVector) -> Result<Verdict, InferenceError> {
        let x = features.as_array();
        let expected = self.model.n_features();
        if x.len() != expected {
            return Err(InferenceError::FeatureCountMismatch {
                expected,
                actual: x.len(),
            });
        }

        let label = self.model.classify(x);
        let verdict = Verdict::from_label(label).ok_or(InferenceError::UnexpectedLabel { label })?;

        tracing::debug!("Classifier returned label {} -> {:?}", label, verdict);
        Ok(verdict)
    }

    /// Validate raw measurements and classify them in one step
    pub fn assess<I, K>(&self, raw: I) -> Result<Verdict, PredictionError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let features = self.validator.validate(raw)?;
        Ok(self.predict(&features)?)
    }

    /// Classify many samples on the shared worker pool, preserving input order
    ///
    /// Blocks until every sample is classified. Async callers should run it
    /// on a blocking thread.
    pub fn predict_many(&self, samples: &[FeatureVector]) -> Vec<Result<Verdict, InferenceError>> {
        let pool = self.worker_pool();
        let workers = pool.max_count().min(samples.len());

        if workers <= 1 {
            return samples.iter().map(|s| self.predict(s)).collect();
        }

        let chunk_size = samples.len().div_ceil(workers);
        let (sender, receiver) = mpsc::channel();

        for (index, chunk) in samples.chunks(chunk_size).enumerate() {
            let chunk = chunk.to_vec();
            let predictor = self.clone();
            let sender = sender.clone();
            pool.execute(move || {
                let results: Vec<_> = chunk.iter().map(|s| predictor.predict(s)).collect();
                // The receiver only goes away if the caller has stopped waiting
                let _ = sender.send((index, results));
            });
        }
        drop(sender);

        let mut chunks: Vec<Option<Vec<_>>> = samples.chunks(chunk_size).map(|_| None).collect();
        for (index, results) in receiver {
            chunks[index] = Some(results);
        }

        chunks
            .into_iter()
            .zip(samples.chunks(chunk_size))
            .flat_map(|(results, chunk)| {
                results.unwrap_or_else(|| {
                    tracing::error!("Batch worker died; {} samples unclassified", chunk.len());
                    vec![Err(InferenceError::WorkerLost); chunk.len()]
                })
            })
            .collect()
    }

    fn worker_pool(&self) -> ThreadPool {
        let cell = self.pool.get_or_init(|| {
            let threads = num_cpus::get();
            tracing::debug!("Starting batch worker pool with {} threads", threads);
            Mutex::new(ThreadPool::new(threads))
        });
        // Clones share the same workers; the lock only guards the handle
        match cell.lock() {
            Ok(pool) => pool.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn validator(&self) -> &InputValidator {
        &self.validator
    }
}
