/// A trained binary decision function over an ordered feature slice
///
/// Implementations must be immutable once constructed; the predictor shares a
/// single instance across all concurrent requests without locking.
pub trait Classifier: Send + Sync {
    /// Number of features the classifier was trained on
    fn n_features(&self) -> usize;

    /// Class label for one sample. `features.len()` equals `n_features()`.
    fn classify(&self, features: &[f64]) -> i64;
}

