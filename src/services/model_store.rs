use crate::core::{LoadError, PotabilityPredictor};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

type Loader = Box<dyn Fn(&Path) -> Result<PotabilityPredictor, LoadError> + Send + Sync>;

/// Load-once handle for the potability model
///
/// The artifact is read at most once per store, even when several threads
/// race on the first access. A failed load is not cached, so a later call
/// retries.
pub struct ModelStore {
    path: PathBuf,
    loader: Loader,
    predictor: OnceCell<PotabilityPredictor>,
}

impl std::fmt::Debug for ModelStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelStore")
            .field("path", &self.path)
            .field("predictor", &self.predictor)
            .finish()
    }
}

impl ModelStore {
    /// Store that reads the JSON forest artifact at `path`
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self::with_loader(path, |path: &Path| PotabilityPredictor::load(path))
    }

    /// Store that builds its predictor with a custom loader
    pub fn with_loader<P, F>(path: P, loader: F) -> Self
    where
        P: Into<PathBuf>,
        F: Fn(&Path) -> Result<PotabilityPredictor, LoadError> + Send + Sync + 'static,
    {
        Self {
            path: path.into(),
            loader: Box::new(loader),
            predictor: OnceCell::new(),
        }
    }

    /// Wrap a predictor that is already loaded
    pub fn with_predictor<P: Into<PathBuf>>(path: P, predictor: PotabilityPredictor) -> Self {
        Self {
            path: path.into(),
            loader: Box::new(|path: &Path| PotabilityPredictor::load(path)),
            predictor: OnceCell::with_value(predictor),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the predictor, loading the artifact on first use
    pub fn get_or_load(&self) -> Result<&PotabilityPredictor, LoadError> {
        self.predictor.get_or_try_init(|| {
            tracing::info!("Loading potability model from {}", self.path.display());
            let predictor = (self.loader)(&self.path)?;
            tracing::info!("Potability model loaded");
            Ok(predictor)
        })
    }

    /// The predictor, if it has been loaded
    pub fn get(&self) -> Option<&PotabilityPredictor> {
        self.predictor.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.predictor.get().is_some()
    }
}
