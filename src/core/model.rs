use crate::core::classifier::Classifier;
use crate::models::{Field, FEATURE_COUNT};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Marker for a leaf in the child index arrays
const LEAF: i64 = -1;

/// Errors that can occur while acquiring the model artifact
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("model artifact not found: {0}")]
    NotFound(String),

    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("model artifact is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("model artifact is incompatible: {0}")]
    Incompatible(String),
}

/// Serialized tree in array-of-nodes layout
#[derive(Debug, Clone, Deserialize)]
struct TreeArtifact {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    value: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ForestArtifact {
    n_features: usize,
    /// Training column names, checked against the canonical order when present
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    classes: Vec<i64>,
    trees: Vec<TreeArtifact>,
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Class probabilities, normalised at load time
        proba: Vec<f64>,
    },
}

#[derive(Debug, Clone)]
struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    fn leaf_proba(&self, x: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
                Node::Leaf { proba } => return proba,
            }
        }
    }
}

/// The trained tree-ensemble potability classifier
///
/// Immutable after [`PotabilityModel::load`]; prediction only reads it, so a
/// single instance can be shared across threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct PotabilityModel {
    n_features: usize,
    classes: Vec<i64>,
    trees: Vec<DecisionTree>,
}

impl PotabilityModel {
    /// Load the model artifact from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound(shown.clone()),
            _ => LoadError::Io {
                path: shown.clone(),
                source: e,
            },
        })?;

        let model = Self::from_reader(BufReader::new(file))?;
        tracing::debug!(
            "Loaded model from {} ({} trees, classes {:?})",
            shown,
            model.trees.len(),
            model.classes
        );
        Ok(model)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        let artifact: ForestArtifact = serde_json::from_reader(reader)?;
        Self::from_artifact(artifact)
    }

    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let artifact: ForestArtifact = serde_json::from_str(json)?;
        Self::from_artifact(artifact)
    }

    fn from_artifact(artifact: ForestArtifact) -> Result<Self, LoadError> {
        if artifact.n_features != FEATURE_COUNT {
            return Err(LoadError::Incompatible(format!(
                "expected {} features, artifact declares {}",
                FEATURE_COUNT, artifact.n_features
            )));
        }
        if let Some(names) = &artifact.feature_names {
            let canonical = Field::ALL.iter().map(|f| f.key());
            if names.len() != FEATURE_COUNT || !names.iter().map(String::as_str).eq(canonical) {
                return Err(LoadError::Incompatible(format!(
                    "artifact feature order {:?} does not match the expected column order",
                    names
                )));
            }
        }
        if artifact.classes.is_empty() {
            return Err(LoadError::Incompatible("artifact declares no classes".to_string()));
        }
        if artifact.trees.is_empty() {
            return Err(LoadError::Incompatible("artifact contains no trees".to_string()));
        }

        let n_classes = artifact.classes.len();
        let trees = artifact
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, tree)| {
                build_tree(tree, artifact.n_features, n_classes)
                    .map_err(|msg| LoadError::Incompatible(format!("tree {}: {}", i, msg)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            n_features: artifact.n_features,
            classes: artifact.classes,
            trees,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    /// Class probabilities averaged over all trees, indexed like `classes()`
    pub fn predict_proba(&self, x: &[f64]) -> Vec<f64> {
        let mut acc = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (a, p) in acc.iter_mut().zip(tree.leaf_proba(x)) {
                *a += p;
            }
        }
        let n = self.trees.len() as f64;
        acc.iter_mut().for_each(|a| *a /= n);
        acc
    }
}

impl Classifier for PotabilityModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn classify(&self, features: &[f64]) -> i64 {
        let proba = self.predict_proba(features);
        // First maximum wins so ties resolve to the lowest class index
        let best = proba
            .iter()
            .enumerate()
            .fold(0, |best, (i, p)| if *p > proba[best] { i } else { best });
        self.classes[best]
    }
}

fn build_tree(
    tree: TreeArtifact,
    n_features: usize,
    n_classes: usize,
) -> Result<DecisionTree, String> {
    let n = tree.children_left.len();
    if n == 0 {
        return Err("tree has no nodes".to_string());
    }
    if tree.children_right.len() != n
        || tree.feature.len() != n
        || tree.threshold.len() != n
        || tree.value.len() != n
    {
        return Err("node arrays have mismatched lengths".to_string());
    }

    let mut nodes = Vec::with_capacity(n);
    for i in 0..n {
        let (left, right) = (tree.children_left[i], tree.children_right[i]);

        if left == LEAF && right == LEAF {
            let weights = &tree.value[i];
            if weights.len() != n_classes {
                return Err(format!(
                    "leaf {} has {} class weights, expected {}",
                    i,
                    weights.len(),
                    n_classes
                ));
            }
            if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(format!("leaf {} has invalid class weights", i));
            }
            let total: f64 = weights.iter().sum();
            if total <= 0.0 {
                return Err(format!("leaf {} has no class weight", i));
            }
            nodes.push(Node::Leaf {
                proba: weights.iter().map(|w| w / total).collect(),
            });
            continue;
        }

        // Children must come after their parent, which rules out cycles
        let child = |c: i64| -> Result<usize, String> {
            if c <= i as i64 || c >= n as i64 {
                return Err(format!("node {} has invalid child index {}", i, c));
            }
            Ok(c as usize)
        };
        let left = child(left)?;
        let right = child(right)?;

        let feature = tree.feature[i];
        if feature < 0 || feature as usize >= n_features {
            return Err(format!("node {} splits on invalid feature {}", i, feature));
        }
        let threshold = tree.threshold[i];
        if !threshold.is_finite() {
            return Err(format!("node {} has a non-finite threshold", i));
        }

        nodes.push(Node::Split {
            feature: feature as usize,
            threshold,
            left,
            right,
        });
    }

    Ok(DecisionTree { nodes })
}
