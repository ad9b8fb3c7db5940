//! Trained classifier behind an explicit present/absent handle.
//!
//! - [`ModelManifest`] - bundle descriptor (feature order, reference constants, classifier kind)
//! - [`OnnxClassifier`] / [`LogisticClassifier`] - [`Classifier`] implementations
//! - [`ModelHandle`] - `Loaded` or `Unavailable`; never a hidden global flag
//! - [`ModelSlot`] - swaps whole handles on reload so in-flight requests keep a consistent snapshot

mod linear;
mod manifest;
mod onnx;

pub use linear::LogisticClassifier;
pub use manifest::{ClassifierSpec, ModelManifest};
pub use onnx::OnnxClassifier;

use crate::error::ModelError;
use crate::features::{FeatureBuilder, FeatureVector, MedicalIndexSet};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{error, info, warn};

/// Binary probability model. Must tolerate concurrent read-only calls.
pub trait Classifier: Send + Sync {
    /// Probability of the positive ("has disease") class.
    fn predict_probability(&self, features: &FeatureVector) -> Result<f64, ModelError>;

    /// Input width the classifier was built for, when it declares one.
    fn expected_features(&self) -> Option<usize> {
        None
    }
}

pub struct LoadedModel {
    name: String,
    version: String,
    feature_columns: Vec<String>,
    builder: FeatureBuilder,
    classifier: Box<dyn Classifier>,
    digest: String,
}

impl LoadedModel {
    /// Pair a validated manifest with an already constructed classifier.
    pub fn new(manifest: ModelManifest, classifier: Box<dyn Classifier>) -> Result<Self, ModelError> {
        manifest.validate()?;
        if let Some(expected) = classifier.expected_features() {
            if expected != manifest.feature_columns.len() {
                return Err(ModelError::DimensionMismatch {
                    expected,
                    actual: manifest.feature_columns.len(),
                });
            }
        }
        let serialized = serde_json::to_vec(&manifest)
            .map_err(|e| ModelError::InvalidManifest(e.to_string()))?;
        Ok(Self {
            digest: sha256_hex(&[&serialized]),
            name: manifest.name,
            version: manifest.version,
            feature_columns: manifest.feature_columns,
            builder: FeatureBuilder::new(manifest.reference),
            classifier,
        })
    }

    /// Load a bundle from its manifest file.
    pub fn load(manifest_path: &Path) -> Result<Self, ModelError> {
        let (manifest, manifest_bytes) = ModelManifest::read(manifest_path)?;
        manifest.validate()?;

        let (classifier, artifact_bytes): (Box<dyn Classifier>, Vec<u8>) = match &manifest.classifier {
            ClassifierSpec::Onnx {
                path,
                input_name,
                probability_output,
                positive_class_index,
            } => {
                let model_path = manifest::resolve_artifact(manifest_path, path);
                let bytes = std::fs::read(&model_path).map_err(|source| ModelError::Read {
                    path: model_path.clone(),
                    source,
                })?;
                let classifier = OnnxClassifier::load(
                    &model_path,
                    input_name.as_deref(),
                    probability_output,
                    *positive_class_index,
                )?;
                (Box::new(classifier) as Box<dyn Classifier>, bytes)
            }
            ClassifierSpec::Logistic {
                intercept,
                coefficients,
            } => (
                Box::new(LogisticClassifier::new(*intercept, coefficients.clone())) as Box<dyn Classifier>,
                Vec::new(),
            ),
        };

        let mut model = Self::new(manifest, classifier)?;
        model.digest = sha256_hex(&[&manifest_bytes, &artifact_bytes]);
        Ok(model)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// SHA-256 over the artifact bytes, hex encoded.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Build the feature vector in declared column order and score it.
    pub fn predict(&self, indexes: &MedicalIndexSet) -> Result<(FeatureVector, f64), ModelError> {
        let features = self.builder.build(indexes, &self.feature_columns)?;
        let p = self.classifier.predict_probability(&features)?;
        if !(0.0..=1.0).contains(&p) {
            return Err(ModelError::InvalidProbability(p));
        }
        Ok((features, p))
    }
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("feature_columns", &self.feature_columns)
            .field("digest", &self.digest)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum ModelHandle {
    Loaded(LoadedModel),
    Unavailable { reason: String },
}

impl ModelHandle {
    /// Load from a manifest path. Failure yields `Unavailable`; it never aborts the caller.
    pub fn load(manifest_path: &Path) -> Self {
        match LoadedModel::load(manifest_path) {
            Ok(model) => {
                info!(
                    path = %manifest_path.display(),
                    model = model.name(),
                    version = model.version(),
                    features = model.feature_columns().len(),
                    digest = model.digest(),
                    "model loaded"
                );
                Self::Loaded(model)
            }
            Err(e) => {
                error!(path = %manifest_path.display(), error = %e, "model load failed; predictions disabled");
                Self::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// The loaded model, or `ModelError::Unavailable`.
    pub fn model(&self) -> Result<&LoadedModel, ModelError> {
        match self {
            Self::Loaded(m) => Ok(m),
            Self::Unavailable { reason } => Err(ModelError::Unavailable(reason.clone())),
        }
    }
}

impl From<LoadedModel> for ModelHandle {
    fn from(model: LoadedModel) -> Self {
        Self::Loaded(model)
    }
}

/// Process-wide holder of the current handle.
pub struct ModelSlot {
    path: PathBuf,
    current: RwLock<Arc<ModelHandle>>,
}

impl ModelSlot {
    /// Load once from `path`; an unavailable model still yields a usable slot.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let handle = ModelHandle::load(&path);
        Self::with_handle(path, handle)
    }

    pub fn with_handle(path: impl Into<PathBuf>, handle: ModelHandle) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(Arc::new(handle)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Files whose change should trigger a reload: the manifest, plus the ONNX file it names.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.path.clone()];
        if let Ok((manifest, _)) = ModelManifest::read(&self.path) {
            paths.extend(manifest.artifact_path(&self.path));
        }
        paths
    }

    /// Current handle. Holders keep using it even if a reload swaps in a newer one.
    pub fn snapshot(&self) -> Arc<ModelHandle> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in a new handle, returning the previous one.
    pub fn replace(&self, handle: ModelHandle) -> Arc<ModelHandle> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(handle))
    }

    /// Reload from disk. A failed reload keeps a previously loaded model in service.
    pub fn reload(&self) -> Result<Arc<ModelHandle>, ModelError> {
        let loaded = LoadedModel::load(&self.path);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        match loaded {
            Ok(model) => {
                info!(
                    path = %self.path.display(),
                    version = model.version(),
                    digest = model.digest(),
                    "model reloaded"
                );
                let handle = Arc::new(ModelHandle::Loaded(model));
                *guard = Arc::clone(&handle);
                Ok(handle)
            }
            Err(e) => {
                if guard.is_loaded() {
                    warn!(path = %self.path.display(), error = %e, "model reload failed; keeping current model");
                } else {
                    error!(path = %self.path.display(), error = %e, "model reload failed");
                    *guard = Arc::new(ModelHandle::unavailable(e.to_string()));
                }
                Err(e)
            }
        }
    }
}

fn sha256_hex(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{compute_indexes, Standardization, StandardizationReference};

    struct Fixed(f64);

    impl Classifier for Fixed {
        fn predict_probability(&self, _: &FeatureVector) -> Result<f64, ModelError> {
            Ok(self.0)
        }
    }

    fn manifest(columns: &[&str]) -> ModelManifest {
        ModelManifest {
            name: "test".to_string(),
            version: "1".to_string(),
            feature_columns: columns.iter().map(|s| s.to_string()).collect(),
            reference: StandardizationReference {
                spise: Standardization { mean: 6.5, std: 1.2 },
                mets_ir: Standardization { mean: 35.0, std: 5.0 },
                spise_weight: 0.6,
                mets_ir_weight: 0.4,
            },
            classifier: ClassifierSpec::Logistic {
                intercept: 0.0,
                coefficients: vec![0.0; columns.len()],
            },
        }
    }

    #[test]
    fn probability_outside_unit_interval_is_rejected() {
        let m = LoadedModel::new(manifest(&["SPISE"]), Box::new(Fixed(1.5))).unwrap();
        let idx = compute_indexes(150.0, 100.0, 50.0, 25.0).unwrap();
        assert!(matches!(m.predict(&idx), Err(ModelError::InvalidProbability(_))));

        let m = LoadedModel::new(manifest(&["SPISE"]), Box::new(Fixed(f64::NAN))).unwrap();
        assert!(matches!(m.predict(&idx), Err(ModelError::InvalidProbability(_))));
    }

    #[test]
    fn classifier_width_must_match_columns() {
        let err = LoadedModel::new(
            manifest(&["SPISE", "TyG"]),
            Box::new(LogisticClassifier::new(0.0, vec![1.0])),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::DimensionMismatch { expected: 1, actual: 2 }));
    }

    #[test]
    fn unavailable_handle_reports_reason() {
        let h = ModelHandle::unavailable("file missing");
        assert!(!h.is_loaded());
        let err = h.model().unwrap_err();
        assert_eq!(err.to_string(), "Model not loaded: file missing");
    }

    #[test]
    fn missing_manifest_loads_as_unavailable() {
        let h = ModelHandle::load(Path::new("does/not/exist.json"));
        assert!(matches!(h, ModelHandle::Unavailable { .. }));
    }

    #[test]
    fn replace_keeps_old_snapshot_alive() {
        let slot = ModelSlot::with_handle("unused.json", ModelHandle::unavailable("boot"));
        let before = slot.snapshot();
        let model = LoadedModel::new(manifest(&["SPISE"]), Box::new(Fixed(0.2))).unwrap();
        slot.replace(model.into());

        assert!(!before.is_loaded());
        assert!(slot.snapshot().is_loaded());
    }

    #[test]
    fn reload_returns_the_installed_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let slot = ModelSlot::with_handle(&path, ModelHandle::unavailable("boot"));

        assert!(slot.reload().is_err());
        match &*slot.snapshot() {
            ModelHandle::Unavailable { reason } => assert!(reason.contains("manifest.json")),
            ModelHandle::Loaded(_) => panic!("expected unavailable"),
        }

        std::fs::write(&path, serde_json::to_vec(&manifest(&["SPISE"])).unwrap()).unwrap();
        let installed = slot.reload().unwrap();
        assert!(Arc::ptr_eq(&installed, &slot.snapshot()));
        assert!(installed.is_loaded());
    }

    #[test]
    fn digest_is_hex_sha256() {
        let m = LoadedModel::new(manifest(&["SPISE"]), Box::new(Fixed(0.2))).unwrap();
        assert_eq!(m.digest().len(), 64);
        assert!(m.digest().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
