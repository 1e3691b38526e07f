// ============================================================
// Layer 6 — Artifact Store
// ============================================================
// Saves and restores the fitted preprocessor and the fitted
// model. Both are written with bincode inside an envelope:
//
//   Envelope {
//       format_version,   ← bumped when the layout changes
//       kind,             ← Preprocessor | Model
//       schema,           ← FeatureSchema the payload was fit on
//       run_id,           ← training run that wrote the file
//       payload,          ← FittedPreprocessor | Model
//   }
//
// Loading reads the header first (bincode decodes fields in
// order and ignores trailing bytes), checks version, kind and
// schema, and only then decodes the payload. A stale or
// swapped file is therefore reported as what it is rather
// than as a generic decode failure.
//
// Every store instance carries one run id and stamps it into
// everything it saves. `load_pair` refuses a preprocessor and
// a model whose run ids differ, so a run that died between
// the two writes cannot leave a silently mismatched pair.
// Each file is written to a `.tmp` sibling and renamed into
// place, so a reader never sees a half-written envelope.
//
// File layout:
//   models/
//     preprocessor.bin    ← fitted FeatureBuilder statistics
//     model.bin           ← winning regressor
//     train_config.json   ← the TrainConfig of the run
//     metrics.csv         ← see metrics.rs

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Local;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::data::preprocessor::FittedPreprocessor;
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::schema::FeatureSchema;
use crate::ml::model::Model;

pub const ARTIFACT_FORMAT_VERSION: u32 = 2;

pub const PREPROCESSOR_FILE: &str = "preprocessor.bin";
pub const MODEL_FILE:        &str = "model.bin";
pub const CONFIG_FILE:       &str = "train_config.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    Preprocessor,
    Model,
}

#[derive(Debug, Serialize, Deserialize)]
struct EnvelopeHeader {
    format_version: u32,
    kind:           ArtifactKind,
    schema:         FeatureSchema,
    run_id:         String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    format_version: u32,
    kind:           ArtifactKind,
    schema:         FeatureSchema,
    run_id:         String,
    payload:        T,
}

/// Reads and writes every persisted artifact of a training run.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir:      PathBuf,
    expected: FeatureSchema,
    run_id:   String,
}

impl ArtifactStore {
    /// Store rooted at `dir`, validating against the Ames schema.
    /// Artifacts saved through it share a freshly drawn run id.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), expected: FeatureSchema::ames(), run_id: new_run_id() }
    }

    #[cfg(test)]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn preprocessor_path(&self) -> PathBuf {
        self.dir.join(PREPROCESSOR_FILE)
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn save_preprocessor(&self, pre: &FittedPreprocessor) -> PipelineResult<PathBuf> {
        let path = self.preprocessor_path();
        self.write_envelope(&path, ArtifactKind::Preprocessor, pre.schema(), pre)?;
        tracing::info!("Saved preprocessor to '{}'", path.display());
        Ok(path)
    }

    pub fn load_preprocessor(&self) -> PipelineResult<FittedPreprocessor> {
        let path = self.preprocessor_path();
        let (_, pre): (_, FittedPreprocessor) = self.read_envelope(&path, ArtifactKind::Preprocessor)?;
        // The payload carries its own copy of the schema; both must agree
        self.expected.ensure_matches(pre.schema())?;
        tracing::debug!("Loaded preprocessor from '{}'", path.display());
        Ok(pre)
    }

    /// Persist a fitted model tagged with the schema it was fit on.
    pub fn save_model(&self, model: &Model, schema: &FeatureSchema) -> PipelineResult<PathBuf> {
        let path = self.model_path();
        self.write_envelope(&path, ArtifactKind::Model, schema, model)?;
        tracing::info!("Saved model '{}' to '{}'", model.name(), path.display());
        Ok(path)
    }

    #[cfg(test)]
    pub fn load_model(&self) -> PipelineResult<Model> {
        let path  = self.model_path();
        let (_, model): (_, Model) = self.read_envelope(&path, ArtifactKind::Model)?;
        tracing::debug!("Loaded model '{}' from '{}'", model.name(), path.display());
        Ok(model)
    }

    /// Load the preprocessor and the model, failing unless both
    /// were written by the same training run.
    pub fn load_pair(&self) -> PipelineResult<(FittedPreprocessor, Model)> {
        let pre_path   = self.preprocessor_path();
        let model_path = self.model_path();

        let (pre_run, pre): (_, FittedPreprocessor) =
            self.read_envelope(&pre_path, ArtifactKind::Preprocessor)?;
        self.expected.ensure_matches(pre.schema())?;
        let (model_run, model): (_, Model) = self.read_envelope(&model_path, ArtifactKind::Model)?;

        if pre_run != model_run {
            return Err(PipelineError::schema(format!(
                "'{}' was written by training run {} but '{}' by run {}",
                pre_path.display(),
                pre_run,
                model_path.display(),
                model_run
            )));
        }
        tracing::debug!("Loaded artifact pair from training run {}", pre_run);
        Ok((pre, model))
    }

    /// Write the run configuration as pretty JSON.
    pub fn save_config<C: Serialize>(&self, cfg: &C) -> PipelineResult<PathBuf> {
        let path = self.config_path();
        ensure_parent(&path)?;
        let json = serde_json::to_string_pretty(cfg)
            .map_err(|e| PipelineError::data(format!("cannot encode config: {e}")))?;
        fs::write(&path, json).map_err(|e| PipelineError::io(&path, e))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(path)
    }

    pub fn load_config<C: DeserializeOwned>(&self) -> PipelineResult<C> {
        let path = self.config_path();
        let json = read_existing(&path).and_then(|bytes| {
            String::from_utf8(bytes)
                .map_err(|e| PipelineError::data(format!("'{}' is not UTF-8: {e}", path.display())))
        })?;
        serde_json::from_str(&json)
            .map_err(|e| PipelineError::data(format!("cannot parse '{}': {e}", path.display())))
    }

    fn write_envelope<T: Serialize>(
        &self,
        path:    &Path,
        kind:    ArtifactKind,
        schema:  &FeatureSchema,
        payload: &T,
    ) -> PipelineResult<()> {
        write_envelope_versioned(path, ARTIFACT_FORMAT_VERSION, kind, schema, &self.run_id, payload)
    }

    /// Returns the writer's run id and the payload.
    fn read_envelope<T: DeserializeOwned>(
        &self,
        path: &Path,
        kind: ArtifactKind,
    ) -> PipelineResult<(String, T)> {
        let bytes = read_existing(path)?;

        let header: EnvelopeHeader = bincode::deserialize(&bytes)
            .map_err(|source| PipelineError::ArtifactCorrupt { path: path.to_path_buf(), source })?;

        if header.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(PipelineError::schema(format!(
                "'{}' has artifact format version {}, expected {}",
                path.display(),
                header.format_version,
                ARTIFACT_FORMAT_VERSION
            )));
        }
        if header.kind != kind {
            return Err(PipelineError::schema(format!(
                "'{}' holds a {:?} artifact, expected {:?}",
                path.display(),
                header.kind,
                kind
            )));
        }
        self.expected.ensure_matches(&header.schema)?;

        let envelope: Envelope<T> = bincode::deserialize(&bytes)
            .map_err(|source| PipelineError::ArtifactCorrupt { path: path.to_path_buf(), source })?;
        Ok((envelope.run_id, envelope.payload))
    }
}

/// `<local time>-<random hex>`, e.g. `20240501T101203-9f3c01aa`.
fn new_run_id() -> String {
    format!("{}-{:08x}", Local::now().format("%Y%m%dT%H%M%S"), rand::random::<u32>())
}

fn write_envelope_versioned<T: Serialize>(
    path:           &Path,
    format_version: u32,
    kind:           ArtifactKind,
    schema:         &FeatureSchema,
    run_id:         &str,
    payload:        &T,
) -> PipelineResult<()> {
    let envelope = Envelope {
        format_version,
        kind,
        schema: schema.clone(),
        run_id: run_id.to_string(),
        payload,
    };
    let bytes = bincode::serialize(&envelope)
        .map_err(|e| PipelineError::data(format!("cannot encode {kind:?} artifact: {e}")))?;
    ensure_parent(path)?;

    let tmp = path.with_extension("bin.tmp");
    fs::write(&tmp, bytes).map_err(|e| PipelineError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| PipelineError::io(path, e))
}

fn read_existing(path: &Path) -> PipelineResult<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PipelineError::ArtifactNotFound { path: path.to_path_buf() },
        _ => PipelineError::io(path, e),
    })
}

fn ensure_parent(path: &Path) -> PipelineResult<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::preprocessor::FeatureBuilder;
    use crate::ml::model::{ModelKind, Regressor};
    use ndarray::array;
    use polars::prelude::{DataFrame, NamedFrom, Series};
    use std::collections::BTreeMap;

    fn fitted_preprocessor() -> FittedPreprocessor {
        let schema  = FeatureSchema::ames();
        let columns = schema
            .columns()
            .into_iter()
            .enumerate()
            .map(|(i, name)| Series::new(name, &[i as f64, i as f64 * 2.0 + 1.0, 3.0]))
            .collect();
        FeatureBuilder::new(schema).fit(&DataFrame::new(columns).unwrap()).unwrap()
    }

    fn fitted_model() -> Model {
        let mut m = ModelKind::LinearRegression.build(42);
        m.fit(&array![[0.0], [1.0], [2.0]], &array![1.0, 3.0, 5.0]).unwrap();
        m
    }

    #[test]
    fn test_preprocessor_survives_save_and_load() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("models"));
        let pre   = fitted_preprocessor();

        store.save_preprocessor(&pre).unwrap();
        assert_eq!(store.load_preprocessor().unwrap(), pre);
    }

    #[test]
    fn test_model_predictions_survive_save_and_load() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let model = fitted_model();

        store.save_model(&model, &FeatureSchema::ames()).unwrap();
        let loaded = store.load_model().unwrap();
        let x      = array![[10.0]];
        assert_eq!(loaded.kind(), ModelKind::LinearRegression);
        assert_eq!(loaded.predict(&x).unwrap(), model.predict(&x).unwrap());
    }

    #[test]
    fn test_missing_artifact_is_not_found() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(matches!(store.load_model(), Err(PipelineError::ArtifactNotFound { .. })));
        assert!(matches!(store.load_preprocessor(), Err(PipelineError::ArtifactNotFound { .. })));
    }

    #[test]
    fn test_garbage_file_is_corrupt() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        fs::write(store.model_path(), b"\x01\x02").unwrap();
        assert!(matches!(store.load_model(), Err(PipelineError::ArtifactCorrupt { .. })));
    }

    #[test]
    fn test_other_schema_is_rejected() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let mut schema = FeatureSchema::ames();
        schema.fields.pop();

        store.save_model(&fitted_model(), &schema).unwrap();
        assert!(matches!(store.load_model(), Err(PipelineError::SchemaMismatch(_))));
    }

    #[test]
    fn test_other_format_version_is_rejected() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        write_envelope_versioned(
            &store.model_path(),
            ARTIFACT_FORMAT_VERSION + 1,
            ArtifactKind::Model,
            &FeatureSchema::ames(),
            store.run_id(),
            &fitted_model(),
        )
        .unwrap();
        let err = store.load_model().unwrap_err();
        assert!(err.to_string().contains("format version"));
    }

    #[test]
    fn test_swapped_files_are_rejected() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save_preprocessor(&fitted_preprocessor()).unwrap();
        fs::rename(store.preprocessor_path(), store.model_path()).unwrap();

        let err = store.load_model().unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch(_)));
        assert!(err.to_string().contains("Preprocessor"));
    }

    #[test]
    fn test_pair_from_one_run_loads() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let pre   = fitted_preprocessor();
        store.save_model(&fitted_model(), &FeatureSchema::ames()).unwrap();
        store.save_preprocessor(&pre).unwrap();

        let (loaded_pre, loaded_model) = ArtifactStore::new(dir.path()).load_pair().unwrap();
        assert_eq!(loaded_pre, pre);
        assert_eq!(loaded_model.kind(), ModelKind::LinearRegression);
    }

    #[test]
    fn test_pair_from_two_runs_is_rejected() {
        let dir   = tempfile::tempdir().unwrap();
        let run_a = ArtifactStore::new(dir.path()).with_run_id("run-a");
        let run_b = ArtifactStore::new(dir.path()).with_run_id("run-b");

        // run B replaced the model, then died before its preprocessor was written
        run_a.save_model(&fitted_model(), &FeatureSchema::ames()).unwrap();
        run_a.save_preprocessor(&fitted_preprocessor()).unwrap();
        run_b.save_model(&fitted_model(), &FeatureSchema::ames()).unwrap();

        let err = run_a.load_pair().unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch(_)));
        assert!(err.to_string().contains("run-a"));
        assert!(err.to_string().contains("run-b"));
        // each file on its own is still readable
        assert!(run_a.load_model().is_ok());
        assert!(run_a.load_preprocessor().is_ok());
    }

    #[test]
    fn test_no_temporary_file_left_behind() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save_model(&fitted_model(), &FeatureSchema::ames()).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![MODEL_FILE.to_string()]);
    }

    #[test]
    fn test_config_round_trips_as_json() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let cfg: BTreeMap<String, u64> = [("seed".to_string(), 42)].into_iter().collect();

        store.save_config(&cfg).unwrap();
        let back: BTreeMap<String, u64> = store.load_config().unwrap();
        assert_eq!(back, cfg);
        assert!(fs::read_to_string(store.config_path()).unwrap().contains("\"seed\""));
    }
}
