// ============================================================
// Layer 6 — Model Store
// ============================================================
// Persists a trained classifier so `evaluate` can rebuild it
// without the pretrained directory.
//
//   <output>/
//     bilstm_bert.mpk          ← full-precision named MessagePack weights
//     classifier_config.json   ← architecture, needed to rebuild
//                                the module before loading weights
//     run_config.json          ← settings of the run that trained it
//     tokenizer.json           ← the tokenizer the run encoded with
//
// Loading fails if the weights do not fit the saved architecture.

use anyhow::{anyhow, Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::config::RunConfig;
use crate::ml::model::{SequenceClassifier, SequenceClassifierConfig};

const MODEL_FILE: &str = "bilstm_bert";
const CLASSIFIER_CONFIG_FILE: &str = "classifier_config.json";
const RUN_CONFIG_FILE: &str = "run_config.json";

type WeightsRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write weights plus both configs.
    pub fn save<B: Backend>(
        &self,
        model:      &SequenceClassifier<B>,
        classifier: &SequenceClassifierConfig,
        run:        &RunConfig,
    ) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create output directory '{}'", self.dir.display()))?;

        let path = self.dir.join(MODEL_FILE);
        WeightsRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save model to '{}'", path.display()))?;

        let cfg_path = self.dir.join(CLASSIFIER_CONFIG_FILE);
        classifier
            .save(&cfg_path)
            .with_context(|| format!("Cannot write '{}'", cfg_path.display()))?;

        let run_path = self.dir.join(RUN_CONFIG_FILE);
        fs::write(&run_path, serde_json::to_string_pretty(run)?)
            .with_context(|| format!("Cannot write '{}'", run_path.display()))?;

        tracing::info!("Saved model to '{}'", self.dir.display());
        Ok(())
    }

    pub fn load_classifier_config(&self) -> Result<SequenceClassifierConfig> {
        let path = self.dir.join(CLASSIFIER_CONFIG_FILE);
        SequenceClassifierConfig::load(&path).map_err(|e| {
            anyhow!(
                "Cannot read '{}'. Has a model been trained into this directory? ({e:?})",
                path.display()
            )
        })
    }

    pub fn load_run_config(&self) -> Result<RunConfig> {
        let path = self.dir.join(RUN_CONFIG_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Rebuild the classifier from its saved config and load its weights.
    pub fn load_model<B: Backend>(&self, device: &B::Device) -> Result<SequenceClassifier<B>> {
        let cfg = self.load_classifier_config()?;
        let model = cfg.init::<B>(device);

        let path = self.dir.join(MODEL_FILE);
        let record = WeightsRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load model weights '{}'", path.display()))?;

        tracing::info!("Loaded model from '{}'", self.dir.display());
        Ok(model.load_record(record))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::tests::tiny_config;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_saved_model_reloads_with_same_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("out"));
        let device = Default::default();
        let cfg = tiny_config();
        let model = cfg.init::<TestBackend>(&device);
        store.save(&model, &cfg, &RunConfig::default()).unwrap();

        let reloaded = store.load_model::<TestBackend>(&device).unwrap();
        assert_eq!(reloaded.num_classes, 10);
        assert_eq!(reloaded.lstm_hidden, 8);

        let ids = Tensor::<TestBackend, 2, Int>::from_ints([[2, 5, 9, 3, 0, 0]], &device);
        let mask = Tensor::<TestBackend, 2, Int>::from_ints([[1, 1, 1, 1, 0, 0]], &device);
        let a = model.forward(ids.clone(), mask.clone()).unwrap().into_data();
        let b = reloaded.forward(ids, mask).unwrap().into_data();
        a.assert_approx_eq(&b, 5);
    }

    #[test]
    fn test_saved_weights_are_bit_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let device = Default::default();
        let cfg = tiny_config();
        let model = cfg.init::<TestBackend>(&device);
        store.save(&model, &cfg, &RunConfig::default()).unwrap();
        let reloaded = store.load_model::<TestBackend>(&device).unwrap();

        let floats = |t: Tensor<TestBackend, 2>| t.into_data().to_vec::<f32>().unwrap();

        let before = floats(model.head.weight.val());
        assert_eq!(before.len(), 160);
        assert_eq!(before, floats(reloaded.head.weight.val()));
        assert_eq!(
            floats(model.encoder.embeddings.word_embeddings.weight.val()),
            floats(reloaded.encoder.embeddings.word_embeddings.weight.val())
        );
    }

    #[test]
    fn test_run_config_is_saved_alongside() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let cfg = tiny_config();
        let model = cfg.init::<TestBackend>(&Default::default());
        let run = RunConfig { epochs: 7, max_seq_len: 64, ..RunConfig::default() };
        store.save(&model, &cfg, &run).unwrap();

        let back = store.load_run_config().unwrap();
        assert_eq!(back.epochs, 7);
        assert_eq!(back.max_seq_len, 64);
        assert_eq!(store.load_classifier_config().unwrap().num_classes, 10);
    }

    #[test]
    fn test_loading_from_empty_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        assert!(store.load_model::<TestBackend>(&Default::default()).is_err());
        assert!(store.load_run_config().is_err());
    }
}
