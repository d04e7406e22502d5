// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Reloads a model written by `train` and scores it on a test
// file:
//
//   Step 1: Read run_config.json for the label scheme and
//           sequence length the model was trained with
//   Step 2: Load tokenizer.json saved next to the weights
//   Step 3: Rebuild the classifier and load its weights
//   Step 4: Encode the test split, run the report pass
//
// Inference only, so the plain (non-autodiff) backend is used.

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, NdArray, Wgpu},
    prelude::*,
};
use std::path::PathBuf;

use crate::application::config::{wgpu_available, DeviceKind, ResolvedDevice};
use crate::data::{
    dataset::ExampleStore, encoding::TextEncoder, loader::TsvLoader, stream::sequential_stream,
};
use crate::domain::{example::Split, traits::ExampleSource};
use crate::infra::{checkpoint::ModelStore, tokenizer_store::TokenizerStore};
use crate::ml::evaluator::{evaluate_report, EvaluationReport};

pub struct EvaluateUseCase {
    model_dir:  PathBuf,
    test_path:  PathBuf,
    batch_size: usize,
    device:     DeviceKind,
}

impl EvaluateUseCase {
    pub fn new(
        model_dir:  impl Into<PathBuf>,
        test_path:  impl Into<PathBuf>,
        batch_size: usize,
        device:     DeviceKind,
    ) -> Self {
        Self {
            model_dir: model_dir.into(),
            test_path: test_path.into(),
            batch_size,
            device,
        }
    }

    pub fn execute(&self) -> Result<EvaluationReport> {
        match self.device.resolve(wgpu_available) {
            ResolvedDevice::Cpu  => self.run::<NdArray>(NdArrayDevice::Cpu),
            ResolvedDevice::Wgpu => self.run::<Wgpu>(WgpuDevice::default()),
        }
    }

    fn run<B: Backend>(&self, device: B::Device) -> Result<EvaluationReport> {
        let store = ModelStore::new(&self.model_dir);

        // ── Step 1: Settings of the training run ─────────────────────────────
        let run_cfg = store.load_run_config()?;

        // ── Step 2: Tokenizer ────────────────────────────────────────────────
        let tokenizer = TokenizerStore::new(store.dir()).load()?;
        let text_encoder = TextEncoder::new(tokenizer, run_cfg.max_seq_len)?;

        // ── Step 3: Model ────────────────────────────────────────────────────
        let model = store.load_model::<B>(&device)?;
        run_cfg.labels.validate(model.num_classes)?;

        // ── Step 4: Score ────────────────────────────────────────────────────
        let examples = TsvLoader::new(run_cfg.labels.clone())
            .with_split(Split::Test, &self.test_path)
            .load_split(Split::Test)?;
        let test_store = ExampleStore::new(text_encoder.encode_all(&examples)?);
        let stream = sequential_stream::<B>(test_store, self.batch_size, device);

        evaluate_report(&model, &stream, &run_cfg.labels)
    }
}
