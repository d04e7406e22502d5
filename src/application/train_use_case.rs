// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load train / dev / test splits      (Layer 4 - data)
//   Step 2: Merge dev into train, or keep it
//           aside for validation                (Layer 4 - data)
//   Step 3: Load tokenizer, encode every split  (Layer 6 / 4)
//   Step 4: Build the classifier from the
//           pretrained encoder                  (Layer 6 / 5)
//   Step 5: Fine-tune                           (Layer 5 - ml)
//   Step 6: Save weights, configs, tokenizer    (Layer 6 - infra)
//   Step 7: Evaluate on the test split          (Layer 5 - ml)
//
// Steps 4 to 7 run on the burn backend picked by DeviceKind.

use anyhow::{anyhow, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    module::AutodiffModule,
    tensor::backend::AutodiffBackend,
};

use crate::application::config::{wgpu_available, ResolvedDevice, RunConfig};
use crate::data::{
    dataset::ExampleStore,
    encoding::TextEncoder,
    loader::TsvLoader,
    stream::{sequential_stream, shuffled_stream},
};
use crate::domain::{example::Split, traits::ExampleSource};
use crate::infra::{
    checkpoint::ModelStore,
    metrics::{EpochMetrics, MetricsLogger},
    pretrained::PretrainedBert,
    tokenizer_store::TokenizerStore,
};
use crate::ml::{
    evaluator::{evaluate_report, EvaluationReport},
    model::SequenceClassifierConfig,
    trainer::train,
};

/// What a finished training run reports back to the CLI.
pub struct TrainSummary {
    pub epochs:          Vec<EpochMetrics>,
    pub optimizer_steps: usize,
    pub test:            EvaluationReport,
}

pub struct TrainUseCase {
    config: RunConfig,
}

impl TrainUseCase {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainSummary> {
        match self.config.device.resolve(wgpu_available) {
            ResolvedDevice::Cpu  => self.run::<Autodiff<NdArray>>(NdArrayDevice::Cpu),
            ResolvedDevice::Wgpu => self.run::<Autodiff<Wgpu>>(WgpuDevice::default()),
        }
    }

    fn run<B: AutodiffBackend>(&self, device: B::Device) -> Result<TrainSummary> {
        let cfg = &self.config;
        tracing::info!("Training on {:?}", device);

        // ── Step 1: Load splits ──────────────────────────────────────────────
        let loader = TsvLoader::new(cfg.labels.clone())
            .with_split(Split::Train, &cfg.train_path)
            .with_split(Split::Dev, &cfg.dev_path)
            .with_split(Split::Test, &cfg.test_path);
        let mut train_examples = loader.load_split(Split::Train)?;
        let dev_examples       = loader.load_split(Split::Dev)?;
        let test_examples      = loader.load_split(Split::Test)?;

        // ── Step 2: Dev handling ─────────────────────────────────────────────
        let val_examples = if cfg.validate {
            Some(dev_examples)
        } else {
            train_examples.extend(dev_examples);
            tracing::info!("Dev split merged into training: {} examples", train_examples.len());
            None
        };

        // ── Step 3: Tokenise ─────────────────────────────────────────────────
        let tokenizer = TokenizerStore::new(&cfg.pretrained_dir).load()?;
        let pretrained = PretrainedBert::new(&cfg.pretrained_dir);
        let encoder_cfg = pretrained.load_config()?;

        let vocab_size = tokenizer.get_vocab_size(true);
        if vocab_size > encoder_cfg.vocab_size {
            return Err(anyhow!(
                "Tokenizer has {} tokens but the encoder embeds only {}",
                vocab_size,
                encoder_cfg.vocab_size
            ));
        }
        if cfg.max_seq_len > encoder_cfg.max_position_embeddings {
            return Err(anyhow!(
                "max_seq_len {} exceeds the encoder's {} positions",
                cfg.max_seq_len,
                encoder_cfg.max_position_embeddings
            ));
        }

        let text_encoder = TextEncoder::new(tokenizer.clone(), cfg.max_seq_len)?;
        let train_encoded = text_encoder.encode_all(&train_examples)?;
        let truncated = train_encoded
            .iter()
            .filter(|e| e.real_tokens() == cfg.max_seq_len)
            .count();
        tracing::info!("{} training examples fill all {} positions", truncated, cfg.max_seq_len);
        let train_store = ExampleStore::new(train_encoded);
        let test_store  = ExampleStore::new(text_encoder.encode_all(&test_examples)?);
        let val_store = val_examples
            .map(|v| text_encoder.encode_all(&v).map(ExampleStore::new))
            .transpose()?;
        for (class, count) in train_store.label_counts(cfg.labels.num_classes()).iter().enumerate() {
            tracing::debug!(
                "  {:<6} (raw label {}) {}",
                cfg.labels.category_name(class).unwrap_or("?"),
                cfg.labels.denormalize(class),
                count
            );
        }

        // ── Step 4: Model ────────────────────────────────────────────────────
        let classifier_cfg = SequenceClassifierConfig::new(encoder_cfg, cfg.labels.num_classes())
            .with_lstm_hidden(cfg.lstm_hidden)
            .with_dropout(cfg.dropout);
        cfg.labels.validate(classifier_cfg.num_classes)?;

        let mut model = classifier_cfg.init::<B>(&device);
        model.encoder = pretrained.load_weights(model.encoder, &device)?;

        // ── Step 5: Fine-tune ────────────────────────────────────────────────
        let seed = cfg.seed.unwrap_or_else(rand::random);
        tracing::info!("Shuffle seed: {}", seed);

        let train_stream = shuffled_stream::<B>(train_store, cfg.batch_size, seed, device.clone());
        let val_stream = val_store
            .map(|s| sequential_stream::<B::InnerBackend>(s, cfg.batch_size, device.clone()));

        let metrics_log = MetricsLogger::new(&cfg.output_dir)?;
        let outcome = train(model, &train_stream, val_stream.as_ref(), cfg, Some(&metrics_log))?;
        tracing::info!("Epoch metrics written to '{}'", metrics_log.csv_path().display());

        // ── Step 6: Persist ──────────────────────────────────────────────────
        let store = ModelStore::new(&cfg.output_dir);
        store.save(&outcome.model, &classifier_cfg, cfg)?;
        TokenizerStore::new(store.dir()).save(&tokenizer)?;

        // ── Step 7: Test evaluation ──────────────────────────────────────────
        let test_stream = sequential_stream::<B::InnerBackend>(test_store, cfg.batch_size, device);
        let test = evaluate_report(&outcome.model.valid(), &test_stream, &cfg.labels)?;

        Ok(TrainSummary {
            epochs:          outcome.epochs,
            optimizer_steps: outcome.optimizer_steps,
            test,
        })
    }
}
