// ============================================================
// Layer 6 — Pretrained BERT Checkpoint
// ============================================================
// Reads a HuggingFace BERT directory:
//
//   config.json        → BertEncoderConfig (architecture)
//   pytorch_model.bin  → BertEncoder weights
//
// Parameter names are remapped from the HuggingFace layout onto
// the crate's encoder:
//
//   bert.embeddings.LayerNorm             → embeddings.layer_norm
//   bert.encoder.layer.N.attention.self.Q → encoder.layers.N.mha.Q
//   ...attention.output.dense             → ...mha.output
//   ...attention.output.LayerNorm         → ...norm_1
//   ...intermediate.dense                 → ...pwff.linear_inner
//   ...output.dense                       → ...pwff.linear_outer
//   ...output.LayerNorm                   → ...norm_2
//
// Older checkpoints name the LayerNorm parameters gamma / beta
// instead of weight / bias; both spellings are accepted.
//
// Pooler and pre-training heads have no counterpart and are
// left unused.

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, Recorder},
};
use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::ml::encoder::{BertEncoder, BertEncoderConfig, BertEncoderRecord};

pub const CONFIG_FILE: &str = "config.json";
pub const WEIGHTS_FILE: &str = "pytorch_model.bin";

/// The subset of a HuggingFace `config.json` the encoder needs.
#[derive(Debug, Clone, Deserialize)]
pub struct HfBertConfig {
    pub vocab_size:              usize,
    pub hidden_size:             usize,
    pub num_hidden_layers:       usize,
    pub num_attention_heads:     usize,
    pub intermediate_size:       usize,
    pub max_position_embeddings: usize,
    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size:         usize,
    #[serde(default = "default_dropout")]
    pub hidden_dropout_prob:     f64,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps:          f64,
}

fn default_type_vocab_size() -> usize { 2 }
fn default_dropout() -> f64 { 0.1 }
fn default_layer_norm_eps() -> f64 { 1e-12 }

impl From<HfBertConfig> for BertEncoderConfig {
    fn from(c: HfBertConfig) -> Self {
        BertEncoderConfig::new(
            c.vocab_size,
            c.hidden_size,
            c.num_hidden_layers,
            c.num_attention_heads,
            c.intermediate_size,
            c.max_position_embeddings,
        )
        .with_type_vocab_size(c.type_vocab_size)
        .with_hidden_dropout_prob(c.hidden_dropout_prob)
        .with_layer_norm_eps(c.layer_norm_eps)
    }
}

pub struct PretrainedBert {
    dir: PathBuf,
}

impl PretrainedBert {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn load_config(&self) -> Result<BertEncoderConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read encoder config '{}'", path.display()))?;
        let hf: HfBertConfig = serde_json::from_str(&json)
            .with_context(|| format!("'{}' is not a BERT config", path.display()))?;

        tracing::info!(
            "Encoder: {} layers, hidden {}, {} heads, vocab {}",
            hf.num_hidden_layers,
            hf.hidden_size,
            hf.num_attention_heads,
            hf.vocab_size
        );
        Ok(hf.into())
    }

    /// Replace the weights of `encoder` with the checkpoint's.
    /// The encoder must have been built from `load_config()`.
    pub fn load_weights<B: Backend>(
        &self,
        encoder: BertEncoder<B>,
        device:  &B::Device,
    ) -> Result<BertEncoder<B>> {
        let path = self.dir.join(WEIGHTS_FILE);
        if !path.exists() {
            anyhow::bail!("Pretrained weights '{}' not found", path.display());
        }

        let args = LoadArgs::new(path.clone())
            .with_key_remap(r"^bert\.", "")
            .with_key_remap(r"^embeddings\.LayerNorm", "embeddings.layer_norm")
            .with_key_remap(
                r"^encoder\.layer\.([0-9]+)\.attention\.self\.(query|key|value)",
                "encoder.layers.$1.mha.$2",
            )
            .with_key_remap(
                r"^encoder\.layer\.([0-9]+)\.attention\.output\.dense",
                "encoder.layers.$1.mha.output",
            )
            .with_key_remap(
                r"^encoder\.layer\.([0-9]+)\.attention\.output\.LayerNorm",
                "encoder.layers.$1.norm_1",
            )
            .with_key_remap(
                r"^encoder\.layer\.([0-9]+)\.intermediate\.dense",
                "encoder.layers.$1.pwff.linear_inner",
            )
            .with_key_remap(
                r"^encoder\.layer\.([0-9]+)\.output\.dense",
                "encoder.layers.$1.pwff.linear_outer",
            )
            .with_key_remap(
                r"^encoder\.layer\.([0-9]+)\.output\.LayerNorm",
                "encoder.layers.$1.norm_2",
            )
            .with_key_remap(r"(layer_norm|norm_[12])\.gamma$", "$1.weight")
            .with_key_remap(r"(layer_norm|norm_[12])\.beta$", "$1.bias");

        let record: BertEncoderRecord<B> = PyTorchFileRecorder::<FullPrecisionSettings>::default()
            .load(args, device)
            .with_context(|| format!("Cannot load pretrained weights from '{}'", path.display()))?;

        tracing::info!("Loaded pretrained encoder weights from '{}'", path.display());
        Ok(encoder.load_record(record))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    const BERT_BASE_CHINESE: &str = r#"{
        "architectures": ["BertForMaskedLM"],
        "attention_probs_dropout_prob": 0.1,
        "directionality": "bidi",
        "hidden_act": "gelu",
        "hidden_dropout_prob": 0.1,
        "hidden_size": 768,
        "initializer_range": 0.02,
        "intermediate_size": 3072,
        "layer_norm_eps": 1e-12,
        "max_position_embeddings": 512,
        "model_type": "bert",
        "num_attention_heads": 12,
        "num_hidden_layers": 12,
        "pad_token_id": 0,
        "type_vocab_size": 2,
        "vocab_size": 21128
    }"#;

    #[test]
    fn test_hf_config_maps_onto_encoder_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), BERT_BASE_CHINESE).unwrap();

        let cfg = PretrainedBert::new(dir.path()).load_config().unwrap();
        let reference = BertEncoderConfig::bert_base_chinese();
        assert_eq!(cfg.vocab_size, reference.vocab_size);
        assert_eq!(cfg.hidden_size, reference.hidden_size);
        assert_eq!(cfg.num_hidden_layers, reference.num_hidden_layers);
        assert_eq!(cfg.num_attention_heads, reference.num_attention_heads);
        assert_eq!(cfg.intermediate_size, reference.intermediate_size);
        assert_eq!(cfg.max_position_embeddings, reference.max_position_embeddings);
    }

    #[test]
    fn test_optional_fields_fall_back_to_bert_defaults() {
        let json = r#"{"vocab_size": 50, "hidden_size": 16, "num_hidden_layers": 1,
                       "num_attention_heads": 2, "intermediate_size": 32,
                       "max_position_embeddings": 64}"#;
        let cfg: BertEncoderConfig = serde_json::from_str::<HfBertConfig>(json).unwrap().into();
        assert_eq!(cfg.type_vocab_size, 2);
        assert!((cfg.layer_norm_eps - 1e-12).abs() < 1e-18);
    }

    #[test]
    fn test_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PretrainedBert::new(dir.path()).load_config().is_err());
    }

    const TINY_CONFIG: &str = r#"{"vocab_size": 8, "hidden_size": 4, "num_hidden_layers": 1,
                                  "num_attention_heads": 2, "intermediate_size": 8,
                                  "max_position_embeddings": 16}"#;

    fn values(tensor: Tensor<NdArray, 1>) -> Vec<f32> {
        tensor.into_data().to_vec::<f32>().unwrap()
    }

    /// Load one of the committed tiny checkpoints; value k of tensor n is (n + k) / 8,
    /// LayerNorm scales are 1.5 and shifts 0.25.
    fn load_fixture(file: &str) -> BertEncoder<NdArray> {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), TINY_CONFIG).unwrap();
        let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(file);
        fs::copy(fixture, dir.path().join(WEIGHTS_FILE)).unwrap();

        let pretrained = PretrainedBert::new(dir.path());
        let device = Default::default();
        let encoder = pretrained.load_config().unwrap().init::<NdArray>(&device);
        pretrained.load_weights(encoder, &device).unwrap()
    }

    fn assert_matches_fixture(encoder: BertEncoder<NdArray>) {
        let word = encoder.embeddings.word_embeddings.weight.val().into_data().to_vec::<f32>().unwrap();
        let expected: Vec<f32> = (0..32).map(|k| k as f32 * 0.125).collect();
        assert_eq!(word, expected);

        assert_eq!(values(encoder.embeddings.layer_norm.gamma.val()), vec![1.5; 4]);
        assert_eq!(values(encoder.embeddings.layer_norm.beta.val()), vec![0.25; 4]);

        let record = encoder.into_record();
        let layer = &record.encoder.layers[0];
        assert_eq!(values(layer.norm_1.gamma.val()), vec![1.5; 4]);
        assert_eq!(values(layer.norm_2.beta.val()), vec![0.25; 4]);

        // intermediate.dense.weight is tensor 15, stored [out, in] and read as [in, out]
        let inner = &layer.pwff.linear_inner;
        assert_eq!(inner.weight.val().dims(), [4, 8]);
        let w = inner.weight.val().into_data().to_vec::<f32>().unwrap();
        let (input, output) = (1, 2);
        assert_eq!(w[input * 8 + output], (15 + output * 4 + input) as f32 * 0.125);
    }

    #[test]
    fn test_loads_checkpoint_with_weight_bias_layer_norms() {
        assert_matches_fixture(load_fixture("bert_tiny_weight_bias.pt"));
    }

    #[test]
    fn test_loads_checkpoint_with_gamma_beta_layer_norms() {
        assert_matches_fixture(load_fixture("bert_tiny_gamma_beta.pt"));
    }

    #[test]
    fn test_missing_weights_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = BertEncoderConfig::new(40, 16, 1, 2, 32, 24).init::<NdArray>(&Default::default());
        assert!(PretrainedBert::new(dir.path()).load_weights(encoder, &Default::default()).is_err());
    }
}
