// ============================================================
// Layer 5 — Contextual Encoder (BERT)
// ============================================================
// forward(input_ids, attention_mask) → per-token hidden states
//
//   input_ids [B, S] ─┬─ word embedding ─────┐
//                     ├─ position embedding ─┼─ + → LayerNorm → Dropout
//                     └─ token-type (all 0) ─┘            │
//                                                         ▼
//   attention_mask [B, S] ── (== 0) ── mask_pad ──▶ TransformerEncoder
//                                                         │
//                                                         ▼
//                                               hidden [B, S, H]
//
// The transformer stack is burn's post-norm TransformerEncoder,
// which has the same layout as BERT's encoder layers. The same
// type serves both as the pretrained encoder (weights loaded by
// infra::pretrained) and as a small randomly initialised one.

use burn::{
    nn::{
        transformer::{TransformerEncoder, TransformerEncoderConfig, TransformerEncoderInput},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
    },
    prelude::*,
};

use crate::domain::error::ClassifierError;

#[derive(Config, Debug)]
pub struct BertEncoderConfig {
    pub vocab_size:              usize,
    pub hidden_size:             usize,
    pub num_hidden_layers:       usize,
    pub num_attention_heads:     usize,
    pub intermediate_size:       usize,
    pub max_position_embeddings: usize,
    #[config(default = 2)]
    pub type_vocab_size:         usize,
    #[config(default = 0.1)]
    pub hidden_dropout_prob:     f64,
    #[config(default = 1e-12)]
    pub layer_norm_eps:          f64,
}

impl BertEncoderConfig {
    /// bert-base-chinese dimensions.
    #[cfg(test)]
    pub fn bert_base_chinese() -> Self {
        Self::new(21128, 768, 12, 12, 3072, 512)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> BertEncoder<B> {
        let embeddings = BertEmbeddings {
            word_embeddings:       EmbeddingConfig::new(self.vocab_size, self.hidden_size).init(device),
            position_embeddings:   EmbeddingConfig::new(self.max_position_embeddings, self.hidden_size).init(device),
            token_type_embeddings: EmbeddingConfig::new(self.type_vocab_size, self.hidden_size).init(device),
            layer_norm:            LayerNormConfig::new(self.hidden_size)
                .with_epsilon(self.layer_norm_eps)
                .init(device),
            dropout:               DropoutConfig::new(self.hidden_dropout_prob).init(),
        };
        let encoder = TransformerEncoderConfig::new(
            self.hidden_size,
            self.intermediate_size,
            self.num_attention_heads,
            self.num_hidden_layers,
        )
        .with_dropout(self.hidden_dropout_prob)
        .init(device);

        BertEncoder {
            embeddings,
            encoder,
            hidden_size:             self.hidden_size,
            max_position_embeddings: self.max_position_embeddings,
        }
    }
}

#[derive(Module, Debug)]
pub struct BertEmbeddings<B: Backend> {
    pub word_embeddings:       Embedding<B>,
    pub position_embeddings:   Embedding<B>,
    pub token_type_embeddings: Embedding<B>,
    pub layer_norm:            LayerNorm<B>,
    pub dropout:               Dropout,
}

impl<B: Backend> BertEmbeddings<B> {
    /// input_ids: [batch, seq_len] → [batch, seq_len, hidden]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = input_ids.dims();
        let device = input_ids.device();

        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let token_types = Tensor::<B, 2, Int>::zeros([batch_size, seq_len], &device);

        let x = self.word_embeddings.forward(input_ids)
            + self.position_embeddings.forward(positions)
            + self.token_type_embeddings.forward(token_types);

        self.dropout.forward(self.layer_norm.forward(x))
    }
}

#[derive(Module, Debug)]
pub struct BertEncoder<B: Backend> {
    pub embeddings:              BertEmbeddings<B>,
    pub encoder:                 TransformerEncoder<B>,
    pub hidden_size:             usize,
    pub max_position_embeddings: usize,
}

impl<B: Backend> BertEncoder<B> {
    /// input_ids, attention_mask: [batch, seq_len] → [batch, seq_len, hidden]
    ///
    /// Padding positions are still computed, but no token attends to them.
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> Result<Tensor<B, 3>, ClassifierError> {
        let ids_dims  = input_ids.dims();
        let mask_dims = attention_mask.dims();
        if ids_dims != mask_dims {
            return Err(ClassifierError::ShapeMismatch {
                input_ids:      ids_dims,
                attention_mask: mask_dims,
            });
        }
        if ids_dims[1] > self.max_position_embeddings {
            return Err(ClassifierError::SequenceTooLong {
                len: ids_dims[1],
                max: self.max_position_embeddings,
            });
        }

        let x = self.embeddings.forward(input_ids);
        let mask_pad = attention_mask.equal_elem(0);

        Ok(self.encoder.forward(TransformerEncoderInput::new(x).mask_pad(mask_pad)))
    }
}
