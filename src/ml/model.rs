// ============================================================
// Layer 5 — Sequence Classifier
// ============================================================
// input_ids, attention_mask [B, S]
//   → BertEncoder          [B, S, H]
//   → BiLSTM final states  [2, B, Hr] → [B, 2·Hr]
//   → Dropout → Linear     [B, num_classes]   (raw logits)

use burn::{
    nn::{
        loss::CrossEntropyLossConfig,
        BiLstm, BiLstmConfig,
        Dropout, DropoutConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};

use crate::domain::error::ClassifierError;
use crate::ml::encoder::{BertEncoder, BertEncoderConfig};

#[derive(Config, Debug)]
pub struct SequenceClassifierConfig {
    pub encoder:     BertEncoderConfig,
    pub num_classes: usize,
    /// Hidden size of each LSTM direction
    #[config(default = 256)]
    pub lstm_hidden: usize,
    #[config(default = 0.1)]
    pub dropout:     f64,
}

impl SequenceClassifierConfig {
    /// Encoder weights start from `init`'s random values; load pretrained
    /// weights afterwards with `infra::pretrained`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> SequenceClassifier<B> {
        let encoder    = self.encoder.init(device);
        let aggregator = BiLstmConfig::new(self.encoder.hidden_size, self.lstm_hidden, true).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();
        let head       = LinearConfig::new(2 * self.lstm_hidden, self.num_classes).init(device);

        SequenceClassifier {
            encoder,
            aggregator,
            dropout,
            head,
            lstm_hidden: self.lstm_hidden,
            num_classes: self.num_classes,
        }
    }
}

/// BERT → BiLSTM → dropout → linear.
///
/// Dropout is only active on an autodiff backend; the `valid()` copy
/// used for evaluation runs it as identity.
#[derive(Module, Debug)]
pub struct SequenceClassifier<B: Backend> {
    pub encoder:     BertEncoder<B>,
    pub aggregator:  BiLstm<B>,
    pub dropout:     Dropout,
    pub head:        Linear<B>,
    pub lstm_hidden: usize,
    pub num_classes: usize,
}

impl<B: Backend> SequenceClassifier<B> {
    /// input_ids, attention_mask: [batch, seq_len] → logits: [batch, num_classes]
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> Result<Tensor<B, 2>, ClassifierError> {
        let [batch_size, _] = input_ids.dims();

        let hidden = self.encoder.forward(input_ids, attention_mask)?; // [batch, seq_len, H]

        // Final hidden state of each direction: [2, batch, Hr].
        // Forward direction first, matching the concatenation order below.
        let (_, state) = self.aggregator.forward(hidden, None);
        let pooled = state
            .hidden
            .swap_dims(0, 1)
            .reshape([batch_size, 2 * self.lstm_hidden]); // [batch, 2·Hr]

        Ok(self.head.forward(self.dropout.forward(pooled)))
    }

    /// Mean cross-entropy of the batch, unweighted.
    pub fn forward_loss(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
        labels:         Tensor<B, 1, Int>,
    ) -> Result<(Tensor<B, 1>, Tensor<B, 2>), ClassifierError> {
        let logits = self.forward(input_ids, attention_mask)?;
        let loss = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), labels);
        Ok((loss, logits))
    }
}

/// Argmax class per row: [batch, num_classes] → [batch]
pub fn predicted_labels<B: Backend>(logits: Tensor<B, 2>) -> Tensor<B, 1, Int> {
    logits.argmax(1).flatten::<1>(0, 1)
}
