use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::error::ClassifierError;

/// One tokenised, padded example.
/// Sequence format: [CLS] text [SEP] [PAD]...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedExample {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub label:          usize,
}

impl EncodedExample {
    /// Rejects sequences whose ids and mask are not both `seq_len` long.
    pub fn new(
        input_ids:      Vec<u32>,
        attention_mask: Vec<u32>,
        label:          usize,
        seq_len:        usize,
    ) -> Result<Self, ClassifierError> {
        if input_ids.len() != seq_len || attention_mask.len() != seq_len {
            return Err(ClassifierError::EncodedLength {
                input_ids:      input_ids.len(),
                attention_mask: attention_mask.len(),
                expected:       seq_len,
            });
        }
        Ok(Self { input_ids, attention_mask, label })
    }

    pub fn real_tokens(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m == 1).count()
    }
}

/// In-memory store of encoded examples, read by burn's DataLoader.
pub struct ExampleStore {
    examples: Vec<EncodedExample>,
}

impl ExampleStore {
    pub fn new(examples: Vec<EncodedExample>) -> Self { Self { examples } }

    /// Per-class example counts, indexed by label.
    pub fn label_counts(&self, num_classes: usize) -> Vec<usize> {
        let mut counts = vec![0usize; num_classes];
        for ex in &self.examples {
            if let Some(c) = counts.get_mut(ex.label) {
                *c += 1;
            }
        }
        counts
    }
}

impl Dataset<EncodedExample> for ExampleStore {
    fn get(&self, index: usize) -> Option<EncodedExample> {
        self.examples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.examples.len()
    }
}
