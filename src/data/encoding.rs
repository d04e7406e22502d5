// ============================================================
// Layer 4 — Text Encoder
// ============================================================
// Turns an Example into a fixed-length EncodedExample:
//
//   [CLS] tok_1 tok_2 ... tok_k [SEP] [PAD] [PAD] ... [PAD]
//   └──────────── real tokens ───────┘└──── padding ───┘
//   mask: 1 1 1 ... 1 1                0 0 ... 0
//
// Text longer than max_seq_len − 2 tokens is truncated before
// [SEP] is appended, so every sequence keeps both markers.
// The same Example and settings always produce the same tensors.

use anyhow::{anyhow, Result};
use tokenizers::Tokenizer;

use crate::data::dataset::EncodedExample;
use crate::domain::example::Example;

pub const CLS_TOKEN: &str = "[CLS]";
pub const SEP_TOKEN: &str = "[SEP]";
pub const PAD_TOKEN: &str = "[PAD]";

/// Fixed-length encoder built around a subword tokenizer.
pub struct TextEncoder {
    tokenizer:   Tokenizer,
    max_seq_len: usize,
    cls_id:      u32,
    sep_id:      u32,
    pad_id:      u32,
}

impl TextEncoder {
    pub fn new(tokenizer: Tokenizer, max_seq_len: usize) -> Result<Self> {
        if max_seq_len < 2 {
            return Err(anyhow!("max_seq_len must leave room for [CLS] and [SEP], got {max_seq_len}"));
        }
        let special = |token: &str| {
            tokenizer
                .token_to_id(token)
                .ok_or_else(|| anyhow!("Tokenizer vocabulary has no {token} token"))
        };
        let cls_id = special(CLS_TOKEN)?;
        let sep_id = special(SEP_TOKEN)?;
        let pad_id = special(PAD_TOKEN)?;

        Ok(Self { tokenizer, max_seq_len, cls_id, sep_id, pad_id })
    }

    /// Token ids and mask for one text, exactly `max_seq_len` long.
    pub fn encode_text(&self, text: &str) -> Result<(Vec<u32>, Vec<u32>)> {
        let enc = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| anyhow!("Tokenisation error: {e}"))?;

        let budget = self.max_seq_len - 2;
        let body = enc.get_ids();
        let body = &body[..body.len().min(budget)];

        let mut input_ids = Vec::with_capacity(self.max_seq_len);
        input_ids.push(self.cls_id);
        input_ids.extend_from_slice(body);
        input_ids.push(self.sep_id);

        let real_len = input_ids.len();
        let mut attention_mask = vec![1u32; real_len];

        input_ids.resize(self.max_seq_len, self.pad_id);
        attention_mask.resize(self.max_seq_len, 0);

        Ok((input_ids, attention_mask))
    }

    pub fn encode(&self, example: &Example) -> Result<EncodedExample> {
        let (input_ids, attention_mask) = self.encode_text(&example.text)?;
        Ok(EncodedExample::new(input_ids, attention_mask, example.label, self.max_seq_len)?)
    }

    pub fn encode_all(&self, examples: &[Example]) -> Result<Vec<EncodedExample>> {
        examples.iter().map(|e| self.encode(e)).collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::infra::tokenizer_store::TokenizerStore;

    /// Characters the test vocabulary knows; anything else maps to [UNK].
    const TEST_CHARS: &str = "我在网上认识了一个男友他让转账冒充客服退款刷单返利诈骗";

    /// A BERT-style WordPiece tokenizer over a handful of Chinese characters.
    pub(crate) fn test_tokenizer() -> Tokenizer {
        let dir = tempfile::tempdir().unwrap();
        let mut vocab = vec!["[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();
        vocab.extend(TEST_CHARS.chars().map(|c| c.to_string()));
        std::fs::write(dir.path().join("vocab.txt"), vocab.join("\n")).unwrap();
        TokenizerStore::new(dir.path()).load().unwrap()
    }

    #[test]
    fn test_every_length_normalises_to_max_seq_len() {
        let encoder = TextEncoder::new(test_tokenizer(), 16).unwrap();
        for text in ["", "诈骗", "我在网上认识了一个男友他让我转账", &"刷单".repeat(40)] {
            let (ids, mask) = encoder.encode_text(text).unwrap();
            assert_eq!(ids.len(), 16);
            assert_eq!(mask.len(), 16);
        }
    }

    #[test]
    fn test_mask_marks_exactly_the_non_pad_positions() {
        let encoder = TextEncoder::new(test_tokenizer(), 12).unwrap();
        for text in ["冒充客服", "我在网上认识了一个男友他让我转账退款", "abc"] {
            let (ids, mask) = encoder.encode_text(text).unwrap();
            for (id, m) in ids.iter().zip(&mask) {
                assert_eq!(*m == 1, *id != encoder.pad_id);
            }
        }
    }

    #[test]
    fn test_markers_survive_truncation() {
        let encoder = TextEncoder::new(test_tokenizer(), 8).unwrap();
        let tokenizer = test_tokenizer();
        let cls = tokenizer.token_to_id(CLS_TOKEN).unwrap();
        let sep = tokenizer.token_to_id(SEP_TOKEN).unwrap();

        let (ids, mask) = encoder.encode_text(&"刷单返利".repeat(10)).unwrap();
        assert_eq!(ids[0], cls);
        assert_eq!(ids[7], sep);
        assert!(mask.iter().all(|&m| m == 1));
    }

    #[test]
    fn test_chinese_text_is_split_per_character() {
        let encoder = TextEncoder::new(test_tokenizer(), 10).unwrap();
        let (_, mask) = encoder.encode_text("冒充客服").unwrap();
        // [CLS] 冒 充 客 服 [SEP]
        assert_eq!(mask.iter().sum::<u32>(), 6);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let encoder = TextEncoder::new(test_tokenizer(), 32).unwrap();
        let example = Example::new("他让我转账退款", 3);
        let a = encoder.encode(&example).unwrap();
        let b = encoder.encode(&example).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.label, 3);
    }
}
