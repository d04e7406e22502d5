// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Finds the WordPiece tokenizer that matches a BERT checkpoint.
//
// Lookup order inside the directory:
//   1. tokenizer.json  — a full HuggingFace tokenizer, used as is
//   2. vocab.txt       — one token per line, id = line number;
//                        a BERT tokenizer JSON is built around it
//
// The built tokenizer uses BertNormalizer with Chinese character
// splitting, so every CJK character becomes its own word before
// WordPiece runs. No post-processor: [CLS]/[SEP] are added by the
// TextEncoder so truncation can keep both markers.

use anyhow::{anyhow, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tokenizers::Tokenizer;

pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const VOCAB_FILE: &str = "vocab.txt";

const SPECIAL_TOKENS: [&str; 5] = ["[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]"];

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn load(&self) -> Result<Tokenizer> {
        let tok_path = self.dir.join(TOKENIZER_FILE);
        if tok_path.exists() {
            tracing::info!("Loading tokenizer from '{}'", tok_path.display());
            return Tokenizer::from_file(&tok_path).map_err(|e| {
                anyhow!("Cannot load tokenizer from '{}': {}", tok_path.display(), e)
            });
        }

        let vocab_path = self.dir.join(VOCAB_FILE);
        if vocab_path.exists() {
            tracing::info!("Building WordPiece tokenizer from '{}'", vocab_path.display());
            return self.build_from_vocab(&vocab_path);
        }

        Err(anyhow!(
            "Neither {} nor {} found in '{}'",
            TOKENIZER_FILE,
            VOCAB_FILE,
            self.dir.display()
        ))
    }

    /// Write `tokenizer` as tokenizer.json, creating the directory if needed.
    pub fn save(&self, tokenizer: &Tokenizer) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;
        let path = self.dir.join(TOKENIZER_FILE);
        tokenizer
            .save(&path, false)
            .map_err(|e| anyhow!("Cannot write tokenizer to '{}': {}", path.display(), e))?;
        tracing::debug!("Saved tokenizer to '{}'", path.display());
        Ok(path)
    }

    fn build_from_vocab(&self, vocab_path: &Path) -> Result<Tokenizer> {
        let content = fs::read_to_string(vocab_path)
            .with_context(|| format!("Cannot read vocabulary '{}'", vocab_path.display()))?;

        let mut vocab = serde_json::Map::new();
        for (id, token) in content.lines().enumerate() {
            vocab.insert(token.trim_end_matches('\r').to_string(), serde_json::json!(id));
        }

        let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
            .iter()
            .filter_map(|token| {
                vocab.get(*token).map(|id| {
                    serde_json::json!({
                        "id": id, "content": token, "single_word": false, "lstrip": false,
                        "rstrip": false, "normalized": false, "special": true
                    })
                })
            })
            .collect();
        if !vocab.contains_key("[UNK]") {
            return Err(anyhow!("Vocabulary '{}' has no [UNK] token", vocab_path.display()));
        }

        let vocab_size = vocab.len();
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": true
            },
            "pre_tokenizer": { "type": "BertPreTokenizer" },
            "post_processor": null,
            "decoder": { "type": "WordPiece", "prefix": "##", "cleanup": true },
            "model": {
                "type": "WordPiece",
                "unk_token": "[UNK]",
                "continuing_subword_prefix": "##",
                "max_input_chars_per_word": 100,
                "vocab": vocab
            }
        });

        let tokenizer = Tokenizer::from_str(&tokenizer_json.to_string())
            .map_err(|e| anyhow!("Cannot build tokenizer from '{}': {e}", vocab_path.display()))?;
        tracing::info!("WordPiece tokenizer ready ({} tokens)", vocab_size);
        Ok(tokenizer)
    }
}
