// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All module definitions and tensor math live here.
//
//   encoder.rs   — BERT embeddings + transformer stack
//   model.rs     — encoder → BiLSTM → dropout → linear head
//   trainer.rs   — AdamW fine-tuning loop with per-epoch metrics
//   evaluator.rs — inference-only loss / F1 / report passes

pub mod encoder;

pub mod model;

pub mod trainer;

pub mod evaluator;
