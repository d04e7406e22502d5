// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches files on behalf of the other layers:
//
//   checkpoint.rs      — trained classifier weights + configs
//   pretrained.rs      — HuggingFace BERT config and weights
//   tokenizer_store.rs — tokenizer.json / vocab.txt lookup
//   metrics.rs         — F1, classification report, confusion
//                        matrix, per-epoch CSV log

pub mod checkpoint;

pub mod pretrained;

pub mod tokenizer_store;

pub mod metrics;
