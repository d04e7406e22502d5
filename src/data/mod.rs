// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From split files to device-resident tensor batches:
//
//   train.txt / dev.txt / test.txt
//       │
//       ▼
//   TsvLoader         → Example { text, label − offset }
//       │
//       ▼
//   TextEncoder       → EncodedExample (ids + mask, length 128)
//       │
//       ▼
//   ExampleStore      → implements Burn's Dataset trait
//       │
//       ▼
//   ClassificationBatcher → stacks examples into [N, 128] tensors
//       │
//       ▼
//   BatchStream       → shuffled (train) or sequential (eval)

/// Reads `<text>\t<raw_label>` split files
pub mod loader;

/// Tokenises and pads text to a fixed length
pub mod encoding;

/// Encoded examples and Burn's Dataset impl
pub mod dataset;

/// Burn Batcher producing classification batches
pub mod batcher;

/// Shuffled / sequential DataLoaders
pub mod stream;
