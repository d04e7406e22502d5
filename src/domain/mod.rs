// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that define what the system talks about:
// labelled examples, the label scheme and the error taxonomy.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only plain structs, enums and traits

/// A labelled text and the split it belongs to
pub mod example;

/// Raw-label offset + ordered category names
pub mod label_scheme;

/// Fatal error taxonomy shared by every layer
pub mod error;

/// Abstractions other layers implement
pub mod traits;
