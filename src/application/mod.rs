// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: no tensor math, no printing,
// no file formats. Each use case picks the burn backend once
// and hands typed data down to the lower layers.

/// Run settings shared by both workflows
pub mod config;

/// Fine-tune and test a classifier
pub mod train_use_case;

/// Score a saved classifier on a test file
pub mod evaluate_use_case;
