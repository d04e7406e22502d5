// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer asks for examples through this trait and
// never sees how a split is stored on disk.

use anyhow::Result;

use crate::domain::example::{Example, Split};

// ─── ExampleSource ────────────────────────────────────────────────────────────
/// Anything that can produce the labelled examples of one split.
///
/// Implementations:
///   - TsvLoader → `<text>\t<raw_label>` files
pub trait ExampleSource {
    /// Load every example of the split, labels already normalised.
    fn load_split(&self, split: Split) -> Result<Vec<Example>>;
}
