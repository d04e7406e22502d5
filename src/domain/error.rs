// ============================================================
// Layer 3 — Domain Errors
// ============================================================
// Every failure here is fatal for the run. Nothing is retried
// and nothing is recovered line-by-line.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("input_ids shape {input_ids:?} does not match attention_mask shape {attention_mask:?}")]
    ShapeMismatch {
        input_ids:      [usize; 2],
        attention_mask: [usize; 2],
    },

    #[error("sequence length {len} exceeds the encoder maximum of {max}")]
    SequenceTooLong { len: usize, max: usize },

    #[error("encoded example has {input_ids} ids and {attention_mask} mask entries, expected {expected}")]
    EncodedLength {
        input_ids:      usize,
        attention_mask: usize,
        expected:       usize,
    },

    #[error("{source_name}:{line}: {reason}")]
    MalformedLine {
        source_name: String,
        line:        usize,
        reason:      String,
    },

    #[error("raw label {raw} normalises to {normalized}, outside [0, {num_classes})")]
    LabelOutOfRange {
        raw:         i64,
        normalized:  i64,
        num_classes: usize,
    },

    #[error("label scheme names {categories} categories but the classifier outputs {outputs} classes")]
    CategoryCountMismatch { categories: usize, outputs: usize },

    #[error("{0} batch stream produced no batches")]
    EmptyStream(&'static str),
}
