// ============================================================
// Layer 3 — Example Domain Type
// ============================================================
// One labelled text as read from a split file, after the raw
// label has been normalised into a class index.

use serde::{Deserialize, Serialize};

/// A labelled training / evaluation text.
/// `label` is already a class index in `[0, num_classes)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub text:  String,
    pub label: usize,
}

impl Example {
    pub fn new(text: impl Into<String>, label: usize) -> Self {
        Self { text: text.into(), label }
    }
}

/// Which file an example came from. Used in log lines and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Dev,
    Test,
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Split::Train => "train",
            Split::Dev   => "dev",
            Split::Test  => "test",
        };
        f.write_str(name)
    }
}
