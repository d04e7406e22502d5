// ============================================================
// Layer 4 — Split Loader
// ============================================================
// Reads `<text>\t<raw_label>` files and normalises each raw label
// through the LabelScheme.
//
// Line handling:
//   - blank lines are skipped
//   - a line without a tab, or with a non-integer label, aborts
//   - a label outside the scheme aborts
//
// Everything is read once per run; examples are never mutated
// afterwards.

use anyhow::{Context, Result};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::domain::error::ClassifierError;
use crate::domain::example::{Example, Split};
use crate::domain::label_scheme::LabelScheme;
use crate::domain::traits::ExampleSource;

/// Loads the split files of one dataset. Only configured splits can be read.
#[derive(Debug, Clone)]
pub struct TsvLoader {
    paths:  HashMap<Split, PathBuf>,
    scheme: LabelScheme,
}

impl TsvLoader {
    pub fn new(scheme: LabelScheme) -> Self {
        Self { paths: HashMap::new(), scheme }
    }

    pub fn with_split(mut self, split: Split, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(split, path.into());
        self
    }
}

impl ExampleSource for TsvLoader {
    fn load_split(&self, split: Split) -> Result<Vec<Example>> {
        let path = self
            .paths
            .get(&split)
            .with_context(|| format!("No file configured for the {split} split"))?;
        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot read {} split '{}'", split, path.display()))?;

        let examples = parse_examples(&content, &path.display().to_string(), &self.scheme)?;
        tracing::info!("Loaded {} {} examples from '{}'", examples.len(), split, path.display());
        Ok(examples)
    }
}

/// Parse a whole file body. `source_name` only appears in error messages.
pub fn parse_examples(
    content:     &str,
    source_name: &str,
    scheme:      &LabelScheme,
) -> Result<Vec<Example>, ClassifierError> {
    let mut examples = Vec::new();
    let mut min_raw: Option<i64> = None;

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (text, raw) = parse_line(line, source_name, idx + 1)?;
        min_raw = Some(min_raw.map_or(raw, |m| m.min(raw)));

        let label = scheme.normalize(raw).map_err(|e| ClassifierError::MalformedLine {
            source_name: source_name.to_string(),
            line:        idx + 1,
            reason:      e.to_string(),
        })?;
        examples.push(Example::new(text, label));
    }

    // A dataset whose raw labels do not start at the offset usually means
    // the offset is wrong, even when every label still lands in range.
    if let Some(min_raw) = min_raw {
        if min_raw != scheme.offset {
            tracing::warn!(
                "Smallest raw label in '{}' is {}, configured offset is {}",
                source_name,
                min_raw,
                scheme.offset
            );
        }
    }

    Ok(examples)
}

/// Split one line into (text, raw_label).
fn parse_line(line: &str, source_name: &str, line_no: usize) -> Result<(String, i64), ClassifierError> {
    let malformed = |reason: String| ClassifierError::MalformedLine {
        source_name: source_name.to_string(),
        line:        line_no,
        reason,
    };

    let mut fields = line.split('\t');
    let text = fields.next().unwrap_or_default();
    let raw_label = fields
        .next()
        .ok_or_else(|| malformed("missing tab-separated label".to_string()))?;

    let raw = raw_label
        .trim()
        .parse::<i64>()
        .map_err(|e| malformed(format!("label '{}' is not an integer: {e}", raw_label.trim())))?;

    Ok((text.to_string(), raw))
}
