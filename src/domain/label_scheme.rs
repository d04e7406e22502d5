// ============================================================
// Layer 3 — Label Scheme
// ============================================================
// The split files store raw integer labels that start at a fixed
// offset. The scheme ties that offset to the ordered category
// names so the two can never drift apart:
//
//   raw label  ──(− offset)──▶  class index  ──▶  category name
//       2                           0              婚恋交友
//       3                           1              假冒身份
//      ...                         ...               ...
//
// The class index is also the row/column index of the confusion
// matrix and the position of the logit in the classifier output.

use serde::{Deserialize, Serialize};

use crate::domain::error::ClassifierError;

/// Raw label of the first category in the split files.
pub const DEFAULT_LABEL_OFFSET: i64 = 2;

/// Fraud categories in class-index order.
pub const FRAUD_CATEGORIES: [&str; 10] = [
    "婚恋交友",
    "假冒身份",
    "钓鱼网站",
    "冒充公检法",
    "平台诈骗",
    "招聘兼职",
    "杀猪盘",
    "博彩赌博",
    "信贷理财",
    "刷单诈骗",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelScheme {
    /// Subtracted from every raw label at ingestion
    pub offset:     i64,
    pub categories: Vec<String>,
}

impl Default for LabelScheme {
    fn default() -> Self {
        Self {
            offset:     DEFAULT_LABEL_OFFSET,
            categories: FRAUD_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl LabelScheme {
    pub fn new(offset: i64, categories: Vec<String>) -> Self {
        Self { offset, categories }
    }

    pub fn num_classes(&self) -> usize {
        self.categories.len()
    }

    /// Map a raw file label onto a class index.
    pub fn normalize(&self, raw: i64) -> Result<usize, ClassifierError> {
        let normalized = raw - self.offset;
        if normalized < 0 || normalized >= self.num_classes() as i64 {
            return Err(ClassifierError::LabelOutOfRange {
                raw,
                normalized,
                num_classes: self.num_classes(),
            });
        }
        Ok(normalized as usize)
    }

    /// Inverse of [`LabelScheme::normalize`].
    pub fn denormalize(&self, class_index: usize) -> i64 {
        class_index as i64 + self.offset
    }

    pub fn category_name(&self, class_index: usize) -> Option<&str> {
        self.categories.get(class_index).map(String::as_str)
    }

    /// The classifier head must emit exactly one logit per category.
    pub fn validate(&self, classifier_outputs: usize) -> Result<(), ClassifierError> {
        if self.num_classes() != classifier_outputs {
            return Err(ClassifierError::CategoryCountMismatch {
                categories: self.num_classes(),
                outputs:    classifier_outputs,
            });
        }
        Ok(())
    }
}
