// ============================================================
// Layer 6 — Metrics
// ============================================================
// Classification metrics computed on plain label vectors, plus
// the per-epoch CSV log.
//
//   ConfusionMatrix       rows = true label, columns = predicted
//   weighted_f1           per-class F1 averaged by support
//   ClassificationReport  precision / recall / F1 / support per
//                         class + accuracy, macro and weighted rows
//   MetricAccumulator     running loss + F1 sums over one epoch
//   MetricsLogger         writes EpochMetrics rows to metrics.csv, one file per run
//
// A class with no predictions has precision 0; a class with no
// examples has recall 0; F1 is 0 whenever precision + recall is 0.

use anyhow::{bail, Result};
use std::{
    fmt,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

// ─── ConfusionMatrix ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// counts[true][predicted]
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn new(num_classes: usize) -> Self {
        Self { counts: vec![vec![0; num_classes]; num_classes] }
    }

    pub fn from_labels(y_true: &[usize], y_pred: &[usize], num_classes: usize) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            bail!("{} true labels but {} predictions", y_true.len(), y_pred.len());
        }
        let mut cm = Self::new(num_classes);
        for (&t, &p) in y_true.iter().zip(y_pred) {
            if t >= num_classes || p >= num_classes {
                bail!("label pair ({t}, {p}) outside {num_classes} classes");
            }
            cm.counts[t][p] += 1;
        }
        Ok(cm)
    }

    pub fn num_classes(&self) -> usize {
        self.counts.len()
    }

    pub fn get(&self, true_label: usize, predicted: usize) -> usize {
        self.counts[true_label][predicted]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Number of examples whose true label is `class` (the class support).
    pub fn row_sum(&self, class: usize) -> usize {
        self.counts[class].iter().sum()
    }

    /// Number of examples predicted as `class`.
    pub fn column_sum(&self, class: usize) -> usize {
        self.counts.iter().map(|row| row[class]).sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.num_classes()).map(|c| self.get(c, c)).sum()
    }

    pub fn class_scores(&self, class: usize) -> ClassScores {
        let tp        = self.get(class, class) as f64;
        let support   = self.row_sum(class);
        let predicted = self.column_sum(class);

        let precision = if predicted > 0 { tp / predicted as f64 } else { 0.0 };
        let recall    = if support   > 0 { tp / support   as f64 } else { 0.0 };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        ClassScores { precision, recall, f1, support }
    }

    pub fn weighted_f1(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (0..self.num_classes())
            .map(|c| {
                let s = self.class_scores(c);
                s.f1 * s.support as f64
            })
            .sum::<f64>()
            / total as f64
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .counts
            .iter()
            .flatten()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1);

        for (i, row) in self.counts.iter().enumerate() {
            let open  = if i == 0 { "[[" } else { " [" };
            let close = if i + 1 == self.counts.len() { "]]" } else { "]" };
            let cells: Vec<String> = row.iter().map(|c| format!("{c:>width$}")).collect();
            writeln!(f, "{open}{}{close}", cells.join(" "))?;
        }
        Ok(())
    }
}

/// Weighted-average F1 of a label vector pair, weighted by class support.
pub fn weighted_f1(y_true: &[usize], y_pred: &[usize], num_classes: usize) -> Result<f64> {
    Ok(ConfusionMatrix::from_labels(y_true, y_pred, num_classes)?.weighted_f1())
}

// ─── ClassificationReport ─────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub support:   usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// (category name, scores) in class-index order
    pub classes:      Vec<(String, ClassScores)>,
    pub accuracy:     f64,
    pub macro_avg:    ClassScores,
    pub weighted_avg: ClassScores,
}

impl ClassificationReport {
    pub fn from_confusion(cm: &ConfusionMatrix, names: &[String]) -> Result<Self> {
        if names.len() != cm.num_classes() {
            bail!("{} category names for {} classes", names.len(), cm.num_classes());
        }
        let classes: Vec<(String, ClassScores)> = names
            .iter()
            .enumerate()
            .map(|(c, name)| (name.clone(), cm.class_scores(c)))
            .collect();

        let total = cm.total();
        let n = classes.len().max(1) as f64;
        let mean = |pick: fn(&ClassScores) -> f64| classes.iter().map(|(_, s)| pick(s)).sum::<f64>() / n;
        let weighted = |pick: fn(&ClassScores) -> f64| {
            if total == 0 {
                return 0.0;
            }
            classes.iter().map(|(_, s)| pick(s) * s.support as f64).sum::<f64>() / total as f64
        };

        let macro_avg = ClassScores {
            precision: mean(|s| s.precision),
            recall:    mean(|s| s.recall),
            f1:        mean(|s| s.f1),
            support:   total,
        };
        let weighted_avg = ClassScores {
            precision: weighted(|s| s.precision),
            recall:    weighted(|s| s.recall),
            f1:        weighted(|s| s.f1),
            support:   total,
        };
        let accuracy = if total > 0 { cm.correct() as f64 / total as f64 } else { 0.0 };

        Ok(Self { classes, accuracy, macro_avg, weighted_avg })
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|(name, _)| name.chars().count())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);

        writeln!(f, "{:>width$} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for (name, scores) in &self.classes {
            write_row(f, width, name, scores)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.weighted_avg.support
        )?;
        write_row(f, width, "macro avg", &self.macro_avg)?;
        write_row(f, width, "weighted avg", &self.weighted_avg)
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, width: usize, name: &str, s: &ClassScores) -> fmt::Result {
    writeln!(
        f,
        "{name:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        s.precision, s.recall, s.f1, s.support
    )
}

// ─── MetricAccumulator ────────────────────────────────────────────────────────
/// Running per-batch sums for one epoch (or one validation pass).
/// A fresh accumulator is created at the start of every epoch.
#[derive(Debug, Default, Clone)]
pub struct MetricAccumulator {
    loss_sum: f64,
    f1_sum:   f64,
    batches:  usize,
}

impl MetricAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, loss: f64, f1: f64) {
        self.loss_sum += loss;
        self.f1_sum   += f1;
        self.batches  += 1;
    }

    pub fn batches(&self) -> usize {
        self.batches
    }

    /// (mean loss, mean F1) over recorded batches; None before any batch.
    pub fn averages(&self) -> Option<(f64, f64)> {
        if self.batches == 0 {
            return None;
        }
        let n = self.batches as f64;
        Some((self.loss_sum / n, self.f1_sum / n))
    }
}

// ─── EpochMetrics ─────────────────────────────────────────────────────────────
/// One row of the training log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Starts at 1
    pub epoch:      usize,
    pub train_loss: f64,
    pub train_f1:   f64,
    /// Present only when a validation stream was supplied
    pub val_loss:   Option<f64>,
    pub val_f1:     Option<f64>,
}

impl EpochMetrics {
    /// The console line printed at the end of each epoch.
    pub fn summary_line(&self, total_epochs: usize) -> String {
        let mut line = format!(
            "Epoch: {}/{} | Train Loss: {:.3} | Train F1 Score: {:.3}",
            self.epoch, total_epochs, self.train_loss, self.train_f1
        );
        if let (Some(val_loss), Some(val_f1)) = (self.val_loss, self.val_f1) {
            line.push_str(&format!(" | Val Loss: {val_loss:.3} | Val F1 Score: {val_f1:.3}"));
        }
        line
    }
}

/// Appends epoch metrics to `<dir>/metrics.csv`.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Starts a fresh CSV with only the header; rows of an earlier run are dropped.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        let mut f = fs::File::create(&csv_path)?;
        writeln!(f, "epoch,train_loss,train_f1,val_loss,val_f1")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;

        let opt = |v: Option<f64>| v.map(|v| format!("{v:.6}")).unwrap_or_default();
        writeln!(
            f,
            "{},{:.6},{:.6},{},{}",
            m.epoch,
            m.train_loss,
            m.train_f1,
            opt(m.val_loss),
            opt(m.val_f1),
        )?;

        tracing::debug!("Logged epoch {} metrics to '{}'", m.epoch, self.csv_path.display());
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("class {i}")).collect()
    }

    #[test]
    fn test_perfect_predictions_score_one() {
        let y = vec![0, 1, 2, 2, 1];
        assert!((weighted_f1(&y, &y, 3).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_f1_matches_hand_computation() {
        // class 0: tp=1 fp=1 fn=1 → p=0.5 r=0.5 f1=0.5, support 2
        // class 1: tp=2 fp=1 fn=0 → p=2/3 r=1   f1=0.8, support 2
        // class 2: tp=0 fp=0 fn=1 → f1=0,              support 1
        let y_true = vec![0, 0, 1, 1, 2];
        let y_pred = vec![0, 1, 1, 1, 0];
        let f1 = weighted_f1(&y_true, &y_pred, 3).unwrap();
        let expected = (0.5 * 2.0 + 0.8 * 2.0 + 0.0) / 5.0;
        assert!((f1 - expected).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_f1_stays_in_unit_interval() {
        let y_true: Vec<usize> = (0..50).map(|i| i % 10).collect();
        let y_pred: Vec<usize> = (0..50).map(|i| (i * 7 + 3) % 10).collect();
        let f1 = weighted_f1(&y_true, &y_pred, 10).unwrap();
        assert!((0.0..=1.0).contains(&f1));
    }

    #[test]
    fn test_confusion_rows_sum_to_support() {
        let y_true = vec![0, 0, 1, 2, 2, 2, 3];
        let y_pred = vec![0, 2, 1, 2, 0, 2, 1];
        let cm = ConfusionMatrix::from_labels(&y_true, &y_pred, 4).unwrap();
        let report = ClassificationReport::from_confusion(&cm, &names(4)).unwrap();

        assert_eq!(cm.total(), y_true.len());
        for (c, (_, scores)) in report.classes.iter().enumerate() {
            assert_eq!(cm.row_sum(c), scores.support);
        }
        assert_eq!(cm.get(2, 0), 1);
        assert_eq!(cm.get(3, 1), 1);
    }

    #[test]
    fn test_report_accuracy_and_averages() {
        let y_true = vec![0, 0, 1, 1, 2];
        let y_pred = vec![0, 1, 1, 1, 0];
        let cm = ConfusionMatrix::from_labels(&y_true, &y_pred, 3).unwrap();
        let report = ClassificationReport::from_confusion(&cm, &names(3)).unwrap();

        assert!((report.accuracy - 0.6).abs() < 1e-12);
        assert!((report.macro_avg.f1 - (0.5 + 0.8 + 0.0) / 3.0).abs() < 1e-12);
        assert!((report.weighted_avg.f1 - cm.weighted_f1()).abs() < 1e-12);
        assert_eq!(report.weighted_avg.support, 5);
    }

    #[test]
    fn test_report_layout_lists_classes_in_order() {
        let cm = ConfusionMatrix::from_labels(&[0, 1, 2], &[0, 1, 1], 3).unwrap();
        let names = vec!["婚恋交友".to_string(), "假冒身份".to_string(), "钓鱼网站".to_string()];
        let text = ClassificationReport::from_confusion(&cm, &names).unwrap().to_string();

        let first  = text.find("婚恋交友").unwrap();
        let second = text.find("假冒身份").unwrap();
        let third  = text.find("钓鱼网站").unwrap();
        assert!(first < second && second < third);
        assert!(text.contains("precision"));
        assert!(text.contains("weighted avg"));
    }

    #[test]
    fn test_mismatched_lengths_are_rejected() {
        assert!(ConfusionMatrix::from_labels(&[0, 1], &[0], 2).is_err());
        assert!(ConfusionMatrix::from_labels(&[0, 5], &[0, 1], 2).is_err());
        let cm = ConfusionMatrix::new(3);
        assert!(ClassificationReport::from_confusion(&cm, &names(2)).is_err());
    }

    #[test]
    fn test_confusion_matrix_display() {
        let cm = ConfusionMatrix::from_labels(&[0, 0, 1], &[0, 1, 1], 2).unwrap();
        assert_eq!(cm.to_string(), "[[1 1]\n [0 1]]\n");
    }

    #[test]
    fn test_accumulator_averages_by_batch_count() {
        let mut acc = MetricAccumulator::new();
        assert!(acc.averages().is_none());
        acc.record(2.0, 0.5);
        acc.record(1.0, 0.25);
        let (loss, f1) = acc.averages().unwrap();
        assert_eq!(acc.batches(), 2);
        assert!((loss - 1.5).abs() < 1e-12);
        assert!((f1 - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_summary_line_with_and_without_validation() {
        let mut m = EpochMetrics { epoch: 2, train_loss: 0.5, train_f1: 0.75, val_loss: None, val_f1: None };
        assert_eq!(m.summary_line(4), "Epoch: 2/4 | Train Loss: 0.500 | Train F1 Score: 0.750");
        m.val_loss = Some(0.6);
        m.val_f1 = Some(0.7);
        assert!(m.summary_line(4).ends_with("| Val Loss: 0.600 | Val F1 Score: 0.700"));
    }

    #[test]
    fn test_logger_appends_rows() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger
            .log(&EpochMetrics { epoch: 1, train_loss: 1.0, train_f1: 0.2, val_loss: None, val_f1: None })
            .unwrap();
        logger
            .log(&EpochMetrics { epoch: 2, train_loss: 0.8, train_f1: 0.4, val_loss: Some(0.9), val_f1: Some(0.3) })
            .unwrap();

        let csv = std::fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "epoch,train_loss,train_f1,val_loss,val_f1");
        assert_eq!(lines[1], "1,1.000000,0.200000,,");
        assert_eq!(lines[2], "2,0.800000,0.400000,0.900000,0.300000");
    }

    #[test]
    fn test_new_run_replaces_previous_rows() {
        let dir = tempfile::tempdir().unwrap();
        let epoch = |n| EpochMetrics { epoch: n, train_loss: 1.0, train_f1: 0.5, val_loss: None, val_f1: None };

        let first = MetricsLogger::new(dir.path()).unwrap();
        first.log(&epoch(1)).unwrap();
        first.log(&epoch(2)).unwrap();

        let second = MetricsLogger::new(dir.path()).unwrap();
        second.log(&epoch(1)).unwrap();

        let csv = std::fs::read_to_string(second.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "epoch,train_loss,train_f1,val_loss,val_f1");
        assert!(lines[1].starts_with("1,"));
    }
}
