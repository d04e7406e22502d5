// ============================================================
// Layer 5 — Evaluation Procedure
// ============================================================
// Inference-only passes over a labelled batch stream.
//
// Callers hand in the `valid()` copy of the classifier, which
// lives on the inner (non-autodiff) backend: dropout is identity
// there and no gradient graph is recorded.
//
// Two variants share the same loop:
//   evaluate_loss_f1 — mean batch loss + mean batch weighted F1,
//                      the validation signal during training
//   evaluate_report  — every (true, predicted) pair of the stream,
//                      turned into a classification report and a
//                      confusion matrix for the final test run
//
// The stream is read once per call, in its own order.

use anyhow::{anyhow, Result};
use burn::prelude::*;
use std::fmt;

use crate::data::stream::BatchStream;
use crate::domain::error::ClassifierError;
use crate::domain::label_scheme::LabelScheme;
use crate::infra::metrics::{weighted_f1, ClassificationReport, ConfusionMatrix, MetricAccumulator};
use crate::ml::model::{predicted_labels, SequenceClassifier};

/// Outcome of a final test evaluation.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub y_true:    Vec<usize>,
    pub y_pred:    Vec<usize>,
    pub report:    ClassificationReport,
    pub confusion: ConfusionMatrix,
}

impl EvaluationReport {
    pub fn examples(&self) -> usize {
        self.y_true.len()
    }

    pub fn misclassified(&self) -> usize {
        self.y_true.iter().zip(&self.y_pred).filter(|(t, p)| t != p).count()
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Classification Report:")?;
        writeln!(f, "{}", self.report)?;
        writeln!(f, "Confusion Matrix:")?;
        write!(f, "{}", self.confusion)
    }
}

/// Mean loss and mean weighted F1 over the batches of `stream`.
pub fn evaluate_loss_f1<B: Backend>(
    model:  &SequenceClassifier<B>,
    stream: &BatchStream<B>,
) -> Result<(f64, f64)> {
    let mut acc = MetricAccumulator::new();

    for batch in stream.iter() {
        let (loss, logits) = model.forward_loss(
            batch.input_ids,
            batch.attention_mask,
            batch.labels.clone(),
        )?;
        let loss_val: f64 = loss.into_scalar().elem::<f64>();

        let (y_true, y_pred) = label_pairs(batch.labels, logits)?;
        let f1 = weighted_f1(&y_true, &y_pred, model.num_classes)?;
        acc.record(loss_val, f1);
    }

    acc.averages()
        .ok_or_else(|| ClassifierError::EmptyStream("validation").into())
}

/// Predictions for the whole stream, scored against the label scheme.
pub fn evaluate_report<B: Backend>(
    model:  &SequenceClassifier<B>,
    stream: &BatchStream<B>,
    scheme: &LabelScheme,
) -> Result<EvaluationReport> {
    scheme.validate(model.num_classes)?;

    let mut y_true = Vec::new();
    let mut y_pred = Vec::new();

    for batch in stream.iter() {
        let logits = model.forward(batch.input_ids, batch.attention_mask)?;
        let (t, p) = label_pairs(batch.labels, logits)?;
        y_true.extend(t);
        y_pred.extend(p);
    }
    if y_true.is_empty() {
        return Err(ClassifierError::EmptyStream("test").into());
    }

    let confusion = ConfusionMatrix::from_labels(&y_true, &y_pred, scheme.num_classes())?;
    let report = ClassificationReport::from_confusion(&confusion, &scheme.categories)?;
    tracing::info!(
        "Evaluated {} examples: accuracy={:.4} weighted_f1={:.4}",
        y_true.len(),
        report.accuracy,
        report.weighted_avg.f1
    );

    Ok(EvaluationReport { y_true, y_pred, report, confusion })
}

/// Pull (true labels, argmax predictions) of one batch back to the host.
pub(crate) fn label_pairs<B: Backend>(
    labels: Tensor<B, 1, Int>,
    logits: Tensor<B, 2>,
) -> Result<(Vec<usize>, Vec<usize>)> {
    let to_host = |t: Tensor<B, 1, Int>| -> Result<Vec<usize>> {
        let values = t
            .into_data()
            .convert::<i64>()
            .to_vec::<i64>()
            .map_err(|e| anyhow!("Cannot read label tensor: {e:?}"))?;
        Ok(values.into_iter().map(|v| v as usize).collect())
    };
    Ok((to_host(labels)?, to_host(predicted_labels(logits))?))
}
