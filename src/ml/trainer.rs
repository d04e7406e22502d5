// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full fine-tuning: the AdamW step updates encoder, BiLSTM and
// head together.
//
// Burn backends:
//   - training runs on B (an AutodiffBackend) — dropout active
//   - model.valid() is the same model on B::InnerBackend, used
//     for validation — dropout off, no gradient tape
//   - validation batches must be built on B::InnerBackend too
//
// Per batch: forward → cross-entropy → backward → one AdamW step
// → record loss and weighted F1. Gradients are returned fresh by
// every backward() call, so nothing carries over between steps.
// A non-finite loss is not intercepted.

use anyhow::Result;
use burn::{
    module::AutodiffModule,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::config::RunConfig;
use crate::data::stream::BatchStream;
use crate::domain::error::ClassifierError;
use crate::infra::metrics::{weighted_f1, EpochMetrics, MetricAccumulator, MetricsLogger};
use crate::ml::evaluator::{evaluate_loss_f1, label_pairs};
use crate::ml::model::SequenceClassifier;

/// The trained model and what happened while training it.
pub struct TrainingOutcome<B: AutodiffBackend> {
    pub model:           SequenceClassifier<B>,
    pub epochs:          Vec<EpochMetrics>,
    pub optimizer_steps: usize,
}

pub fn train<B: AutodiffBackend>(
    mut model:    SequenceClassifier<B>,
    train_stream: &BatchStream<B>,
    val_stream:   Option<&BatchStream<B::InnerBackend>>,
    cfg:          &RunConfig,
    metrics_log:  Option<&MetricsLogger>,
) -> Result<TrainingOutcome<B>> {
    // One optimizer for the whole run; its moment estimates persist across epochs.
    let mut optim = AdamWConfig::new()
        .with_weight_decay(cfg.weight_decay)
        .with_epsilon(cfg.adam_epsilon)
        .init();

    let mut history = Vec::with_capacity(cfg.epochs);
    let mut optimizer_steps = 0usize;

    for epoch in 1..=cfg.epochs {
        let mut acc = MetricAccumulator::new();

        for batch in train_stream.iter() {
            let (loss, logits) = model.forward_loss(
                batch.input_ids,
                batch.attention_mask,
                batch.labels.clone(),
            )?;
            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
            optimizer_steps += 1;

            let (y_true, y_pred) = label_pairs(batch.labels, logits.detach())?;
            acc.record(loss_val, weighted_f1(&y_true, &y_pred, model.num_classes)?);
        }

        let (train_loss, train_f1) = acc
            .averages()
            .ok_or(ClassifierError::EmptyStream("training"))?;

        let (val_loss, val_f1) = match val_stream {
            Some(stream) => {
                let (loss, f1) = evaluate_loss_f1(&model.valid(), stream)?;
                (Some(loss), Some(f1))
            }
            None => (None, None),
        };

        let metrics = EpochMetrics { epoch, train_loss, train_f1, val_loss, val_f1 };
        println!("{}", metrics.summary_line(cfg.epochs));
        tracing::debug!("Epoch {} done after {} batches", epoch, acc.batches());

        if let Some(log) = metrics_log {
            log.log(&metrics)?;
        }
        history.push(metrics);
    }

    tracing::info!("Training complete: {} optimizer steps", optimizer_steps);
    Ok(TrainingOutcome { model, epochs: history, optimizer_steps })
}
