// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap, hands them to a use case and
// prints what comes back. Training prints its per-epoch lines
// as it goes; the final report is printed here.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "fraud-text-classifier",
    version,
    about = "Fine-tune a BERT + BiLSTM classifier on Chinese fraud-case texts."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Training on '{}' with encoder '{}'", args.train, args.pretrained);
    let output = args.output.clone();

    let summary = TrainUseCase::new(args.into()).execute()?;
    println!(
        "Training complete: {} epochs, {} optimizer steps. Model saved to '{}'.",
        summary.epochs.len(),
        summary.optimizer_steps,
        output
    );
    println!(
        "{} of {} test examples misclassified.",
        summary.test.misclassified(),
        summary.test.examples()
    );
    println!("{}", summary.test);
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let report = EvaluateUseCase::new(
        &args.model,
        &args.test,
        args.batch_size,
        args.device.into(),
    )
    .execute()?;
    println!(
        "{} of {} examples in '{}' misclassified.",
        report.misclassified(),
        report.examples(),
        args.test
    );
    println!("{report}");
    Ok(())
}
