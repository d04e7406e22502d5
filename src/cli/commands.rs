// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// `train` and `evaluate`, with every run setting exposed as a
// flag. Defaults reproduce the reference fine-tuning run.

use clap::{Args, Subcommand, ValueEnum};

use crate::application::config::{DeviceKind, RunConfig};
use crate::domain::label_scheme::{LabelScheme, DEFAULT_LABEL_OFFSET, FRAUD_CATEGORIES};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune BERT + BiLSTM on the fraud splits, then score the test split
    Train(TrainArgs),

    /// Score a saved model on a test file
    Evaluate(EvaluateArgs),
}

/// Backend selection as typed on the command line
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum DeviceArg {
    Auto,
    Cpu,
}

impl From<DeviceArg> for DeviceKind {
    fn from(d: DeviceArg) -> Self {
        match d {
            DeviceArg::Auto => DeviceKind::Auto,
            DeviceArg::Cpu  => DeviceKind::Cpu,
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Training split, one `<text>\t<label>` per line
    #[arg(long, default_value = "data/train.txt")]
    pub train: String,

    /// Dev split; merged into training unless --validate is given
    #[arg(long, default_value = "data/dev.txt")]
    pub dev: String,

    #[arg(long, default_value = "data/test.txt")]
    pub test: String,

    /// Directory holding config.json, pytorch_model.bin and vocab.txt
    /// (or tokenizer.json) of a BERT checkpoint
    #[arg(long, default_value = "bert-base-chinese")]
    pub pretrained: String,

    /// Where weights, configs, tokenizer and metrics.csv are written
    #[arg(long, default_value = "output")]
    pub output: String,

    #[arg(long, default_value_t = 128)]
    pub max_seq_len: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 4)]
    pub epochs: usize,

    #[arg(long, default_value_t = 5e-5)]
    pub lr: f64,

    #[arg(long, default_value_t = 0.01)]
    pub weight_decay: f32,

    #[arg(long, default_value_t = 1e-8)]
    pub adam_epsilon: f32,

    /// Hidden size of each BiLSTM direction
    #[arg(long, default_value_t = 256)]
    pub lstm_hidden: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Raw label of the first category in the split files
    #[arg(long, default_value_t = DEFAULT_LABEL_OFFSET, allow_negative_numbers = true)]
    pub label_offset: i64,

    #[arg(long, value_enum, default_value_t = DeviceArg::Auto)]
    pub device: DeviceArg,

    /// Report validation loss / F1 on the dev split after every epoch
    #[arg(long)]
    pub validate: bool,

    /// Shuffle seed (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for RunConfig {
    fn from(a: TrainArgs) -> Self {
        let categories = FRAUD_CATEGORIES.iter().map(|c| c.to_string()).collect();
        RunConfig {
            train_path:     a.train,
            dev_path:       a.dev,
            test_path:      a.test,
            pretrained_dir: a.pretrained,
            output_dir:     a.output,
            max_seq_len:    a.max_seq_len,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            weight_decay:   a.weight_decay,
            adam_epsilon:   a.adam_epsilon,
            lstm_hidden:    a.lstm_hidden,
            dropout:        a.dropout,
            device:         a.device.into(),
            validate:       a.validate,
            seed:           a.seed,
            labels:         LabelScheme::new(a.label_offset, categories),
        }
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Output directory of a previous `train` run
    #[arg(long, default_value = "output")]
    pub model: String,

    #[arg(long, default_value = "data/test.txt")]
    pub test: String,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, value_enum, default_value_t = DeviceArg::Auto)]
    pub device: DeviceArg,
}
