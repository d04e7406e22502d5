// ============================================================
// Layer 2 — Run Configuration
// ============================================================
// Every setting of a training / evaluation run. Serialisable so
// the exact run can be written next to the trained weights and
// read back by `evaluate`.

use burn::{
    backend::{wgpu::WgpuDevice, Wgpu},
    tensor::Tensor,
};
use serde::{Deserialize, Serialize};
use std::panic;

use crate::domain::label_scheme::LabelScheme;

/// Which burn backend the run executes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// wgpu when an adapter is available, ndarray otherwise
    #[default]
    Auto,
    /// ndarray on the host
    Cpu,
}

/// The backend a run ends up on once `Auto` has been decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedDevice {
    Wgpu,
    Cpu,
}

impl DeviceKind {
    /// `wgpu_ready` is only consulted for `Auto`.
    pub fn resolve(self, wgpu_ready: impl FnOnce() -> bool) -> ResolvedDevice {
        match self {
            DeviceKind::Cpu => ResolvedDevice::Cpu,
            DeviceKind::Auto if wgpu_ready() => ResolvedDevice::Wgpu,
            DeviceKind::Auto => {
                tracing::warn!("No wgpu adapter available, falling back to the CPU backend");
                ResolvedDevice::Cpu
            }
        }
    }
}

/// Run a one-element op on the default wgpu device.
///
/// cubecl panics when it finds no adapter, so the op runs under
/// `catch_unwind` with the panic hook silenced.
pub fn wgpu_available() -> bool {
    let hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let ok = panic::catch_unwind(|| {
        let device = WgpuDevice::default();
        Tensor::<Wgpu, 1>::from_floats([1.0, 2.0], &device).sum().into_scalar()
    })
    .is_ok();
    panic::set_hook(hook);
    ok
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub train_path:     String,
    pub dev_path:       String,
    pub test_path:      String,
    /// HuggingFace-style directory: config.json, vocab.txt or tokenizer.json,
    /// pytorch_model.bin
    pub pretrained_dir: String,
    pub output_dir:     String,
    pub max_seq_len:    usize,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub weight_decay:   f32,
    pub adam_epsilon:   f32,
    pub lstm_hidden:    usize,
    pub dropout:        f64,
    pub device:         DeviceKind,
    /// Keep dev as a validation set instead of merging it into train
    pub validate:       bool,
    /// Shuffle seed; a random one is drawn when absent
    pub seed:           Option<u64>,
    pub labels:         LabelScheme,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            train_path:     "data/train.txt".to_string(),
            dev_path:       "data/dev.txt".to_string(),
            test_path:      "data/test.txt".to_string(),
            pretrained_dir: "bert-base-chinese".to_string(),
            output_dir:     "output".to_string(),
            max_seq_len:    128,
            batch_size:     32,
            epochs:         4,
            lr:             5e-5,
            weight_decay:   0.01,
            adam_epsilon:   1e-8,
            lstm_hidden:    256,
            dropout:        0.1,
            device:         DeviceKind::Auto,
            validate:       false,
            seed:           None,
            labels:         LabelScheme::default(),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_run() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.max_seq_len, 128);
        assert_eq!(cfg.batch_size, 32);
        assert_eq!(cfg.epochs, 4);
        assert!((cfg.lr - 5e-5).abs() < 1e-12);
        assert_eq!(cfg.labels.num_classes(), 10);
    }

    #[test]
    fn test_config_survives_json() {
        let cfg = RunConfig { device: DeviceKind::Cpu, seed: Some(7), ..RunConfig::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"cpu\""));
        let back: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.device, DeviceKind::Cpu);
        assert_eq!(back.seed, Some(7));
        assert_eq!(back.labels, cfg.labels);
    }

    #[test]
    fn test_auto_falls_back_to_cpu_without_adapter() {
        assert_eq!(DeviceKind::Auto.resolve(|| false), ResolvedDevice::Cpu);
        assert_eq!(DeviceKind::Auto.resolve(|| true), ResolvedDevice::Wgpu);
    }

    #[test]
    fn test_cpu_never_checks_for_an_adapter() {
        let resolved = DeviceKind::Cpu.resolve(|| panic!("adapter check must not run"));
        assert_eq!(resolved, ResolvedDevice::Cpu);
    }
}
