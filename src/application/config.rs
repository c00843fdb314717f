// ============================================================
// Layer 2 — Pipeline Configuration
// ============================================================
// All settings for one run of the batching pipeline.
// Serialisable so a run can be described by a JSON file:
//
//   {
//     "train_x_files": ["data/train/europarl-v7.fr-en.en"],
//     "train_t_files": ["data/train/europarl-v7.fr-en.fr"],
//     "seq_len": 300,
//     "batch_size": 32,
//     "warmup_iterations": 20,
//     "schedule": { "shuffle": true, "repeat": true },
//     "seed": 42
//   }
//
// Missing keys fall back to `PipelineConfig::default()`.

use anyhow::{bail, Context, Result};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::data::batcher::BatcherConfig;
use crate::data::schedule::ScheduleOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Source-side corpus files, concatenated in order
    pub train_x_files: Vec<PathBuf>,

    /// Target-side corpus files, line-aligned with `train_x_files`
    pub train_t_files: Vec<PathBuf>,

    /// Saved alphabet JSON; built from the corpus and written here
    /// if the file does not exist yet
    pub alphabet_path: Option<PathBuf>,

    /// Most frequent characters kept when building an alphabet
    pub max_symbols: usize,

    /// EOS marker appended by the alphabet
    pub eos: Option<char>,

    /// SOS marker; the reserved GO id is used when absent
    pub sos: Option<char>,

    pub seq_len:    usize,
    pub batch_size: usize,

    /// Deterministic sorted batches before the regular schedule
    pub warmup_iterations: usize,

    /// Options of the regular (post-warmup) schedule
    pub schedule: ScheduleOptions,

    pub add_feature_dim:         bool,
    pub use_dynamic_array_sizes: bool,

    /// Seed for every shuffle; fresh entropy when absent
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            train_x_files:           vec![PathBuf::from("data/train/europarl-v7.fr-en.en")],
            train_t_files:           vec![PathBuf::from("data/train/europarl-v7.fr-en.fr")],
            alphabet_path:           None,
            max_symbols:             300,
            eos:                     Some('*'),
            sos:                     None,
            seq_len:                 300,
            batch_size:              32,
            warmup_iterations:       20,
            schedule:                ScheduleOptions { shuffle: true, ..ScheduleOptions::default() },
            add_feature_dim:         false,
            use_dynamic_array_sizes: false,
            seed:                    None,
        }
    }
}

impl PipelineConfig {
    /// Read a config from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&json)
            .with_context(|| format!("Malformed config '{}'", path.display()))?;
        Ok(cfg)
    }

    /// Write this config as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved pipeline config to '{}'", path.display());
        Ok(())
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.train_x_files.is_empty() {
            bail!("No source files configured");
        }
        if self.train_x_files.len() != self.train_t_files.len() {
            bail!(
                "Got {} source files but {} target files",
                self.train_x_files.len(),
                self.train_t_files.len()
            );
        }
        if self.seq_len < 3 {
            bail!("seq_len must be at least 3, got {}", self.seq_len);
        }
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.schedule.fuzziness == 0 {
            bail!("fuzziness must be at least 1");
        }
        Ok(())
    }

    pub fn batcher_config(&self) -> BatcherConfig {
        BatcherConfig {
            add_feature_dim:         self.add_feature_dim,
            use_dynamic_array_sizes: self.use_dynamic_array_sizes,
            // Lengths and masks count EOS only if the alphabet emits it
            add_eos_character:       self.eos.is_some(),
            ..BatcherConfig::new(self.batch_size, self.seq_len)
        }
    }

    /// Random generator for the schedules of this run.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        }
    }
}
