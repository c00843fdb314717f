// ============================================================
// Layer 2 — AlphabetUseCase
// ============================================================
// Builds a character alphabet from a corpus and saves it, so
// later runs encode with exactly the same ids.

use anyhow::Result;
use std::path::PathBuf;

use crate::application::config::PipelineConfig;
use crate::data::loader::TextLoader;
use crate::infra::alphabet_store::{build_alphabet, AlphabetStore};

pub struct AlphabetUseCase {
    config: PipelineConfig,
    output: PathBuf,
}

impl AlphabetUseCase {
    pub fn new(config: PipelineConfig, output: impl Into<PathBuf>) -> Self {
        Self { config, output: output.into() }
    }

    /// Build and save the alphabet. Returns its vocabulary size.
    /// An existing file at the output path is overwritten.
    pub fn execute(&self) -> Result<usize> {
        let cfg = &self.config;
        cfg.validate()?;

        let loader   = TextLoader::new(&cfg.train_x_files, &cfg.train_t_files, cfg.seq_len)?;
        let alphabet = build_alphabet(loader.samples(), cfg.max_symbols, cfg.eos, cfg.sos);

        AlphabetStore::new(&self.output).save(&alphabet)?;
        Ok(alphabet.vocab_size())
    }
}
