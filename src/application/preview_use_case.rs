// ============================================================
// Layer 2 — PreviewUseCase
// ============================================================
// Runs the full pipeline for a fixed number of batches so a
// corpus + config can be inspected before training:
//
//   Step 1: Load and preprocess the corpus   (Layer 4 - data)
//   Step 2: Load / build the alphabet        (Layer 6 - infra)
//   Step 3: Warmup-composed schedule         (Layer 4 - data)
//   Step 4: Materialize batches              (Layer 4 - data)
//   Step 5: Log per-batch statistics         (Layer 6 - infra)

use anyhow::Result;
use std::path::PathBuf;

use crate::application::config::PipelineConfig;
use crate::data::{batcher::TextBatcher, loader::TextLoader, schedule::ScheduleKind};
use crate::infra::{
    alphabet::CharAlphabet,
    alphabet_store::{build_alphabet, AlphabetStore},
    metrics::{BatchStats, BatchStatsLogger},
};

/// What a preview run produced.
#[derive(Debug, Clone)]
pub struct PreviewSummary {
    /// Samples left after preprocessing
    pub num_samples: usize,

    /// Batches materialized
    pub num_batches: usize,

    /// First x_len of every batch, in order
    pub first_x_lens: Vec<i32>,

    /// (field, shape) of the last batch
    pub last_shapes: Vec<(String, Vec<usize>)>,
}

pub struct PreviewUseCase {
    config: PipelineConfig,
}

impl PreviewUseCase {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Pull `iterations` batches (fewer if the schedule ends first).
    pub fn execute(&self, iterations: usize, stats_csv: Option<PathBuf>) -> Result<PreviewSummary> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Corpus ────────────────────────────────────────────────────
        let loader = TextLoader::new(&cfg.train_x_files, &cfg.train_t_files, cfg.seq_len)?;
        tracing::info!("Loaded {} samples", loader.len());

        // ── Step 2: Alphabet ──────────────────────────────────────────────────
        let alphabet = load_alphabet(cfg, &loader)?;

        // ── Step 3 + 4: Schedule → batches ────────────────────────────────────
        let batcher  = TextBatcher::new(&loader, alphabet, cfg.batcher_config(), cfg.schedule);
        let schedule = ScheduleKind::Warmup { warmup_iterations: cfg.warmup_iterations };
        tracing::info!(
            "Running warmup for {} iterations, then the regular schedule ({:?})",
            cfg.warmup_iterations,
            cfg.schedule
        );

        let logger = stats_csv.map(BatchStatsLogger::new).transpose()?;

        let mut first_x_lens = Vec::new();
        let mut last_shapes  = Vec::new();
        let mut line         = String::new();

        for (i, batch) in batcher.gen_batch_with(schedule, cfg.rng()).take(iterations).enumerate() {
            let first = batch.x_len.iter().next().copied().unwrap_or(0);
            first_x_lens.push(first);

            // Five values per row, one block every twenty batches
            line.push_str(&first.to_string());
            line.push(if i % 5 == 4 { '\n' } else { '\t' });
            if i % 20 == 19 {
                tracing::info!("x_len[0] of batches {}..={}:\n{}", i - 19, i, line);
                line.clear();
            }

            // ── Step 5: Stats ─────────────────────────────────────────────────
            if let Some(logger) = &logger {
                logger.log(&BatchStats::from_batch(i, &batch))?;
            }

            last_shapes = batch
                .fields()
                .into_iter()
                .map(|(name, array)| (name.to_string(), array.shape().to_vec()))
                .collect();
        }

        if !line.is_empty() {
            tracing::info!("x_len[0] of the remaining batches:\n{}", line);
        }

        Ok(PreviewSummary {
            num_samples: loader.len(),
            num_batches: first_x_lens.len(),
            first_x_lens,
            last_shapes,
        })
    }
}

/// Alphabet from `alphabet_path` (built and saved if missing), or
/// built in memory from the corpus when no path is configured.
fn load_alphabet(cfg: &PipelineConfig, loader: &TextLoader) -> Result<CharAlphabet> {
    match &cfg.alphabet_path {
        Some(path) => AlphabetStore::new(path).load_or_build(
            loader.samples(),
            cfg.max_symbols,
            cfg.eos,
            cfg.sos,
        ),
        None => Ok(build_alphabet(loader.samples(), cfg.max_symbols, cfg.eos, cfg.sos)),
    }
}
