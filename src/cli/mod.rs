// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Arguments are parsed
// with `clap`; all work is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `preview`        — run the batch pipeline and report on it
//   2. `build-alphabet` — build a character alphabet from the corpus

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{AlphabetArgs, Commands, CorpusArgs, PreviewArgs};

use crate::application::config::PipelineConfig;

#[derive(Parser, Debug)]
#[command(
    name = "text-seq-batcher",
    version = "0.1.0",
    about = "Load a parallel text corpus and stream length-bucketed training batches."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route the subcommand to its use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Preview(args)       => run_preview(args),
            Commands::BuildAlphabet(args) => run_build_alphabet(args),
        }
    }
}

/// A `--config` file wins over the individual flags.
fn resolve_config(corpus: &CorpusArgs, from_flags: PipelineConfig) -> Result<PipelineConfig> {
    match &corpus.config {
        Some(path) => {
            tracing::info!("Using pipeline config '{}'", path.display());
            PipelineConfig::from_file(path)
        }
        None => Ok(from_flags),
    }
}

/// Handles the `preview` subcommand.
/// Builds the config, runs the pipeline and prints the last batch's shapes.
fn run_preview(args: PreviewArgs) -> Result<()> {
    use crate::application::preview_use_case::PreviewUseCase;

    // Convert CLI args → application config
    let config = resolve_config(&args.corpus, PipelineConfig::from(&args))?;
    let summary = PreviewUseCase::new(config).execute(args.iterations, args.stats_csv.clone())?;

    // Presentation only: the use case already logged the x_len grid
    println!(
        "Materialized {} batches from {} samples.",
        summary.num_batches, summary.num_samples
    );
    if !summary.last_shapes.is_empty() {
        println!("Last batch:");
        for (name, shape) in &summary.last_shapes {
            println!("  {:<14} {:?}", name, shape);
        }
    }
    Ok(())
}

/// Handles the `build-alphabet` subcommand.
fn run_build_alphabet(args: AlphabetArgs) -> Result<()> {
    use crate::application::alphabet_use_case::AlphabetUseCase;

    let config = resolve_config(&args.corpus, PipelineConfig::from(&args.corpus))?;
    let size   = AlphabetUseCase::new(config, &args.output).execute()?;

    println!("Alphabet with {} ids saved to '{}'.", size, args.output.display());
    Ok(())
}
