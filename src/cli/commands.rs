// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `preview` and `build-alphabet`,
// and all their flags.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::config::PipelineConfig;
use crate::data::schedule::ScheduleOptions;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the batching pipeline for a number of batches and report on them
    Preview(PreviewArgs),

    /// Build a character alphabet from the corpus and save it as JSON
    BuildAlphabet(AlphabetArgs),
}

/// Corpus and shaping flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct CorpusArgs {
    /// JSON pipeline config; when given, the flags below are ignored
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Source-side files (comma separated)
    #[arg(long, value_delimiter = ',', default_value = "data/train/europarl-v7.fr-en.en")]
    pub x_files: Vec<PathBuf>,

    /// Target-side files, line-aligned with --x-files (comma separated)
    #[arg(long, value_delimiter = ',', default_value = "data/train/europarl-v7.fr-en.fr")]
    pub t_files: Vec<PathBuf>,

    /// Sequence length; sentences are cut to seq_len - 1 characters
    #[arg(long, default_value_t = 300)]
    pub seq_len: usize,

    /// Most frequent characters kept when building an alphabet
    #[arg(long, default_value_t = 300)]
    pub max_symbols: usize,

    /// End-of-sequence marker character
    #[arg(long, default_value_t = '*')]
    pub eos: char,
}

#[derive(Args, Debug)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// Maximum number of samples per batch
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Sorted, unshuffled batches before the regular schedule
    #[arg(long, default_value_t = 20)]
    pub warmup_iterations: usize,

    /// Batches to materialize
    #[arg(long, default_value_t = 200)]
    pub iterations: usize,

    /// Keep the regular schedule in corpus order
    #[arg(long)]
    pub no_shuffle: bool,

    /// Repeat the regular schedule forever
    #[arg(long)]
    pub repeat: bool,

    /// Length divisor for bucketing keys
    #[arg(long, default_value_t = 3)]
    pub fuzziness: usize,

    /// Sort by length before the first regular epoch
    #[arg(long)]
    pub sort: bool,

    /// Size arrays to the longest sample in each batch
    #[arg(long)]
    pub dynamic: bool,

    /// Add a trailing feature axis to every array
    #[arg(long)]
    pub feature_dim: bool,

    /// Seed for shuffling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Alphabet JSON (built from the corpus if missing)
    #[arg(long)]
    pub alphabet: Option<PathBuf>,

    /// Write per-batch packing statistics to this CSV file
    #[arg(long)]
    pub stats_csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct AlphabetArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// Where to write the alphabet JSON
    #[arg(long, default_value = "data/alphabet/alphabet.json")]
    pub output: PathBuf,
}

impl From<&CorpusArgs> for PipelineConfig {
    fn from(a: &CorpusArgs) -> Self {
        PipelineConfig {
            train_x_files: a.x_files.clone(),
            train_t_files: a.t_files.clone(),
            seq_len:       a.seq_len,
            max_symbols:   a.max_symbols,
            eos:           Some(a.eos),
            ..PipelineConfig::default()
        }
    }
}

/// Convert CLI PreviewArgs into the application-layer PipelineConfig.
impl From<&PreviewArgs> for PipelineConfig {
    fn from(a: &PreviewArgs) -> Self {
        PipelineConfig {
            alphabet_path:           a.alphabet.clone(),
            batch_size:              a.batch_size,
            warmup_iterations:       a.warmup_iterations,
            schedule: ScheduleOptions {
                shuffle:   !a.no_shuffle,
                repeat:    a.repeat,
                fuzziness: a.fuzziness,
                sort:      a.sort,
            },
            add_feature_dim:         a.feature_dim,
            use_dynamic_array_sizes: a.dynamic,
            seed:                    a.seed,
            ..PipelineConfig::from(&a.corpus)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_preview_args_into_config() {
        let cli = Cli::try_parse_from([
            "text-seq-batcher", "preview",
            "--x-files", "a.en,b.en",
            "--t-files", "a.fr,b.fr",
            "--batch-size", "8",
            "--no-shuffle",
            "--repeat",
            "--seed", "5",
        ])
        .unwrap();

        let Commands::Preview(args) = cli.command else {
            panic!("expected preview");
        };
        let cfg = PipelineConfig::from(&args);
        assert_eq!(cfg.train_x_files, vec![PathBuf::from("a.en"), PathBuf::from("b.en")]);
        assert_eq!(cfg.batch_size, 8);
        assert!(!cfg.schedule.shuffle);
        assert!(cfg.schedule.repeat);
        assert_eq!(cfg.seed, Some(5));
        assert_eq!(cfg.eos, Some('*'));
    }

    #[test]
    fn test_build_alphabet_defaults() {
        let cli = Cli::try_parse_from(["text-seq-batcher", "build-alphabet"]).unwrap();
        let Commands::BuildAlphabet(args) = cli.command else {
            panic!("expected build-alphabet");
        };
        assert_eq!(args.output, PathBuf::from("data/alphabet/alphabet.json"));
        assert_eq!(args.corpus.seq_len, 300);
    }
}
