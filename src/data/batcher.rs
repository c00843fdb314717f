// ============================================================
// Layer 4 — Text Batcher
// ============================================================
// Turns a list of sample indices into a TextBatch.
//
// For a batch of N samples and seq_len S the fields are built
// like this (fixed sizing):
//
//   x_encoded     alphabet.encode(x)            → [N, S]
//   t_encoded     alphabet.encode(t)            → [N, S]
//   t_encoded_go  [SOS | t_encoded[:, :-1]]     → [N, S]
//   x_spaces      word-boundary positions of x  → [N, S/4]
//   t_mask        1 per target char (+ EOS)     → [N, S]
//   x_len, t_len  char count (+ EOS)            → [N]
//   x_spaces_len  entries in each x_spaces row  → [N]
//
// Word boundaries:
//   With EOS on, a space is appended to the sentence first. Every
//   space at position i contributes i-1 (the last char of the word
//   before it), and the final position is always added last:
//
//     "hi there" + " "  →  spaces at 2, 8  →  [1, 7, 8]
//
// With dynamic sizing the sequence axis of every 2D array fits
// the longest row in the batch instead of the fixed length.

use ndarray::{s, Array1, Array2, ArrayD, Axis};
use rand::rngs::StdRng;

use crate::data::loader::TextLoader;
use crate::data::packer::{packer_for, Packer};
use crate::data::schedule::{IndexBatches, ScheduleKind, ScheduleOptions};
use crate::domain::batch::TextBatch;
use crate::domain::sample::Sample;
use crate::domain::traits::{Alphabet, SampleSource};

/// Upper bound applied to the x_len / t_len vectors.
pub const LEN_CAP: usize = 100_000;

/// A lazily materialized stream of batches.
pub type TextBatches<'s> = Box<dyn Iterator<Item = TextBatch> + 's>;

// ─── BatcherConfig ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatcherConfig {
    /// Maximum number of samples per batch
    pub batch_size: usize,

    /// Fixed width of the sequence axis
    pub seq_len: usize,

    /// Give every array a trailing axis of length 1
    pub add_feature_dim: bool,

    /// Size the sequence axis to the longest row in each batch
    pub use_dynamic_array_sizes: bool,

    /// Count an EOS position in lengths, masks, and word boundaries.
    /// `TextBatcher::new` overrides it to match the alphabet.
    pub add_eos_character: bool,
}

impl BatcherConfig {
    pub fn new(batch_size: usize, seq_len: usize) -> Self {
        Self {
            batch_size,
            seq_len,
            add_feature_dim:         false,
            use_dynamic_array_sizes: false,
            add_eos_character:       true,
        }
    }

    /// Fixed width of the x_spaces array
    pub fn spaces_len(&self) -> usize {
        self.seq_len / 4
    }
}

// ─── TextBatcher ──────────────────────────────────────────────────────────────
/// Materializes index batches from a sample source into arrays.
///
/// `S` is usually a `TextLoader`; any `SampleSource` (even a plain
/// `[Sample]`) works.
pub struct TextBatcher<'a, A: Alphabet, S: SampleSource + ?Sized = TextLoader> {
    source:           &'a S,
    alphabet:         A,
    config:           BatcherConfig,
    schedule_options: ScheduleOptions,
    packer:           Box<dyn Packer>,
}

impl<'a, A: Alphabet, S: SampleSource + ?Sized> TextBatcher<'a, A, S> {
    /// `schedule_options` are used whenever the batcher builds its
    /// own schedule (`gen_batch_with`).
    ///
    /// Whether lengths, masks and word boundaries count an EOS
    /// position follows the alphabet: `add_eos_character` is set to
    /// `alphabet.eos_id().is_some()`.
    pub fn new(
        source:           &'a S,
        alphabet:         A,
        config:           BatcherConfig,
        schedule_options: ScheduleOptions,
    ) -> Self {
        let add_eos_character = alphabet.eos_id().is_some();
        if config.add_eos_character != add_eos_character {
            tracing::warn!(
                "add_eos_character={} does not match the alphabet; using {}",
                config.add_eos_character,
                add_eos_character
            );
        }
        let config = BatcherConfig { add_eos_character, ..config };

        Self {
            source,
            alphabet,
            config,
            schedule_options,
            packer: packer_for(config.use_dynamic_array_sizes),
        }
    }

    pub fn config(&self) -> &BatcherConfig {
        &self.config
    }

    pub fn alphabet(&self) -> &A {
        &self.alphabet
    }

    /// Samples are borrowed from here
    pub fn source(&self) -> &'a S {
        self.source
    }

    /// Build the batch for one list of sample indices.
    ///
    /// # Panics
    /// Panics if an index is out of range for the source.
    pub fn make_batch(&self, indices: &[usize]) -> TextBatch {
        let all = self.source.samples();
        let samples: Vec<&Sample> = indices.iter().map(|&i| &all[i]).collect();

        let eos        = self.config.add_eos_character;
        let seq_len    = self.config.seq_len;
        let spaces_len = self.config.spaces_len();

        // ── Per-sample rows ───────────────────────────────────────────────────
        let x_rows: Vec<Vec<i32>> = samples.iter().map(|s| self.alphabet.encode(&s.source)).collect();
        let t_rows: Vec<Vec<i32>> = samples.iter().map(|s| self.alphabet.encode(&s.target)).collect();
        let space_rows: Vec<Vec<i32>> = samples.iter().map(|s| word_boundaries(&s.source, eos)).collect();
        let mask_rows: Vec<Vec<i32>>  = samples.iter().map(|s| target_mask(&s.target, eos)).collect();

        // ── Packed arrays ─────────────────────────────────────────────────────
        let x_encoded    = self.packer.pack(&x_rows, seq_len);
        let t_encoded    = self.packer.pack(&t_rows, seq_len);
        let t_encoded_go = prepend_sos(&t_encoded, self.alphabet.sos_id());
        let x_spaces     = self.packer.pack(&space_rows, spaces_len);
        let t_mask       = self.packer.pack(&mask_rows, seq_len);

        // ── Length vectors ────────────────────────────────────────────────────
        let offset       = usize::from(eos);
        let x_len        = len_vec(samples.iter().map(|s| s.source_len()), offset, LEN_CAP);
        let t_len        = len_vec(samples.iter().map(|s| s.target_len()), offset, LEN_CAP);
        let x_spaces_len = len_vec(space_rows.iter().map(Vec::len), 0, spaces_len);

        let batch = TextBatch {
            batch_size:   indices.len(),
            x_encoded:    x_encoded.into_dyn(),
            t_encoded:    t_encoded.into_dyn(),
            t_encoded_go: t_encoded_go.into_dyn(),
            x_spaces:     x_spaces.into_dyn(),
            t_mask:       t_mask.into_dyn(),
            x_len:        x_len.into_dyn(),
            t_len:        t_len.into_dyn(),
            x_spaces_len: x_spaces_len.into_dyn(),
        };

        if self.config.add_feature_dim {
            batch.map_arrays(add_feature_axis)
        } else {
            batch
        }
    }

    /// Lazily materialize every index batch `schedule` yields.
    pub fn gen_batch<'s>(&'s self, schedule: IndexBatches<'s>) -> TextBatches<'s> {
        Box::new(schedule.map(move |indices| self.make_batch(&indices)))
    }

    /// Build a schedule of the given kind over this batcher's source,
    /// using the stored schedule options, and materialize it lazily.
    pub fn gen_batch_with(&self, kind: ScheduleKind, rng: StdRng) -> TextBatches<'_> {
        tracing::debug!(
            "Building {:?} schedule over {} samples",
            kind,
            self.source.num_samples()
        );
        let schedule = kind.build(
            self.source.samples(),
            self.config.batch_size,
            self.schedule_options,
            rng,
        );
        self.gen_batch(schedule)
    }
}

// ─── Row builders ─────────────────────────────────────────────────────────────

/// Positions that end a word, plus the final position.
pub fn word_boundaries(sentence: &str, add_eos: bool) -> Vec<i32> {
    let mut chars: Vec<char> = sentence.chars().collect();
    if add_eos {
        // EOS counts as a trailing space
        chars.push(' ');
    }

    let mut out: Vec<i32> = chars
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c == ' ')
        .map(|(i, _)| i as i32 - 1)
        .collect();
    out.push(chars.len() as i32 - 1);
    out
}

/// One `1` per target character, plus one for EOS.
pub fn target_mask(sentence: &str, add_eos: bool) -> Vec<i32> {
    vec![1; sentence.chars().count() + usize::from(add_eos)]
}

fn len_vec(lengths: impl Iterator<Item = usize>, offset: usize, cap: usize) -> Array1<i32> {
    lengths.map(|len| (len + offset).min(cap) as i32).collect()
}

/// `[sos | array[:, :-1]]`, same shape as `array`.
fn prepend_sos(array: &Array2<i32>, sos_id: i32) -> Array2<i32> {
    let width   = array.ncols();
    let mut out = Array2::<i32>::zeros((array.nrows(), width));
    if width == 0 {
        return out;
    }
    out.column_mut(0).fill(sos_id);
    out.slice_mut(s![.., 1..]).assign(&array.slice(s![.., ..width - 1]));
    out
}

fn add_feature_axis(array: ArrayD<i32>) -> ArrayD<i32> {
    let last = array.ndim();
    array.insert_axis(Axis(last))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::alphabet::CharAlphabet;
    use ndarray::{array, Ix1, Ix2};
    use rand::SeedableRng;

    fn alphabet() -> CharAlphabet {
        CharAlphabet::ascii(Some('*'), None)
    }

    fn loader(pairs: &[(&str, &str)], seq_len: usize) -> TextLoader {
        TextLoader::from_pairs(pairs.iter().copied(), seq_len).unwrap()
    }

    fn two_d(a: &ArrayD<i32>) -> Array2<i32> {
        a.clone().into_dimensionality::<Ix2>().unwrap()
    }

    fn one_d(a: &ArrayD<i32>) -> Array1<i32> {
        a.clone().into_dimensionality::<Ix1>().unwrap()
    }

    #[test]
    fn test_word_boundaries() {
        assert_eq!(word_boundaries("hi there", true), vec![1, 7, 8]);
        assert_eq!(word_boundaries("hi there", false), vec![1, 7]);
        assert_eq!(word_boundaries("hello", true), vec![4, 5]);
    }

    #[test]
    fn test_target_mask() {
        assert_eq!(target_mask("abc", true), vec![1, 1, 1, 1]);
        assert_eq!(target_mask("abc", false), vec![1, 1, 1]);
    }

    #[test]
    fn test_prepend_sos() {
        let a = array![[5, 6, 7], [8, 9, 0]];
        assert_eq!(prepend_sos(&a, 2), array![[2, 5, 6], [2, 8, 9]]);
    }

    #[test]
    fn test_prepend_sos_keeps_zero_width() {
        let a = Array2::<i32>::zeros((3, 0));
        assert_eq!(prepend_sos(&a, 2).shape(), &[3, 0]);
    }

    #[test]
    fn test_hi_there_scenario() {
        let loader  = loader(&[("hi there", "salut")], 10);
        let batcher = TextBatcher::new(&loader, alphabet(), BatcherConfig::new(4, 10), ScheduleOptions::default());

        let batches: Vec<TextBatch> = batcher.gen_batch_with(ScheduleKind::Bucket, StdRng::seed_from_u64(0)).collect();
        assert_eq!(batches.len(), 1);

        let b = &batches[0];
        assert_eq!(b.batch_size, 1);
        assert_eq!(one_d(&b.x_len), array![9]);
        assert_eq!(one_d(&b.t_len), array![6]);
        assert_eq!(b.x_encoded.shape(), &[1, 10]);
        assert_eq!(b.x_spaces.shape(), &[1, 2]);
        // [1, 7, 8] cut to the x_spaces width of 10 / 4 = 2
        assert_eq!(two_d(&b.x_spaces), array![[1, 7]]);
        assert_eq!(one_d(&b.x_spaces_len), array![2]);
    }

    #[test]
    fn test_encoded_rows_are_zero_padded() {
        let loader  = loader(&[("ab", "cd")], 6);
        let a       = alphabet();
        let batcher = TextBatcher::new(&loader, &a, BatcherConfig::new(2, 6), ScheduleOptions::default());
        let b       = batcher.make_batch(&[0]);

        let expected = array![[a.id_of('a'), a.id_of('b'), a.id_of('*'), 0, 0, 0]];
        assert_eq!(two_d(&b.x_encoded), expected);
    }

    #[test]
    fn test_shift_matches_target() {
        let loader  = loader(&[("one two", "un deux"), ("three", "trois quatre")], 16);
        let a       = alphabet();
        let batcher = TextBatcher::new(&loader, &a, BatcherConfig::new(2, 16), ScheduleOptions::default());
        let b       = batcher.make_batch(&[0, 1]);

        let t  = two_d(&b.t_encoded);
        let go = two_d(&b.t_encoded_go);
        assert!(go.column(0).iter().all(|&v| v == a.sos_id()));
        assert_eq!(go.slice(s![.., 1..]), t.slice(s![.., ..-1]));
    }

    #[test]
    fn test_mask_length_matches_adjusted_length() {
        let loader  = loader(&[("abc", "abcdefgh"), ("xyz", "ab")], 9);
        let batcher = TextBatcher::new(&loader, alphabet(), BatcherConfig::new(2, 9), ScheduleOptions::default());
        let b       = batcher.make_batch(&[0, 1]);
        let mask    = two_d(&b.t_mask);

        for (row, sample) in mask.outer_iter().zip(loader.samples()) {
            let ones = sample.target_len() + 1;
            let ones = ones.min(9);
            assert!(row.iter().take(ones).all(|&v| v == 1));
            assert!(row.iter().skip(ones).all(|&v| v == 0));
        }
    }

    #[test]
    fn test_make_batch_is_idempotent() {
        let loader  = loader(&[("hello world", "bonjour"), ("good day", "bonne journee")], 20);
        let batcher = TextBatcher::new(&loader, alphabet(), BatcherConfig::new(2, 20), ScheduleOptions::default());
        assert_eq!(batcher.make_batch(&[1, 0]), batcher.make_batch(&[1, 0]));
    }

    #[test]
    fn test_dynamic_sizes_fit_longest_row() {
        let loader = loader(&[("ab cd", "xyz"), ("abcdefg", "xy")], 50);
        let config = BatcherConfig { use_dynamic_array_sizes: true, ..BatcherConfig::new(2, 50) };
        let b      = TextBatcher::new(&loader, alphabet(), config, ScheduleOptions::default()).make_batch(&[0, 1]);

        // longest source "abcdefg" + EOS
        assert_eq!(b.x_encoded.shape(), &[2, 8]);
        assert_eq!(b.t_encoded.shape(), &[2, 4]);
        assert_eq!(b.t_encoded_go.shape(), &[2, 4]);
        assert_eq!(b.t_mask.shape(), &[2, 4]);
        // "ab cd" → [1, 4, 5]
        assert_eq!(b.x_spaces.shape(), &[2, 3]);
    }

    #[test]
    fn test_feature_dim_adds_trailing_axis() {
        let loader = loader(&[("ab", "cd"), ("ef", "gh")], 8);
        let config = BatcherConfig { add_feature_dim: true, ..BatcherConfig::new(2, 8) };
        let b      = TextBatcher::new(&loader, alphabet(), config, ScheduleOptions::default()).make_batch(&[0, 1]);

        assert_eq!(b.x_encoded.shape(), &[2, 8, 1]);
        assert_eq!(b.x_spaces.shape(), &[2, 2, 1]);
        assert_eq!(b.x_len.shape(), &[2, 1]);
        assert_eq!(b.x_spaces_len.shape(), &[2, 1]);
    }

    #[test]
    fn test_without_eos_character() {
        let loader = loader(&[("hi there", "salut")], 10);
        let config = BatcherConfig::new(1, 10);
        let b      = TextBatcher::new(&loader, CharAlphabet::ascii(None, None), config, ScheduleOptions::default())
            .make_batch(&[0]);
        assert_eq!(one_d(&b.x_len), array![8]);
        assert_eq!(one_d(&b.t_len), array![5]);
        assert_eq!(two_d(&b.t_mask).sum(), 5);
        assert_eq!(two_d(&b.x_spaces), array![[1, 7]]);
    }

    #[test]
    fn test_lengths_agree_with_encoded_rows_without_eos() {
        let loader  = loader(&[("hi there", "salut"), ("ok then", "bon")], 10);
        let batcher = TextBatcher::new(
            &loader,
            CharAlphabet::ascii(None, None),
            BatcherConfig::new(2, 10),
            ScheduleOptions::default(),
        );
        assert!(!batcher.config().add_eos_character);

        let b = batcher.make_batch(&[0, 1]);
        let x = two_d(&b.x_encoded);
        let t = two_d(&b.t_encoded);
        let m = two_d(&b.t_mask);
        for i in 0..2 {
            let x_ids = x.row(i).iter().filter(|&&v| v != 0).count() as i32;
            let t_ids = t.row(i).iter().filter(|&&v| v != 0).count() as i32;
            assert_eq!(one_d(&b.x_len)[i], x_ids);
            assert_eq!(one_d(&b.t_len)[i], t_ids);
            assert_eq!(m.row(i).sum(), t_ids);
        }
    }

    #[test]
    fn test_eos_setting_follows_alphabet() {
        let loader = loader(&[("ab", "cd")], 6);

        // Config says no EOS, but the alphabet appends one
        let config  = BatcherConfig { add_eos_character: false, ..BatcherConfig::new(1, 6) };
        let batcher = TextBatcher::new(&loader, alphabet(), config, ScheduleOptions::default());
        assert!(batcher.config().add_eos_character);
        assert_eq!(one_d(&batcher.make_batch(&[0]).x_len), array![3]);
    }

    #[test]
    fn test_slice_as_sample_source() {
        let samples = vec![Sample::new("ab", "cd"), Sample::new("abc", "cde")];
        let batcher = TextBatcher::new(
            samples.as_slice(),
            alphabet(),
            BatcherConfig::new(2, 6),
            ScheduleOptions::default(),
        );
        assert_eq!(batcher.source().num_samples(), 2);

        let batches: Vec<TextBatch> = batcher
            .gen_batch_with(ScheduleKind::Bucket, StdRng::seed_from_u64(0))
            .collect();
        assert_eq!(batches.len(), 1);
        assert_eq!(one_d(&batches[0].x_len), array![3, 4]);
    }

    #[test]
    fn test_empty_index_list_with_dynamic_sizes() {
        let loader = loader(&[("ab", "cd")], 6);
        let config = BatcherConfig { use_dynamic_array_sizes: true, ..BatcherConfig::new(1, 6) };
        let b      = TextBatcher::new(&loader, alphabet(), config, ScheduleOptions::default()).make_batch(&[]);

        assert_eq!(b.batch_size, 0);
        assert_eq!(b.t_encoded.shape(), &[0, 0]);
        assert_eq!(b.t_encoded_go.shape(), b.t_encoded.shape());
    }

    #[test]
    fn test_warmup_driven_batches() {
        let pairs: Vec<(String, String)> = (0..10)
            .map(|i| (format!("src {}", "a".repeat(i + 1)), format!("tgt{i}")))
            .collect();
        let loader  = TextLoader::from_pairs(pairs, 30).unwrap();
        let batcher = TextBatcher::new(&loader, alphabet(), BatcherConfig::new(5, 30), ScheduleOptions::training());

        let batches: Vec<TextBatch> = batcher
            .gen_batch_with(ScheduleKind::Warmup { warmup_iterations: 2 }, StdRng::seed_from_u64(3))
            .take(6)
            .collect();
        assert_eq!(batches.len(), 6);
        assert!(batches.iter().all(|b| b.batch_size == 5));

        // Warmup is sorted: the first batch holds the five shortest sources
        let first = one_d(&batches[0].x_len);
        let second = one_d(&batches[1].x_len);
        assert!(first.iter().max() <= second.iter().min());
    }
}
