// ============================================================
// Layer 4 — Sample Preprocessor
// ============================================================
// Cleans raw aligned sentence pairs before they are used.
//
// Steps (applied in order):
//   1. Strip leading/trailing whitespace on both sides
//   2. Drop pairs where either side has ≤ 1 character
//   3. Truncate both sides to `seq_len - 1` characters
//   4. Remove exact duplicate pairs (first occurrence wins)
//
// Step 2 has no upper bound: over-long sentences are cut by
// step 3 rather than rejected. The `- 1` leaves room for the
// EOS marker the alphabet appends.

use std::collections::HashSet;

use crate::domain::sample::Sample;

/// Lengths reported after a preprocessing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreprocessReport {
    /// Pairs handed to the preprocessor
    pub before: usize,
    /// Pairs left after filtering, truncation, and dedup
    pub after: usize,
}

impl PreprocessReport {
    /// Percentage of pairs retained. `None` when nothing was read.
    pub fn retained_percent(&self) -> Option<f64> {
        if self.before == 0 {
            None
        } else {
            Some(self.after as f64 / self.before as f64 * 100.0)
        }
    }
}

pub struct Preprocessor {
    /// Maximum characters kept per side
    limit: usize,
}

impl Preprocessor {
    /// Create a Preprocessor for a target sequence length.
    ///
    /// # Panics
    /// Panics if `seq_len < 3`: no sample could keep more than
    /// one character per side after truncation.
    pub fn new(seq_len: usize) -> Self {
        assert!(seq_len >= 3, "seq_len ({}) must be at least 3", seq_len);
        Self { limit: seq_len - 1 }
    }

    /// Characters kept per side after truncation
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run every step on raw (source, target) lines.
    pub fn run<I, S, T>(&self, pairs: I) -> (Vec<Sample>, PreprocessReport)
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let stripped: Vec<Sample> = pairs
            .into_iter()
            .map(|(x, t)| Sample::new(x.as_ref().trim(), t.as_ref().trim()))
            .collect();
        let before = stripped.len();

        let kept      = filter_by_length(stripped, usize::MAX);
        let truncated = truncate_samples(kept, self.limit);
        let samples   = dedup_samples(truncated);

        let report = PreprocessReport { before, after: samples.len() };
        (samples, report)
    }
}

/// Keep pairs whose sides are both longer than one character
/// and shorter than `max_length`.
pub fn filter_by_length(samples: Vec<Sample>, max_length: usize) -> Vec<Sample> {
    let fits = |len: usize| len > 1 && len < max_length;
    samples
        .into_iter()
        .filter(|s| fits(s.source_len()) && fits(s.target_len()))
        .collect()
}

/// Cut both sides to at most `limit` characters.
pub fn truncate_samples(samples: Vec<Sample>, limit: usize) -> Vec<Sample> {
    samples
        .into_iter()
        .map(|s| Sample {
            source: truncate_chars(&s.source, limit),
            target: truncate_chars(&s.target, limit),
        })
        .collect()
}

/// Remove exact duplicates, keeping the first occurrence of each pair.
pub fn dedup_samples(samples: Vec<Sample>) -> Vec<Sample> {
    let mut seen = HashSet::with_capacity(samples.len());
    samples
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None                => text.to_string(),
    }
}
