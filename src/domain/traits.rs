// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The pipeline only talks to its collaborators through these
// traits:
//   - TextLoader     implements SampleSource (so does [Sample])
//   - CharAlphabet   implements Alphabet
//
// Any other corpus reader or encoding table can be dropped in
// by implementing the same trait.

use crate::domain::sample::Sample;

// ─── SampleSource ─────────────────────────────────────────────────────────────
/// Anything that owns a preprocessed, immutable list of samples.
///
/// Schedules and the batcher only ever borrow the slice.
pub trait SampleSource {
    /// All samples, in their final order.
    fn samples(&self) -> &[Sample];

    /// Number of samples available.
    fn num_samples(&self) -> usize {
        self.samples().len()
    }
}

impl SampleSource for [Sample] {
    fn samples(&self) -> &[Sample] {
        self
    }
}

// ─── Alphabet ─────────────────────────────────────────────────────────────────
/// A character → id encoding table.
///
/// Implementations:
///   - CharAlphabet → fixed symbol list, optionally appends EOS
pub trait Alphabet {
    /// Encode a sentence into integer ids.
    /// When the alphabet is configured with an EOS marker, the
    /// returned sequence ends with `eos_id()`.
    fn encode(&self, text: &str) -> Vec<i32>;

    /// Id written in front of decoder inputs.
    fn sos_id(&self) -> i32;

    /// Id appended by `encode`, if any.
    fn eos_id(&self) -> Option<i32>;
}

impl<A: Alphabet + ?Sized> Alphabet for &A {
    fn encode(&self, text: &str) -> Vec<i32> {
        (**self).encode(text)
    }

    fn sos_id(&self) -> i32 {
        (**self).sos_id()
    }

    fn eos_id(&self) -> Option<i32> {
        (**self).eos_id()
    }
}
