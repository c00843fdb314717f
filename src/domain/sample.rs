// ============================================================
// Layer 3 — Sample Domain Type
// ============================================================
// One aligned sentence pair from the parallel corpus:
//   - source: the sentence the encoder reads   (x)
//   - target: the sentence the decoder produces (t)
//
// Lengths are always counted in characters (Unicode scalar
// values), never bytes, because every downstream array is
// indexed per character.

use serde::{Deserialize, Serialize};

/// An aligned (source, target) sentence pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sample {
    /// Source-side sentence
    pub source: String,

    /// Target-side sentence
    pub target: String,
}

impl Sample {
    /// Create a new Sample from anything string-like.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Number of characters in the source sentence
    pub fn source_len(&self) -> usize {
        self.source.chars().count()
    }

    /// Number of characters in the target sentence
    pub fn target_len(&self) -> usize {
        self.target.chars().count()
    }
}

impl<S: Into<String>, T: Into<String>> From<(S, T)> for Sample {
    fn from((source, target): (S, T)) -> Self {
        Self::new(source, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths_count_chars_not_bytes() {
        let s = Sample::new("héllo", "ça va");
        assert_eq!(s.source_len(), 5);
        assert_eq!(s.target_len(), 5);
    }

    #[test]
    fn test_from_tuple() {
        let s: Sample = ("hi there", "salut").into();
        assert_eq!(s.source, "hi there");
        assert_eq!(s.target, "salut");
    }
}
