// ============================================================
// Layer 3 — TextBatch Domain Type
// ============================================================
// One materialized batch, ready for a training step.
//
// Every array has the number of samples in the batch as its
// first axis. Shapes with the default (fixed) sizing and
// seq_len = S:
//
//   x_encoded     [batch, S]      encoded source (+ EOS)
//   t_encoded     [batch, S]      encoded target (+ EOS)
//   t_encoded_go  [batch, S]      SOS + t_encoded[:, :-1]
//   x_spaces      [batch, S/4]    word-boundary positions in x
//   t_mask        [batch, S]      1 for every real target position
//   x_len         [batch]         source lengths
//   t_len         [batch]         target lengths
//   x_spaces_len  [batch]         entries used in each x_spaces row
//
// With feature-dim enabled each shape gains a trailing `1`.

use ndarray::ArrayD;

/// Field names, in the order `TextBatch::fields` returns them.
pub const FIELD_NAMES: [&str; 8] = [
    "x_encoded",
    "t_encoded",
    "t_encoded_go",
    "x_spaces",
    "t_mask",
    "x_len",
    "t_len",
    "x_spaces_len",
];

/// A batch of encoded parallel-text samples.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBatch {
    /// Number of samples in this batch (first-axis extent)
    pub batch_size: usize,

    pub x_encoded:    ArrayD<i32>,
    pub t_encoded:    ArrayD<i32>,
    pub t_encoded_go: ArrayD<i32>,
    pub x_spaces:     ArrayD<i32>,
    pub t_mask:       ArrayD<i32>,
    pub x_len:        ArrayD<i32>,
    pub t_len:        ArrayD<i32>,
    pub x_spaces_len: ArrayD<i32>,
}

impl TextBatch {
    /// Look a field up by name, e.g. `batch.get("t_mask")`.
    pub fn get(&self, name: &str) -> Option<&ArrayD<i32>> {
        match name {
            "x_encoded"    => Some(&self.x_encoded),
            "t_encoded"    => Some(&self.t_encoded),
            "t_encoded_go" => Some(&self.t_encoded_go),
            "x_spaces"     => Some(&self.x_spaces),
            "t_mask"       => Some(&self.t_mask),
            "x_len"        => Some(&self.x_len),
            "t_len"        => Some(&self.t_len),
            "x_spaces_len" => Some(&self.x_spaces_len),
            _              => None,
        }
    }

    /// All (name, array) pairs.
    pub fn fields(&self) -> Vec<(&'static str, &ArrayD<i32>)> {
        FIELD_NAMES
            .iter()
            .filter_map(|&name| self.get(name).map(|a| (name, a)))
            .collect()
    }

    /// Apply `f` to every array in place.
    pub(crate) fn map_arrays(self, f: impl Fn(ArrayD<i32>) -> ArrayD<i32>) -> Self {
        Self {
            batch_size:   self.batch_size,
            x_encoded:    f(self.x_encoded),
            t_encoded:    f(self.t_encoded),
            t_encoded_go: f(self.t_encoded_go),
            x_spaces:     f(self.x_spaces),
            t_mask:       f(self.t_mask),
            x_len:        f(self.x_len),
            t_len:        f(self.t_len),
            x_spaces_len: f(self.x_spaces_len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    fn tiny_batch() -> TextBatch {
        let two_d = Array2::<i32>::zeros((2, 4)).into_dyn();
        let one_d = Array1::<i32>::zeros(2).into_dyn();
        TextBatch {
            batch_size:   2,
            x_encoded:    two_d.clone(),
            t_encoded:    two_d.clone(),
            t_encoded_go: two_d.clone(),
            x_spaces:     Array2::<i32>::zeros((2, 1)).into_dyn(),
            t_mask:       two_d,
            x_len:        one_d.clone(),
            t_len:        one_d.clone(),
            x_spaces_len: one_d,
        }
    }

    #[test]
    fn test_get_known_and_unknown_fields() {
        let b = tiny_batch();
        assert_eq!(b.get("x_spaces").unwrap().shape(), &[2, 1]);
        assert!(b.get("nope").is_none());
    }

    #[test]
    fn test_fields_lists_every_name_once() {
        let b     = tiny_batch();
        let names: Vec<&str> = b.fields().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, FIELD_NAMES.to_vec());
    }
}
