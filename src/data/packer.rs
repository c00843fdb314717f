// ============================================================
// Layer 4 — Array Packers
// ============================================================
// A packer copies variable-length rows into a zero-padded 2D
// array of shape [rows, width]:
//
//   rows:  [3, 9, 4]        width 5 → [[3, 9, 4, 0, 0],
//          [7, 1, 1, 2, 8, 6]          [7, 1, 1, 2, 8]]
//
// Rows longer than the width are cut on the right; shorter
// rows are padded with 0.
//
// Two strategies decide the width:
//
//   FixedPacker    — the field's configured max length
//   DynamicPacker  — the longest row actually in this batch
//                    (needs a pass over the rows first)

use ndarray::Array2;

/// Strategy for choosing the sequence-axis width of a batch array.
pub trait Packer {
    /// Width of the packed array for these rows, given the field's
    /// configured maximum.
    fn width(&self, rows: &[Vec<i32>], max_len: usize) -> usize;

    /// Pack `rows` into a zero-initialised `[rows.len(), width]` array.
    fn pack(&self, rows: &[Vec<i32>], max_len: usize) -> Array2<i32> {
        let width     = self.width(rows, max_len);
        let mut array = Array2::<i32>::zeros((rows.len(), width));

        for (mut out, row) in array.outer_iter_mut().zip(rows) {
            let len = row.len().min(width);
            for (dst, &src) in out.iter_mut().zip(&row[..len]) {
                *dst = src;
            }
        }

        array
    }
}

/// Every batch has the same width: the configured maximum.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPacker;

impl Packer for FixedPacker {
    fn width(&self, _rows: &[Vec<i32>], max_len: usize) -> usize {
        max_len
    }
}

/// Width follows the longest row in the batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicPacker;

impl Packer for DynamicPacker {
    fn width(&self, rows: &[Vec<i32>], _max_len: usize) -> usize {
        longest(rows)
    }
}

fn longest(rows: &[Vec<i32>]) -> usize {
    rows.iter().map(Vec::len).max().unwrap_or(0)
}

/// Pick the packer for a sizing mode.
pub fn packer_for(use_dynamic_array_sizes: bool) -> Box<dyn Packer> {
    if use_dynamic_array_sizes {
        Box::new(DynamicPacker)
    } else {
        Box::new(FixedPacker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fixed_pads_and_truncates() {
        let rows = vec![vec![3, 9, 4], vec![7, 1, 1, 2, 8, 6]];
        let out  = FixedPacker.pack(&rows, 5);
        assert_eq!(out, array![[3, 9, 4, 0, 0], [7, 1, 1, 2, 8]]);
    }

    #[test]
    fn test_dynamic_fits_longest_row() {
        let rows = vec![vec![1, 2], vec![5, 6, 7]];
        let out  = DynamicPacker.pack(&rows, 100);
        assert_eq!(out, array![[1, 2, 0], [5, 6, 7]]);
    }

    #[test]
    fn test_empty_rows() {
        let out = DynamicPacker.pack(&[], 10);
        assert_eq!(out.shape(), &[0, 0]);
        assert_eq!(FixedPacker.pack(&[], 10).shape(), &[0, 10]);
    }

    #[test]
    fn test_packer_for() {
        let rows = vec![vec![1, 2]];
        assert_eq!(packer_for(true).pack(&rows, 4).shape(), &[1, 2]);
        assert_eq!(packer_for(false).pack(&rows, 4).shape(), &[1, 4]);
    }
}
