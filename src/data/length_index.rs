// ============================================================
// Layer 4 — Length Index
// ============================================================
// Maps every sample to a composite sort key:
//
//   key = ((len(x) / fuzziness) << 14) + len(t) / fuzziness
//
// Source length sits in the high bits so it is the primary
// bucketing axis; target length only breaks ties. Dividing by
// `fuzziness` coarsens the key so samples of *similar* length
// compare equal, which lets a shuffle-then-stable-sort produce
// a different batch composition every epoch.

use crate::domain::sample::Sample;

/// Bits reserved for the target-length part of the key.
pub const TARGET_BITS: u32 = 14;

/// Sort key of a single sample.
///
/// # Panics
/// Panics if `fuzziness == 0`.
pub fn sort_key(sample: &Sample, fuzziness: usize) -> u64 {
    assert!(fuzziness >= 1, "fuzziness must be at least 1");
    let x = (sample.source_len() / fuzziness) as u64;
    let t = (sample.target_len() / fuzziness) as u64;
    (x << TARGET_BITS) + t
}

/// Sort keys for every sample, indexed like `samples`.
///
/// # Panics
/// Panics if `fuzziness == 0`.
pub fn length_keys(samples: &[Sample], fuzziness: usize) -> Vec<u64> {
    assert!(fuzziness >= 1, "fuzziness must be at least 1");
    samples.iter().map(|s| sort_key(s, fuzziness)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_length_dominates() {
        let long_x  = Sample::new("abcd", "ab");
        let long_t  = Sample::new("abc", "abcdefghij");
        assert!(sort_key(&long_x, 1) > sort_key(&long_t, 1));
    }

    #[test]
    fn test_key_layout() {
        let s = Sample::new("abcdefg", "abcde");
        assert_eq!(sort_key(&s, 1), (7 << 14) + 5);
        assert_eq!(sort_key(&s, 3), (2 << 14) + 1);
    }

    #[test]
    fn test_fuzziness_merges_nearby_lengths() {
        let a = Sample::new("abcdef", "xy");
        let b = Sample::new("abcdefgh", "xy");
        assert_ne!(sort_key(&a, 1), sort_key(&b, 1));
        assert_eq!(sort_key(&a, 3), sort_key(&b, 3));
    }

    #[test]
    fn test_length_keys_follow_sample_order() {
        let samples = vec![Sample::new("abc", "ab"), Sample::new("ab", "abc")];
        assert_eq!(length_keys(&samples, 1), vec![(3 << 14) + 2, (2 << 14) + 3]);
    }

    #[test]
    #[should_panic]
    fn test_zero_fuzziness_panics() {
        let _ = length_keys(&[Sample::new("ab", "ab")], 0);
    }
}
