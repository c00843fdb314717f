// ============================================================
// Layer 4 — Parallel Text Loader
// ============================================================
// Reads line-aligned source/target files and turns them into
// the final, immutable sample list.
//
// File layout expected:
//   paths_x[k]  — one source sentence per line
//   paths_t[k]  — the matching target sentence on the same line
//
// Multiple path pairs are concatenated in order before pairing,
// so line i of the joined source stream goes with line i of the
// joined target stream.
//
// All I/O happens here, once, at construction time. Nothing
// downstream touches the disk.

use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::preprocessor::Preprocessor;
use crate::domain::sample::Sample;
use crate::domain::traits::SampleSource;

/// Owns the preprocessed samples of one parallel corpus.
#[derive(Debug, Clone)]
pub struct TextLoader {
    paths_x: Vec<PathBuf>,
    paths_t: Vec<PathBuf>,
    seq_len: usize,
    samples: Vec<Sample>,
}

impl TextLoader {
    /// Load and preprocess a parallel corpus.
    ///
    /// Fails if the path lists differ in length, `seq_len < 3`,
    /// a file cannot be read, or no sample survives filtering.
    pub fn new<P: AsRef<Path>>(paths_x: &[P], paths_t: &[P], seq_len: usize) -> Result<Self> {
        if paths_x.len() != paths_t.len() {
            bail!(
                "Got {} source files but {} target files",
                paths_x.len(),
                paths_t.len()
            );
        }
        check_seq_len(seq_len)?;

        let mut data_x: Vec<String> = Vec::new();
        let mut data_t: Vec<String> = Vec::new();

        for (path_x, path_t) in paths_x.iter().zip(paths_t) {
            tracing::info!("Loading X data ({})", path_x.as_ref().display());
            data_x.extend(read_lines(path_x.as_ref())?);

            tracing::info!("Loading t data ({})", path_t.as_ref().display());
            data_t.extend(read_lines(path_t.as_ref())?);
        }

        if data_x.len() != data_t.len() {
            tracing::warn!(
                "Source has {} lines but target has {}; extra lines are ignored",
                data_x.len(),
                data_t.len()
            );
        }

        let samples = preprocess(data_x.into_iter().zip(data_t), seq_len)?;

        Ok(Self {
            paths_x: paths_x.iter().map(|p| p.as_ref().to_path_buf()).collect(),
            paths_t: paths_t.iter().map(|p| p.as_ref().to_path_buf()).collect(),
            seq_len,
            samples,
        })
    }

    /// Build a loader from in-memory pairs, with the same preprocessing
    /// as `new`.
    pub fn from_pairs<I, S, T>(pairs: I, seq_len: usize) -> Result<Self>
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        check_seq_len(seq_len)?;
        let samples = preprocess(pairs, seq_len)?;
        Ok(Self {
            paths_x: Vec::new(),
            paths_t: Vec::new(),
            seq_len,
            samples,
        })
    }

    /// Preprocessed samples, in corpus order
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Sample at `index`, if any
    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    /// Number of samples that survived preprocessing
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sequence length the samples were truncated for
    /// (every side is at most `seq_len - 1` characters)
    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn paths_x(&self) -> &[PathBuf] {
        &self.paths_x
    }

    pub fn paths_t(&self) -> &[PathBuf] {
        &self.paths_t
    }
}

impl SampleSource for TextLoader {
    fn samples(&self) -> &[Sample] {
        &self.samples
    }
}

/// Room for at least two characters plus EOS.
fn check_seq_len(seq_len: usize) -> Result<()> {
    if seq_len < 3 {
        bail!("seq_len must be at least 3, got {}", seq_len);
    }
    Ok(())
}

/// Every line of `path`; a trailing newline yields one empty line,
/// which preprocessing drops.
fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    Ok(text.split('\n').map(str::to_string).collect())
}

/// Run the preprocessor and log how much of the corpus survived.
fn preprocess<I, S, T>(pairs: I, seq_len: usize) -> Result<Vec<Sample>>
where
    I: IntoIterator<Item = (S, T)>,
    S: AsRef<str>,
    T: AsRef<str>,
{
    tracing::info!("Removing very long and very short samples ...");
    let (samples, report) = Preprocessor::new(seq_len).run(pairs);

    if samples.is_empty() {
        bail!(
            "No samples left after filtering ({} pairs read)",
            report.before
        );
    }

    // before > 0 here, since after > 0
    let pct = report.retained_percent().unwrap_or(0.0);
    tracing::info!(
        "{} of {} ({:.2}%) samples remaining",
        report.after,
        report.before,
        pct
    );

    Ok(samples)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn write_file(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_loads_and_pairs_lines() {
        let dir = TempDir::new().unwrap();
        let x   = write_file(&dir, "x.txt", "hello there\n  good day \nz\n");
        let t   = write_file(&dir, "t.txt", "salut\nbonjour\nzz\n");

        let loader = TextLoader::new(&[x], &[t], 20).unwrap();
        assert_eq!(
            loader.samples(),
            &[Sample::new("hello there", "salut"), Sample::new("good day", "bonjour")]
        );
    }

    #[test]
    fn test_concatenates_multiple_files() {
        let dir = TempDir::new().unwrap();
        let x1  = write_file(&dir, "x1.txt", "aa\nbb");
        let t1  = write_file(&dir, "t1.txt", "AA\nBB");
        let x2  = write_file(&dir, "x2.txt", "cc");
        let t2  = write_file(&dir, "t2.txt", "CC");

        let loader = TextLoader::new(&[x1, x2], &[t1, t2], 10).unwrap();
        let sources: Vec<&str> = loader.samples().iter().map(|s| s.source.as_str()).collect();
        assert_eq!(sources, vec!["aa", "bb", "cc"]);
        assert_eq!(loader.get(2).unwrap().target, "CC");
    }

    #[test]
    fn test_samples_respect_length_invariant() {
        let mut fx = NamedTempFile::new().unwrap();
        let mut ft = NamedTempFile::new().unwrap();
        writeln!(fx, "a very long source sentence indeed\nok\nab").unwrap();
        writeln!(ft, "short\nno\nanother rather long target").unwrap();

        let seq_len = 8;
        let loader  = TextLoader::new(&[fx.path()], &[ft.path()], seq_len).unwrap();
        for s in loader.samples() {
            assert!(s.source_len() > 1 && s.source_len() <= seq_len - 1);
            assert!(s.target_len() > 1 && s.target_len() <= seq_len - 1);
        }
        assert_eq!(loader.len(), 3);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let t   = write_file(&dir, "t.txt", "salut");
        let err = TextLoader::new(&[dir.path().join("nope.txt")], &[t], 10).unwrap_err();
        assert!(err.to_string().contains("nope.txt"));
    }

    #[test]
    fn test_mismatched_path_lists() {
        let dir = TempDir::new().unwrap();
        let x   = write_file(&dir, "x.txt", "hello");
        assert!(TextLoader::new(&[x.clone(), x], &[dir.path().join("t")], 10).is_err());
    }

    #[test]
    fn test_empty_corpus_is_an_error() {
        let err = TextLoader::from_pairs(vec![("a", "b"), ("", "")], 10).unwrap_err();
        assert!(err.to_string().contains("No samples left"));
    }

    #[test]
    fn test_seq_len_too_small_is_an_error() {
        assert!(TextLoader::from_pairs(vec![("hello", "salut")], 2).is_err());
    }
}
