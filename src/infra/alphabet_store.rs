// ============================================================
// Layer 6 — Alphabet Store
// ============================================================
// Builds, saves, and loads character alphabets as JSON:
//
//   { "symbols": ["e", " ", "a", ...], "eos": "*", "sos": null }
//
// A new alphabet is built from corpus character frequencies,
// most frequent first, so the ids of common characters stay
// small and stable across runs over the same corpus.

use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::domain::sample::Sample;
use crate::infra::alphabet::{AlphabetFile, CharAlphabet};

pub struct AlphabetStore {
    path: PathBuf,
}

impl AlphabetStore {
    /// Store backed by the JSON file at `path` (need not exist yet).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the alphabet JSON
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved alphabet, or build one from `samples` and save it.
    pub fn load_or_build(
        &self,
        samples:     &[Sample],
        max_symbols: usize,
        eos:         Option<char>,
        sos:         Option<char>,
    ) -> Result<CharAlphabet> {
        if self.path.exists() {
            tracing::info!("Loading existing alphabet from '{}'", self.path.display());
            self.load()
        } else {
            tracing::info!("Building new alphabet (max_symbols={})", max_symbols);
            let alphabet = build_alphabet(samples, max_symbols, eos, sos);
            self.save(&alphabet)?;
            Ok(alphabet)
        }
    }

    /// Load a previously saved alphabet.
    pub fn load(&self) -> Result<CharAlphabet> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read alphabet '{}'", self.path.display()))?;
        let file: AlphabetFile = serde_json::from_str(&json)
            .with_context(|| format!("Malformed alphabet '{}'", self.path.display()))?;
        Ok(CharAlphabet::from_file(file))
    }

    /// Write `alphabet` as pretty JSON, creating parent directories.
    pub fn save(&self, alphabet: &CharAlphabet) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        }

        let json = serde_json::to_string_pretty(&alphabet.to_file())?;
        fs::write(&self.path, json)
            .with_context(|| format!("Cannot write alphabet '{}'", self.path.display()))?;

        tracing::info!(
            "Alphabet with {} ids saved to '{}'",
            alphabet.vocab_size(),
            self.path.display()
        );
        Ok(())
    }
}

/// Alphabet of the `max_symbols` most frequent characters on either
/// side of the corpus. Ties are broken by character order.
pub fn build_alphabet(
    samples:     &[Sample],
    max_symbols: usize,
    eos:         Option<char>,
    sos:         Option<char>,
) -> CharAlphabet {
    let mut freq: HashMap<char, usize> = HashMap::new();
    for s in samples {
        for c in s.source.chars().chain(s.target.chars()) {
            *freq.entry(c).or_insert(0) += 1;
        }
    }

    let mut chars: Vec<(char, usize)> = freq.into_iter().collect();
    chars.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    chars.truncate(max_symbols);

    CharAlphabet::new(chars.into_iter().map(|(c, _)| c), eos, sos)
}
