// ============================================================
// Layer 6 — Character Alphabet
// ============================================================
// Maps characters to integer ids. Id layout:
//
//   0        padding (never produced by encode)
//   1        unknown character
//   2        default start-of-sequence (GO) id
//   3 ..     one id per symbol, in symbol-list order
//
// Optional markers:
//   eos — a character whose id `encode` appends to every sentence
//   sos — a character whose id is used as `sos_id`; without it
//         the reserved GO id is used
//
// Marker characters are added to the symbol list if missing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::traits::Alphabet;

pub const PAD_ID: i32 = 0;
pub const UNK_ID: i32 = 1;
pub const GO_ID: i32 = 2;
const FIRST_SYMBOL_ID: i32 = 3;

/// Serialisable description of an alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlphabetFile {
    pub symbols: Vec<char>,
    #[serde(default)]
    pub eos: Option<char>,
    #[serde(default)]
    pub sos: Option<char>,
}

/// Character-level encoding table.
#[derive(Debug, Clone)]
pub struct CharAlphabet {
    symbols: Vec<char>,
    lookup:  HashMap<char, i32>,
    eos:     Option<char>,
    sos:     Option<char>,
}

impl CharAlphabet {
    /// Build an alphabet from a symbol list. Duplicate symbols keep
    /// their first id.
    pub fn new(symbols: impl IntoIterator<Item = char>, eos: Option<char>, sos: Option<char>) -> Self {
        let mut alphabet = Self {
            symbols: Vec::new(),
            lookup:  HashMap::new(),
            eos,
            sos,
        };
        for c in symbols.into_iter().chain(eos).chain(sos) {
            alphabet.push_symbol(c);
        }
        alphabet
    }

    /// Printable ASCII (space through `~`).
    pub fn ascii(eos: Option<char>, sos: Option<char>) -> Self {
        Self::new((b' '..=b'~').map(char::from), eos, sos)
    }

    pub fn from_file(file: AlphabetFile) -> Self {
        Self::new(file.symbols, file.eos, file.sos)
    }

    pub fn to_file(&self) -> AlphabetFile {
        AlphabetFile {
            symbols: self.symbols.clone(),
            eos:     self.eos,
            sos:     self.sos,
        }
    }

    fn push_symbol(&mut self, c: char) {
        if !self.lookup.contains_key(&c) {
            let id = FIRST_SYMBOL_ID + self.symbols.len() as i32;
            self.lookup.insert(c, id);
            self.symbols.push(c);
        }
    }

    /// Id of a single character (UNK if absent).
    pub fn id_of(&self, c: char) -> i32 {
        self.lookup.get(&c).copied().unwrap_or(UNK_ID)
    }

    /// Total number of ids, reserved ones included.
    pub fn vocab_size(&self) -> usize {
        FIRST_SYMBOL_ID as usize + self.symbols.len()
    }

    /// Turn ids back into text. Padding is skipped, unknown ids
    /// become `?`, the EOS id becomes the EOS marker.
    pub fn decode(&self, ids: &[i32]) -> String {
        ids.iter()
            .filter(|&&id| id != PAD_ID)
            .map(|&id| match id {
                UNK_ID | GO_ID => '?',
                id => self
                    .symbols
                    .get((id - FIRST_SYMBOL_ID) as usize)
                    .copied()
                    .unwrap_or('?'),
            })
            .collect()
    }
}

impl Alphabet for CharAlphabet {
    fn encode(&self, text: &str) -> Vec<i32> {
        let mut ids: Vec<i32> = text.chars().map(|c| self.id_of(c)).collect();
        if let Some(eos) = self.eos_id() {
            ids.push(eos);
        }
        ids
    }

    fn sos_id(&self) -> i32 {
        self.sos.map(|c| self.id_of(c)).unwrap_or(GO_ID)
    }

    fn eos_id(&self) -> Option<i32> {
        self.eos.map(|c| self.id_of(c))
    }
}
