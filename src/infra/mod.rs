// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Concrete collaborators the pipeline core only sees through
// traits or plain data:
//
//   alphabet.rs       — CharAlphabet, the character encoding
//                       table behind the Alphabet trait
//
//   alphabet_store.rs — builds an alphabet from corpus character
//                       frequencies and saves/loads it as JSON
//
//   metrics.rs        — per-batch packing statistics written to
//                       a CSV file

/// Character → id encoding table
pub mod alphabet;

/// Alphabet building, saving, and loading
pub mod alphabet_store;

/// Batch statistics CSV logger
pub mod metrics;
