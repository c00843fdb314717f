// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits that define the core concepts
// of the batching pipeline.
//
// Rules for this layer:
//   - NO file I/O
//   - NO randomness
//   - Only plain structs, enums, and traits
//
// Think of this layer as the "dictionary" of the system —
// it defines what things ARE, not how they are produced.

// A (source, target) sentence pair
pub mod sample;

// One materialized batch of arrays
pub mod batch;

// Core abstractions (traits) that other layers implement
pub mod traits;
