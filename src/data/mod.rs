// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from raw parallel text files to array batches.
//
// The pipeline flows in this order:
//
//   source / target files
//       │
//       ▼
//   TextLoader        → reads files, pairs lines
//       │
//       ▼
//   Preprocessor      → strip, filter, truncate, dedup
//       │
//       ▼
//   length_index      → per-sample bucketing keys
//       │
//       ▼
//   schedule          → yields lists of sample indices
//       │
//       ▼
//   TextBatcher       → encodes + packs each list into arrays
//       │
//       ▼
//   training loop (external)
//
// Everything after TextLoader is lazy: a batch is only built
// when the consumer asks for the next one.

/// Reads and pairs line-aligned corpus files
pub mod loader;

/// Cleans, filters, truncates, and deduplicates sample pairs
pub mod preprocessor;

/// Composite length keys used for bucketing
pub mod length_index;

/// Bucketed and warmup-composed index schedules
pub mod schedule;

/// Fixed and dynamic array packing strategies
pub mod packer;

/// Builds TextBatch arrays from index lists
pub mod batcher;
