// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal.
//
// Rules for this layer:
//   - No encoding or scheduling logic here (that's Layer 4)
//   - No printing here (that's Layer 1)
//   - Only workflow coordination

// Run settings, loadable from JSON
pub mod config;

// Drive the pipeline for N batches and report on them
pub mod preview_use_case;

// Build and save a character alphabet
pub mod alphabet_use_case;
