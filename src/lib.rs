//! Character-level data pipeline for sequence-to-sequence training on
//! parallel text: load line-aligned corpora, group samples of similar
//! length, and stream padded integer batches.

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod infra;
