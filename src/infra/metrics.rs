// ============================================================
// Layer 6 — Batch Statistics Logger
// ============================================================
// Records how well each batch is packed to a CSV file.
//
// Metrics recorded per batch:
//   - iteration:    batch number (starts at 0)
//   - batch_size:   samples in the batch
//   - width:        sequence-axis extent of t_mask
//   - max_x_len:    longest source length (incl. EOS)
//   - max_t_len:    longest target length (incl. EOS)
//   - fill_ratio:   real target positions / all target positions
//
// Example CSV output:
//   iteration,batch_size,width,max_x_len,max_t_len,fill_ratio
//   0,32,300,41,44,0.112500
//   1,32,300,43,47,0.120417
//
// A low fill ratio means most of the array is padding; dynamic
// sizing or more bucketing (lower fuzziness) raises it.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::batch::TextBatch;

/// Packing statistics of one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub iteration:  usize,
    pub batch_size: usize,
    pub width:      usize,
    pub max_x_len:  i32,
    pub max_t_len:  i32,
    pub fill_ratio: f64,
}

impl BatchStats {
    /// Compute statistics from a materialized batch.
    pub fn from_batch(iteration: usize, batch: &TextBatch) -> Self {
        // Non-zero mask cells are real target positions
        let width = batch.t_mask.shape().get(1).copied().unwrap_or(0);
        let cells = batch.t_mask.len();
        let real  = batch.t_mask.iter().filter(|&&v| v != 0).count();

        Self {
            iteration,
            batch_size: batch.batch_size,
            width,
            max_x_len:  batch.x_len.iter().copied().max().unwrap_or(0),
            max_t_len:  batch.t_len.iter().copied().max().unwrap_or(0),
            fill_ratio: if cells > 0 { real as f64 / cells as f64 } else { 0.0 },
        }
    }
}

/// Appends batch statistics to a CSV file.
pub struct BatchStatsLogger {
    csv_path: PathBuf,
}

impl BatchStatsLogger {
    /// Create the logger, writing the CSV header if the file is new.
    pub fn new(csv_path: impl Into<PathBuf>) -> Result<Self> {
        let csv_path = csv_path.into();

        // Make sure the parent directory exists
        if let Some(dir) = csv_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        // Only write the header once; an existing file is appended to
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "iteration,batch_size,width,max_x_len,max_t_len,fill_ratio")?;
            tracing::debug!("Created batch stats CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one row.
    pub fn log(&self, s: &BatchStats) -> Result<()> {
        // Open in append mode so earlier rows are kept
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(
            f,
            "{},{},{},{},{},{:.6}",
            s.iteration, s.batch_size, s.width, s.max_x_len, s.max_t_len, s.fill_ratio,
        )?;
        Ok(())
    }

    /// Where the rows are written
    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
