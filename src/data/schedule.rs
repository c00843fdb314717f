// ============================================================
// Layer 4 — Batch Schedules
// ============================================================
// A schedule decides WHICH samples go into each batch. It never
// touches the samples themselves — it only yields lists of
// sample indices, one list per batch.
//
// Two schedules are provided:
//
//   BucketSchedule  — sort samples by length key, cut the sorted
//                     list into contiguous slices of batch_size,
//                     visit the slices (optionally in random order,
//                     optionally forever)
//
//   WarmupSchedule  — a short deterministic phase (sorted, no
//                     shuffle, fuzziness 1, single pass) followed
//                     by a regular phase with the caller's options
//
// Both are plain iterators with explicit state, so a consumer
// simply stops pulling to cancel them.
//
// Each schedule owns its random generator. Seed it with
// `StdRng::seed_from_u64` for reproducible epochs.
//
// Shuffle + stable sort:
//   At the start of an epoch with shuffle on, the index list is
//   shuffled and then STABLY sorted by key. Samples with equal
//   (fuzzy) keys keep their shuffled relative order, so slices
//   differ between epochs while still grouping similar lengths.

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::data::length_index::length_keys;
use crate::domain::sample::Sample;

/// A lazily produced sequence of index batches.
pub type IndexBatches<'a> = Box<dyn Iterator<Item = Vec<usize>> + 'a>;

/// Signature shared by pluggable schedule builders, e.g. `bucket_schedule`.
pub type ScheduleFn = for<'a> fn(&'a [Sample], usize, ScheduleOptions, StdRng) -> IndexBatches<'a>;

// ─── ScheduleOptions ──────────────────────────────────────────────────────────
/// Knobs of a bucketed schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleOptions {
    /// Reshuffle (and re-sort) the index list every epoch,
    /// and visit batches in random order
    pub shuffle: bool,

    /// Start over after the last batch instead of stopping
    pub repeat: bool,

    /// Divisor applied to lengths before building sort keys
    pub fuzziness: usize,

    /// Sort indices by length key before the first epoch
    pub sort: bool,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            shuffle:   false,
            repeat:    false,
            fuzziness: 3,
            sort:      false,
        }
    }
}

impl ScheduleOptions {
    /// Fixed settings used during warmup.
    pub fn warmup() -> Self {
        Self {
            shuffle:   false,
            repeat:    false,
            fuzziness: 1,
            sort:      true,
        }
    }

    /// Shuffled, endless schedule used for the bulk of training.
    pub fn training() -> Self {
        Self {
            shuffle: true,
            repeat:  true,
            ..Self::default()
        }
    }
}

/// `ceil(num_samples / batch_size)`
pub fn num_batches(batch_size: usize, num_samples: usize) -> usize {
    (num_samples + batch_size - 1) / batch_size
}

/// Half-open range `[start, end)` covered by batch number `batch`.
/// Every batch is full except possibly the last one.
pub fn batch_bounds(batch: usize, batch_size: usize, num_samples: usize) -> (usize, usize) {
    let start = (batch * batch_size).min(num_samples);
    let end   = (start + batch_size).min(num_samples);
    (start, end)
}

// ─── BucketSchedule ───────────────────────────────────────────────────────────
/// Length-bucketed index schedule.
pub struct BucketSchedule {
    /// (sample index, sort key), in current visiting order
    entries: Vec<(usize, u64)>,

    /// Order in which slice numbers are visited this epoch
    order: Vec<usize>,

    batch_size: usize,
    options:    ScheduleOptions,

    /// Position inside `order` of the next batch to yield
    cursor: usize,
    epoch:  usize,
    done:   bool,
    rng:    StdRng,
}

impl BucketSchedule {
    /// Build a schedule over `samples`.
    ///
    /// # Panics
    /// Panics if `batch_size == 0` or `options.fuzziness == 0`.
    pub fn new(samples: &[Sample], batch_size: usize, options: ScheduleOptions, rng: StdRng) -> Self {
        assert!(batch_size >= 1, "batch_size must be at least 1");

        let keys = length_keys(samples, options.fuzziness);
        let mut entries: Vec<(usize, u64)> = keys.into_iter().enumerate().collect();

        if options.sort {
            // sort_by_key is stable: equal keys keep their order
            entries.sort_by_key(|&(_, key)| key);
        }

        let order: Vec<usize> = (0..num_batches(batch_size, entries.len())).collect();

        tracing::debug!(
            "Bucket schedule: {} samples, {} batches of up to {} ({:?})",
            entries.len(),
            order.len(),
            batch_size,
            options
        );

        Self {
            entries,
            order,
            batch_size,
            options,
            cursor: 0,
            epoch:  0,
            done:   false,
            rng,
        }
    }

    /// Number of batches per epoch
    pub fn num_batches(&self) -> usize {
        self.order.len()
    }

    /// Completed epochs so far
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Batches already yielded in the current epoch
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Options this schedule was built with
    pub fn options(&self) -> ScheduleOptions {
        self.options
    }

    /// Slice numbers in the order the current epoch visits them
    pub fn batch_order(&self) -> &[usize] {
        &self.order
    }

    /// Sample indices in current sorted/shuffled order
    pub fn ordered_indices(&self) -> Vec<usize> {
        self.entries.iter().map(|&(i, _)| i).collect()
    }

    fn reshuffle(&mut self) {
        self.entries.shuffle(&mut self.rng);
        self.entries.sort_by_key(|&(_, key)| key);
        self.order.shuffle(&mut self.rng);
    }
}

impl Iterator for BucketSchedule {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done || self.order.is_empty() {
            return None;
        }

        if self.cursor == 0 && self.options.shuffle {
            self.reshuffle();
        }

        let batch        = self.order[self.cursor];
        let (start, end) = batch_bounds(batch, self.batch_size, self.entries.len());
        let indices      = self.entries[start..end].iter().map(|&(i, _)| i).collect();

        self.cursor += 1;
        if self.cursor == self.order.len() {
            tracing::debug!("Epoch {} done ({} batches)", self.epoch, self.order.len());
            self.cursor = 0;
            self.epoch += 1;
            if !self.options.repeat {
                self.done = true;
            }
        }

        Some(indices)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done || self.order.is_empty() {
            (0, Some(0))
        } else if self.options.repeat {
            (usize::MAX, None)
        } else {
            let left = self.order.len() - self.cursor;
            (left, Some(left))
        }
    }
}

/// Boxed `BucketSchedule`; the default `ScheduleFn`.
pub fn bucket_schedule<'a>(
    samples:    &'a [Sample],
    batch_size: usize,
    options:    ScheduleOptions,
    rng:        StdRng,
) -> IndexBatches<'a> {
    Box::new(BucketSchedule::new(samples, batch_size, options, rng))
}

// ─── WarmupSchedule ───────────────────────────────────────────────────────────
/// Warmup phase chained into a regular phase.
pub struct WarmupSchedule<'a> {
    samples:           &'a [Sample],
    batch_size:        usize,
    warmup_iterations: usize,
    warmup_emitted:    usize,
    warmup:            Option<IndexBatches<'a>>,
    regular:           Option<IndexBatches<'a>>,
    regular_fn:        ScheduleFn,
    regular_options:   ScheduleOptions,
    rng:               StdRng,
}

impl<'a> WarmupSchedule<'a> {
    /// Compose `warmup_fn` (run with `ScheduleOptions::warmup()`) and
    /// `regular_fn` (run with `regular_options`). The regular phase is
    /// only built once the warmup phase is over.
    ///
    /// # Panics
    /// Panics if `batch_size == 0`.
    pub fn new(
        samples:           &'a [Sample],
        batch_size:        usize,
        warmup_iterations: usize,
        warmup_fn:         ScheduleFn,
        regular_fn:        ScheduleFn,
        regular_options:   ScheduleOptions,
        mut rng:           StdRng,
    ) -> Self {
        assert!(batch_size >= 1, "batch_size must be at least 1");

        let warmup_rng = StdRng::seed_from_u64(rng.gen());
        let warmup = (warmup_iterations > 0)
            .then(|| warmup_fn(samples, batch_size, ScheduleOptions::warmup(), warmup_rng));

        Self {
            samples,
            batch_size,
            warmup_iterations,
            warmup_emitted: 0,
            warmup,
            regular: None,
            regular_fn,
            regular_options,
            rng,
        }
    }

    /// Both phases backed by `bucket_schedule`.
    pub fn with_bucket_phases(
        samples:           &'a [Sample],
        batch_size:        usize,
        warmup_iterations: usize,
        regular_options:   ScheduleOptions,
        rng:               StdRng,
    ) -> Self {
        Self::new(
            samples,
            batch_size,
            warmup_iterations,
            bucket_schedule,
            bucket_schedule,
            regular_options,
            rng,
        )
    }

    /// True while the warmup phase still has batches to give.
    ///
    /// A warmup generator that runs dry early is detected through its
    /// `size_hint`; one that reports no upper bound stays "in warmup"
    /// until the next pull finds it empty.
    pub fn in_warmup(&self) -> bool {
        match &self.warmup {
            Some(warmup) => {
                self.warmup_emitted < self.warmup_iterations && warmup.size_hint().1 != Some(0)
            }
            None => false,
        }
    }

    /// Batches yielded by the warmup phase so far
    pub fn warmup_emitted(&self) -> usize {
        self.warmup_emitted
    }
}

impl Iterator for WarmupSchedule<'_> {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if let Some(warmup) = self.warmup.as_mut() {
            if self.warmup_emitted < self.warmup_iterations {
                if let Some(indices) = warmup.next() {
                    self.warmup_emitted += 1;
                    return Some(indices);
                }
            }
            tracing::debug!("Warmup finished after {} batches", self.warmup_emitted);
            self.warmup = None;
        }

        if self.regular.is_none() {
            let rng = StdRng::seed_from_u64(self.rng.gen());
            self.regular = Some((self.regular_fn)(
                self.samples,
                self.batch_size,
                self.regular_options,
                rng,
            ));
        }

        self.regular.as_mut()?.next()
    }
}

/// Warmup schedule with bucketed phases, boxed.
pub fn warmup_schedule<'a>(
    samples:           &'a [Sample],
    batch_size:        usize,
    warmup_iterations: usize,
    warmup_fn:         Option<ScheduleFn>,
    regular_fn:        Option<ScheduleFn>,
    regular_options:   ScheduleOptions,
    rng:               StdRng,
) -> IndexBatches<'a> {
    Box::new(WarmupSchedule::new(
        samples,
        batch_size,
        warmup_iterations,
        warmup_fn.unwrap_or(bucket_schedule),
        regular_fn.unwrap_or(bucket_schedule),
        regular_options,
        rng,
    ))
}

// ─── ScheduleKind ─────────────────────────────────────────────────────────────
/// Which schedule a batcher should be driven by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleKind {
    /// Plain bucketed schedule with the given options
    Bucket,

    /// Warmup phase, then bucketed schedule with the given options
    Warmup { warmup_iterations: usize },
}

impl ScheduleKind {
    pub fn build<'a>(
        self,
        samples:    &'a [Sample],
        batch_size: usize,
        options:    ScheduleOptions,
        rng:        StdRng,
    ) -> IndexBatches<'a> {
        match self {
            ScheduleKind::Bucket => bucket_schedule(samples, batch_size, options, rng),
            ScheduleKind::Warmup { warmup_iterations } => warmup_schedule(
                samples,
                batch_size,
                warmup_iterations,
                None,
                None,
                options,
                rng,
            ),
        }
    }
}
