//! The loop-controller capability the benchmarker is allowed to touch.
//!
//! A training loop hands the benchmarker a `&mut dyn LoopController` at each
//! hook. The trait exposes only the position fields that fast-forwarding needs
//! to overwrite and the counters it reads; everything else about the loop stays
//! private to its owner.

/// What the loop should do after a batch-end hook returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Keep going from the (possibly overwritten) position.
    Continue,
    /// Stop the current epoch now and run epoch-end processing.
    AbandonEpoch,
}

/// Position capability of an epoch/batch loop.
///
/// Invariant kept by every setter call the benchmarker makes:
/// `batch == epoch * steps_per_epoch + batch_in_epoch`.
pub trait LoopController {
    /// Current epoch index.
    fn epoch(&self) -> u64;

    /// Index of the next batch to run within the current epoch.
    fn batch_in_epoch(&self) -> u64;

    /// Cumulative number of samples processed since the run began.
    fn sample_count(&self) -> u64;

    /// Number of batches in one epoch; constant for the run.
    fn steps_per_epoch(&self) -> u64;

    /// Configured run length in epochs.
    fn total_duration(&self) -> u64;

    fn set_epoch(&mut self, epoch: u64);

    /// Overwrite the absolute batch counter.
    fn set_batch(&mut self, batch: u64);

    fn set_batch_in_epoch(&mut self, batch_in_epoch: u64);
}
