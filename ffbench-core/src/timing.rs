//! Timing model: measured seconds-per-step per checkpoint, the measurement
//! window that produces them, and piecewise-constant extrapolation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::TimingError;

/// Seconds-per-step measured at each step checkpoint of one epoch.
/// `None` means the checkpoint has not been measured yet.
pub type TimingRow = BTreeMap<u64, Option<f64>>;

/// Sparse table of measured step durations indexed by (epoch, step).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingTable {
    rows: BTreeMap<u64, TimingRow>,
}

/// One flattened table cell, as it appears in reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointTiming {
    pub epoch: u64,
    pub step: u64,
    pub secs_per_step: Option<f64>,
}

impl TimingTable {
    /// A table with every (epoch, step) pair unmeasured.
    pub fn new(epochs: &[u64], steps: &[u64]) -> Self {
        let rows = epochs
            .iter()
            .map(|&epoch| (epoch, steps.iter().map(|&step| (step, None)).collect()))
            .collect();
        Self { rows }
    }

    pub fn record(
        &mut self,
        epoch: u64,
        step: u64,
        secs_per_step: f64,
    ) -> Result<(), TimingError> {
        let cell = self
            .rows
            .get_mut(&epoch)
            .and_then(|row| row.get_mut(&step))
            .ok_or(TimingError::UnknownCheckpoint { epoch, step })?;
        *cell = Some(secs_per_step);
        Ok(())
    }

    pub fn get(&self, epoch: u64, step: u64) -> Option<f64> {
        self.rows.get(&epoch)?.get(&step).copied().flatten()
    }

    pub fn row(&self, epoch: u64) -> Option<&TimingRow> {
        self.rows.get(&epoch)
    }

    pub fn measured_count(&self) -> usize {
        self.cells().filter(|c| c.secs_per_step.is_some()).count()
    }

    pub fn unmeasured_count(&self) -> usize {
        self.cells().filter(|c| c.secs_per_step.is_none()).count()
    }

    /// All cells in (epoch, step) order.
    pub fn cells(&self) -> impl Iterator<Item = CheckpointTiming> + '_ {
        self.rows.iter().flat_map(|(&epoch, row)| {
            row.iter().map(move |(&step, &secs_per_step)| CheckpointTiming {
                epoch,
                step,
                secs_per_step,
            })
        })
    }
}

/// Wall-clock seconds spanned by `n_epochs` epochs of `steps_per_epoch` steps,
/// each shaped like `row`.
///
/// Step `s` costs the value measured at the largest measured step `<= s`
/// (carry-forward), so the per-epoch total is a sum of constant segments. The
/// row must have a measurement at step 0.
pub fn elapsed_for_epoch(
    epoch: u64,
    row: &TimingRow,
    steps_per_epoch: u64,
    n_epochs: u64,
) -> Result<f64, TimingError> {
    if !matches!(row.get(&0), Some(Some(_))) {
        return Err(TimingError::MissingBaseline { epoch });
    }

    let mut measured = row
        .iter()
        .filter_map(|(&step, &secs)| secs.map(|s| (step, s)))
        .take_while(|&(step, _)| step < steps_per_epoch)
        .peekable();

    let mut per_epoch = 0.0;
    while let Some((step, secs)) = measured.next() {
        let segment_end = measured.peek().map_or(steps_per_epoch, |&(next, _)| next);
        per_epoch += secs * (segment_end - step) as f64;
    }
    Ok(per_epoch * n_epochs as f64)
}

/// An open measurement window: time and samples accumulated over consecutive
/// batches of one checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementWindow {
    baseline_samples: u64,
    last_tick: f64,
    last_samples: u64,
    elapsed_secs: f64,
    samples: u64,
    steps: u64,
}

impl MeasurementWindow {
    pub fn open(now: f64, sample_count: u64) -> Self {
        Self {
            baseline_samples: sample_count,
            last_tick: now,
            last_samples: sample_count,
            elapsed_secs: 0.0,
            samples: 0,
            steps: 0,
        }
    }

    /// Account for one finished batch.
    pub fn record_batch(&mut self, now: f64, sample_count: u64) {
        self.elapsed_secs += (now - self.last_tick).max(0.0);
        self.samples += sample_count.saturating_sub(self.last_samples);
        self.last_tick = now;
        self.last_samples = sample_count;
        self.steps += 1;
    }

    pub fn baseline_samples(&self) -> u64 {
        self.baseline_samples
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Samples per second over the window, `None` if no time has elapsed.
    pub fn throughput(&self) -> Option<f64> {
        (self.elapsed_secs > 0.0).then(|| self.samples as f64 / self.elapsed_secs)
    }

    pub fn secs_per_step(&self, min_steps: u64) -> f64 {
        self.elapsed_secs / min_steps as f64
    }
}
