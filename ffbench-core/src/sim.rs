//! A reference epoch/batch loop for driving a [`Benchmarker`] without a model.
//!
//! `SimulatedLoop` calls the benchmarker's hooks in the same order a trainer
//! does, advances its counters the same way, and charges each executed batch a
//! synthetic cost on a [`ManualClock`]. Runs are fully deterministic.

use std::time::Duration;

use crate::benchmarker::Benchmarker;
use crate::clock::ManualClock;
use crate::controller::{BatchOutcome, LoopController};
use crate::error::BenchError;

/// Cost of the batch at `(epoch, batch_in_epoch)`.
pub type StepCost = Box<dyn Fn(u64, u64) -> Duration + Send + Sync>;

/// What a simulated run did.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub batches_executed: usize,
    pub epoch_ends: u64,
    pub final_epoch: u64,
    pub final_batch: u64,
    /// Time actually spent in executed batches.
    pub simulated_secs: f64,
    /// The benchmarker's extrapolated estimate for the full run.
    pub estimated_secs: f64,
}

pub struct SimulatedLoop {
    epoch: u64,
    batch: u64,
    batch_in_epoch: u64,
    sample_count: u64,
    steps_per_epoch: u64,
    total_duration: u64,
    batch_size: u64,
    clock: ManualClock,
    step_cost: StepCost,
    executed: Vec<(u64, u64)>,
    epoch_ends: u64,
}

impl std::fmt::Debug for SimulatedLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedLoop")
            .field("epoch", &self.epoch)
            .field("batch", &self.batch)
            .field("batch_in_epoch", &self.batch_in_epoch)
            .field("sample_count", &self.sample_count)
            .field("steps_per_epoch", &self.steps_per_epoch)
            .field("total_duration", &self.total_duration)
            .finish_non_exhaustive()
    }
}

impl SimulatedLoop {
    /// A loop where every batch takes 10ms.
    pub fn new(steps_per_epoch: u64, total_duration: u64, batch_size: u64) -> Self {
        Self {
            epoch: 0,
            batch: 0,
            batch_in_epoch: 0,
            sample_count: 0,
            steps_per_epoch,
            total_duration,
            batch_size,
            clock: ManualClock::new(),
            step_cost: Box::new(|_, _| Duration::from_millis(10)),
            executed: Vec::new(),
            epoch_ends: 0,
        }
    }

    pub fn with_step_cost(
        mut self,
        cost: impl Fn(u64, u64) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.step_cost = Box::new(cost);
        self
    }

    /// Handle to the loop's clock; give it to the benchmarker via `with_clock`.
    pub fn clock(&self) -> ManualClock {
        self.clock.clone()
    }

    pub fn batch(&self) -> u64 {
        self.batch
    }

    /// Every `(epoch, batch_in_epoch)` that was actually executed, in order.
    pub fn executed_batches(&self) -> &[(u64, u64)] {
        &self.executed
    }

    /// Run from `fit_start` until the epoch counter reaches the run length.
    pub fn run(&mut self, bench: &mut Benchmarker) -> Result<RunSummary, BenchError> {
        bench.fit_start(&*self)?;

        while self.epoch < self.total_duration {
            while self.batch_in_epoch < self.steps_per_epoch {
                bench.batch_start(&*self);
                self.execute_batch();
                if bench.batch_end(self)? == BatchOutcome::AbandonEpoch {
                    tracing::debug!(
                        epoch = self.epoch,
                        batch_in_epoch = self.batch_in_epoch,
                        "Epoch abandoned"
                    );
                    break;
                }
            }
            self.epoch += 1;
            self.batch_in_epoch = 0;
            self.epoch_ends += 1;
            bench.epoch_end(self)?;
        }

        let summary = RunSummary {
            batches_executed: self.executed.len(),
            epoch_ends: self.epoch_ends,
            final_epoch: self.epoch,
            final_batch: self.batch,
            simulated_secs: self.clock.elapsed().as_secs_f64(),
            estimated_secs: bench.wall_clock_train(),
        };
        tracing::info!(
            batches = summary.batches_executed,
            epoch_ends = summary.epoch_ends,
            simulated_secs = summary.simulated_secs,
            estimated_secs = summary.estimated_secs,
            "Simulated run finished"
        );
        Ok(summary)
    }

    fn execute_batch(&mut self) {
        self.clock
            .advance((self.step_cost)(self.epoch, self.batch_in_epoch));
        self.executed.push((self.epoch, self.batch_in_epoch));
        self.sample_count += self.batch_size;
        self.batch += 1;
        self.batch_in_epoch += 1;
    }
}

impl LoopController for SimulatedLoop {
    fn epoch(&self) -> u64 {
        self.epoch
    }

    fn batch_in_epoch(&self) -> u64 {
        self.batch_in_epoch
    }

    fn sample_count(&self) -> u64 {
        self.sample_count
    }

    fn steps_per_epoch(&self) -> u64 {
        self.steps_per_epoch
    }

    fn total_duration(&self) -> u64 {
        self.total_duration
    }

    fn set_epoch(&mut self, epoch: u64) {
        self.epoch = epoch;
    }

    fn set_batch(&mut self, batch: u64) {
        self.batch = batch;
    }

    fn set_batch_in_epoch(&mut self, batch_in_epoch: u64) {
        self.batch_in_epoch = batch_in_epoch;
    }
}
