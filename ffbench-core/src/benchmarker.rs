//! The fast-forward benchmarker.
//!
//! [`Benchmarker`] is driven by a training loop through four hooks, called in
//! this order over a run:
//!
//! 1. [`fit_start`](Benchmarker::fit_start) once, before the first epoch.
//! 2. [`batch_start`](Benchmarker::batch_start) / [`batch_end`](Benchmarker::batch_end)
//!    around every batch the loop actually executes.
//! 3. [`epoch_end`](Benchmarker::epoch_end) after every epoch, including one cut
//!    short by [`BatchOutcome::AbandonEpoch`].
//!
//! Each checkpoint is measured over `min_steps` batches. Once measured, the loop
//! position is overwritten so that it skips straight to the next checkpoint:
//! within an epoch by moving the batch counters, across epochs by moving the
//! epoch counter. Skipped regions are costed by carrying the last measured
//! step duration forward (see [`elapsed_for_epoch`]).
//!
//! The benchmarker rewrites loop state, so it does not coexist with anything
//! else that depends on the loop visiting every batch. Models trained under it
//! are not fully trained.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::BenchmarkerConfig;
use crate::controller::{BatchOutcome, LoopController};
use crate::error::{BenchError, ConfigError, TimingError};
use crate::schedule::{CheckpointSchedule, StepAdvance};
use crate::sink::LogSink;
use crate::timing::{CheckpointTiming, MeasurementWindow, TimingTable, elapsed_for_epoch};

/// Throughput averaged over one resolved checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputSample {
    pub epoch: u64,
    pub step: u64,
    pub samples_per_sec: f64,
}

/// Summary of a benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub min_steps: u64,
    pub epochs: Vec<u64>,
    pub steps: Vec<u64>,
    pub steps_per_epoch: u64,
    /// Run length captured at `fit_start`; `None` if the run never started.
    pub total_duration: Option<u64>,
    /// Extrapolated training wall-clock time in seconds.
    pub wall_clock_train_secs: f64,
    pub throughput: Vec<ThroughputSample>,
    pub timing: Vec<CheckpointTiming>,
}

impl BenchmarkReport {
    pub fn to_json(&self) -> Result<String, BenchError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Fast-forwards a training loop through configured checkpoints and estimates
/// the wall-clock time of the full run.
pub struct Benchmarker {
    run_id: Uuid,
    min_steps: u64,
    schedule: CheckpointSchedule,
    timing: TimingTable,
    window: Option<MeasurementWindow>,
    wall_clock_train: f64,
    total_duration: Option<u64>,
    steps_per_epoch: u64,
    throughput: Vec<ThroughputSample>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn LogSink>,
}

impl std::fmt::Debug for Benchmarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Benchmarker")
            .field("run_id", &self.run_id)
            .field("min_steps", &self.min_steps)
            .field("schedule", &self.schedule)
            .field("window", &self.window)
            .field("wall_clock_train", &self.wall_clock_train)
            .field("total_duration", &self.total_duration)
            .finish_non_exhaustive()
    }
}

impl Benchmarker {
    /// Validate `config` and build a benchmarker timed by the system clock.
    pub fn new(config: &BenchmarkerConfig, sink: Arc<dyn LogSink>) -> Result<Self, ConfigError> {
        let schedule = CheckpointSchedule::from_config(config)?;
        Ok(Self {
            run_id: Uuid::new_v4(),
            min_steps: config.min_steps,
            schedule,
            timing: TimingTable::default(),
            window: None,
            wall_clock_train: 0.0,
            total_duration: None,
            steps_per_epoch: 0,
            throughput: Vec::new(),
            clock: Arc::new(SystemClock::new()),
            sink,
        })
    }

    /// Replace the clock used to time measurement windows.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn min_steps(&self) -> u64 {
        self.min_steps
    }

    pub fn schedule(&self) -> &CheckpointSchedule {
        &self.schedule
    }

    pub fn timing(&self) -> &TimingTable {
        &self.timing
    }

    /// Extrapolated training time so far, in seconds.
    pub fn wall_clock_train(&self) -> f64 {
        self.wall_clock_train
    }

    pub fn total_duration(&self) -> Option<u64> {
        self.total_duration
    }

    pub fn is_measuring(&self) -> bool {
        self.window.is_some()
    }

    pub fn window(&self) -> Option<&MeasurementWindow> {
        self.window.as_ref()
    }

    pub fn throughput_samples(&self) -> &[ThroughputSample] {
        &self.throughput
    }

    /// Capture the run length, expand all-epochs mode and reset the timing table.
    pub fn fit_start(&mut self, ctl: &dyn LoopController) -> Result<(), BenchError> {
        tracing::warn!(
            "Benchmarker is active: the model will not be fully trained and quality metrics for this run are meaningless"
        );

        let total = ctl.total_duration();
        self.steps_per_epoch = ctl.steps_per_epoch();
        self.total_duration = Some(total);
        self.wall_clock_train = 0.0;
        self.window = None;
        self.throughput.clear();
        self.schedule.rewind();

        if self.schedule.all_epochs() {
            self.schedule.expand_all_epochs(total)?;
            tracing::info!(
                total_epochs = total,
                "all_epochs is set, measuring every epoch from 0 to {}",
                total
            );
        }
        self.timing = TimingTable::new(self.schedule.epochs(), self.schedule.steps());

        let unreachable_epochs: Vec<u64> = self
            .schedule
            .epochs()
            .iter()
            .copied()
            .filter(|&e| e >= total)
            .collect();
        if !unreachable_epochs.is_empty() {
            tracing::warn!(
                epochs = ?unreachable_epochs,
                total_epochs = total,
                "Epoch checkpoints at or beyond the run length will not be measured"
            );
        }
        let unreachable_steps: Vec<u64> = self
            .schedule
            .steps()
            .iter()
            .copied()
            .filter(|&s| s >= self.steps_per_epoch)
            .collect();
        if !unreachable_steps.is_empty() {
            tracing::warn!(
                steps = ?unreachable_steps,
                steps_per_epoch = self.steps_per_epoch,
                "Step checkpoints at or beyond the epoch length will not be measured"
            );
        }

        tracing::info!(
            run_id = %self.run_id,
            min_steps = self.min_steps,
            epochs = ?self.schedule.epochs(),
            steps = ?self.schedule.steps(),
            steps_per_epoch = self.steps_per_epoch,
            total_epochs = total,
            "Benchmark started"
        );
        Ok(())
    }

    /// Cost the epoch just finished and jump the loop to the next epoch checkpoint.
    pub fn epoch_end(&mut self, ctl: &mut dyn LoopController) -> Result<(), BenchError> {
        let Some(prev_epoch) = self.schedule.current_epoch() else {
            tracing::debug!(epoch = ctl.epoch(), "Epoch end after the last checkpoint");
            return Ok(());
        };

        let end = self.total_duration.unwrap_or_else(|| ctl.total_duration());
        let steps_per_epoch = ctl.steps_per_epoch();
        let next_epoch = self.schedule.peek_next_epoch(end);
        let n_epochs = next_epoch.saturating_sub(prev_epoch);

        let row = self
            .timing
            .row(prev_epoch)
            .ok_or(TimingError::MissingBaseline { epoch: prev_epoch })?;
        let elapsed = elapsed_for_epoch(prev_epoch, row, steps_per_epoch, n_epochs)?;

        self.schedule.advance_epoch(end);
        self.schedule.reset_step();
        if let Some(window) = self.window.take() {
            tracing::debug!(
                epoch = prev_epoch,
                steps = window.steps(),
                "Discarding measurement window cut off by the epoch end"
            );
        }

        ctl.set_epoch(next_epoch);
        ctl.set_batch(next_epoch * steps_per_epoch);
        ctl.set_batch_in_epoch(0);

        self.wall_clock_train += elapsed;
        self.sink.log_wall_clock(self.wall_clock_train);

        tracing::info!(
            epoch = prev_epoch,
            next_epoch,
            n_epochs,
            elapsed_secs = elapsed,
            wall_clock_train_secs = self.wall_clock_train,
            "Epoch checkpoint costed"
        );
        Ok(())
    }

    /// Open a measurement window if none is open and checkpoints remain.
    pub fn batch_start(&mut self, ctl: &dyn LoopController) {
        if self.window.is_some() || self.schedule.is_exhausted() {
            return;
        }
        let sample_count = ctl.sample_count();
        self.window = Some(MeasurementWindow::open(self.clock.now_secs(), sample_count));
        tracing::debug!(
            epoch = ctl.epoch(),
            batch_in_epoch = ctl.batch_in_epoch(),
            sample_count,
            "Opened measurement window"
        );
    }

    /// Account for a finished batch; once `min_steps` batches are in the window,
    /// record the checkpoint and fast-forward to the next one.
    pub fn batch_end(&mut self, ctl: &mut dyn LoopController) -> Result<BatchOutcome, BenchError> {
        let Some(mut window) = self.window.take() else {
            return Ok(BatchOutcome::Continue);
        };
        window.record_batch(self.clock.now_secs(), ctl.sample_count());
        if window.steps() < self.min_steps {
            self.window = Some(window);
            return Ok(BatchOutcome::Continue);
        }

        let Some(epoch) = self.schedule.current_epoch() else {
            tracing::debug!(
                epoch = ctl.epoch(),
                batch_in_epoch = ctl.batch_in_epoch(),
                steps = window.steps(),
                "Window resolved after the last checkpoint; dropping it"
            );
            return Ok(BatchOutcome::Continue);
        };
        let step = self.schedule.current_step();
        let secs_per_step = window.secs_per_step(self.min_steps);
        let samples_per_sec = window.throughput().unwrap_or_else(|| {
            tracing::warn!(
                epoch,
                step,
                "Measurement window took no measurable time; reporting zero throughput"
            );
            0.0
        });

        self.timing.record(epoch, step, secs_per_step)?;
        self.sink.log_throughput(samples_per_sec);
        self.throughput.push(ThroughputSample {
            epoch,
            step,
            samples_per_sec,
        });
        tracing::debug!(
            epoch,
            step,
            secs_per_step,
            samples_per_sec,
            samples = window.samples(),
            "Checkpoint measured"
        );

        let steps_per_epoch = ctl.steps_per_epoch();
        match self.schedule.advance_step() {
            StepAdvance::Next(next_step) if next_step < steps_per_epoch => {
                let position = ctl.batch_in_epoch();
                if next_step < position {
                    tracing::debug!(
                        next_step,
                        batch_in_epoch = position,
                        "Next step checkpoint already passed; not jumping back"
                    );
                } else {
                    ctl.set_batch(ctl.epoch() * steps_per_epoch + next_step);
                    ctl.set_batch_in_epoch(next_step);
                }
                Ok(BatchOutcome::Continue)
            }
            StepAdvance::Next(next_step) => {
                tracing::debug!(
                    next_step,
                    steps_per_epoch,
                    "Remaining step checkpoints lie beyond the epoch"
                );
                self.schedule.reset_step();
                Ok(BatchOutcome::AbandonEpoch)
            }
            StepAdvance::Wrapped => Ok(BatchOutcome::AbandonEpoch),
        }
    }

    pub fn report(&self) -> BenchmarkReport {
        BenchmarkReport {
            run_id: self.run_id,
            generated_at: Utc::now(),
            min_steps: self.min_steps,
            epochs: self.schedule.epochs().to_vec(),
            steps: self.schedule.steps().to_vec(),
            steps_per_epoch: self.steps_per_epoch,
            total_duration: self.total_duration,
            wall_clock_train_secs: self.wall_clock_train,
            throughput: self.throughput.clone(),
            timing: self.timing.cells().collect(),
        }
    }
}
