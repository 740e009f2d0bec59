//! # ffbench-core — fast-forward throughput benchmarking
//!
//! Estimates how long a full epoch/batch training run takes without running it.
//! A [`Benchmarker`] plugs into the loop's lifecycle hooks, measures throughput
//! at a handful of (epoch, step) checkpoints, fast-forwards the loop's position
//! past everything in between, and extrapolates the run's wall-clock time from
//! the sparse samples.
//!
//! The loop is reached only through the [`LoopController`] trait; metrics leave
//! through a [`LogSink`].

pub mod benchmarker;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod schedule;
pub mod sim;
pub mod sink;
pub mod timing;

pub use benchmarker::{BenchmarkReport, Benchmarker, ThroughputSample};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BenchmarkerConfig, load_config};
pub use controller::{BatchOutcome, LoopController};
pub use error::{BenchError, ConfigError, TimingError};
pub use schedule::{CheckpointSchedule, StepAdvance};
pub use sim::{RunSummary, SimulatedLoop};
pub use sink::{LogSink, RecordingSink, THROUGHPUT_KEY, TracingSink, WALL_CLOCK_KEY};
pub use timing::{CheckpointTiming, MeasurementWindow, TimingTable, elapsed_for_epoch};
