//! Metric sinks for throughput and wall-clock emissions.

use std::sync::Mutex;

/// Metric key for the averaged throughput of one checkpoint (samples/second).
pub const THROUGHPUT_KEY: &str = "throughput/step";

/// Metric key for the extrapolated cumulative training wall-clock time (seconds).
pub const WALL_CLOCK_KEY: &str = "wall_clock/train";

/// Receiver for the two scalar series a benchmark run produces.
///
/// Only one designated worker's sink output is authoritative in a
/// multi-worker run.
pub trait LogSink: Send + Sync {
    /// Called once per resolved checkpoint.
    fn log_throughput(&self, samples_per_sec: f64);

    /// Called once per epoch boundary; values never decrease within a run.
    fn log_wall_clock(&self, seconds: f64);
}

/// Sink that forwards every emission as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log_throughput(&self, samples_per_sec: f64) {
        tracing::info!(metric = THROUGHPUT_KEY, value = samples_per_sec, "throughput");
    }

    fn log_wall_clock(&self, seconds: f64) {
        tracing::info!(metric = WALL_CLOCK_KEY, value = seconds, "wall clock");
    }
}

/// A sink that records every emission for inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    throughput: Mutex<Vec<f64>>,
    wall_clock: Mutex<Vec<f64>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn throughput(&self) -> Vec<f64> {
        self.throughput
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn wall_clock(&self) -> Vec<f64> {
        self.wall_clock
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl LogSink for RecordingSink {
    fn log_throughput(&self, samples_per_sec: f64) {
        self.throughput
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(samples_per_sec);
    }

    fn log_wall_clock(&self, seconds: f64) {
        self.wall_clock
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.log_throughput(10.0);
        sink.log_throughput(12.5);
        sink.log_wall_clock(3.0);
        assert_eq!(sink.throughput(), vec![10.0, 12.5]);
        assert_eq!(sink.wall_clock(), vec![3.0]);
    }

    #[test]
    fn test_tracing_sink_is_object_safe() {
        let sink: Box<dyn LogSink> = Box::new(TracingSink);
        sink.log_throughput(1.0);
        sink.log_wall_clock(2.0);
    }
}
