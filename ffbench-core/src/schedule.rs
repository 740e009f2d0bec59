//! Checkpoint lists and the cursor that walks them.
//!
//! Both lists are sorted and deduplicated once, at construction. Every jump the
//! benchmarker makes assumes that order; an unsorted list would let a jump move
//! the loop backward.

use std::collections::BTreeSet;

use crate::config::BenchmarkerConfig;
use crate::error::ConfigError;

/// Result of moving the step cursor past a resolved checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAdvance {
    /// Another step checkpoint remains in this epoch.
    Next(u64),
    /// The step list is exhausted; the cursor is back at 0.
    Wrapped,
}

/// Ordered (epoch, step) checkpoints plus the current position within them.
#[derive(Debug, Clone)]
pub struct CheckpointSchedule {
    epochs: Vec<u64>,
    steps: Vec<u64>,
    epoch_ix: usize,
    step_ix: usize,
    all_epochs: bool,
}

impl CheckpointSchedule {
    pub fn new(
        epoch_list: &[u64],
        step_list: &[u64],
        all_epochs: bool,
    ) -> Result<Self, ConfigError> {
        check_lists(epoch_list, step_list, all_epochs)?;
        Ok(Self::build(epoch_list, step_list, all_epochs))
    }

    /// Build from a config after [`BenchmarkerConfig::validate`] accepts it.
    pub fn from_config(config: &BenchmarkerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(
            &config.epoch_list,
            &config.step_list,
            config.all_epochs,
        ))
    }

    fn build(epoch_list: &[u64], step_list: &[u64], all_epochs: bool) -> Self {
        Self {
            epochs: sorted_unique(epoch_list),
            steps: sorted_unique(step_list),
            epoch_ix: 0,
            step_ix: 0,
            all_epochs,
        }
    }

    /// Replace the epoch list with every epoch in `0..total_duration` when in
    /// all-epochs mode. No-op otherwise.
    pub fn expand_all_epochs(&mut self, total_duration: u64) -> Result<(), ConfigError> {
        if !self.all_epochs {
            return Ok(());
        }
        if total_duration == 0 {
            return Err(ConfigError::EmptyEpochList);
        }
        self.epochs = (0..total_duration).collect();
        self.epoch_ix = 0;
        Ok(())
    }

    /// Put both cursors back on the first checkpoint.
    pub fn rewind(&mut self) {
        self.epoch_ix = 0;
        self.step_ix = 0;
    }

    pub fn epochs(&self) -> &[u64] {
        &self.epochs
    }

    pub fn steps(&self) -> &[u64] {
        &self.steps
    }

    pub fn all_epochs(&self) -> bool {
        self.all_epochs
    }

    pub fn epoch_ix(&self) -> usize {
        self.epoch_ix
    }

    pub fn step_ix(&self) -> usize {
        self.step_ix
    }

    /// The epoch checkpoint being measured, or `None` once all are done.
    pub fn current_epoch(&self) -> Option<u64> {
        self.epochs.get(self.epoch_ix).copied()
    }

    pub fn current_step(&self) -> u64 {
        self.steps[self.step_ix]
    }

    pub fn is_exhausted(&self) -> bool {
        self.epoch_ix >= self.epochs.len()
    }

    /// Move to the next step checkpoint, wrapping to 0 at the end of the list.
    pub fn advance_step(&mut self) -> StepAdvance {
        self.step_ix += 1;
        match self.steps.get(self.step_ix) {
            Some(&step) => StepAdvance::Next(step),
            None => {
                self.step_ix = 0;
                StepAdvance::Wrapped
            }
        }
    }

    pub fn reset_step(&mut self) {
        self.step_ix = 0;
    }

    /// Move to the next epoch checkpoint and return the epoch the loop should
    /// jump to. Once the list is exhausted that is `end`, and any listed epoch
    /// beyond `end` is clamped to it.
    pub fn advance_epoch(&mut self, end: u64) -> u64 {
        let next = self.peek_next_epoch(end);
        if self.epoch_ix < self.epochs.len() {
            self.epoch_ix += 1;
        }
        next
    }

    /// The target [`advance_epoch`](Self::advance_epoch) would return, without
    /// moving the cursor.
    pub fn peek_next_epoch(&self, end: u64) -> u64 {
        self.epochs
            .get(self.epoch_ix + 1)
            .map_or(end, |&epoch| epoch.min(end))
    }
}

/// Both lists must contain 0; the epoch list is ignored in all-epochs mode.
pub(crate) fn check_lists(
    epoch_list: &[u64],
    step_list: &[u64],
    all_epochs: bool,
) -> Result<(), ConfigError> {
    if !all_epochs {
        if epoch_list.is_empty() {
            return Err(ConfigError::EmptyEpochList);
        }
        if !epoch_list.contains(&0) {
            return Err(ConfigError::MissingEpochZero);
        }
    }
    if step_list.is_empty() {
        return Err(ConfigError::EmptyStepList);
    }
    if !step_list.contains(&0) {
        return Err(ConfigError::MissingStepZero);
    }
    Ok(())
}

fn sorted_unique(values: &[u64]) -> Vec<u64> {
    values
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lists_sorted_and_deduplicated() {
        let schedule = CheckpointSchedule::new(&[3, 0, 3, 1], &[50, 0, 10, 50], false).unwrap();
        assert_eq!(schedule.epochs(), &[0, 1, 3]);
        assert_eq!(schedule.steps(), &[0, 10, 50]);
    }

    #[test]
    fn test_validation_errors() {
        assert_eq!(
            CheckpointSchedule::new(&[], &[0], false).unwrap_err(),
            ConfigError::EmptyEpochList
        );
        assert_eq!(
            CheckpointSchedule::new(&[1], &[0], false).unwrap_err(),
            ConfigError::MissingEpochZero
        );
        assert_eq!(
            CheckpointSchedule::new(&[0], &[], false).unwrap_err(),
            ConfigError::EmptyStepList
        );
        assert_eq!(
            CheckpointSchedule::new(&[0], &[2], true).unwrap_err(),
            ConfigError::MissingStepZero
        );
        assert!(CheckpointSchedule::new(&[], &[0], true).is_ok());
    }

    #[test]
    fn test_expand_all_epochs() {
        let mut schedule = CheckpointSchedule::new(&[], &[0], true).unwrap();
        schedule.expand_all_epochs(3).unwrap();
        assert_eq!(schedule.epochs(), &[0, 1, 2]);

        let mut empty = CheckpointSchedule::new(&[], &[0], true).unwrap();
        assert_eq!(
            empty.expand_all_epochs(0).unwrap_err(),
            ConfigError::EmptyEpochList
        );
    }

    #[test]
    fn test_expand_ignored_without_all_epochs() {
        let mut schedule = CheckpointSchedule::new(&[0, 5], &[0], false).unwrap();
        schedule.expand_all_epochs(10).unwrap();
        assert_eq!(schedule.epochs(), &[0, 5]);
    }

    #[test]
    fn test_step_cursor_wraps() {
        let mut schedule = CheckpointSchedule::new(&[0], &[0, 3, 7], false).unwrap();
        assert_eq!(schedule.current_step(), 0);
        assert_eq!(schedule.advance_step(), StepAdvance::Next(3));
        assert_eq!(schedule.advance_step(), StepAdvance::Next(7));
        assert_eq!(schedule.advance_step(), StepAdvance::Wrapped);
        assert_eq!(schedule.step_ix(), 0);
    }

    #[test]
    fn test_rewind_restarts_both_cursors() {
        let mut schedule = CheckpointSchedule::new(&[0, 4], &[0, 3], false).unwrap();
        schedule.advance_step();
        schedule.advance_epoch(10);
        schedule.advance_epoch(10);
        assert!(schedule.is_exhausted());

        schedule.rewind();
        assert_eq!(schedule.current_epoch(), Some(0));
        assert_eq!(schedule.step_ix(), 0);
        assert_eq!(schedule.epochs(), &[0, 4]);
    }

    #[test]
    fn test_from_config_applies_full_validation() {
        let config = BenchmarkerConfig {
            min_steps: 0,
            ..Default::default()
        };
        assert_eq!(
            CheckpointSchedule::from_config(&config).unwrap_err(),
            ConfigError::ZeroMinSteps
        );

        let config = BenchmarkerConfig {
            epoch_list: vec![2, 0, 2],
            ..Default::default()
        };
        let schedule = CheckpointSchedule::from_config(&config).unwrap();
        assert_eq!(schedule.epochs(), &[0, 2]);
    }

    #[test]
    fn test_epoch_cursor_ends_at_total() {
        let mut schedule = CheckpointSchedule::new(&[0, 2, 9], &[0], false).unwrap();
        assert_eq!(schedule.advance_epoch(6), 2);
        // 9 lies beyond the run and is clamped.
        assert_eq!(schedule.advance_epoch(6), 6);
        assert_eq!(schedule.advance_epoch(6), 6);
        assert!(schedule.is_exhausted());
        assert_eq!(schedule.current_epoch(), None);
        // Advancing an exhausted cursor stays put.
        assert_eq!(schedule.advance_epoch(6), 6);
        assert_eq!(schedule.epoch_ix(), 3);
    }
}
