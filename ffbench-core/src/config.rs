//! Benchmarker configuration.
//!
//! Uses `figment` for layered configuration: defaults -> user config -> workspace
//! config -> environment -> explicit overrides. Files are looked up at
//! `~/.config/ffbench/benchmarker.toml` and `.ffbench/benchmarker.toml` in the
//! workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{BenchError, ConfigError};
use crate::schedule::check_lists;

/// Checkpoint selection for a fast-forward benchmark run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkerConfig {
    /// Minimum number of batches measured per checkpoint.
    #[serde(default = "default_min_steps")]
    pub min_steps: u64,
    /// Epochs at which throughput is measured. Must contain 0.
    #[serde(default = "default_epoch_list")]
    pub epoch_list: Vec<u64>,
    /// Steps within each measured epoch at which throughput is measured. Must contain 0.
    #[serde(default = "default_step_list")]
    pub step_list: Vec<u64>,
    /// Ignore `epoch_list` and measure the first `min_steps` batches of every epoch.
    #[serde(default)]
    pub all_epochs: bool,
}

impl Default for BenchmarkerConfig {
    fn default() -> Self {
        Self {
            min_steps: default_min_steps(),
            epoch_list: default_epoch_list(),
            step_list: default_step_list(),
            all_epochs: false,
        }
    }
}

fn default_min_steps() -> u64 {
    50
}

fn default_epoch_list() -> Vec<u64> {
    vec![0, 1]
}

fn default_step_list() -> Vec<u64> {
    vec![0, 50]
}

impl BenchmarkerConfig {
    /// Check the invariants every later jump and extrapolation relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_steps == 0 {
            return Err(ConfigError::ZeroMinSteps);
        }
        check_lists(&self.epoch_list, &self.step_list, self.all_epochs)
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `FFBENCH_`, e.g. `FFBENCH_MIN_STEPS=20`)
/// 3. Workspace-local config (`.ffbench/benchmarker.toml`)
/// 4. User config (`~/.config/ffbench/benchmarker.toml`)
/// 5. Built-in defaults
///
/// The merged result is validated before it is returned.
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&BenchmarkerConfig>,
) -> Result<BenchmarkerConfig, BenchError> {
    let mut figment = Figment::from(Serialized::defaults(BenchmarkerConfig::default()));

    if let Some(dirs) = directories::ProjectDirs::from("dev", "ffbench", "ffbench") {
        let user_config = dirs.config_dir().join("benchmarker.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".ffbench").join("benchmarker.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    figment = figment.merge(Env::prefixed("FFBENCH_"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let config: BenchmarkerConfig = figment.extract().map_err(Box::new)?;
    config.validate()?;
    tracing::debug!(
        min_steps = config.min_steps,
        epochs = ?config.epoch_list,
        steps = ?config.step_list,
        all_epochs = config.all_epochs,
        "Loaded benchmarker configuration"
    );
    Ok(config)
}
