//! Configuration for the R-DSOM network.

use crate::error::{RdsomError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for an R-DSOM run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Network construction parameters.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Per-step winner selection and adaptation parameters.
    #[serde(default)]
    pub step: StepConfig,

    /// Sequence training parameters.
    #[serde(default)]
    pub training: TrainingConfig,
}

impl Config {
    /// Loads a configuration from a JSON file.
    ///
    /// Missing sections fall back to their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;
        self.step.validate()?;
        self.training.validate()
    }
}

/// Network construction parameters.
///
/// Immutable once the network exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Dimensionality of the input vectors.
    /// Default: 1.
    pub input_dim: usize,

    /// Number of neurons.
    /// Default: 10.
    pub neuron_count: usize,

    /// Signed topology selector.
    /// `k > 0` builds a random graph where every neuron has at least `k` links,
    /// `-d < 0` builds a regular grid of dimension `d` (1 or 2).
    /// Default: -1.
    pub topology: i32,

    /// Lower bound of the initial input weights.
    /// Default: 0.0.
    pub w_min: f64,

    /// Upper bound of the initial input weights.
    /// Default: 1.0.
    pub w_max: f64,

    /// Random seed for reproducibility.
    /// Default: None (random).
    pub seed: Option<u64>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            input_dim: 1,
            neuron_count: 10,
            topology: -1,
            w_min: 0.0,
            w_max: 1.0,
            seed: None,
        }
    }
}

impl NetworkConfig {
    /// Checks the scalar parameters. Topology compatibility is checked by the builder.
    pub fn validate(&self) -> Result<()> {
        if self.input_dim == 0 {
            return Err(RdsomError::Config("input_dim must be at least 1".to_string()));
        }
        if self.neuron_count == 0 {
            return Err(RdsomError::Config("neuron_count must be at least 1".to_string()));
        }
        if self.topology == 0 {
            return Err(RdsomError::Config(
                "topology selector must be a positive degree or a negative grid dimension"
                    .to_string(),
            ));
        }
        let span = self.w_max - self.w_min;
        if !span.is_finite() || span < 0.0 {
            return Err(RdsomError::Config(format!(
                "invalid weight range [{}, {}]",
                self.w_min, self.w_max
            )));
        }
        Ok(())
    }
}

/// Parameters of a single `forward` / `delta_w` step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    /// Trade-off between input and recurrent similarity, in [0, 1].
    /// `1.0` ignores the recurrent similarity entirely.
    /// Default: 0.5.
    pub beta: f64,

    /// Width of the input similarity kernel.
    /// Default: 0.1.
    pub sigma_input: f64,

    /// Width of the recurrent similarity kernel.
    /// Default: 0.1.
    pub sigma_recurrent: f64,

    /// Width of the circular convolution kernel.
    /// Default: 0.1.
    pub sigma_convolution: f64,

    /// Learning rate.
    /// Default: 0.1.
    pub eps: f64,

    /// Elasticity of the input neighborhood.
    /// Default: 1.0.
    pub ela: f64,

    /// Elasticity of the recurrent neighborhood.
    /// Default: 1.0.
    pub ela_rec: f64,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            beta: 0.5,
            sigma_input: 0.1,
            sigma_recurrent: 0.1,
            sigma_convolution: 0.1,
            eps: 0.1,
            ela: 1.0,
            ela_rec: 1.0,
        }
    }
}

impl StepConfig {
    /// Checks the parameters used by `forward`.
    pub fn validate_forward(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.beta) {
            return Err(RdsomError::Config(format!("beta must be in [0, 1], got {}", self.beta)));
        }
        for (name, value) in [
            ("sigma_input", self.sigma_input),
            ("sigma_recurrent", self.sigma_recurrent),
            ("sigma_convolution", self.sigma_convolution),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(RdsomError::Config(format!("{name} must be > 0, got {value}")));
            }
        }
        Ok(())
    }

    /// Checks the parameters used by `delta_w`.
    pub fn validate_adaptation(&self) -> Result<()> {
        if !(self.eps >= 0.0 && self.eps.is_finite()) {
            return Err(RdsomError::Config(format!("eps must be >= 0, got {}", self.eps)));
        }
        for (name, value) in [("ela", self.ela), ("ela_rec", self.ela_rec)] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(RdsomError::Config(format!("{name} must be > 0, got {value}")));
            }
        }
        Ok(())
    }

    /// Checks all step parameters.
    pub fn validate(&self) -> Result<()> {
        self.validate_forward()?;
        self.validate_adaptation()
    }
}

/// Sequence training configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of passes over the input sequence.
    /// Default: 1.
    pub epochs: usize,

    /// Log progress every this many steps (0 disables progress logging).
    /// Default: 1000.
    pub log_every: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 1,
            log_every: 1000,
        }
    }
}

impl TrainingConfig {
    /// Checks the training parameters.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(RdsomError::Config("epochs must be at least 1".to_string()));
        }
        Ok(())
    }
}
