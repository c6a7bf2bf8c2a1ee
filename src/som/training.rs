//! Sequence training.
//!
//! Feeds an ordered input sequence through the network, one
//! `forward` + `delta_w` step per input, and records the winner and the
//! one-step prediction error of every step.

use crate::config::{StepConfig, TrainingConfig};
use crate::error::{RdsomError, Result};
use crate::som::Network;
use log::info;

/// Outcome of a single step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepRecord {
    /// Global step counter, across epochs.
    pub step: usize,
    /// Elected winner.
    pub winner: usize,
    /// Winner predicted for the following step.
    pub predicted_winner: usize,
    /// Input distance of the winner.
    pub winner_distance_input: f64,
    /// Recurrent distance of the winner to the previous winner.
    pub winner_distance_recurrent: f64,
    /// Input distance of the winner predicted by the previous step.
    pub prediction_error: f64,
}

/// Records of a training run.
#[derive(Debug, Clone, Default)]
pub struct TrainingReport {
    /// One record per step.
    pub records: Vec<StepRecord>,
}

impl TrainingReport {
    /// Number of steps run.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no step was run.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mean one-step prediction error.
    pub fn mean_prediction_error(&self) -> f64 {
        self.mean(|r| r.prediction_error)
    }

    /// Mean input distance of the winners.
    pub fn mean_winner_distance(&self) -> f64 {
        self.mean(|r| r.winner_distance_input)
    }

    /// Sequence of winners.
    pub fn winners(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.winner).collect()
    }

    fn mean<F: Fn(&StepRecord) -> f64>(&self, f: F) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        self.records.iter().map(f).sum::<f64>() / self.records.len() as f64
    }
}

/// Drives a network over input sequences.
pub struct SequenceTrainer {
    step: StepConfig,
    config: TrainingConfig,
}

impl SequenceTrainer {
    /// Creates a new trainer with the given parameters.
    pub fn new(step: StepConfig, config: TrainingConfig) -> Self {
        Self { step, config }
    }

    /// Runs every epoch over `inputs`.
    ///
    /// With `learn == false` each step is closed with [`Network::advance`]
    /// instead of `delta_w`: the weights stay untouched while the winners roll.
    pub fn run(&self, network: &mut Network, inputs: &[Vec<f64>], learn: bool) -> Result<TrainingReport> {
        self.run_with_progress(network, inputs, learn, |_| {})
    }

    /// Like [`run`](Self::run), calling `progress` after every step.
    pub fn run_with_progress<F: FnMut(&StepRecord)>(
        &self,
        network: &mut Network,
        inputs: &[Vec<f64>],
        learn: bool,
        mut progress: F,
    ) -> Result<TrainingReport> {
        if inputs.is_empty() {
            return Err(RdsomError::Training("No input vectors provided".to_string()));
        }
        self.config.validate()?;
        self.step.validate()?;

        let total = self.config.epochs * inputs.len();
        info!(
            "Running R-DSOM on {} inputs x {} epochs ({} steps, learn={})",
            inputs.len(),
            self.config.epochs,
            total,
            learn
        );

        let mut report = TrainingReport {
            records: Vec::with_capacity(total),
        };

        for epoch in 0..self.config.epochs {
            for input in inputs {
                let step = report.records.len();
                let winner = network.forward(input, &self.step)?;
                if learn {
                    network.delta_w(input, &self.step)?;
                } else {
                    network.advance()?;
                }

                let record = StepRecord {
                    step,
                    winner,
                    predicted_winner: network.predicted_winner(),
                    winner_distance_input: network.winner_distance_input(),
                    winner_distance_recurrent: network.winner_distance_recurrent(),
                    prediction_error: network.winner_distance_pred(),
                };
                progress(&record);
                report.records.push(record);

                if self.config.log_every > 0 && (step + 1) % self.config.log_every == 0 {
                    info!(
                        "Step {}/{} (epoch {}): winner={}, d_in={:.4}, d_pred={:.4}",
                        step + 1,
                        total,
                        epoch,
                        winner,
                        record.winner_distance_input,
                        record.prediction_error
                    );
                }
            }
        }

        info!(
            "Run completed: mean winner distance={:.4}, mean prediction error={:.4}",
            report.mean_winner_distance(),
            report.mean_prediction_error()
        );
        Ok(report)
    }
}
