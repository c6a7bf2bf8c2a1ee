//! # R-DSOM - Recurrent Dynamic Self-Organizing Map
//!
//! A Dynamic SOM whose neurons also carry a position in a one-dimensional
//! "recurrence" space, so that the map learns both *where* an input falls
//! and *what tends to come next*.
//!
//! ## Overview
//!
//! Every step has two halves:
//!
//! - **forward**: input and recurrent similarities are merged
//!   (`sqrt(s_in * (beta + (1 - beta) * s_rec))`), smoothed by a circular
//!   Gaussian convolution on 1-D maps, and the best neuron wins. The neuron
//!   whose recurrent weight best matches the previous winner is kept as the
//!   prediction for the next step.
//! - **delta_w**: weights move towards the input with a neighborhood whose
//!   width is driven by the current normalized winner error, not by a time
//!   schedule.
//!
//! Neighborhoods are measured in hops along the topology links, which are
//! either a random fixed-degree graph or a 1-D/2-D grid.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rdsom::{Network, NetworkConfig, StepConfig};
//!
//! let mut net = Network::new(&NetworkConfig {
//!     input_dim: 1,
//!     neuron_count: 9,
//!     topology: -1,
//!     seed: Some(42),
//!     ..Default::default()
//! })?;
//!
//! let params = StepConfig::default();
//! for x in [0.1, 0.5, 0.9] {
//!     let winner = net.forward(&[x], &params)?;
//!     net.delta_w(&[x], &params)?;
//!     println!("{x} -> {winner}, prediction error {}", net.winner_distance_pred());
//! }
//!
//! net.save("net.json")?;
//! ```
//!
//! ## Architecture
//!
//! - [`som`] - Neurons, topology, distances, kernels, network and trainer
//! - [`storage`] - JSON persistence and input sequence files
//! - [`config`] - Construction, step and training parameters

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod som;
pub mod storage;

// Re-export commonly used types
pub use config::{Config, NetworkConfig, StepConfig, TrainingConfig};
pub use error::{RdsomError, Result};
pub use som::{Network, Neuron, SequenceTrainer, StepRecord, Topology, TrainingReport};
pub use storage::{read_inputs, NetworkDocument, NeuronDocument};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
