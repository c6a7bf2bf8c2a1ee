//! Recurrent Dynamic Self-Organizing Map.
//!
//! - **Neuron**: weights, recurrent weights, links and distance cache (neuron.rs)
//! - **Topology**: random fixed-degree graphs and 1-D/2-D grids (topology.rs)
//! - **Distances**: all-pairs hop-count shortest paths (distance.rs)
//! - **Kernels**: similarities, convolution and the DSOM neighborhood (kernel.rs)
//! - **Network**: winner election and weight adaptation (network.rs)
//! - **Training**: sequence driver with per-step error records (training.rs)

mod neuron;
mod network;
pub mod distance;
pub mod kernel;
pub mod topology;
pub mod training;

pub use network::Network;
pub use neuron::{euclidean, Neuron};
pub use topology::Topology;
pub use training::{SequenceTrainer, StepRecord, TrainingReport};
