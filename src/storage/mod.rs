//! Storage module for network persistence and input sequences.

mod format;
mod inputs;

pub use format::{NetworkDocument, NeuronDocument, FORMAT_VERSION};
pub use inputs::{parse_inputs, read_inputs};
