//! JSON document format for persisted networks.
//!
//! ```text
//! {
//!   "format_version": 1,
//!   "input_dim": 1,
//!   "neuron_count": 9,
//!   "topology_selector": -1,
//!   "grid_side": 9,
//!   "max_input_distance": 0.93,
//!   "max_recurrent_distance": 0.88,
//!   "neurons": [
//!     { "index": 0, "links": [1], "neighbor_distances": [[1, 1.0], [2, 2.0]],
//!       "weights": [0.41], "recurrent_weights": [0.0], "position": [0] },
//!     ...
//!   ]
//! }
//! ```
//!
//! The topological normalization constant is never stored. Restoring a
//! network recomputes every distance from the links, derives the constant
//! again and rejects stored distances that disagree with the result.

use crate::error::{RdsomError, Result};
use crate::som::topology::{grid_coords, grid_neighbors, Topology};
use crate::som::{Network, Neuron};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Current document version.
pub const FORMAT_VERSION: u16 = 1;

/// Dimension of the recurrence space.
const RECURRENT_DIM: usize = 1;

fn default_version() -> u16 {
    FORMAT_VERSION
}

/// Persisted form of a network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDocument {
    /// Document version.
    #[serde(default = "default_version")]
    pub format_version: u16,
    /// Declared input dimensionality.
    pub input_dim: usize,
    /// Number of neurons.
    pub neuron_count: usize,
    /// Signed topology selector (degree if positive, -dimension if negative).
    pub topology_selector: i32,
    /// Grid side (0 for random topologies).
    pub grid_side: usize,
    /// Running maximum of input distances.
    pub max_input_distance: f64,
    /// Running maximum of recurrent distances.
    #[serde(default)]
    pub max_recurrent_distance: f64,
    /// The neurons, in index order.
    pub neurons: Vec<NeuronDocument>,
}

/// Persisted form of a neuron.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuronDocument {
    /// Neuron index.
    pub index: usize,
    /// Direct links.
    pub links: Vec<usize>,
    /// Cached `(index, distance)` pairs.
    pub neighbor_distances: Vec<(usize, f64)>,
    /// Input weights.
    pub weights: Vec<f64>,
    /// Recurrent weights.
    pub recurrent_weights: Vec<f64>,
    /// Grid coordinates, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec<i64>>,
}

impl NeuronDocument {
    fn from_neuron(neuron: &Neuron) -> Self {
        Self {
            index: neuron.index,
            links: neuron.links.iter().copied().collect(),
            neighbor_distances: neuron
                .neighbor_distances
                .iter()
                .map(|(&i, &d)| (i, d))
                .collect(),
            weights: neuron.weights.clone(),
            recurrent_weights: neuron.recurrent_weights.clone(),
            position: neuron.position.clone(),
        }
    }
}

fn invalid<T>(msg: String) -> Result<T> {
    Err(RdsomError::Document(msg))
}

impl NetworkDocument {
    /// Captures a network.
    pub fn from_network(network: &Network) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            input_dim: network.input_dim(),
            neuron_count: network.len(),
            topology_selector: network.topology().selector(),
            grid_side: network.grid_side(),
            max_input_distance: network.max_input_distance(),
            max_recurrent_distance: network.max_recurrent_distance(),
            neurons: network.neurons().iter().map(NeuronDocument::from_neuron).collect(),
        }
    }

    /// Rebuilds the network, validating every field first.
    ///
    /// Either the whole network is restored or an error is returned.
    pub fn into_network(self) -> Result<Network> {
        if self.format_version > FORMAT_VERSION {
            return invalid(format!(
                "unsupported format version {} (latest is {})",
                self.format_version, FORMAT_VERSION
            ));
        }
        if self.input_dim == 0 {
            return invalid("input_dim must be at least 1".to_string());
        }
        let n = self.neuron_count;
        if self.neurons.len() != n {
            return invalid(format!(
                "neuron_count is {} but {} neurons are stored",
                n,
                self.neurons.len()
            ));
        }

        let topology = Topology::from_selector(self.topology_selector)
            .map_err(|e| RdsomError::Document(e.to_string()))?;
        let side = topology
            .validate(n)
            .map_err(|e| RdsomError::Document(e.to_string()))?;
        if side != self.grid_side {
            return invalid(format!(
                "grid_side {} does not match {} neurons in {}",
                self.grid_side, n, topology
            ));
        }
        for (name, value) in [
            ("max_input_distance", self.max_input_distance),
            ("max_recurrent_distance", self.max_recurrent_distance),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return invalid(format!("{name} must be a finite non-negative number"));
            }
        }

        let mut neurons = Vec::with_capacity(n);
        for (slot, doc) in self.neurons.iter().enumerate() {
            neurons.push(Self::restore_neuron(slot, doc, n, self.input_dim, topology, side)?);
        }

        for neuron in &neurons {
            for &link in &neuron.links {
                if !neurons[link].has_link(neuron.index) {
                    return invalid(format!(
                        "link {} -> {} is not symmetric",
                        neuron.index, link
                    ));
                }
            }
            match topology {
                Topology::Grid { dimension } => {
                    let expected: BTreeSet<usize> =
                        grid_neighbors(neuron.index, side, dimension).into_iter().collect();
                    if neuron.links != expected {
                        return invalid(format!(
                            "neuron {} links {:?} are not its grid neighbors {:?}",
                            neuron.index, neuron.links, expected
                        ));
                    }
                }
                Topology::Random { degree } => {
                    if neuron.links.len() < degree {
                        return invalid(format!(
                            "neuron {} has {} links, degree is {}",
                            neuron.index,
                            neuron.links.len(),
                            degree
                        ));
                    }
                }
            }
        }

        let network = Network::from_parts(
            neurons,
            topology,
            self.input_dim,
            self.max_input_distance,
            self.max_recurrent_distance,
        )?;

        // Stored distances are a cache; they must agree with the links.
        for doc in &self.neurons {
            for &(other, dist) in &doc.neighbor_distances {
                let actual = network.topological_distance(doc.index, other);
                if actual != Some(dist) {
                    return invalid(format!(
                        "neuron {} stores distance {} to neuron {}, links give {:?}",
                        doc.index, dist, other, actual
                    ));
                }
            }
        }

        Ok(network)
    }

    fn restore_neuron(
        slot: usize,
        doc: &NeuronDocument,
        n: usize,
        input_dim: usize,
        topology: Topology,
        side: usize,
    ) -> Result<Neuron> {
        if doc.index != slot {
            return invalid(format!("neuron at slot {} has index {}", slot, doc.index));
        }
        if doc.weights.len() != input_dim {
            return invalid(format!(
                "neuron {} has {} weights, expected {}",
                slot,
                doc.weights.len(),
                input_dim
            ));
        }
        if doc.recurrent_weights.len() != RECURRENT_DIM {
            return invalid(format!(
                "neuron {} has {} recurrent weights, expected {}",
                slot,
                doc.recurrent_weights.len(),
                RECURRENT_DIM
            ));
        }
        if doc
            .weights
            .iter()
            .chain(doc.recurrent_weights.iter())
            .any(|w| !w.is_finite())
        {
            return invalid(format!("neuron {} has non-finite weights", slot));
        }

        let mut links = BTreeSet::new();
        for &link in &doc.links {
            if link >= n || link == slot {
                return invalid(format!("neuron {} has invalid link {}", slot, link));
            }
            links.insert(link);
        }

        for &(other, dist) in &doc.neighbor_distances {
            if other >= n || other == slot {
                return invalid(format!("neuron {} has a distance to invalid neuron {}", slot, other));
            }
            if !(dist.is_finite() && dist >= 1.0) {
                return invalid(format!(
                    "neuron {} has invalid distance {} to neuron {}",
                    slot, dist, other
                ));
            }
        }

        // Grid coordinates follow from the index; stored ones are not trusted.
        let position = match topology {
            Topology::Grid { dimension } => Some(grid_coords(slot, side, dimension)),
            Topology::Random { .. } => None,
        };

        let mut neuron = Neuron::new_with_weights(
            slot,
            position,
            doc.weights.clone(),
            doc.recurrent_weights.clone(),
        );
        neuron.links = links;
        Ok(neuron)
    }
}

impl Network {
    /// Captures the network as a persistence document.
    pub fn to_document(&self) -> NetworkDocument {
        NetworkDocument::from_network(self)
    }

    /// Restores a network from a persistence document.
    pub fn from_document(doc: NetworkDocument) -> Result<Self> {
        doc.into_network()
    }

    /// Saves the network as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.to_document())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        info!("Saved {} neurons to {}", self.len(), path.display());
        Ok(())
    }

    /// Loads a network saved with [`Network::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let doc: NetworkDocument = serde_json::from_reader(BufReader::new(file))?;
        let network = doc.into_network()?;
        info!("Loaded {} neurons from {}", network.len(), path.display());
        Ok(network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NetworkConfig, StepConfig};

    fn grid_network() -> Network {
        let mut net = Network::new(&NetworkConfig {
            input_dim: 2,
            neuron_count: 9,
            topology: -2,
            seed: Some(9),
            ..Default::default()
        })
        .unwrap();
        net.step(&[0.3, 0.6], &StepConfig::default()).unwrap();
        net
    }

    #[test]
    fn test_document_restores_network() {
        let net = grid_network();
        let restored = Network::from_document(net.to_document()).unwrap();
        assert_eq!(restored.neurons(), net.neurons());
        assert_eq!(restored.max_input_distance(), net.max_input_distance());
        assert_eq!(restored.max_recurrent_distance(), net.max_recurrent_distance());
        assert_eq!(restored.max_topological_distance(), net.max_topological_distance());
    }

    #[test]
    fn test_restore_without_distances() {
        let net = grid_network();
        let mut doc = net.to_document();
        for n in &mut doc.neurons {
            n.neighbor_distances.clear();
        }
        let restored = doc.into_network().unwrap();
        assert_eq!(restored.neurons(), net.neurons());
    }

    #[test]
    fn test_rejects_count_mismatch() {
        let mut doc = grid_network().to_document();
        doc.neuron_count = 10;
        assert!(matches!(doc.into_network(), Err(RdsomError::Document(_))));
    }

    #[test]
    fn test_rejects_weight_dimension_mismatch() {
        let mut doc = grid_network().to_document();
        doc.neurons[4].weights.push(0.0);
        assert!(matches!(doc.into_network(), Err(RdsomError::Document(_))));
    }

    #[test]
    fn test_rejects_asymmetric_link() {
        let mut doc = grid_network().to_document();
        doc.neurons[0].links.push(8);
        assert!(matches!(doc.into_network(), Err(RdsomError::Document(_))));
    }

    #[test]
    fn test_rejects_shortcut_distance() {
        let net = grid_network();
        assert_eq!(net.topological_distance(0, 8), Some(4.0));

        let mut doc = net.to_document();
        for entry in &mut doc.neurons[0].neighbor_distances {
            if entry.0 == 8 {
                entry.1 = 1.0;
            }
        }
        assert!(matches!(doc.into_network(), Err(RdsomError::Document(_))));

        let mut doc = net.to_document();
        doc.neurons[3].neighbor_distances.retain(|&(other, _)| other != 5);
        doc.neurons[3].neighbor_distances.push((5, 3.0));
        assert!(matches!(doc.into_network(), Err(RdsomError::Document(_))));
    }

    #[test]
    fn test_rejects_extra_grid_link() {
        let mut doc = grid_network().to_document();
        doc.neurons[0].links.push(8);
        doc.neurons[8].links.push(0);
        assert!(matches!(doc.into_network(), Err(RdsomError::Document(_))));

        let mut doc = grid_network().to_document();
        doc.neurons[4].links.retain(|&l| l != 5);
        doc.neurons[5].links.retain(|&l| l != 4);
        assert!(matches!(doc.into_network(), Err(RdsomError::Document(_))));
    }

    #[test]
    fn test_rejects_random_degree_shortfall() {
        let net = Network::new(&NetworkConfig {
            neuron_count: 10,
            topology: 3,
            seed: Some(2),
            ..Default::default()
        })
        .unwrap();
        let mut doc = net.to_document();
        let dropped = std::mem::take(&mut doc.neurons[0].links);
        for l in dropped {
            doc.neurons[l].links.retain(|&other| other != 0);
        }
        for n in &mut doc.neurons {
            n.neighbor_distances.clear();
        }
        assert!(matches!(doc.into_network(), Err(RdsomError::Document(_))));
    }

    #[test]
    fn test_grid_normalization_ignores_stored_cache() {
        let net = grid_network();
        let mut doc = net.to_document();
        for n in &mut doc.neurons {
            n.neighbor_distances.clear();
        }
        let restored = doc.into_network().unwrap();
        assert_eq!(restored.max_topological_distance(), 4.0);
        assert_eq!(restored.topological_distance(0, 8), Some(4.0));
        assert_eq!(restored.topological_distance(8, 0), Some(4.0));
    }

    #[test]
    fn test_rejects_bad_grid_side() {
        let mut doc = grid_network().to_document();
        doc.grid_side = 4;
        assert!(matches!(doc.into_network(), Err(RdsomError::Document(_))));
    }

    #[test]
    fn test_rejects_bad_distance() {
        let mut doc = grid_network().to_document();
        doc.neurons[1].neighbor_distances.push((7, 0.5));
        assert!(doc.into_network().is_err());
    }

    #[test]
    fn test_missing_field_fails_to_parse() {
        let json = r#"{ "input_dim": 1, "neuron_count": 1, "topology_selector": -1, "grid_side": 1 }"#;
        let parsed: std::result::Result<NetworkDocument, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_json_roundtrip_minimal() {
        let json = r#"{
            "input_dim": 1, "neuron_count": 2, "topology_selector": -1, "grid_side": 2,
            "max_input_distance": 0.0,
            "neurons": [
                { "index": 0, "links": [1], "neighbor_distances": [],
                  "weights": [0.1], "recurrent_weights": [0.0] },
                { "index": 1, "links": [0], "neighbor_distances": [],
                  "weights": [0.9], "recurrent_weights": [0.5] }
            ]
        }"#;
        let doc: NetworkDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.format_version, FORMAT_VERSION);
        let net = doc.into_network().unwrap();
        assert_eq!(net.max_topological_distance(), 1.0);
        assert_eq!(net.topological_distance(0, 1), Some(1.0));
        assert_eq!(net.neuron(1).unwrap().position, Some(vec![1]));
    }
}
