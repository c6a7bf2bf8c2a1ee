//! Topology construction: random fixed-degree graphs and regular grids.
//!
//! Grids have no wraparound. A 1-D grid of side `s` is a chain, a 2-D grid
//! is stored row-major (`index = row * side + col`) with links to the four
//! cardinal neighbors that exist.

use crate::error::{RdsomError, Result};
use crate::som::Neuron;
use log::debug;
use rand::Rng;
use std::fmt;

/// Layout of the direct links between neurons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// Random graph where every neuron has at least `degree` links.
    Random {
        /// Minimum number of links per neuron.
        degree: usize,
    },
    /// Regular grid without wraparound.
    Grid {
        /// Grid dimension (1 or 2).
        dimension: usize,
    },
}

impl Topology {
    /// Decodes a signed selector: `k > 0` is a random degree, `-d < 0` a grid dimension.
    pub fn from_selector(selector: i32) -> Result<Self> {
        match selector {
            0 => Err(RdsomError::Config(
                "topology selector 0 is neither a degree nor a grid dimension".to_string(),
            )),
            k if k > 0 => Ok(Topology::Random { degree: k as usize }),
            d => Ok(Topology::Grid {
                dimension: d.unsigned_abs() as usize,
            }),
        }
    }

    /// Encodes back to the signed selector.
    pub fn selector(&self) -> i32 {
        match *self {
            Topology::Random { degree } => degree as i32,
            Topology::Grid { dimension } => -(dimension as i32),
        }
    }

    /// True for grid topologies.
    #[inline]
    pub fn is_grid(&self) -> bool {
        matches!(self, Topology::Grid { .. })
    }

    /// Checks that `neuron_count` neurons can be laid out with this topology.
    ///
    /// Returns the grid side (0 for random topologies).
    pub fn validate(&self, neuron_count: usize) -> Result<usize> {
        if neuron_count == 0 {
            return Err(RdsomError::Topology("a network needs at least one neuron".to_string()));
        }
        match *self {
            Topology::Random { degree } => {
                if degree >= neuron_count {
                    return Err(RdsomError::Topology(format!(
                        "degree {degree} requires more than {neuron_count} neurons"
                    )));
                }
                Ok(0)
            }
            Topology::Grid { dimension } => {
                if !(1..=2).contains(&dimension) {
                    return Err(RdsomError::Topology(format!(
                        "grid dimension {dimension} not supported (only 1 and 2)"
                    )));
                }
                grid_side(neuron_count, dimension).ok_or_else(|| {
                    RdsomError::Topology(format!(
                        "incompatible size: {neuron_count} neurons is not a {dimension}-D grid"
                    ))
                })
            }
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topology::Random { degree } => write!(f, "random(degree={degree})"),
            Topology::Grid { dimension } => write!(f, "grid({dimension}D)"),
        }
    }
}

/// Integer side `s` with `s^dimension == count`, if any.
pub fn grid_side(count: usize, dimension: usize) -> Option<usize> {
    let guess = (count as f64).powf(1.0 / dimension as f64).round() as usize;
    // Check the neighbors of the float guess to absorb rounding.
    (guess.saturating_sub(1)..=guess + 1).find(|&side| {
        side > 0 && side.checked_pow(dimension as u32) == Some(count)
    })
}

/// Grid coordinates of a neuron index.
pub fn grid_coords(index: usize, side: usize, dimension: usize) -> Vec<i64> {
    match dimension {
        1 => vec![index as i64],
        _ => vec![(index / side) as i64, (index % side) as i64],
    }
}

/// Builds the neuron collection and its direct links.
///
/// All parameters are validated before any neuron is created. Returns the
/// neurons and the grid side (0 for random topologies).
pub fn build<R: Rng>(
    topology: Topology,
    input_dim: usize,
    neuron_count: usize,
    w_min: f64,
    w_max: f64,
    rng: &mut R,
) -> Result<(Vec<Neuron>, usize)> {
    if input_dim == 0 {
        return Err(RdsomError::Config("input_dim must be at least 1".to_string()));
    }
    let span = w_max - w_min;
    if !span.is_finite() || span < 0.0 {
        return Err(RdsomError::Config(format!("invalid weight range [{w_min}, {w_max}]")));
    }
    let side = topology.validate(neuron_count)?;

    let neurons = match topology {
        Topology::Random { degree } => {
            let mut neurons: Vec<Neuron> = (0..neuron_count)
                .map(|i| Neuron::new_random(i, None, input_dim, w_min, w_max, rng))
                .collect();
            link_random(&mut neurons, degree, rng);
            neurons
        }
        Topology::Grid { dimension } => {
            let mut neurons: Vec<Neuron> = (0..neuron_count)
                .map(|i| {
                    let pos = grid_coords(i, side, dimension);
                    let mut neuron =
                        Neuron::new_random(i, Some(pos), input_dim, w_min, w_max, rng);
                    if dimension == 1 {
                        // Recurrence space starts out mirroring the chain order.
                        neuron.recurrent_weights = vec![i as f64 / side as f64];
                    }
                    neuron
                })
                .collect();
            link_grid(&mut neurons, side, dimension);
            neurons
        }
    };

    debug!(
        "Built {} topology with {} neurons (side={})",
        topology, neuron_count, side
    );
    Ok((neurons, side))
}

/// Adds symmetric random links until every neuron has at least `degree` of them.
///
/// Requires `degree < neurons.len()`.
fn link_random<R: Rng>(neurons: &mut [Neuron], degree: usize, rng: &mut R) {
    let n = neurons.len();
    for i in 0..n {
        while neurons[i].links.len() < degree {
            let other = rng.gen_range(0..n);
            if other == i || neurons[i].has_link(other) {
                continue;
            }
            neurons[i].add_link(other);
            neurons[other].add_link(i);
        }
    }
}

/// Cardinal neighbors of a grid neuron, in row-major index space.
pub fn grid_neighbors(index: usize, side: usize, dimension: usize) -> Vec<usize> {
    let mut neighbors = Vec::with_capacity(2 * dimension);
    match dimension {
        1 => {
            if index > 0 {
                neighbors.push(index - 1);
            }
            if index + 1 < side {
                neighbors.push(index + 1);
            }
        }
        _ => {
            let (row, col) = (index / side, index % side);
            if row > 0 {
                neighbors.push(index - side);
            }
            if row + 1 < side {
                neighbors.push(index + side);
            }
            if col > 0 {
                neighbors.push(index - 1);
            }
            if col + 1 < side {
                neighbors.push(index + 1);
            }
        }
    }
    neighbors
}

/// Links every grid neuron to its existing cardinal neighbors.
fn link_grid(neurons: &mut [Neuron], side: usize, dimension: usize) {
    for (i, neuron) in neurons.iter_mut().enumerate() {
        for j in grid_neighbors(i, side, dimension) {
            neuron.add_link(j);
        }
    }
}
