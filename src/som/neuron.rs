//! Neuron representation for the recurrent Dynamic SOM.

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A neuron of the recurrent Dynamic SOM.
///
/// Each neuron has an input-space weight vector, a position in the
/// one-dimensional recurrence space, its direct topology links and a cache
/// of topological distances to every reachable neuron.
#[derive(Debug, Clone, PartialEq)]
pub struct Neuron {
    /// Stable identity, equal to the neuron's slot in the network.
    pub index: usize,
    /// Grid coordinates, present only for grid topologies.
    pub position: Option<Vec<i64>>,
    /// Weight vector in input space.
    pub weights: Vec<f64>,
    /// Weight vector in recurrence space.
    pub recurrent_weights: Vec<f64>,
    /// Direct (symmetric) topology neighbors.
    pub links: BTreeSet<usize>,
    /// Topological distance to other neurons. Entries are only ever lowered.
    pub neighbor_distances: BTreeMap<usize, f64>,
}

impl Neuron {
    /// Creates a new neuron with weights uniform in `[w_min, w_max]`
    /// and a recurrent weight uniform in `[0, 1]`.
    pub fn new_random<R: Rng>(
        index: usize,
        position: Option<Vec<i64>>,
        weight_dim: usize,
        w_min: f64,
        w_max: f64,
        rng: &mut R,
    ) -> Self {
        let input_range = Uniform::new_inclusive(w_min, w_max);
        let weights: Vec<f64> = (0..weight_dim).map(|_| input_range.sample(rng)).collect();
        let recurrent_weights = vec![rng.gen_range(0.0..=1.0)];

        Self::new_with_weights(index, position, weights, recurrent_weights)
    }

    /// Creates a new neuron with the given weights and no links.
    pub fn new_with_weights(
        index: usize,
        position: Option<Vec<i64>>,
        weights: Vec<f64>,
        recurrent_weights: Vec<f64>,
    ) -> Self {
        Self {
            index,
            position,
            weights,
            recurrent_weights,
            links: BTreeSet::new(),
            neighbor_distances: BTreeMap::new(),
        }
    }

    /// Adds a direct link. Returns false if it already existed.
    pub fn add_link(&mut self, other: usize) -> bool {
        self.links.insert(other)
    }

    /// Checks for a direct link.
    #[inline]
    pub fn has_link(&self, other: usize) -> bool {
        self.links.contains(&other)
    }

    /// Records a topological distance, keeping the existing entry if it is
    /// already smaller or equal. Self entries are never stored.
    pub fn update_neighbor(&mut self, other: usize, distance: f64) {
        if other == self.index {
            return;
        }
        self.neighbor_distances
            .entry(other)
            .and_modify(|d| {
                if distance < *d {
                    *d = distance;
                }
            })
            .or_insert(distance);
    }

    /// Topological distance to another neuron, if known. Zero for itself.
    pub fn topological_distance(&self, other: usize) -> Option<f64> {
        if other == self.index {
            Some(0.0)
        } else {
            self.neighbor_distances.get(&other).copied()
        }
    }

    /// Euclidean distance between this neuron's weights and an input vector.
    pub fn distance(&self, input: &[f64]) -> f64 {
        debug_assert_eq!(
            self.weights.len(),
            input.len(),
            "Weight and input dimensions must match"
        );

        euclidean(&self.weights, input)
    }

    /// Input distance scaled by `sqrt(dim)`, so that it lies in [0, 1]
    /// for weights and inputs in the unit hypercube.
    pub fn distance_normed(&self, input: &[f64]) -> f64 {
        if input.is_empty() {
            return 0.0;
        }
        self.distance(input) / (input.len() as f64).sqrt()
    }

    /// Euclidean distance in recurrence space to a recurrent position.
    pub fn recurrent_distance(&self, recurrent: &[f64]) -> f64 {
        euclidean(&self.recurrent_weights, recurrent)
    }

    /// Moves the input weights towards `target` by `rate`.
    pub fn move_weights(&mut self, target: &[f64], rate: f64) {
        for (w, t) in self.weights.iter_mut().zip(target.iter()) {
            *w += rate * (t - *w);
        }
    }

    /// Moves the recurrent weights towards `target` by `rate`.
    pub fn move_recurrent_weights(&mut self, target: &[f64], rate: f64) {
        for (w, t) in self.recurrent_weights.iter_mut().zip(target.iter()) {
            *w += rate * (t - *w);
        }
    }
}

/// Euclidean distance between two vectors of the same length.
#[inline]
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn write_vec(f: &mut fmt::Formatter<'_>, values: &[f64]) -> fmt::Result {
    for v in values {
        write!(f, "{v} ")?;
    }
    Ok(())
}

impl fmt::Display for Neuron {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] at (", self.index)?;
        if let Some(pos) = &self.position {
            for p in pos {
                write!(f, "{p}, ")?;
            }
        }
        write!(f, ") w=")?;
        write_vec(f, &self.weights)?;
        write!(f, "rw=")?;
        write_vec(f, &self.recurrent_weights)?;

        if f.alternate() {
            write!(f, "\n    link=")?;
            for link in &self.links {
                write!(f, "({link}) ")?;
            }
            write!(f, "\n    neig=")?;
            for (idx, dist) in &self.neighbor_distances {
                write!(f, "({idx}, {dist}) ")?;
            }
        }
        Ok(())
    }
}
