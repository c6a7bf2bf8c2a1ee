//! Topological (hop-count) distances between neurons.
//!
//! Every source runs a shortest-path search over the direct links, seeded
//! with the distances the source already caches, so a network restored with
//! its distance cache converges without redoing work it has already done.

use crate::som::Neuron;
use log::debug;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Frontier entry ordered so that the heap pops the smallest distance first,
/// then the lowest index.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Frontier {
    distance: f64,
    index: usize,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest hop-count distance from `source` to every neuron.
///
/// Unreachable neurons are `f64::INFINITY`.
pub fn single_source(neurons: &[Neuron], source: usize) -> Vec<f64> {
    let n = neurons.len();
    let mut dist = vec![f64::INFINITY; n];
    let mut settled = vec![false; n];
    let mut heap = BinaryHeap::new();

    for (&idx, &d) in &neurons[source].neighbor_distances {
        if idx < n && d < dist[idx] {
            dist[idx] = d;
        }
    }
    dist[source] = 0.0;

    for (index, &distance) in dist.iter().enumerate() {
        if distance.is_finite() {
            heap.push(Frontier { distance, index });
        }
    }

    while let Some(Frontier { distance, index }) = heap.pop() {
        if settled[index] || distance > dist[index] {
            continue;
        }
        settled[index] = true;

        for &link in &neurons[index].links {
            if link >= n || settled[link] {
                continue;
            }
            let alt = distance + 1.0;
            if alt < dist[link] {
                dist[link] = alt;
                heap.push(Frontier {
                    distance: alt,
                    index: link,
                });
            }
        }
    }

    dist
}

/// Runs [`single_source`] from `source` and writes every finite distance
/// into both ends' caches. Returns the largest distance found.
pub fn compute_distances_from(neurons: &mut [Neuron], source: usize) -> f64 {
    let dist = single_source(neurons, source);

    let mut max_dist: f64 = 0.0;
    for (i, &d) in dist.iter().enumerate() {
        if !d.is_finite() || i == source {
            continue;
        }
        neurons[source].update_neighbor(i, d);
        neurons[i].update_neighbor(source, d);
        max_dist = max_dist.max(d);
    }
    max_dist
}

/// Fills the distance cache of every neuron and returns the maximum
/// topological distance in the network.
pub fn compute_all_distances(neurons: &mut [Neuron]) -> f64 {
    let mut max_dist: f64 = 0.0;
    for source in 0..neurons.len() {
        max_dist = max_dist.max(compute_distances_from(neurons, source));
    }
    debug!(
        "Computed topological distances for {} neurons, max={}",
        neurons.len(),
        max_dist
    );
    max_dist
}
