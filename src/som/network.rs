//! Recurrent Dynamic Self-Organizing Map.
//!
//! One learning step is a [`Network::forward`] call, which elects the winner
//! from the merged input/recurrent similarity, followed by a
//! [`Network::delta_w`] call on the same input, which adapts the weights with
//! a neighborhood whose width follows the current normalized winner error.

use crate::config::{NetworkConfig, StepConfig};
use crate::error::{RdsomError, Result};
use crate::som::distance;
use crate::som::kernel::{argmax, circular_convolution, gaussian, merge, neighborhood, normalized};
use crate::som::topology::{self, grid_coords, Topology};
use crate::som::Neuron;
use log::{debug, trace};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::fmt;

/// Rolling per-step state, overwritten by every `forward` call.
#[derive(Debug, Clone, Default)]
struct StepState {
    current_winner: usize,
    previous_winner: usize,
    predicted_winner: usize,
    winner_distance_input: f64,
    winner_distance_recurrent: f64,
    winner_distance_pred: f64,
    similarity_input: Vec<f64>,
    similarity_recurrent: Vec<f64>,
    similarity_merged: Vec<f64>,
    similarity_convolved: Vec<f64>,
    /// Input of the last `forward` not yet consumed by `delta_w`.
    pending: Option<Vec<f64>>,
}

impl StepState {
    fn new(neuron_count: usize) -> Self {
        Self {
            similarity_input: vec![0.0; neuron_count],
            similarity_recurrent: vec![0.0; neuron_count],
            similarity_merged: vec![0.0; neuron_count],
            similarity_convolved: vec![0.0; neuron_count],
            ..Default::default()
        }
    }
}

/// A recurrent Dynamic SOM.
///
/// Neurons live in an index-addressed arena and refer to each other by
/// index. The topology is fixed at construction.
#[derive(Debug, Clone)]
pub struct Network {
    neurons: Vec<Neuron>,
    topology: Topology,
    input_dim: usize,
    grid_side: usize,
    max_topological_distance: f64,
    max_input_distance: f64,
    max_recurrent_distance: f64,
    state: StepState,
}

impl Network {
    /// Creates a network from its configuration, seeding a `ChaCha8Rng`
    /// from `config.seed` (or from entropy).
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(config, &mut rng)
    }

    /// Creates a network drawing its random weights and links from `rng`.
    pub fn with_rng<R: Rng>(config: &NetworkConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let topology = Topology::from_selector(config.topology)?;
        let (neurons, _) = topology::build(
            topology,
            config.input_dim,
            config.neuron_count,
            config.w_min,
            config.w_max,
            rng,
        )?;

        let network = Self::from_parts(neurons, topology, config.input_dim, 0.0, 0.0)?;
        debug!(
            "Created R-DSOM: {} neurons, {}, input_dim={}, max_topo={}",
            network.len(),
            topology,
            network.input_dim,
            network.max_topological_distance
        );
        Ok(network)
    }

    /// Assembles a network from linked neurons, filling the distance caches
    /// and deriving the topological normalization constant.
    pub(crate) fn from_parts(
        mut neurons: Vec<Neuron>,
        topology: Topology,
        input_dim: usize,
        max_input_distance: f64,
        max_recurrent_distance: f64,
    ) -> Result<Self> {
        let grid_side = topology.validate(neurons.len())?;
        distance::compute_all_distances(&mut neurons);
        let max_topological_distance = Self::derive_max_topological_distance(topology, grid_side);
        let state = StepState::new(neurons.len());

        Ok(Self {
            neurons,
            topology,
            input_dim,
            grid_side,
            max_topological_distance,
            max_input_distance,
            max_recurrent_distance,
            state,
        })
    }

    /// Random topologies normalize by 1.0; grids by the hop count between
    /// the first and the last neuron, which is `dimension * (side - 1)`.
    fn derive_max_topological_distance(topology: Topology, grid_side: usize) -> f64 {
        match topology {
            Topology::Grid { dimension } if grid_side > 1 => (dimension * (grid_side - 1)) as f64,
            _ => 1.0,
        }
    }

    /// Recomputes every neuron's distance cache.
    ///
    /// Returns the largest topological distance found and refreshes the
    /// normalization constant.
    pub fn compute_all_distances(&mut self) -> Result<f64> {
        let max = distance::compute_all_distances(&mut self.neurons);
        self.max_topological_distance =
            Self::derive_max_topological_distance(self.topology, self.grid_side);
        Ok(max)
    }

    fn check_input(&self, input: &[f64]) -> Result<()> {
        if input.len() != self.input_dim {
            return Err(RdsomError::DimensionMismatch {
                expected: self.input_dim,
                found: input.len(),
            });
        }
        if let Some(i) = input.iter().position(|x| !x.is_finite()) {
            return Err(RdsomError::InvalidInput(format!(
                "component {} is not finite ({})",
                i, input[i]
            )));
        }
        Ok(())
    }

    /// Elects the winner for `input` and updates the rolling state.
    ///
    /// Never touches the weights. Returns the new current winner.
    pub fn forward(&mut self, input: &[f64], params: &StepConfig) -> Result<usize> {
        self.check_input(input)?;
        params.validate_forward()?;

        let previous = self.state.previous_winner;
        let prev_recurrent = self.neurons[previous].recurrent_weights.clone();

        let (dist_input, dist_recurrent): (Vec<f64>, Vec<f64>) = self
            .neurons
            .par_iter()
            .map(|n| (n.distance(input), n.recurrent_distance(&prev_recurrent)))
            .unzip();

        let sim_input: Vec<f64> = dist_input
            .iter()
            .map(|&d| gaussian(d, params.sigma_input))
            .collect();
        let sim_recurrent: Vec<f64> = dist_recurrent
            .iter()
            .map(|&d| gaussian(d, params.sigma_recurrent))
            .collect();
        let sim_merged: Vec<f64> = sim_input
            .iter()
            .zip(sim_recurrent.iter())
            .map(|(&si, &sr)| merge(si, sr, params.beta))
            .collect();

        // The ring convolution only has a meaning along a 1-D chain.
        let sim_convolved = match self.topology {
            Topology::Grid { dimension: 1 } => {
                circular_convolution(&sim_merged, params.sigma_convolution)
            }
            _ => sim_merged.clone(),
        };

        let winner = argmax(&sim_convolved);
        let last_prediction = self.state.predicted_winner;

        self.state.winner_distance_input = dist_input[winner];
        self.state.winner_distance_recurrent = dist_recurrent[winner];
        self.state.winner_distance_pred = self.neurons[last_prediction].distance(input);
        self.state.predicted_winner = argmax(&sim_recurrent);
        self.state.current_winner = winner;

        let sample_max_input = dist_input.iter().copied().fold(0.0, f64::max);
        let sample_max_recurrent = dist_recurrent.iter().copied().fold(0.0, f64::max);
        self.max_input_distance = self.max_input_distance.max(sample_max_input);
        self.max_recurrent_distance = self.max_recurrent_distance.max(sample_max_recurrent);

        self.state.similarity_input = sim_input;
        self.state.similarity_recurrent = sim_recurrent;
        self.state.similarity_merged = sim_merged;
        self.state.similarity_convolved = sim_convolved;
        self.state.pending = Some(input.to_vec());

        trace!(
            "forward: winner={} (prev={}, predicted={}), d_in={:.4}, d_rec={:.4}, d_pred={:.4}",
            winner,
            previous,
            self.state.predicted_winner,
            self.state.winner_distance_input,
            self.state.winner_distance_recurrent,
            self.state.winner_distance_pred
        );

        Ok(winner)
    }

    /// Adapts the weights towards `input` around the current winner.
    ///
    /// Must follow a [`forward`](Self::forward) call on the same input.
    pub fn delta_w(&mut self, input: &[f64], params: &StepConfig) -> Result<()> {
        self.check_input(input)?;
        params.validate_adaptation()?;
        match &self.state.pending {
            None => {
                return Err(RdsomError::Precondition(
                    "delta_w called without a preceding forward".to_string(),
                ))
            }
            Some(pending) if pending.as_slice() != input => {
                return Err(RdsomError::Precondition(
                    "delta_w input differs from the forward input".to_string(),
                ))
            }
            Some(_) => {}
        }

        let winner = self.state.current_winner;
        let previous = self.state.previous_winner;
        let max_input = self.max_input_distance;
        let max_recurrent = self.max_recurrent_distance;
        let max_topo = self.max_topological_distance;
        let err_input = normalized(self.state.winner_distance_input, max_input);
        let err_recurrent = normalized(self.state.winner_distance_recurrent, max_recurrent);
        let (eps, ela, ela_rec) = (params.eps, params.ela, params.ela_rec);

        match self.topology {
            Topology::Random { .. } => {
                let links: Vec<(usize, f64)> = self.neurons[winner]
                    .links
                    .iter()
                    .map(|&j| (j, self.neurons[winner].topological_distance(j).unwrap_or(1.0)))
                    .collect();

                for (j, topo) in links {
                    let neuron = &mut self.neurons[j];
                    let rate = eps
                        * normalized(neuron.distance(input), max_input)
                        * neighborhood(topo / max_topo, err_input, ela);
                    neuron.move_weights(input, rate);
                }
            }
            Topology::Grid { .. } => {
                let prev_recurrent = self.neurons[previous].recurrent_weights.clone();
                let to_winner: Vec<f64> = (0..self.neurons.len())
                    .map(|j| {
                        self.neurons[winner]
                            .topological_distance(j)
                            .unwrap_or(f64::INFINITY)
                    })
                    .collect();

                self.neurons
                    .par_iter_mut()
                    .zip(to_winner.par_iter())
                    .for_each(|(neuron, &topo)| {
                        let t = topo / max_topo;
                        let rate = eps
                            * normalized(neuron.distance(input), max_input)
                            * neighborhood(t, err_input, ela);
                        let rate_recurrent = eps
                            * normalized(neuron.recurrent_distance(&prev_recurrent), max_recurrent)
                            * neighborhood(t, err_recurrent, ela_rec);
                        neuron.move_weights(input, rate);
                        neuron.move_recurrent_weights(&prev_recurrent, rate_recurrent);
                    });
            }
        }

        self.state.previous_winner = winner;
        self.state.pending = None;
        Ok(())
    }

    /// Ends the current step without adapting any weight: the current
    /// winner becomes the previous winner for the next recurrent similarity.
    pub fn advance(&mut self) -> Result<()> {
        if self.state.pending.take().is_none() {
            return Err(RdsomError::Precondition(
                "advance called without a preceding forward".to_string(),
            ));
        }
        self.state.previous_winner = self.state.current_winner;
        Ok(())
    }

    /// Runs `forward` then `delta_w` on the same input.
    pub fn step(&mut self, input: &[f64], params: &StepConfig) -> Result<usize> {
        let winner = self.forward(input, params)?;
        self.delta_w(input, params)?;
        Ok(winner)
    }

    /// Neuron whose input weights are closest to `input`, with its distance.
    ///
    /// This is the plain DSOM winner: recurrence and convolution are
    /// ignored and no state changes.
    pub fn nearest_neuron(&self, input: &[f64]) -> Result<(usize, f64)> {
        self.check_input(input)?;

        let mut best = (0, f64::INFINITY);
        for (i, neuron) in self.neurons.iter().enumerate() {
            let d = neuron.distance(input);
            if d < best.1 {
                best = (i, d);
            }
        }
        Ok(best)
    }

    /// Mean normalized input distance from every input to its nearest neuron.
    ///
    /// A state-free quality measure of the map; see [`Neuron::distance_normed`].
    pub fn quantization_error(&self, inputs: &[Vec<f64>]) -> Result<f64> {
        if inputs.is_empty() {
            return Ok(0.0);
        }
        let mut total = 0.0;
        for input in inputs {
            let (nearest, _) = self.nearest_neuron(input)?;
            total += self.neurons[nearest].distance_normed(input);
        }
        Ok(total / inputs.len() as f64)
    }

    /// Lays the input weights out on the grid: each weight is the neuron's
    /// normalized grid coordinate `coord / (side - 1)`.
    ///
    /// Only valid for grid topologies whose dimension equals the input dimension.
    pub fn set_regular_weights(&mut self) -> Result<()> {
        let dimension = match self.topology {
            Topology::Grid { dimension } => dimension,
            Topology::Random { .. } => {
                return Err(RdsomError::Topology(
                    "regular weights need a grid topology".to_string(),
                ))
            }
        };
        if dimension != self.input_dim {
            return Err(RdsomError::DimensionMismatch {
                expected: dimension,
                found: self.input_dim,
            });
        }

        let side = self.grid_side;
        let scale = if side > 1 { (side - 1) as f64 } else { 1.0 };
        for neuron in &mut self.neurons {
            neuron.weights = grid_coords(neuron.index, side, dimension)
                .into_iter()
                .map(|c| c as f64 / scale)
                .collect();
        }
        Ok(())
    }

    /// Clears the winners and similarity vectors. The running maxima are kept.
    pub fn reset_state(&mut self) {
        self.state = StepState::new(self.neurons.len());
    }

    /// Returns the number of neurons.
    #[inline]
    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    /// Always false: a network has at least one neuron.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    /// All neurons, by index.
    #[inline]
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    /// Gets a neuron by index.
    #[inline]
    pub fn neuron(&self, index: usize) -> Option<&Neuron> {
        self.neurons.get(index)
    }

    /// Input weights of a neuron.
    pub fn weights(&self, index: usize) -> Result<&[f64]> {
        self.neuron_checked(index).map(|n| n.weights.as_slice())
    }

    /// Recurrent weights of a neuron.
    pub fn recurrent_weights(&self, index: usize) -> Result<&[f64]> {
        self.neuron_checked(index).map(|n| n.recurrent_weights.as_slice())
    }

    fn neuron_checked(&self, index: usize) -> Result<&Neuron> {
        self.neurons.get(index).ok_or(RdsomError::IndexOutOfBounds {
            index,
            max: self.neurons.len(),
        })
    }

    /// Topological distance between two neurons, if they are connected.
    pub fn topological_distance(&self, a: usize, b: usize) -> Option<f64> {
        self.neurons.get(a)?.topological_distance(b)
    }

    /// Input dimensionality.
    #[inline]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Topology of the direct links.
    #[inline]
    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Grid side length (0 for random topologies).
    #[inline]
    pub fn grid_side(&self) -> usize {
        self.grid_side
    }

    /// Normalization constant for topological distances.
    #[inline]
    pub fn max_topological_distance(&self) -> f64 {
        self.max_topological_distance
    }

    /// Largest input distance observed so far.
    #[inline]
    pub fn max_input_distance(&self) -> f64 {
        self.max_input_distance
    }

    /// Largest recurrent distance observed so far.
    #[inline]
    pub fn max_recurrent_distance(&self) -> f64 {
        self.max_recurrent_distance
    }

    /// Winner of the last `forward`.
    #[inline]
    pub fn current_winner(&self) -> usize {
        self.state.current_winner
    }

    /// Winner of the previous adapted step.
    #[inline]
    pub fn previous_winner(&self) -> usize {
        self.state.previous_winner
    }

    /// Winner predicted for the next step.
    #[inline]
    pub fn predicted_winner(&self) -> usize {
        self.state.predicted_winner
    }

    /// Input distance of the current winner.
    #[inline]
    pub fn winner_distance_input(&self) -> f64 {
        self.state.winner_distance_input
    }

    /// Recurrent distance of the current winner to the previous winner.
    #[inline]
    pub fn winner_distance_recurrent(&self) -> f64 {
        self.state.winner_distance_recurrent
    }

    /// Input distance of the winner predicted by the previous step.
    #[inline]
    pub fn winner_distance_pred(&self) -> f64 {
        self.state.winner_distance_pred
    }

    /// Input similarity of every neuron.
    pub fn similarity_input(&self) -> &[f64] {
        &self.state.similarity_input
    }

    /// Recurrent similarity of every neuron.
    pub fn similarity_recurrent(&self) -> &[f64] {
        &self.state.similarity_recurrent
    }

    /// Merged similarity of every neuron.
    pub fn similarity_merged(&self) -> &[f64] {
        &self.state.similarity_merged
    }

    /// Convolved similarity of every neuron.
    pub fn similarity_convolved(&self) -> &[f64] {
        &self.state.similarity_convolved
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Net {}^{} max_d_topo={} max_d_input={} max_d_rec={}",
            self.grid_side,
            self.topology.selector(),
            self.max_topological_distance,
            self.max_input_distance,
            self.max_recurrent_distance
        )?;
        for neuron in &self.neurons {
            if f.alternate() {
                writeln!(f, "{neuron:#}")?;
            } else {
                writeln!(f, "{neuron}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_config(neurons: usize, dimension: i32, input_dim: usize) -> NetworkConfig {
        NetworkConfig {
            input_dim,
            neuron_count: neurons,
            topology: dimension,
            seed: Some(42),
            ..Default::default()
        }
    }

    fn params() -> StepConfig {
        StepConfig {
            beta: 0.5,
            sigma_input: 0.2,
            sigma_recurrent: 0.2,
            sigma_convolution: 0.05,
            eps: 0.3,
            ela: 1.0,
            ela_rec: 1.0,
        }
    }

    #[test]
    fn test_1d_grid_max_distance() {
        let net = Network::new(&grid_config(9, -1, 1)).unwrap();
        assert_eq!(net.len(), 9);
        assert_eq!(net.grid_side(), 9);
        assert_eq!(net.max_topological_distance(), 8.0);
    }

    #[test]
    fn test_2d_grid_max_distance() {
        let net = Network::new(&grid_config(16, -2, 2)).unwrap();
        assert_eq!(net.grid_side(), 4);
        assert_eq!(net.max_topological_distance(), 6.0);
    }

    #[test]
    fn test_random_max_distance_is_one() {
        let config = NetworkConfig {
            topology: 3,
            neuron_count: 10,
            seed: Some(3),
            ..Default::default()
        };
        let net = Network::new(&config).unwrap();
        assert_eq!(net.max_topological_distance(), 1.0);
    }

    #[test]
    fn test_forward_on_1d_grid() {
        let mut net = Network::new(&grid_config(9, -1, 1)).unwrap();
        let winner = net.forward(&[0.5], &params()).unwrap();
        assert!(winner < 9);
        assert_eq!(winner, net.current_winner());
        assert!(net.winner_distance_input() >= 0.0);
        assert_eq!(net.similarity_convolved().len(), 9);
        assert!(net.similarity_merged().iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_forward_is_deterministic() {
        let mut net = Network::new(&grid_config(9, -1, 1)).unwrap();
        let w1 = net.forward(&[0.3], &params()).unwrap();
        let conv1 = net.similarity_convolved().to_vec();
        let w2 = net.forward(&[0.3], &params()).unwrap();
        assert_eq!(w1, w2);
        assert_eq!(conv1, net.similarity_convolved());
    }

    #[test]
    fn test_forward_does_not_touch_weights() {
        let mut net = Network::new(&grid_config(9, -1, 1)).unwrap();
        let before = net.neurons().to_vec();
        net.forward(&[0.7], &params()).unwrap();
        assert_eq!(before, net.neurons());
    }

    #[test]
    fn test_beta_one_picks_nearest_on_2d() {
        // Without convolution and with beta = 1, the winner is the nearest neuron.
        let mut net = Network::new(&grid_config(16, -2, 2)).unwrap();
        let step = StepConfig {
            beta: 1.0,
            ..params()
        };
        let input = [0.2, 0.9];
        let winner = net.forward(&input, &step).unwrap();
        assert_eq!(winner, net.nearest_neuron(&input).unwrap().0);
    }

    #[test]
    fn test_prediction_error_uses_previous_prediction() {
        let mut net = Network::new(&grid_config(9, -1, 1)).unwrap();
        let p = params();
        net.forward(&[0.1], &p).unwrap();
        let predicted = net.predicted_winner();
        net.delta_w(&[0.1], &p).unwrap();
        net.forward(&[0.9], &p).unwrap();
        let expected = net.neuron(predicted).unwrap().distance(&[0.9]);
        assert!((net.winner_distance_pred() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_maxima_are_monotone() {
        let mut net = Network::new(&grid_config(9, -1, 1)).unwrap();
        let p = params();
        let mut last = (0.0, 0.0);
        for x in [0.9, 0.1, 0.5, 0.5, 0.0, 1.0] {
            net.step(&[x], &p).unwrap();
            let now = (net.max_input_distance(), net.max_recurrent_distance());
            assert!(now.0 >= last.0);
            assert!(now.1 >= last.1);
            last = now;
        }
    }

    #[test]
    fn test_delta_w_requires_forward() {
        let mut net = Network::new(&grid_config(9, -1, 1)).unwrap();
        let err = net.delta_w(&[0.5], &params()).unwrap_err();
        assert!(matches!(err, RdsomError::Precondition(_)));

        net.forward(&[0.5], &params()).unwrap();
        let err = net.delta_w(&[0.4], &params()).unwrap_err();
        assert!(matches!(err, RdsomError::Precondition(_)));

        net.delta_w(&[0.5], &params()).unwrap();
        // The forward input is consumed.
        assert!(net.delta_w(&[0.5], &params()).is_err());
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut net = Network::new(&grid_config(9, -1, 1)).unwrap();
        let err = net.forward(&[0.5, 0.5], &params()).unwrap_err();
        assert!(matches!(err, RdsomError::DimensionMismatch { expected: 1, found: 2 }));
        net.forward(&[0.5], &params()).unwrap();
        assert!(net.delta_w(&[0.5, 0.1], &params()).is_err());
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let mut net = Network::new(&grid_config(9, -2, 2)).unwrap();
        let before = net.neurons().to_vec();

        for bad in [[f64::INFINITY, 0.3], [0.3, f64::NAN], [f64::NEG_INFINITY, 0.0]] {
            let err = net.step(&bad, &params()).unwrap_err();
            assert!(matches!(err, RdsomError::InvalidInput(_)));
            assert!(matches!(net.forward(&bad, &params()), Err(RdsomError::InvalidInput(_))));
            assert!(net.nearest_neuron(&bad).is_err());
        }
        assert_eq!(net.neurons(), before.as_slice());
        assert_eq!(net.max_input_distance(), 0.0);

        // A pending step is not disturbed by a bad delta_w.
        net.forward(&[0.3, 0.3], &params()).unwrap();
        let err = net.delta_w(&[f64::NAN, 0.3], &params()).unwrap_err();
        assert!(matches!(err, RdsomError::InvalidInput(_)));
        net.delta_w(&[0.3, 0.3], &params()).unwrap();
        assert!(net
            .neurons()
            .iter()
            .all(|n| n.weights.iter().chain(&n.recurrent_weights).all(|w| w.is_finite())));
    }

    #[test]
    fn test_delta_w_moves_winner_towards_input() {
        let mut net = Network::new(&grid_config(9, -1, 1)).unwrap();
        let p = params();
        net.forward(&[0.0], &p).unwrap();
        net.forward(&[1.0], &p).unwrap();
        let winner = net.current_winner();
        let before = net.neuron(winner).unwrap().distance(&[1.0]);
        net.delta_w(&[1.0], &p).unwrap();
        let after = net.neuron(winner).unwrap().distance(&[1.0]);
        assert!(after <= before);
        assert_eq!(net.previous_winner(), winner);
        assert!(net.neurons().iter().all(|n| n.weights[0].is_finite()));
    }

    #[test]
    fn test_random_topology_updates_only_links() {
        let config = NetworkConfig {
            input_dim: 2,
            neuron_count: 10,
            topology: 3,
            seed: Some(11),
            ..Default::default()
        };
        let mut net = Network::new(&config).unwrap();
        let before = net.neurons().to_vec();
        let input = [0.5, 0.5];
        net.forward(&input, &params()).unwrap();
        let winner = net.current_winner();
        net.delta_w(&input, &params()).unwrap();

        for (old, new) in before.iter().zip(net.neurons()) {
            if !before[winner].has_link(old.index) {
                assert_eq!(old.weights, new.weights);
            }
            assert_eq!(old.recurrent_weights, new.recurrent_weights);
        }
    }

    #[test]
    fn test_zero_distances_do_not_produce_nan() {
        let config = NetworkConfig {
            w_min: 0.5,
            w_max: 0.5,
            ..grid_config(4, -1, 1)
        };
        let mut net = Network::new(&config).unwrap();
        net.step(&[0.5], &params()).unwrap();
        assert!(net.neurons().iter().all(|n| n.weights[0] == 0.5));
    }

    #[test]
    fn test_nearest_neuron() {
        let mut net = Network::new(&grid_config(4, -2, 2)).unwrap();
        net.set_regular_weights().unwrap();
        let (idx, d) = net.nearest_neuron(&[0.9, 0.1]).unwrap();
        assert_eq!(idx, 2);
        assert!((d - (0.01f64 + 0.01).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_quantization_error() {
        let mut net = Network::new(&grid_config(16, -2, 2)).unwrap();
        net.set_regular_weights().unwrap();
        // Every input sits on a neuron.
        let on_grid = vec![vec![0.0, 0.0], vec![1.0 / 3.0, 1.0], vec![1.0, 2.0 / 3.0]];
        assert!(net.quantization_error(&on_grid).unwrap() < 1e-12);

        // Halfway between two columns: 1/6 off, scaled by sqrt(2).
        let between = vec![vec![0.0, 1.0 / 6.0]];
        let expected = (1.0 / 6.0) / 2.0_f64.sqrt();
        assert!((net.quantization_error(&between).unwrap() - expected).abs() < 1e-12);

        assert_eq!(net.quantization_error(&[]).unwrap(), 0.0);
        assert!(net.quantization_error(&[vec![0.5]]).is_err());
    }

    #[test]
    fn test_set_regular_weights() {
        let mut net = Network::new(&grid_config(9, -2, 2)).unwrap();
        net.set_regular_weights().unwrap();
        assert_eq!(net.weights(0).unwrap(), &[0.0, 0.0]);
        assert_eq!(net.weights(5).unwrap(), &[0.5, 1.0]);
        assert_eq!(net.weights(8).unwrap(), &[1.0, 1.0]);

        let mut wrong = Network::new(&grid_config(9, -2, 1)).unwrap();
        assert!(wrong.set_regular_weights().is_err());
    }

    #[test]
    fn test_accessors_bounds() {
        let net = Network::new(&grid_config(4, -1, 1)).unwrap();
        assert!(net.weights(3).is_ok());
        assert!(matches!(
            net.recurrent_weights(4),
            Err(RdsomError::IndexOutOfBounds { index: 4, max: 4 })
        ));
        assert_eq!(net.topological_distance(0, 3), Some(3.0));
        assert_eq!(net.topological_distance(9, 0), None);
    }

    #[test]
    fn test_invalid_construction() {
        assert!(Network::new(&grid_config(10, -2, 1)).is_err());
        assert!(Network::new(&grid_config(27, -3, 1)).is_err());
        let config = NetworkConfig {
            topology: 5,
            neuron_count: 5,
            ..Default::default()
        };
        assert!(matches!(Network::new(&config), Err(RdsomError::Topology(_))));
    }

    #[test]
    fn test_reset_state_keeps_maxima() {
        let mut net = Network::new(&grid_config(9, -1, 1)).unwrap();
        net.forward(&[0.5], &params()).unwrap();
        let max_in = net.max_input_distance();
        net.reset_state();
        assert_eq!(net.current_winner(), 0);
        assert_eq!(net.max_input_distance(), max_in);
        assert!(net.delta_w(&[0.5], &params()).is_err());
    }

    #[test]
    fn test_display_header() {
        let net = Network::new(&grid_config(4, -1, 1)).unwrap();
        let dump = format!("{net}");
        assert!(dump.starts_with("Net 4^-1 max_d_topo=3"));
        assert_eq!(dump.lines().count(), 5);
    }
}
