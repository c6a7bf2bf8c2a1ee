//! Similarity kernels and the Dynamic-SOM neighborhood function.

/// Floor applied to the normalized winner error in [`neighborhood`].
pub const MIN_WINNER_ERROR: f64 = 1e-6;

/// Gaussian similarity `exp(-d² / (2σ²))` of a distance `d`.
#[inline]
pub fn gaussian(distance: f64, sigma: f64) -> f64 {
    (-(distance * distance) / (2.0 * sigma * sigma)).exp()
}

/// Merges input and recurrent similarity as a weighted geometric mean:
/// `sqrt(s_in * (beta + (1 - beta) * s_rec))`.
///
/// Stays in [0, 1] when both similarities do.
#[inline]
pub fn merge(sim_input: f64, sim_recurrent: f64, beta: f64) -> f64 {
    (sim_input * (beta + (1.0 - beta) * sim_recurrent)).sqrt()
}

/// Circular Gaussian convolution along the neuron index.
///
/// Neuron `i` sits at `i / N` on a unit ring. Each output sums the
/// `±⌊N/2⌋` neighbors (indices wrap modulo `N`) weighted by a Gaussian of
/// their ring offset, scaled by `1 / N`.
pub fn circular_convolution(values: &[f64], sigma: f64) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let half = (n / 2) as i64;
    let n_f = n as f64;
    let kernel: Vec<f64> = (-half..=half)
        .map(|k| gaussian(k as f64 / n_f, sigma))
        .collect();

    (0..n)
        .map(|i| {
            let sum: f64 = (-half..=half)
                .zip(kernel.iter())
                .map(|(k, w)| values[(i as i64 + k).rem_euclid(n as i64) as usize] * w)
                .sum();
            sum / n_f
        })
        .collect()
}

/// Dynamic-SOM neighborhood `exp(-t² / (ela² · e²))`.
///
/// `topo_dist` is the normalized topological distance to the winner and
/// `winner_error` the normalized winner distance, floored at
/// [`MIN_WINNER_ERROR`]. A small winner error sharpens the neighborhood,
/// a large one widens it.
#[inline]
pub fn neighborhood(topo_dist: f64, winner_error: f64, elasticity: f64) -> f64 {
    let err = winner_error.max(MIN_WINNER_ERROR);
    (-(topo_dist * topo_dist) / (elasticity * elasticity * err * err)).exp()
}

/// Index of the largest value, lowest index on ties. `0` for an empty slice.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// `value / max`, or 0 when `max` is not positive.
#[inline]
pub fn normalized(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        value / max
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian() {
        assert!((gaussian(0.0, 0.3) - 1.0).abs() < 1e-12);
        assert!((gaussian(1.0, 1.0) - (-0.5f64).exp()).abs() < 1e-12);
        assert!(gaussian(2.0, 1.0) < gaussian(1.0, 1.0));
    }

    #[test]
    fn test_merge_bounds() {
        for &a in &[0.0, 0.1, 0.5, 1.0] {
            for &b in &[0.0, 0.3, 1.0] {
                for &beta in &[0.0, 0.25, 1.0] {
                    let m = merge(a, b, beta);
                    assert!((0.0..=1.0).contains(&m));
                }
            }
        }
        // beta = 1 ignores the recurrent similarity.
        assert!((merge(0.64, 0.0, 1.0) - 0.8).abs() < 1e-12);
        // beta = 0 is the plain geometric mean.
        assert!((merge(0.25, 1.0, 0.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_convolution_constant_input() {
        let values = vec![1.0; 5];
        let out = circular_convolution(&values, 0.2);
        let expected: f64 = (-2..=2).map(|k| gaussian(k as f64 / 5.0, 0.2)).sum::<f64>() / 5.0;
        for v in out {
            assert!((v - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_convolution_wraps() {
        let mut values = vec![0.0; 6];
        values[0] = 1.0;
        let out = circular_convolution(&values, 0.1);
        // Neighbors on both sides of index 0 receive the same mass.
        assert!((out[1] - out[5]).abs() < 1e-12);
        assert!(out[0] > out[1]);
        assert_eq!(argmax(&out), 0);
    }

    #[test]
    fn test_neighborhood() {
        assert!((neighborhood(0.0, 0.5, 1.0) - 1.0).abs() < 1e-12);
        // Larger winner error widens the neighborhood.
        assert!(neighborhood(0.5, 0.8, 1.0) > neighborhood(0.5, 0.2, 1.0));
        // Zero error is floored rather than dividing by zero.
        let h = neighborhood(0.5, 0.0, 1.0);
        assert!(h.is_finite());
        assert_eq!(h, 0.0);
        assert_eq!(neighborhood(0.0, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_argmax_ties() {
        assert_eq!(argmax(&[0.1, 0.9, 0.9, 0.2]), 1);
        assert_eq!(argmax(&[]), 0);
    }

    #[test]
    fn test_normalized() {
        assert_eq!(normalized(2.0, 4.0), 0.5);
        assert_eq!(normalized(0.0, 0.0), 0.0);
    }
}
