//! Metropolis move kernel for hard disks.
//!
//! Hard disks have no energy scale: a proposed move is accepted exactly when
//! it creates no overlap, so there is no Boltzmann factor anywhere. Two move
//! types are drawn per attempt: a single-particle translation, or a swap of
//! two particles followed by a jitter of both.

mod calibrate;

pub use calibrate::{calibrate, CalibrationResult, CalibrationStatus};

use crate::configuration::Configuration;
use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};


/// Counters for attempted and accepted moves.
#[derive(Debug, Clone, Default)]
pub struct MoveStatistics {
    pub attempts: u64,
    pub accepted: u64,
}

impl MoveStatistics {
    pub fn acceptance_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.accepted as f64 / self.attempts as f64
        }
    }
}

/// The Metropolis sampler: owns the configuration and the random stream.
///
/// One PRNG drives particle choice, move-type choice and displacement
/// components, in a fixed draw order, so a seed pins the whole trajectory.
#[derive(Debug, Clone)]
pub struct MonteCarlo {
    pub configuration: Configuration,
    /// Maximum displacement per coordinate for translation jitters.
    pub trans_delta: f64,
    /// Probability that an attempt is a swap rather than a translation.
    pub swap_prob: f64,
    pub stats: MoveStatistics,
    rng: StdRng,
}

impl MonteCarlo {
    pub fn new(configuration: Configuration, rng: StdRng, swap_prob: f64) -> Self {
        assert!((0.0..=1.0).contains(&swap_prob));
        MonteCarlo {
            configuration,
            trans_delta: 1.0,
            swap_prob,
            stats: MoveStatistics::default(),
            rng,
        }
    }

    pub fn with_seed(configuration: Configuration, seed: u64, swap_prob: f64) -> Self {
        Self::new(configuration, StdRng::seed_from_u64(seed), swap_prob)
    }

    /// One cycle = `n` move attempts. Returns how many were accepted.
    pub fn cycle(&mut self) -> u64 {
        let n = self.configuration.n();
        let mut accepted = 0;
        for _ in 0..n {
            if self.attempt_move() {
                accepted += 1;
            }
        }
        self.stats.attempts += n as u64;
        self.stats.accepted += accepted;
        accepted
    }

    /// Single Metropolis attempt: pick a particle, then the move type.
    fn attempt_move(&mut self) -> bool {
        let n = self.configuration.n();
        let i = self.rng.gen_range(0..n);
        let trans_prob = 1.0 - self.swap_prob;
        if self.rng.gen::<f64>() < trans_prob {
            self.attempt_translation(i)
        } else {
            self.attempt_swap(i)
        }
    }

    fn attempt_translation(&mut self, i: usize) -> bool {
        let p_i = self.configuration.positions[i];
        let r_i = self.configuration.radii[i];

        let jitter = self.jitter();
        let proposal = self.configuration.cell.wrap_point(p_i + jitter);

        if self.overlaps_any(proposal, r_i, i, i) {
            return false;
        }
        self.configuration.positions[i] = proposal;
        true
    }

    /// Exchange positions and radii of `i` and a second particle `j`, jitter
    /// both with the translation delta, and accept only if neither proposed
    /// disk overlaps anything.
    fn attempt_swap(&mut self, i: usize) -> bool {
        let n = self.configuration.n();
        let mut j = i;
        while j == i {
            j = self.rng.gen_range(0..n);
        }

        let p_i = self.configuration.positions[i];
        let r_i = self.configuration.radii[i];
        let p_j = self.configuration.positions[j];
        let r_j = self.configuration.radii[j];

        // slot i inherits j's disk and vice versa, then both move
        let jitter_i = self.jitter();
        let jitter_j = self.jitter();
        let cell = self.configuration.cell;
        let prop_i = cell.wrap_point(p_j + jitter_i);
        let prop_j = cell.wrap_point(p_i + jitter_j);
        let (new_r_i, new_r_j) = (r_j, r_i);

        let r_sum = new_r_i + new_r_j;
        if cell.min_image_dist_sq(prop_i, prop_j) < r_sum * r_sum {
            return false;
        }
        if self.overlaps_any(prop_i, new_r_i, i, j) {
            return false;
        }
        if self.overlaps_any(prop_j, new_r_j, i, j) {
            return false;
        }

        self.configuration.positions[i] = prop_i;
        self.configuration.radii[i] = new_r_i;
        self.configuration.positions[j] = prop_j;
        self.configuration.radii[j] = new_r_j;
        true
    }

    /// Uniform displacement in `[-delta, delta)` per coordinate; x drawn
    /// before y.
    fn jitter(&mut self) -> Vector2<f64> {
        let dx = self.trans_delta * (2.0 * self.rng.gen::<f64>() - 1.0);
        let dy = self.trans_delta * (2.0 * self.rng.gen::<f64>() - 1.0);
        Vector2::new(dx, dy)
    }

    /// Does a disk at `p` with the given radius overlap any particle other
    /// than `skip_a`/`skip_b`? Squared distances only; a tie counts as touch,
    /// not overlap.
    fn overlaps_any(&self, p: Vector2<f64>, radius: f64, skip_a: usize, skip_b: usize) -> bool {
        let config = &self.configuration;
        for k in 0..config.n() {
            if k == skip_a || k == skip_b {
                continue;
            }
            let d_sq = config.cell.min_image_dist_sq(p, config.positions[k]);
            let r_sum = radius + config.radii[k];
            if d_sq < r_sum * r_sum {
                return true;
            }
        }
        false
    }
}
