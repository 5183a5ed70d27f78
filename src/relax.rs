//! Initial-configuration resolver.
//!
//! A random placement almost always overlaps at the packing fractions of
//! interest. The resolver grows a soft repulsive radius on every pair from
//! zero to just past contact, relaxing the positions by steepest descent at
//! each increment, so the disks push each other apart into a valid hard-disk
//! configuration.

use crate::configuration::Configuration;
use crate::geometry::PeriodicCell;
use nalgebra::Vector2;
use rand::rngs::StdRng;
use tracing::info;

const MAX_DESCENT_ITERATIONS: usize = 10_000;
const INITIAL_STEP: f64 = 0.5;
const CONVERGENCE_TOL: f64 = 1e-12;
const ARMIJO_C1: f64 = 1e-4;
const INFLATION_STEPS: usize = 101;
const PLACEMENT_ATTEMPTS: usize = 100;

/// Truncated, shifted Lennard-Jones repulsion over an explicit pair list.
///
/// For separation `d < sigma`: `U = eps * ((sigma/d)^12 - 2 (sigma/d)^6 + 1)`,
/// zero at and beyond `sigma`. Energy and force both vanish at the cut, so
/// the kernel is C1, purely repulsive and bounded below.
struct SoftDiskPotential<'a> {
    cell: PeriodicCell,
    pairs: &'a [(usize, usize)],
    sigma_sq: Vec<f64>,
    epsilon: f64,
}

impl<'a> SoftDiskPotential<'a> {
    fn new(cell: PeriodicCell, pairs: &'a [(usize, usize)]) -> Self {
        SoftDiskPotential {
            cell,
            pairs,
            sigma_sq: vec![0.0; pairs.len()],
            epsilon: 1.0,
        }
    }

    /// Set every pair cut to `scale * (r_i + r_j)`.
    fn set_inflation(&mut self, radii: &[f64], scale: f64) {
        for (s, &(i, j)) in self.sigma_sq.iter_mut().zip(self.pairs) {
            let sigma = scale * (radii[i] + radii[j]);
            *s = sigma * sigma;
        }
    }

    fn energy(&self, positions: &[Vector2<f64>]) -> f64 {
        let mut energy = 0.0;
        for (&(i, j), &sigma_sq) in self.pairs.iter().zip(&self.sigma_sq) {
            let mut d_sq = self.cell.min_image_dist_sq(positions[i], positions[j]);
            if d_sq >= sigma_sq {
                continue;
            }
            // clamp to avoid the singularity of near-coincident centres
            let min_d_sq = 0.01 * sigma_sq;
            if d_sq < min_d_sq {
                d_sq = min_d_sq;
            }
            let inv_r2 = sigma_sq / d_sq;
            let inv_r6 = inv_r2 * inv_r2 * inv_r2;
            energy += self.epsilon * (inv_r6 * inv_r6 - 2.0 * inv_r6 + 1.0);
        }
        energy
    }

    fn gradient(&self, positions: &[Vector2<f64>]) -> Vec<Vector2<f64>> {
        let mut gradient = vec![Vector2::zeros(); positions.len()];
        for (&(i, j), &sigma_sq) in self.pairs.iter().zip(&self.sigma_sq) {
            let d = self.cell.min_image(positions[i] - positions[j]);
            let mut d_sq = d.norm_squared();
            if d_sq >= sigma_sq {
                continue;
            }
            let min_d_sq = 0.01 * sigma_sq;
            if d_sq < min_d_sq {
                d_sq = min_d_sq;
            }
            let inv_r2 = sigma_sq / d_sq;
            let inv_r6 = inv_r2 * inv_r2 * inv_r2;
            // dU/d(d^2) * 2, so the pair term is `coeff * d`
            let coeff = 12.0 * self.epsilon * inv_r6 * (1.0 - inv_r6) / d_sq;
            let g = d * coeff;
            gradient[i] += g;
            gradient[j] -= g;
        }
        gradient
    }
}

/// Steepest descent with Armijo backtracking, state confined to this frame.
///
/// Stops when the gradient norm falls below tolerance, when backtracking can
/// no longer produce a sufficient decrease, or at the iteration cap.
fn steepest_descent_armijo(potential: &SoftDiskPotential, positions: &mut Vec<Vector2<f64>>) {
    for _ in 0..MAX_DESCENT_ITERATIONS {
        let gradient = potential.gradient(positions);
        let grad_norm_sq: f64 = gradient.iter().map(|g| g.norm_squared()).sum();
        let grad_norm = grad_norm_sq.sqrt();
        if grad_norm < CONVERGENCE_TOL {
            break;
        }

        let e0 = potential.energy(positions);
        let mut step = INITIAL_STEP;
        let mut moved = false;
        // backtrack until the Armijo condition holds or the step is negligible
        while step * grad_norm >= CONVERGENCE_TOL {
            let trial: Vec<Vector2<f64>> = positions
                .iter()
                .zip(&gradient)
                .map(|(p, g)| p - g * step)
                .collect();
            if potential.energy(&trial) <= e0 - ARMIJO_C1 * step * grad_norm_sq {
                *positions = trial;
                moved = true;
                break;
            }
            step *= 0.5;
        }
        if !moved {
            break;
        }
    }
}

/// Run the inflation schedule on the configuration in place and report
/// whether every overlap was pushed apart.
pub fn resolve_overlaps(config: &mut Configuration) -> bool {
    let n = config.n();
    let pairs: Vec<(usize, usize)> = (0..n.saturating_sub(1))
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect();

    let mut positions = config.positions.clone();
    let mut potential = SoftDiskPotential::new(config.cell, &pairs);
    for k in 1..=INFLATION_STEPS {
        potential.set_inflation(&config.radii, k as f64 * 0.01);
        steepest_descent_armijo(&potential, &mut positions);
    }

    // the descent works on unfolded coordinates; fold them back
    config.positions = positions
        .iter()
        .map(|p| config.cell.wrap_point(*p))
        .collect();
    config.first_overlap().is_none()
}

/// Build a non-overlapping configuration of the given disks at packing
/// fraction `phi`: scatter, relax, check; up to 100 attempts.
pub fn generate_configuration(
    radii: Vec<f64>,
    phi: f64,
    rng: &mut StdRng,
) -> Result<Configuration, String> {
    let cell = PeriodicCell::from_packing_fraction(&radii, phi);
    let mut config = Configuration::new(cell, radii);

    for attempt in 0..PLACEMENT_ATTEMPTS {
        config.scatter(rng);
        let resolved = resolve_overlaps(&mut config);
        info!("Attempt {} successful: {}", attempt, resolved);
        if resolved {
            if !config.all_finite() {
                return Err("non-finite coordinate in relaxed configuration".to_string());
            }
            return Ok(config);
        }
    }
    Err("could not generate a starting configuration".to_string())
}
