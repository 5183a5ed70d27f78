//! Particle configuration: positions, radii and the owning periodic cell.

use crate::geometry::PeriodicCell;
use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, LogNormal};

/// Radius-generation rule for the disk mixture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dispersity {
    /// All disks share one radius.
    Mono { radius: f64 },
    /// Two species: `round(fraction * n)` disks of `radius`, the rest of
    /// `ratio * radius`.
    Bi { radius: f64, ratio: f64, fraction: f64 },
    /// Log-normal radii with mean `radius` and relative standard deviation
    /// `rel_sd`.
    Poly { radius: f64, rel_sd: f64 },
}

impl Dispersity {
    /// Draw `n` radii. Mono needs no randomness; bi assigns the small
    /// species first (placement is random, so ordering carries no bias);
    /// poly samples the log-normal with `sigma^2 = ln(1 + s^2)` and
    /// `mu = ln(r0) - sigma^2 / 2` so the radii themselves have mean `r0`.
    pub fn generate_radii(&self, n: usize, rng: &mut StdRng) -> Result<Vec<f64>, String> {
        match *self {
            Dispersity::Mono { radius } => Ok(vec![radius; n]),
            Dispersity::Bi {
                radius,
                ratio,
                fraction,
            } => {
                let n_small = (fraction * n as f64).round() as usize;
                let mut radii = vec![radius; n.min(n_small)];
                radii.resize(n, ratio * radius);
                Ok(radii)
            }
            Dispersity::Poly { radius, rel_sd } => {
                let sigma_sq = (1.0 + rel_sd * rel_sd).ln();
                let mu = radius.ln() - 0.5 * sigma_sq;
                let lognormal = LogNormal::new(mu, sigma_sq.sqrt())
                    .map_err(|e| format!("invalid polydispersity parameters: {}", e))?;
                Ok((0..n).map(|_| lognormal.sample(rng)).collect())
            }
        }
    }
}

/// The simulated system: `n` disk positions and radii in a periodic square
/// cell. Value-typed; the move kernel and analysers receive it explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    /// Disk centres, folded into `[-L/2, L/2)`.
    pub positions: Vec<Vector2<f64>>,
    /// Disk radii, same length as `positions`.
    pub radii: Vec<f64>,
    /// The periodic cell all distances are measured in.
    pub cell: PeriodicCell,
}

impl Configuration {
    /// A configuration with the given radii, all disks at the origin.
    pub fn new(cell: PeriodicCell, radii: Vec<f64>) -> Self {
        let n = radii.len();
        Configuration {
            positions: vec![Vector2::zeros(); n],
            radii,
            cell,
        }
    }

    pub fn n(&self) -> usize {
        self.positions.len()
    }

    /// Total disk area over cell area.
    pub fn packing_fraction(&self) -> f64 {
        let disk_area: f64 = self
            .radii
            .iter()
            .map(|r| std::f64::consts::PI * r * r)
            .sum();
        disk_area / (self.cell.len * self.cell.len)
    }

    /// Place every disk uniformly at random in the cell.
    pub fn scatter(&mut self, rng: &mut StdRng) {
        for p in &mut self.positions {
            let x = rng.gen::<f64>() * self.cell.len;
            let y = rng.gen::<f64>() * self.cell.len;
            *p = self.cell.wrap_point(Vector2::new(x, y));
        }
    }

    /// First overlapping pair, if any. Touching disks (`d^2 == (r_i+r_j)^2`)
    /// do not overlap.
    pub fn first_overlap(&self) -> Option<(usize, usize)> {
        let n = self.n();
        for i in 0..n.saturating_sub(1) {
            for j in (i + 1)..n {
                let d_sq = self
                    .cell
                    .min_image_dist_sq(self.positions[i], self.positions[j]);
                let r_sum = self.radii[i] + self.radii[j];
                if d_sq < r_sum * r_sum {
                    return Some((i, j));
                }
            }
        }
        None
    }

    pub fn all_finite(&self) -> bool {
        self.positions
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite())
    }
}
