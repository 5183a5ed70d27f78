//! Periodic square-cell geometry: coordinate wrapping and minimum images.

use nalgebra::Vector2;

/// Square periodic cell of side `len`, centred on the origin.
///
/// Coordinates live in the folded interval `[-len/2, len/2)` and pairwise
/// separations are taken through the nearest periodic replica. Folding uses
/// round-half-to-even, so the `d == len/2` tie resolves the same way in the
/// overlap test and in the RDF binning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicCell {
    pub len: f64,
    pub half_len: f64,
    inv_len: f64,
}

impl PeriodicCell {
    pub fn new(len: f64) -> Self {
        assert!(len > 0.0 && len.is_finite(), "cell side must be positive");
        PeriodicCell {
            len,
            half_len: 0.5 * len,
            inv_len: 1.0 / len,
        }
    }

    /// Cell sized so the given disks fill the target packing fraction:
    /// `L = sqrt(pi * sum(r_i^2) / phi)`.
    pub fn from_packing_fraction(radii: &[f64], phi: f64) -> Self {
        let disk_area: f64 = radii.iter().map(|r| std::f64::consts::PI * r * r).sum();
        Self::new((disk_area / phi).sqrt())
    }

    /// Fold a scalar coordinate into `[-len/2, len/2)`.
    ///
    /// `-len/2` is a fixed point; an exact `+len/2` input also stays put
    /// because the half-integer multiple rounds to even.
    #[inline]
    pub fn wrap(&self, u: f64) -> f64 {
        u - self.len * (u * self.inv_len).round_ties_even()
    }

    #[inline]
    pub fn wrap_point(&self, p: Vector2<f64>) -> Vector2<f64> {
        Vector2::new(self.wrap(p.x), self.wrap(p.y))
    }

    /// Minimum-image separation vector.
    #[inline]
    pub fn min_image(&self, d: Vector2<f64>) -> Vector2<f64> {
        self.wrap_point(d)
    }

    /// Squared minimum-image distance between two points.
    #[inline]
    pub fn min_image_dist_sq(&self, a: Vector2<f64>, b: Vector2<f64>) -> f64 {
        self.min_image(a - b).norm_squared()
    }
}
