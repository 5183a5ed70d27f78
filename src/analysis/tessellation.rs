//! Periodic two-dimensional Voronoi and radical (power) tessellation.
//!
//! Each disk's cell starts as the square of half-width L/2 around it (the
//! bisectors with its own periodic images) and is clipped against the
//! bisector half-plane of every candidate neighbour over the 3x3 image
//! block, nearest first. The search radius shrinks with the polygon, so
//! distant candidates are culled early. The radical variant weights every
//! bisector by the difference of squared radii, which is the only change a
//! power diagram needs.

use crate::configuration::Configuration;
use nalgebra::Vector2;
use rayon::prelude::*;

/// One tessellated cell: its vertex count and, for every polygon edge, the
/// index of the particle whose bisector generated that edge (periodic images
/// are mapped back to their base index; a cell bordering its own image
/// reports itself).
#[derive(Debug, Clone)]
pub struct TessellationCell {
    pub vertex_count: usize,
    pub neighbours: Vec<usize>,
}

/// Interface the Voronoi analyser consumes: positions, radii and the cell
/// come in through the configuration, `radical` selects the power diagram.
pub trait Tessellator {
    fn tessellate(&self, configuration: &Configuration, radical: bool) -> Vec<TessellationCell>;
}

/// Bisector-clipping tessellator. Cells are mutually independent, so the
/// per-cell map fans out over rayon with an order-preserving collect.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClippedCellTessellator;

impl Tessellator for ClippedCellTessellator {
    fn tessellate(&self, configuration: &Configuration, radical: bool) -> Vec<TessellationCell> {
        (0..configuration.n())
            .into_par_iter()
            .map(|i| {
                let polygon = cell_polygon(configuration, i, radical);
                TessellationCell {
                    vertex_count: polygon.vertices.len(),
                    neighbours: polygon.sources,
                }
            })
            .collect()
    }
}

/// Convex cell polygon in coordinates relative to its generator.
/// `sources[k]` generated the edge from `vertices[k]` to `vertices[k+1]`
/// (cyclic).
#[derive(Debug, Clone)]
pub(crate) struct CellPolygon {
    pub(crate) vertices: Vec<Vector2<f64>>,
    pub(crate) sources: Vec<usize>,
}

impl CellPolygon {
    /// The square bounded by the bisectors with the generator's own four
    /// axial images.
    fn image_square(half: f64, generator: usize) -> Self {
        CellPolygon {
            vertices: vec![
                Vector2::new(-half, -half),
                Vector2::new(half, -half),
                Vector2::new(half, half),
                Vector2::new(-half, half),
            ],
            sources: vec![generator; 4],
        }
    }

    fn max_vertex_norm_sq(&self) -> f64 {
        self.vertices
            .iter()
            .map(|v| v.norm_squared())
            .fold(0.0, f64::max)
    }

    /// Intersect with the half-plane `{p : p.d <= c}`. Returns whether the
    /// polygon changed. Vertices within `eps` of the line count as inside,
    /// so a bisector through an existing vertex (square lattices) does not
    /// fabricate an edge.
    fn clip(&mut self, d: Vector2<f64>, c: f64, source: usize, eps: f64) -> bool {
        let m = self.vertices.len();
        if m == 0 {
            return false;
        }
        let s: Vec<f64> = self.vertices.iter().map(|v| v.dot(&d) - c).collect();
        if s.iter().all(|&x| x <= eps) {
            return false;
        }
        if s.iter().all(|&x| x > -eps) {
            // cell swallowed whole; only possible for extreme radical weights
            self.vertices.clear();
            self.sources.clear();
            return true;
        }

        let mut vertices = Vec::with_capacity(m + 1);
        let mut sources = Vec::with_capacity(m + 1);
        for k in 0..m {
            let kn = (k + 1) % m;
            let (sa, sb) = (s[k], s[kn]);
            if sa <= eps {
                vertices.push(self.vertices[k]);
                if sb <= eps {
                    sources.push(self.sources[k]);
                } else {
                    let t = sa / (sa - sb);
                    vertices.push(self.vertices[k] + (self.vertices[kn] - self.vertices[k]) * t);
                    sources.push(self.sources[k]);
                    sources.push(source);
                }
            } else if sb <= eps {
                let t = sa / (sa - sb);
                vertices.push(self.vertices[k] + (self.vertices[kn] - self.vertices[k]) * t);
                sources.push(self.sources[k]);
            }
        }
        self.vertices = vertices;
        self.sources = sources;
        true
    }

    /// Merge consecutive vertices closer than `tol`, dropping the
    /// zero-length edge between them.
    fn dedupe(&mut self, tol: f64) {
        let tol_sq = tol * tol;
        let mut k = 0;
        while self.vertices.len() > 2 && k < self.vertices.len() {
            let kn = (k + 1) % self.vertices.len();
            if (self.vertices[kn] - self.vertices[k]).norm_squared() < tol_sq {
                self.vertices.remove(kn);
                self.sources.remove(k);
            } else {
                k += 1;
            }
        }
    }
}

/// Clip out the cell of particle `i`, in coordinates relative to it.
pub(crate) fn cell_polygon(configuration: &Configuration, i: usize, radical: bool) -> CellPolygon {
    let cell = configuration.cell;
    let len = cell.len;
    let n = configuration.n();
    let p_i = configuration.positions[i];
    let weight = |k: usize| {
        if radical {
            configuration.radii[k] * configuration.radii[k]
        } else {
            0.0
        }
    };
    let w_i = weight(i);
    let eps = 1e-9 * len * len;

    struct Candidate {
        d: Vector2<f64>,
        dist_sq: f64,
        plane: f64,
        source: usize,
    }

    let mut candidates = Vec::with_capacity(9 * n);
    for j in 0..n {
        let w_j = weight(j);
        for sx in -1i32..=1 {
            for sy in -1i32..=1 {
                if j == i && sx == 0 && sy == 0 {
                    continue;
                }
                let d = configuration.positions[j] - p_i
                    + Vector2::new(sx as f64 * len, sy as f64 * len);
                let dist_sq = d.norm_squared();
                candidates.push(Candidate {
                    d,
                    dist_sq,
                    plane: 0.5 * (dist_sq + w_i - w_j),
                    source: j,
                });
            }
        }
    }
    candidates.sort_by(|a, b| a.dist_sq.total_cmp(&b.dist_sq));

    let mut polygon = CellPolygon::image_square(cell.half_len, i);
    let mut max_vertex_sq = polygon.max_vertex_norm_sq();
    for cand in &candidates {
        // distance from the generator to the clipping line along d
        let t0 = cand.plane / cand.dist_sq.sqrt();
        if t0 > 0.0 && t0 * t0 >= max_vertex_sq {
            if radical {
                // weighted planes are not ordered with distance; keep looking
                continue;
            }
            break;
        }
        if polygon.clip(cand.d, cand.plane, cand.source, eps) {
            if polygon.vertices.is_empty() {
                break;
            }
            max_vertex_sq = polygon.max_vertex_norm_sq();
        }
    }
    polygon.dedupe(1e-9 * len);
    polygon
}
