//! Voronoi cell-size and adjacency statistics.
//!
//! Per snapshot the analyser tessellates the configuration, histograms cell
//! vertex counts, counts edges by the vertex counts of their endpoint cells,
//! folds both into running aggregates and reports the snapshot's network
//! row: the normalised size distribution followed by the degree
//! assortativity.

use super::tessellation::{TessellationCell, Tessellator};
use crate::configuration::Configuration;

/// Cells with this many vertices or more fall outside the histograms.
pub const MAX_VERTICES: usize = 21;

/// Running aggregates for one tessellation variant (standard or radical).
#[derive(Debug, Clone)]
pub struct VoronoiAnalyser<T: Tessellator> {
    tessellator: T,
    radical: bool,
    /// `sizes[k]` counts cells with `k` vertices, over all snapshots.
    pub sizes: Vec<u64>,
    /// Dense `MAX_VERTICES x MAX_VERTICES` edge-count matrix, row-major:
    /// entry `[k][l]` counts cell edges whose endpoints have `k` and `l`
    /// vertices. Every edge is seen from both sides, so the matrix stays
    /// symmetric.
    pub adjacencies: Vec<u64>,
    pub snapshots: u64,
}

impl<T: Tessellator> VoronoiAnalyser<T> {
    pub fn new(tessellator: T, radical: bool) -> Self {
        VoronoiAnalyser {
            tessellator,
            radical,
            sizes: vec![0; MAX_VERTICES],
            adjacencies: vec![0; MAX_VERTICES * MAX_VERTICES],
            snapshots: 0,
        }
    }

    /// Tessellate the snapshot, fold it into the aggregates and return its
    /// 22-entry network row.
    pub fn sample(&mut self, configuration: &Configuration) -> Vec<f64> {
        let cells = self.tessellator.tessellate(configuration, self.radical);
        let (sizes, adjacencies) = distributions(&cells);
        for (total, snap) in self.sizes.iter_mut().zip(&sizes) {
            *total += snap;
        }
        for (total, snap) in self.adjacencies.iter_mut().zip(&adjacencies) {
            *total += snap;
        }
        self.snapshots += 1;
        network_analysis(&sizes, &adjacencies)
    }

    /// Network row over everything sampled so far.
    pub fn aggregate_row(&self) -> Vec<f64> {
        network_analysis(&self.sizes, &self.adjacencies)
    }
}

fn distributions(cells: &[TessellationCell]) -> (Vec<u64>, Vec<u64>) {
    let mut sizes = vec![0u64; MAX_VERTICES];
    let mut adjacencies = vec![0u64; MAX_VERTICES * MAX_VERTICES];
    for cell in cells {
        let k = cell.vertex_count;
        if k >= MAX_VERTICES {
            continue;
        }
        sizes[k] += 1;
        for &neighbour in &cell.neighbours {
            let l = cells[neighbour].vertex_count;
            if l < MAX_VERTICES {
                adjacencies[k * MAX_VERTICES + l] += 1;
            }
        }
    }
    (sizes, adjacencies)
}

/// Normalised size distribution `p_k` in entries `0..21`, degree
/// assortativity in entry 21:
/// `r = (k1^2 * <kl> - k2^2) / (k1*k3 - k2^2)`
/// with `<kl>` the edge-averaged product of endpoint vertex counts.
/// When every cell has the same degree the denominator vanishes and the
/// entry is NaN.
pub fn network_analysis(sizes: &[u64], adjacencies: &[u64]) -> Vec<f64> {
    let total: f64 = sizes.iter().sum::<u64>() as f64;
    let mut row = vec![0.0; MAX_VERTICES + 1];
    for k in 0..MAX_VERTICES {
        row[k] = sizes[k] as f64 / total;
    }

    let (mut k1, mut k2, mut k3) = (0.0, 0.0, 0.0);
    for (k, &p) in row.iter().take(MAX_VERTICES).enumerate() {
        let kf = k as f64;
        k1 += kf * p;
        k2 += kf * kf * p;
        k3 += kf * kf * kf * p;
    }

    let edge_total: f64 = adjacencies.iter().sum::<u64>() as f64;
    let mut kl = 0.0;
    for k in 0..MAX_VERTICES {
        for l in 0..MAX_VERTICES {
            kl += (k * l) as f64 * adjacencies[k * MAX_VERTICES + l] as f64;
        }
    }
    row[MAX_VERTICES] = (k1 * k1 * kl / edge_total - k2 * k2) / (k1 * k3 - k2 * k2);
    row
}

#[cfg(test)]
mod tests {
    use super::super::tessellation::ClippedCellTessellator;
    use super::*;
    use crate::geometry::PeriodicCell;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn random_configuration(n: usize, cell_len: f64, seed: u64) -> Configuration {
        let cell = PeriodicCell::new(cell_len);
        let mut config = Configuration::new(cell, vec![0.4; n]);
        config.scatter(&mut StdRng::seed_from_u64(seed));
        config
    }

    #[test]
    fn test_size_distribution_counts_every_cell() {
        let config = random_configuration(30, 12.0, 3);
        let mut analyser = VoronoiAnalyser::new(ClippedCellTessellator, false);
        analyser.sample(&config);
        assert_eq!(analyser.sizes.iter().sum::<u64>(), 30);
        assert_eq!(analyser.snapshots, 1);
    }

    #[test]
    fn test_adjacency_closure() {
        // each cell contributes one incident edge per vertex, so row sums of
        // the adjacency matrix are k * sizes[k]
        let config = random_configuration(25, 10.0, 8);
        let mut analyser = VoronoiAnalyser::new(ClippedCellTessellator, false);
        analyser.sample(&config);
        for k in 0..MAX_VERTICES {
            let row_sum: u64 = (0..MAX_VERTICES)
                .map(|l| analyser.adjacencies[k * MAX_VERTICES + l])
                .sum();
            assert_eq!(row_sum, k as u64 * analyser.sizes[k]);
        }
    }

    #[test]
    fn test_adjacency_matrix_symmetric() {
        let config = random_configuration(25, 10.0, 8);
        let mut analyser = VoronoiAnalyser::new(ClippedCellTessellator, false);
        analyser.sample(&config);
        for k in 0..MAX_VERTICES {
            for l in 0..MAX_VERTICES {
                assert_eq!(
                    analyser.adjacencies[k * MAX_VERTICES + l],
                    analyser.adjacencies[l * MAX_VERTICES + k]
                );
            }
        }
    }

    #[test]
    fn test_aggregates_accumulate_over_snapshots() {
        let config = random_configuration(20, 10.0, 4);
        let mut analyser = VoronoiAnalyser::new(ClippedCellTessellator, false);
        analyser.sample(&config);
        analyser.sample(&config);
        assert_eq!(analyser.sizes.iter().sum::<u64>(), 40);
        assert_eq!(analyser.snapshots, 2);
    }

    #[test]
    fn test_network_row_normalisation() {
        let config = random_configuration(30, 12.0, 9);
        let mut analyser = VoronoiAnalyser::new(ClippedCellTessellator, false);
        let row = analyser.sample(&config);
        assert_eq!(row.len(), MAX_VERTICES + 1);
        let p_sum: f64 = row[..MAX_VERTICES].iter().sum();
        assert_relative_eq!(p_sum, 1.0, epsilon = 1e-12);
        let r = row[MAX_VERTICES];
        if r.is_finite() {
            assert!((-1.0..=1.0).contains(&r), "assortativity {} out of range", r);
        }
    }

    #[test]
    fn test_network_analysis_hand_checked() {
        // two 4-cells and two 6-cells; every 4-cell edge goes to a 6-cell,
        // the remaining 6-cell stubs pair up among themselves
        let mut sizes = vec![0u64; MAX_VERTICES];
        sizes[4] = 2;
        sizes[6] = 2;
        let mut adjacencies = vec![0u64; MAX_VERTICES * MAX_VERTICES];
        adjacencies[4 * MAX_VERTICES + 6] = 8;
        adjacencies[6 * MAX_VERTICES + 4] = 8;
        adjacencies[6 * MAX_VERTICES + 6] = 4;

        let row = network_analysis(&sizes, &adjacencies);
        assert_relative_eq!(row[4], 0.5, epsilon = 1e-12);
        assert_relative_eq!(row[6], 0.5, epsilon = 1e-12);
        // k1 = 5, k2 = 26, k3 = 140, <kl> = 528/20
        assert_relative_eq!(row[MAX_VERTICES], -2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_uniform_degree_has_undefined_assortativity() {
        let mut sizes = vec![0u64; MAX_VERTICES];
        sizes[4] = 4;
        let mut adjacencies = vec![0u64; MAX_VERTICES * MAX_VERTICES];
        adjacencies[4 * MAX_VERTICES + 4] = 16;
        let row = network_analysis(&sizes, &adjacencies);
        assert!(row[MAX_VERTICES].is_nan());
    }
}
