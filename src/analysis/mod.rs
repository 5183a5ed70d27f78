//! Structural observables computed from sampled configurations.
//!
//! - `rdf`: binned pair-distance histogram and g(r) normalisation
//! - `tessellation`: periodic Voronoi / radical tessellator
//! - `voronoi`: cell-size and adjacency statistics over tessellations

pub mod rdf;
pub mod tessellation;
pub mod voronoi;

pub use rdf::RdfAccumulator;
pub use tessellation::{ClippedCellTessellator, TessellationCell, Tessellator};
pub use voronoi::{network_analysis, VoronoiAnalyser, MAX_VERTICES};
