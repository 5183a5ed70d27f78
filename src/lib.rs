//! Hard-disk Monte Carlo in a periodic two-dimensional cell.
//!
//! Samples a fluid of hard disks by Metropolis Monte Carlo (translation and
//! swap moves, overlap-or-accept, no energy scale) and computes equilibrium
//! structural observables from the trajectory: the radial distribution
//! function and Voronoi / radical tessellation statistics.
//!
//! # Modules
//!
//! - `config`: input-file parsing and validation
//! - `geometry`: periodic cell, wrapping and minimum images
//! - `configuration`: the particle store and dispersity rules
//! - `relax`: soft-push resolver for the initial configuration
//! - `mc`: the Metropolis move kernel and delta calibration
//! - `analysis`: RDF accumulation and Voronoi statistics
//! - `output`: logging setup and trajectory/analysis writers
//! - `simulation`: the driver tying the phases together

pub mod analysis;
pub mod config;
pub mod configuration;
pub mod geometry;
pub mod mc;
pub mod output;
pub mod relax;
pub mod simulation;

pub use config::HdmcConfig;
pub use configuration::{Configuration, Dispersity};
pub use geometry::PeriodicCell;
pub use mc::{calibrate, CalibrationResult, CalibrationStatus, MonteCarlo};
pub use simulation::Simulation;
