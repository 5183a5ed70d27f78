//! Simulation driver: initialisation, equilibration, production, teardown.

use crate::analysis::{ClippedCellTessellator, RdfAccumulator, VoronoiAnalyser};
use crate::config::HdmcConfig;
use crate::configuration::Configuration;
use crate::mc::{calibrate, CalibrationStatus, MonteCarlo};
use crate::output::{RowWriter, XyzWriter};
use crate::relax;
use color_eyre::eyre::{eyre, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

/// One complete Monte Carlo run. Owns the sampler and the analysis
/// accumulators; file writers live only for the phases that need them.
pub struct Simulation {
    mc: MonteCarlo,
    config: HdmcConfig,
    rdf: Option<RdfAccumulator>,
    voronoi: Option<VoronoiAnalyser<ClippedCellTessellator>>,
    radical: Option<VoronoiAnalyser<ClippedCellTessellator>>,
}

impl Simulation {
    /// Validate the parameters, draw the radii and resolve a starting
    /// configuration. Fails when the input is out of range or the relaxer
    /// exhausts its attempts.
    pub fn new(config: HdmcConfig) -> Result<Self> {
        config.validate().map_err(|e| eyre!(e))?;

        let particles = &config.particles;
        info!("Number of particles: {}", particles.n);
        info!("Particle dispersity: {:?}", particles.dispersity);
        info!("Packing fraction: {}", particles.packing_fraction);
        info!("Random seed: {}", config.simulation.seed);
        info!("Swap move probability: {}", config.simulation.swap_prob);
        info!("Target acceptance: {}", config.simulation.accept_target);

        let mut rng = StdRng::seed_from_u64(config.simulation.seed);
        let radii = particles
            .dispersity
            .generate_radii(particles.n, &mut rng)
            .map_err(|e| eyre!(e))?;

        info!("Generating initial configuration");
        let configuration =
            relax::generate_configuration(radii, particles.packing_fraction, &mut rng)
                .map_err(|e| eyre!(e))?;
        info!("Cell side: {:.6}", configuration.cell.len);

        let analysis = &config.analysis;
        let rdf = analysis
            .rdf_mode
            .enabled()
            .then(|| RdfAccumulator::new(&configuration.cell, analysis.rdf_delta));
        let voronoi = analysis
            .voronoi_mode
            .standard()
            .then(|| VoronoiAnalyser::new(ClippedCellTessellator, false));
        let radical = analysis
            .voronoi_mode
            .radical()
            .then(|| VoronoiAnalyser::new(ClippedCellTessellator, true));

        let mc = MonteCarlo::new(configuration, rng, config.simulation.swap_prob);
        Ok(Simulation {
            mc,
            config,
            rdf,
            voronoi,
            radical,
        })
    }

    pub fn configuration(&self) -> &Configuration {
        &self.mc.configuration
    }

    pub fn trans_delta(&self) -> f64 {
        self.mc.trans_delta
    }

    pub fn rdf(&self) -> Option<&RdfAccumulator> {
        self.rdf.as_ref()
    }

    pub fn voronoi(&self) -> Option<&VoronoiAnalyser<ClippedCellTessellator>> {
        self.voronoi.as_ref()
    }

    pub fn radical(&self) -> Option<&VoronoiAnalyser<ClippedCellTessellator>> {
        self.radical.as_ref()
    }

    pub fn run(&mut self) -> Result<()> {
        self.equilibrate();
        self.produce()
    }

    /// Calibrate the translation delta, then run the equilibration cycles.
    fn equilibrate(&mut self) {
        let target = self.config.simulation.accept_target;
        let eq_cycles = self.config.simulation.eq_cycles;

        info!("Equilibration Monte Carlo");
        info!(
            "Finding displacement delta for acceptance probability {}",
            target
        );
        let result = calibrate(&mut self.mc, target);
        match result.status {
            CalibrationStatus::Converged => {}
            CalibrationStatus::TooDense => {
                warn!("System too dense to reach the acceptance target")
            }
            CalibrationStatus::TooDilute => {
                warn!("System too dilute to reach the acceptance target")
            }
            CalibrationStatus::IterationLimit => {
                warn!("Delta search iteration limit hit, keeping best delta")
            }
        }
        info!("Translation delta set to {:.6}", result.delta);

        info!("Running equilibration");
        let log_every = (eq_cycles / 100).max(1);
        let n = self.mc.configuration.n() as u64;
        let mut accepted = 0u64;
        for i in 1..=eq_cycles {
            accepted += self.mc.cycle();
            if i % log_every == 0 {
                info!(
                    "Cycles and acceptance: {} {:.6}",
                    i,
                    accepted as f64 / (i as u64 * n) as f64
                );
            }
        }
    }

    /// Production cycles with frozen delta, trajectory writes and online
    /// analysis at their cadences, then the shutdown dumps.
    fn produce(&mut self) -> Result<()> {
        let prod_cycles = self.config.simulation.prod_cycles;
        let xyz_freq = self.config.analysis.xyz_write_freq;
        let analysis_freq = self.config.analysis.analysis_freq;
        let prefix = self.config.analysis.output_prefix.clone();

        let mut xyz = if xyz_freq > 0 {
            Some(XyzWriter::create(format!("{}.xyz", prefix))?)
        } else {
            None
        };
        let mut vor_file = if self.voronoi.is_some() {
            Some(RowWriter::create(format!("{}_vor.dat", prefix))?)
        } else {
            None
        };
        let mut rad_file = if self.radical.is_some() {
            Some(RowWriter::create(format!("{}_rad.dat", prefix))?)
        } else {
            None
        };

        info!("Production Monte Carlo");
        let log_every = (prod_cycles / 100).max(1);
        let n = self.mc.configuration.n() as u64;
        let mut accepted = 0u64;
        for i in 1..=prod_cycles {
            accepted += self.mc.cycle();
            if i % log_every == 0 {
                info!(
                    "Cycles and acceptance: {} {:.6}",
                    i,
                    accepted as f64 / (i as u64 * n) as f64
                );
            }
            if let Some(xyz) = xyz.as_mut() {
                if i % xyz_freq == 0 {
                    xyz.write_frame(&self.mc.configuration)?;
                }
            }
            if analysis_freq > 0 && i % analysis_freq == 0 {
                if let Some(rdf) = self.rdf.as_mut() {
                    rdf.sample(&self.mc.configuration);
                }
                if let (Some(analyser), Some(file)) = (self.voronoi.as_mut(), vor_file.as_mut()) {
                    let row = analyser.sample(&self.mc.configuration);
                    file.write_row(&row)?;
                }
                if let (Some(analyser), Some(file)) = (self.radical.as_mut(), rad_file.as_mut()) {
                    let row = analyser.sample(&self.mc.configuration);
                    file.write_row(&row)?;
                }
            }
        }

        // shutdown dumps: aggregate Voronoi rows and the RDF table
        if let Some(rdf) = &self.rdf {
            let mut rdf_file = RowWriter::create(format!("{}_rdf.dat", prefix))?;
            let normalise = self.config.analysis.rdf_mode.normalised();
            for (bin, value) in rdf.finalise(&self.mc.configuration, normalise) {
                rdf_file.write_pair(bin, value)?;
            }
            rdf_file.flush()?;
        }
        if let (Some(analyser), Some(file)) = (&self.voronoi, vor_file.as_mut()) {
            file.write_row(&analyser.aggregate_row())?;
            file.flush()?;
        }
        if let (Some(analyser), Some(file)) = (&self.radical, rad_file.as_mut()) {
            file.write_row(&analyser.aggregate_row())?;
            file.flush()?;
        }
        if let Some(xyz) = xyz.as_mut() {
            xyz.flush()?;
        }
        Ok(())
    }
}
