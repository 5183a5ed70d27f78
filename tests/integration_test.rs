//! End-to-end simulation scenarios.
//!
//! The fast tests run a complete pipeline (relaxation, calibration,
//! equilibration, production, analysis output) on small systems. The slower
//! physics scenarios at production-scale parameters are `#[ignore]`d by
//! default.

use hdmc::config::HdmcConfig;
use hdmc::Simulation;
use std::path::Path;
use tempfile::tempdir;

fn input_text(
    n: usize,
    phi: f64,
    seed: u64,
    eq: usize,
    prod: usize,
    swap: f64,
    prefix: &str,
    xyz_freq: usize,
    analysis_freq: usize,
    rdf_mode: u8,
    vor_mode: u8,
) -> String {
    format!(
        "Particle parameters\n\
         -------------------\n\
         (n, dispersity, radii, interaction, packing fraction)\n\
         {n}\n\
         mono\n\
         0.5\n\
         add\n\
         {phi}\n\
         Simulation parameters\n\
         (seed, eq cycles, prod cycles, swap prob, acceptance target)\n\
         {seed}\n\
         {eq}\n\
         {prod}\n\
         {swap}\n\
         0.5\n\
         Analysis parameters\n\
         (prefix, xyz freq, analysis freq, rdf mode, rdf delta, voronoi mode)\n\
         {prefix}\n\
         {xyz_freq}\n\
         {analysis_freq}\n\
         {rdf_mode}\n\
         0.1\n\
         {vor_mode}\n"
    )
}

fn run_simulation(input: &str) -> Simulation {
    let config = HdmcConfig::parse(input).expect("input should parse");
    let mut simulation = Simulation::new(config).expect("initialisation should succeed");
    simulation.run().expect("run should succeed");
    simulation
}

fn read(path: impl AsRef<Path>) -> String {
    std::fs::read_to_string(path.as_ref())
        .unwrap_or_else(|_| panic!("missing output file {}", path.as_ref().display()))
}

#[test]
fn test_full_pipeline_writes_all_outputs() {
    let dir = tempdir().unwrap();
    let prefix = dir.path().join("run").to_string_lossy().into_owned();
    let input = input_text(16, 0.3, 7, 20, 40, 0.1, &prefix, 10, 10, 1, 3);
    let simulation = run_simulation(&input);

    // trajectory: 4 frames of n + 2 lines each
    let xyz = read(format!("{}.xyz", prefix));
    assert_eq!(xyz.lines().count(), 4 * 18);
    assert!(xyz.lines().next().unwrap().trim() == "16");

    // per-snapshot voronoi rows plus one aggregate row, 22 columns each
    for suffix in ["_vor.dat", "_rad.dat"] {
        let rows = read(format!("{}{}", prefix, suffix));
        assert_eq!(rows.lines().count(), 4 + 1);
        for line in rows.lines() {
            assert_eq!(line.split_whitespace().count(), 22);
        }
    }

    // one (bin, value) pair per histogram bin
    let rdf = read(format!("{}_rdf.dat", prefix));
    let bins = simulation.rdf().unwrap().histogram.len();
    assert_eq!(rdf.lines().count(), bins);

    // voronoi closure: every snapshot accounts for every cell
    let voronoi = simulation.voronoi().unwrap();
    assert_eq!(voronoi.sizes.iter().sum::<u64>(), 16 * voronoi.snapshots);

    // hard-disk invariants survive the whole run
    let config = simulation.configuration();
    assert_eq!(config.first_overlap(), None);
    assert!(config.all_finite());
    assert!((config.packing_fraction() - 0.3).abs() < 1e-12);
    assert!(simulation.trans_delta() > 0.0);
    assert!(simulation.trans_delta() <= config.cell.half_len);
}

#[test]
fn test_identical_inputs_give_identical_outputs() {
    let dir = tempdir().unwrap();
    let prefix_a = dir.path().join("a").to_string_lossy().into_owned();
    let prefix_b = dir.path().join("b").to_string_lossy().into_owned();

    run_simulation(&input_text(16, 0.3, 42, 20, 40, 0.2, &prefix_a, 10, 10, 1, 1));
    run_simulation(&input_text(16, 0.3, 42, 20, 40, 0.2, &prefix_b, 10, 10, 1, 1));

    assert_eq!(
        read(format!("{}.xyz", prefix_a)),
        read(format!("{}.xyz", prefix_b)),
        "trajectories diverged for identical seeds"
    );
    assert_eq!(
        read(format!("{}_rdf.dat", prefix_a)),
        read(format!("{}_rdf.dat", prefix_b))
    );
    assert_eq!(
        read(format!("{}_vor.dat", prefix_a)),
        read(format!("{}_vor.dat", prefix_b))
    );
}

#[test]
fn test_different_seeds_diverge() {
    let dir = tempdir().unwrap();
    let prefix_a = dir.path().join("a").to_string_lossy().into_owned();
    let prefix_b = dir.path().join("b").to_string_lossy().into_owned();

    run_simulation(&input_text(16, 0.3, 1, 10, 20, 0.0, &prefix_a, 10, 0, 0, 0));
    run_simulation(&input_text(16, 0.3, 2, 10, 20, 0.0, &prefix_b, 10, 0, 0, 0));

    assert_ne!(
        read(format!("{}.xyz", prefix_a)),
        read(format!("{}.xyz", prefix_b))
    );
}

#[test]
fn test_disabled_outputs_are_not_written() {
    let dir = tempdir().unwrap();
    let prefix = dir.path().join("quiet").to_string_lossy().into_owned();
    run_simulation(&input_text(9, 0.2, 3, 10, 20, 0.0, &prefix, 0, 0, 0, 0));

    assert!(!Path::new(&format!("{}.xyz", prefix)).exists());
    assert!(!Path::new(&format!("{}_rdf.dat", prefix)).exists());
    assert!(!Path::new(&format!("{}_vor.dat", prefix)).exists());
    assert!(!Path::new(&format!("{}_rad.dat", prefix)).exists());
}

#[test]
#[ignore] // slower physics scenario
fn test_relaxer_feasibility_at_half_packing() {
    let dir = tempdir().unwrap();
    let prefix = dir.path().join("relax").to_string_lossy().into_owned();
    let input = input_text(64, 0.5, 1, 0, 0, 0.0, &prefix, 0, 0, 0, 0);
    let config = HdmcConfig::parse(&input).unwrap();
    let simulation = Simulation::new(config).expect("relaxer should resolve phi = 0.5");
    assert_eq!(simulation.configuration().first_overlap(), None);
}

#[test]
#[ignore] // slower physics scenario
fn test_dense_system_completes_without_fatal_error() {
    // phi = 0.70 may pin the delta instead of converging; either way the
    // run must finish cleanly
    let dir = tempdir().unwrap();
    let prefix = dir.path().join("dense").to_string_lossy().into_owned();
    let input = input_text(64, 0.70, 1, 50, 50, 0.0, &prefix, 0, 10, 2, 1);
    run_simulation(&input);
}

#[test]
#[ignore] // slower physics scenario
fn test_dilute_rdf_tends_to_unity_with_contact_peak() {
    let dir = tempdir().unwrap();
    let prefix = dir.path().join("rdf").to_string_lossy().into_owned();
    let input = input_text(100, 0.05, 9, 200, 2000, 0.0, &prefix, 0, 10, 1, 0);
    let simulation = run_simulation(&input);

    let config = simulation.configuration();
    let rows = simulation.rdf().unwrap().finalise(config, true);

    // zero inside the core (r < 2 * radius = 1)
    for &(centre, value) in rows.iter().filter(|(c, _)| *c < 0.95) {
        assert!(value == 0.0, "g({}) = {} inside the hard core", centre, value);
    }
    // contact peak above the long-range plateau
    let contact = rows
        .iter()
        .filter(|(c, _)| *c > 1.0 && *c < 1.2)
        .map(|&(_, v)| v)
        .fold(0.0, f64::max);
    assert!(contact > 1.0);
    // plateau near unity well away from contact
    let tail: Vec<f64> = rows
        .iter()
        .filter(|(c, _)| *c > 3.0 && *c < 6.0)
        .map(|&(_, v)| v)
        .collect();
    let mean_tail: f64 = tail.iter().sum::<f64>() / tail.len() as f64;
    assert!(
        (mean_tail - 1.0).abs() < 0.1,
        "g(r) tail {} far from unity",
        mean_tail
    );
}
