//! Input-file model for the simulation: parsing and validation.
//!
//! The input is a line-oriented plain-text file. Each section is preceded by
//! a fixed number of header lines that are skipped unparsed; within a
//! section every value sits on its own line (the first whitespace-separated
//! token is read, so trailing comments are tolerated), except the dispersity
//! parameters which share one line.

use crate::configuration::Dispersity;
use color_eyre::eyre::{eyre, Result, WrapErr};
use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Additive,
    NonAdditive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfMode {
    Off,
    Normalised,
    Raw,
}

impl RdfMode {
    pub fn enabled(self) -> bool {
        self != RdfMode::Off
    }

    pub fn normalised(self) -> bool {
        self == RdfMode::Normalised
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoronoiMode {
    Off,
    Standard,
    Radical,
    Both,
}

impl VoronoiMode {
    pub fn standard(self) -> bool {
        matches!(self, VoronoiMode::Standard | VoronoiMode::Both)
    }

    pub fn radical(self) -> bool {
        matches!(self, VoronoiMode::Radical | VoronoiMode::Both)
    }
}

#[derive(Debug, Clone)]
pub struct ParticleParams {
    pub n: usize,
    pub dispersity: Dispersity,
    pub interaction: Interaction,
    pub packing_fraction: f64,
}

#[derive(Debug, Clone)]
pub struct SimulationParams {
    pub seed: u64,
    pub eq_cycles: usize,
    pub prod_cycles: usize,
    pub swap_prob: f64,
    pub accept_target: f64,
}

#[derive(Debug, Clone)]
pub struct AnalysisParams {
    pub output_prefix: String,
    /// Trajectory write cadence in cycles; 0 disables trajectory output.
    pub xyz_write_freq: usize,
    pub analysis_freq: usize,
    pub rdf_mode: RdfMode,
    pub rdf_delta: f64,
    pub voronoi_mode: VoronoiMode,
}

#[derive(Debug, Clone)]
pub struct HdmcConfig {
    pub particles: ParticleParams,
    pub simulation: SimulationParams,
    pub analysis: AnalysisParams,
}

struct Cursor<'a> {
    lines: std::str::Lines<'a>,
    line_no: usize,
}

impl<'a> Cursor<'a> {
    fn new(content: &'a str) -> Self {
        Cursor {
            lines: content.lines(),
            line_no: 0,
        }
    }

    fn next_line(&mut self, what: &str) -> Result<&'a str> {
        self.line_no += 1;
        self.lines
            .next()
            .ok_or_else(|| eyre!("input ended before {} (line {})", what, self.line_no))
    }

    fn skip(&mut self, count: usize, what: &str) -> Result<()> {
        for _ in 0..count {
            self.next_line(what)?;
        }
        Ok(())
    }

    fn value<T>(&mut self, what: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let line = self.next_line(what)?;
        let token = line
            .split_whitespace()
            .next()
            .ok_or_else(|| eyre!("blank line where {} was expected (line {})", what, self.line_no))?;
        token
            .parse()
            .map_err(|e| eyre!("cannot parse {} from '{}' (line {}): {}", what, token, self.line_no, e))
    }

    fn values(&mut self, what: &str, count: usize) -> Result<Vec<f64>> {
        let line_no = self.line_no + 1;
        let line = self.next_line(what)?;
        let parsed: Result<Vec<f64>> = line
            .split_whitespace()
            .take(count)
            .map(|token| {
                token
                    .parse()
                    .map_err(|e| eyre!("cannot parse {} from '{}' (line {}): {}", what, token, line_no, e))
            })
            .collect();
        let parsed = parsed?;
        if parsed.len() < count {
            return Err(eyre!(
                "{} needs {} values, found {} (line {})",
                what,
                count,
                parsed.len(),
                line_no
            ));
        }
        Ok(parsed)
    }
}

impl HdmcConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .wrap_err_with(|| format!("cannot find input file {}", path.as_ref().display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut cursor = Cursor::new(content);

        cursor.skip(3, "particle section")?;
        let n: usize = cursor.value("number of particles")?;
        let tag: String = cursor.value("dispersity tag")?;
        let dispersity = if tag.starts_with("mono") {
            let radius: f64 = cursor.value("particle radius")?;
            Dispersity::Mono { radius }
        } else if tag.starts_with("bi") {
            let params = cursor.values("bidispersity parameters (radius ratio fraction)", 3)?;
            Dispersity::Bi {
                radius: params[0],
                ratio: params[1],
                fraction: params[2],
            }
        } else if tag.starts_with("poly") {
            let params = cursor.values("polydispersity parameters (radius rel-sd)", 2)?;
            Dispersity::Poly {
                radius: params[0],
                rel_sd: params[1],
            }
        } else {
            return Err(eyre!("unrecognised dispersity tag '{}'", tag));
        };
        let tag: String = cursor.value("interaction tag")?;
        let interaction = if tag.starts_with("nonadd") {
            Interaction::NonAdditive
        } else if tag.starts_with("add") {
            Interaction::Additive
        } else {
            return Err(eyre!("unrecognised interaction tag '{}'", tag));
        };
        let packing_fraction: f64 = cursor.value("packing fraction")?;

        cursor.skip(2, "simulation section")?;
        let seed: u64 = cursor.value("random seed")?;
        let eq_cycles: usize = cursor.value("equilibration cycles")?;
        let prod_cycles: usize = cursor.value("production cycles")?;
        let swap_prob: f64 = cursor.value("swap probability")?;
        let accept_target: f64 = cursor.value("acceptance target")?;

        cursor.skip(2, "analysis section")?;
        let output_prefix: String = cursor.value("output prefix")?;
        let xyz_write_freq: usize = cursor.value("xyz write frequency")?;
        let analysis_freq: usize = cursor.value("analysis frequency")?;
        let rdf_mode = match cursor.value::<u8>("rdf mode")? {
            0 => RdfMode::Off,
            1 => RdfMode::Normalised,
            2 => RdfMode::Raw,
            other => return Err(eyre!("unrecognised rdf mode {}", other)),
        };
        let rdf_delta: f64 = cursor.value("rdf bin width")?;
        let voronoi_mode = match cursor.value::<u8>("voronoi mode")? {
            0 => VoronoiMode::Off,
            1 => VoronoiMode::Standard,
            2 => VoronoiMode::Radical,
            3 => VoronoiMode::Both,
            other => return Err(eyre!("unrecognised voronoi mode {}", other)),
        };

        Ok(HdmcConfig {
            particles: ParticleParams {
                n,
                dispersity,
                interaction,
                packing_fraction,
            },
            simulation: SimulationParams {
                seed,
                eq_cycles,
                prod_cycles,
                swap_prob,
                accept_target,
            },
            analysis: AnalysisParams {
                output_prefix,
                xyz_write_freq,
                analysis_freq,
                rdf_mode,
                rdf_delta,
                voronoi_mode,
            },
        })
    }

    /// Validate parameter ranges and unimplemented combinations.
    pub fn validate(&self) -> Result<(), String> {
        let p = &self.particles;
        if p.n < 2 {
            return Err("at least two particles are required".to_string());
        }
        if !(p.packing_fraction > 0.0 && p.packing_fraction < 1.0) {
            return Err("packing fraction must lie in (0, 1)".to_string());
        }
        match p.dispersity {
            Dispersity::Mono { radius } => {
                if radius <= 0.0 {
                    return Err("particle radius must be positive".to_string());
                }
            }
            Dispersity::Bi {
                radius,
                ratio,
                fraction,
            } => {
                if radius <= 0.0 || ratio <= 0.0 {
                    return Err("bidispersity radius and ratio must be positive".to_string());
                }
                if !(0.0..=1.0).contains(&fraction) {
                    return Err("bidispersity fraction must lie in [0, 1]".to_string());
                }
            }
            Dispersity::Poly { radius, rel_sd } => {
                if radius <= 0.0 {
                    return Err("polydispersity mean radius must be positive".to_string());
                }
                if rel_sd < 0.0 {
                    return Err("polydispersity relative sd must be non-negative".to_string());
                }
            }
        }
        if p.interaction == Interaction::NonAdditive {
            return Err("non-additive interactions are not implemented".to_string());
        }

        let s = &self.simulation;
        if !(0.0..=1.0).contains(&s.swap_prob) {
            return Err("swap probability must lie in [0, 1]".to_string());
        }
        if !(s.accept_target > 0.0 && s.accept_target < 1.0) {
            return Err("acceptance target must lie in (0, 1)".to_string());
        }

        let a = &self.analysis;
        if a.output_prefix.is_empty() {
            return Err("output prefix must not be empty".to_string());
        }
        if a.rdf_mode.enabled() && a.rdf_delta <= 0.0 {
            return Err("rdf bin width must be positive".to_string());
        }
        let any_analysis = a.rdf_mode.enabled() || a.voronoi_mode != VoronoiMode::Off;
        if any_analysis && a.analysis_freq == 0 {
            return Err("analysis frequency must be positive when analysis is enabled".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Particle parameters
-------------------
(n, dispersity, radii, interaction, packing fraction)
100
mono
0.5
add
0.4
Simulation parameters
(seed, eq cycles, prod cycles, swap prob, acceptance target)
42
1000
2000
0.2
0.5
Analysis parameters
(prefix, xyz freq, analysis freq, rdf mode, rdf delta, voronoi mode)
run0
100
10
1
0.05
3
";

    #[test]
    fn test_parse_sample_input() {
        let config = HdmcConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.particles.n, 100);
        assert_eq!(config.particles.dispersity, Dispersity::Mono { radius: 0.5 });
        assert_eq!(config.particles.interaction, Interaction::Additive);
        assert_eq!(config.particles.packing_fraction, 0.4);
        assert_eq!(config.simulation.seed, 42);
        assert_eq!(config.simulation.eq_cycles, 1000);
        assert_eq!(config.simulation.prod_cycles, 2000);
        assert_eq!(config.simulation.swap_prob, 0.2);
        assert_eq!(config.simulation.accept_target, 0.5);
        assert_eq!(config.analysis.output_prefix, "run0");
        assert_eq!(config.analysis.xyz_write_freq, 100);
        assert_eq!(config.analysis.analysis_freq, 10);
        assert_eq!(config.analysis.rdf_mode, RdfMode::Normalised);
        assert_eq!(config.analysis.rdf_delta, 0.05);
        assert_eq!(config.analysis.voronoi_mode, VoronoiMode::Both);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bidisperse_parameter_line() {
        let input = SAMPLE.replace("mono\n0.5", "bi\n0.5 1.4 0.5");
        let config = HdmcConfig::parse(&input).unwrap();
        assert_eq!(
            config.particles.dispersity,
            Dispersity::Bi {
                radius: 0.5,
                ratio: 1.4,
                fraction: 0.5
            }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_dispersity_tag_rejected() {
        let input = SAMPLE.replace("mono", "tetra");
        let err = HdmcConfig::parse(&input).unwrap_err();
        assert!(err.to_string().contains("dispersity"));
    }

    #[test]
    fn test_nonadditive_rejected_at_validation() {
        let input = SAMPLE.replace("\nadd\n", "\nnonadd\n");
        let config = HdmcConfig::parse(&input).unwrap();
        assert_eq!(config.particles.interaction, Interaction::NonAdditive);
        let err = config.validate().unwrap_err();
        assert!(err.contains("not implemented"));
    }

    #[test]
    fn test_unparseable_value_names_the_field() {
        let input = SAMPLE.replace("1000", "many");
        let err = HdmcConfig::parse(&input).unwrap_err();
        assert!(err.to_string().contains("equilibration cycles"));
    }

    #[test]
    fn test_truncated_input_rejected() {
        let truncated: String = SAMPLE.lines().take(10).collect::<Vec<_>>().join("\n");
        assert!(HdmcConfig::parse(&truncated).is_err());
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let mut config = HdmcConfig::parse(SAMPLE).unwrap();
        config.particles.packing_fraction = 1.2;
        assert!(config.validate().is_err());

        let mut config = HdmcConfig::parse(SAMPLE).unwrap();
        config.simulation.swap_prob = -0.1;
        assert!(config.validate().is_err());

        let mut config = HdmcConfig::parse(SAMPLE).unwrap();
        config.analysis.rdf_delta = 0.0;
        assert!(config.validate().is_err());
    }
}
