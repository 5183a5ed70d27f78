//! Translation-delta calibration by bracket-and-bisect in log space.
//!
//! The acceptance statistic driving the search counts swap acceptances
//! alongside translations, so the calibrated delta is biased when the swap
//! probability is large. The rest of the pipeline expects exactly this
//! statistic, so it is preserved rather than split per move type.

use super::MonteCarlo;
use tracing::info;

const TRIALS: usize = 11;
const CYCLES_PER_MEASUREMENT: usize = 10;
const TOLERANCE: f64 = 0.005;
const WARM_UP_ROUNDS: usize = 100;
const MAX_ITERATIONS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStatus {
    /// Acceptance within tolerance of the target.
    Converged,
    /// Even the smallest trial delta rejects too often; delta pinned low.
    TooDense,
    /// Even the largest trial delta accepts too often; delta pinned high.
    TooDilute,
    /// Iteration cap hit; best-so-far delta kept.
    IterationLimit,
}

#[derive(Debug, Clone, Copy)]
pub struct CalibrationResult {
    pub delta: f64,
    pub acceptance: f64,
    pub status: CalibrationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BracketCode {
    Bracketed,
    TooDense,
    TooDilute,
}

/// Empirical acceptance probability over a fixed number of cycles.
fn measure(mc: &mut MonteCarlo, cycles: usize) -> f64 {
    let n = mc.configuration.n();
    let mut accepted = 0;
    for _ in 0..cycles {
        accepted += mc.cycle();
    }
    accepted as f64 / (cycles * n) as f64
}

/// One bracketing pass: probe 11 geometrically spaced deltas, tighten the
/// bracket around the target acceptance, set the kernel delta to the log
/// midpoint and measure the result. The bracket bounds are updated in place
/// so successive passes keep narrowing.
fn bracket_delta(
    mc: &mut MonteCarlo,
    target: f64,
    delta_min: &mut f64,
    delta_max: &mut f64,
) -> (BracketCode, f64) {
    let log_min = delta_min.log10();
    let log_max = delta_max.log10();
    let trial_delta: Vec<f64> = (0..TRIALS)
        .map(|i| 10f64.powf(log_min + i as f64 * (log_max - log_min) / (TRIALS - 1) as f64))
        .collect();

    let trial_prob: Vec<f64> = trial_delta
        .iter()
        .map(|&delta| {
            mc.trans_delta = delta;
            measure(mc, CYCLES_PER_MEASUREMENT)
        })
        .collect();

    let code = if trial_prob[0] < target {
        mc.trans_delta = trial_delta[0];
        BracketCode::TooDense
    } else if trial_prob[TRIALS - 1] > target {
        mc.trans_delta = trial_delta[TRIALS - 1];
        BracketCode::TooDilute
    } else {
        for i in 0..TRIALS {
            if trial_prob[i] > target {
                *delta_min = trial_delta[i];
            } else if trial_prob[i] < target {
                *delta_max = trial_delta[i];
                break;
            }
        }
        mc.trans_delta = 10f64.powf(0.5 * (delta_min.log10() + delta_max.log10()));
        BracketCode::Bracketed
    };

    let acceptance = measure(mc, CYCLES_PER_MEASUREMENT);
    (code, acceptance)
}

fn full_range(mc: &MonteCarlo) -> (f64, f64) {
    let min_radius = mc
        .configuration
        .radii
        .iter()
        .fold(f64::INFINITY, |a, &b| a.min(b));
    (0.01 * min_radius, mc.configuration.cell.half_len)
}

/// Tune the translation delta until the measured acceptance probability is
/// within 0.005 of `target`.
///
/// The bracketing pass runs 100 throwaway rounds first to shake out any
/// ordering left over from the relaxed starting configuration. A system
/// flagged too dense or too dilute on the first real pass keeps the pinned
/// extreme delta; the caller decides how loudly to warn.
pub fn calibrate(mc: &mut MonteCarlo, target: f64) -> CalibrationResult {
    info!("Disrupting any initial ordering");
    for _ in 0..WARM_UP_ROUNDS {
        let (mut lo, mut hi) = full_range(mc);
        bracket_delta(mc, target, &mut lo, &mut hi);
    }

    let (mut lo, mut hi) = full_range(mc);
    let mut iteration = 0;
    loop {
        let (code, acceptance) = bracket_delta(mc, target, &mut lo, &mut hi);
        match code {
            BracketCode::TooDense if iteration == 0 => {
                return CalibrationResult {
                    delta: mc.trans_delta,
                    acceptance,
                    status: CalibrationStatus::TooDense,
                };
            }
            BracketCode::TooDilute if iteration == 0 => {
                return CalibrationResult {
                    delta: mc.trans_delta,
                    acceptance,
                    status: CalibrationStatus::TooDilute,
                };
            }
            _ => {}
        }
        info!(
            "Delta: {:.6} acceptance: {:.6}",
            mc.trans_delta, acceptance
        );
        if (acceptance - target).abs() < TOLERANCE {
            return CalibrationResult {
                delta: mc.trans_delta,
                acceptance,
                status: CalibrationStatus::Converged,
            };
        }
        if iteration > MAX_ITERATIONS {
            return CalibrationResult {
                delta: mc.trans_delta,
                acceptance,
                status: CalibrationStatus::IterationLimit,
            };
        }
        iteration += 1;
    }
}
