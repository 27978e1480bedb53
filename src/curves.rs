//! Synthetic chart series for the presentation layer.

use rand::Rng;
use rand_distr::{Distribution, Exp, Normal};

const BASELINE_LAST_CYCLE: u32 = 15;
const EXPONENTIAL_LAST_CYCLE: u32 = 25;

/// Three-phase real-time PCR amplification curve: linear baseline up to
/// cycle 15, exponential growth up to cycle 25, then a drifting plateau.
/// Each point carries its own Gaussian noise.
pub fn amplification_curve(cycles: u32, rng: &mut impl Rng) -> Vec<(u32, f64)> {
    let baseline_noise = Normal::new(0.0, 0.05).expect("fixed noise parameters");
    let exponential_noise = Normal::new(0.0, 0.1).expect("fixed noise parameters");
    let plateau_noise = Normal::new(0.0, 0.2).expect("fixed noise parameters");

    (0..=cycles)
        .map(|cycle| {
            let fluorescence = if cycle <= BASELINE_LAST_CYCLE {
                1.0 + 0.1 * cycle as f64 + baseline_noise.sample(rng)
            } else if cycle <= EXPONENTIAL_LAST_CYCLE {
                1.0 + 2f64.powf((cycle - BASELINE_LAST_CYCLE) as f64 / 3.0)
                    + exponential_noise.sample(rng)
            } else {
                50.0 + (cycle - EXPONENTIAL_LAST_CYCLE) as f64 * 0.5 + plateau_noise.sample(rng)
            };
            (cycle, fluorescence)
        })
        .collect()
}

/// Transformant overnight growth curve over 16 hours, saturating at the
/// sampled colony count.
pub fn colony_growth_curve(colonies: f64, points: usize) -> Vec<(f64, f64)> {
    if points == 0 {
        return vec![];
    }
    let last = (points - 1).max(1) as f64;
    (0..points)
        .map(|i| {
            let t = 16.0 * i as f64 / last;
            (t, colonies * (1.0 - (-0.3 * t).exp()))
        })
        .collect()
}

/// Gauge value (0-100) for the gel dissolution progress display.
pub fn gel_dissolution_progress(cursor: usize, step_count: usize) -> f64 {
    if step_count == 0 {
        return 0.0;
    }
    (cursor as f64 / step_count as f64).min(1.0) * 100.0
}

/// Exponential expression levels for the results-analysis view.
pub fn expression_levels(genes: usize, scale: f64, rng: &mut impl Rng) -> Vec<f64> {
    let exp = Exp::new(1.0 / scale).expect("positive expression scale");
    (0..genes).map(|_| exp.sample(rng)).collect()
}
