//! Synthetic outcome sampling for completed procedures.

use rand::Rng;
use rand_distr::{Distribution, Exp, Normal, Poisson};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed distribution family and parameters for one declared metric.
/// Families and parameters come from the procedure catalog and are not
/// configurable at call time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum SampleDistribution {
    Normal { mean: f64, std_dev: f64 },
    Poisson { lambda: f64 },
    Exponential { scale: f64 },
}

impl SampleDistribution {
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Normal { mean, std_dev } => {
                mean.is_finite() && std_dev.is_finite() && *std_dev > 0.0
            }
            Self::Poisson { lambda } => lambda.is_finite() && *lambda > 0.0,
            Self::Exponential { scale } => scale.is_finite() && *scale > 0.0,
        }
    }

    pub fn mean(&self) -> f64 {
        match self {
            Self::Normal { mean, .. } => *mean,
            Self::Poisson { lambda } => *lambda,
            Self::Exponential { scale } => *scale,
        }
    }

    pub fn draw(&self, rng: &mut impl Rng) -> f64 {
        match self {
            Self::Normal { mean, std_dev } => Normal::new(*mean, *std_dev)
                .expect("normal parameters validated at catalog load")
                .sample(rng),
            Self::Poisson { lambda } => Poisson::new(*lambda)
                .expect("poisson rate validated at catalog load")
                .sample(rng),
            Self::Exponential { scale } => Exp::new(1.0 / *scale)
                .expect("exponential scale validated at catalog load")
                .sample(rng),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub name: String,
    #[serde(default)]
    pub unit: String,
    pub distribution: SampleDistribution,
}

/// Draws one independent value per declared metric. Every declared name is
/// present in the result.
pub fn sample_metrics(specs: &[MetricSpec], rng: &mut impl Rng) -> BTreeMap<String, f64> {
    specs
        .iter()
        .map(|spec| (spec.name.clone(), spec.distribution.draw(rng)))
        .collect()
}
