//! Distribution mode: the graph is built once, then propagation and
//! scoring re-run over perturbed initial energies. Explicit seeding keeps
//! the percentiles reproducible.

use super::GraphEngine;
use crate::error::{EngineError, EngineResult};
use crate::prob::ProbValue;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use tracing::debug;

pub const DEFAULT_SAMPLES: usize = 1000;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Percentiles {
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

impl Percentiles {
    fn from_samples(mut xs: Vec<f64>) -> Percentiles {
        // Scores were finiteness-checked upstream; ties keep input order.
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let pick = |p: f64| {
            let idx = (p / 100.0 * (xs.len() - 1) as f64).round() as usize;
            xs[idx]
        };
        Percentiles {
            p5: pick(5.0),
            p25: pick(25.0),
            p50: pick(50.0),
            p75: pick(75.0),
            p95: pick(95.0),
        }
    }

    pub fn spread(&self) -> f64 {
        self.p95 - self.p5
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DistributionSummary {
    pub seed: u64,
    pub samples: usize,
    pub strength_score: Percentiles,
    pub career: Percentiles,
    pub wealth: Percentiles,
    pub relationship: Percentiles,
}

impl<'a> GraphEngine<'a> {
    pub(crate) fn distribution(
        &self,
        seed: u64,
        samples: usize,
    ) -> EngineResult<DistributionSummary> {
        self.distribution_from(&self.initial_energies(), seed, samples)
    }

    pub(crate) fn distribution_from(
        &self,
        h0: &[ProbValue],
        seed: u64,
        samples: usize,
    ) -> EngineResult<DistributionSummary> {
        let samples = samples.max(1);
        let mut rng = ChaCha20Rng::seed_from_u64(seed);

        let mut strength_scores = Vec::with_capacity(samples);
        let mut career = Vec::with_capacity(samples);
        let mut wealth = Vec::with_capacity(samples);
        let mut relationship = Vec::with_capacity(samples);

        for _ in 0..samples {
            let perturbed = sample_energies(h0, &mut rng)?;
            let energies = self.propagate(&perturbed)?;
            let (analysis, strength) = self.score(&energies)?;
            strength_scores.push(strength.score);
            career.push(analysis.domains.career.mean);
            wealth.push(analysis.domains.wealth.mean);
            relationship.push(analysis.domains.relationship.mean);
        }

        debug!(seed, samples, "distribution sampled");
        Ok(DistributionSummary {
            seed,
            samples,
            strength_score: Percentiles::from_samples(strength_scores),
            career: Percentiles::from_samples(career),
            wealth: Percentiles::from_samples(wealth),
            relationship: Percentiles::from_samples(relationship),
        })
    }
}

/// One draw per node from its `(mean, std)`, clamped non-negative. The
/// draws collapse to constants so each run scores a concrete world.
fn sample_energies(h0: &[ProbValue], rng: &mut ChaCha20Rng) -> EngineResult<Vec<ProbValue>> {
    h0.iter()
        .map(|p| {
            let draw = if p.std > 0.0 {
                let normal =
                    Normal::new(p.mean, p.std).map_err(|_| EngineError::NonFiniteArithmetic {
                        context: "Monte-Carlo normal draw",
                        value: p.std,
                    })?;
                normal.sample(rng)
            } else {
                p.mean
            };
            Ok(ProbValue::constant(draw.max(0.0)))
        })
        .collect()
}
