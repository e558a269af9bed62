//! Phase 3: damped propagation. A fixed number of iterations; convergence
//! is not required and not checked.

use super::GraphEngine;
use crate::error::EngineResult;
use crate::prob::ProbValue;
use tracing::trace;

impl<'a> GraphEngine<'a> {
    /// `H[t+1] = damping * A * H[t] + (1 - damping) * H[0]`, clamped
    /// non-negative and decayed by the global entropy each step. Means ride
    /// the matrix-vector product; variances propagate through the squared
    /// coefficients.
    pub(crate) fn propagate(&self, h0: &[ProbValue]) -> EngineResult<Vec<ProbValue>> {
        let flow = &self.config().flow;
        let n = h0.len();
        let keep = 1.0 - flow.damping;
        let decay = 1.0 - flow.global_entropy;

        let mut h = h0.to_vec();
        for t in 0..flow.propagation_iterations {
            let mut next = Vec::with_capacity(n);
            for i in 0..n {
                let mut mean = 0.0;
                let mut var = 0.0;
                for j in 0..n {
                    let a = self.adjacency[i][j];
                    mean += a * h[j].mean;
                    var += a * a * h[j].variance();
                }
                let m = flow.damping * mean + keep * h0[i].mean;
                let v = flow.damping * flow.damping * var + keep * keep * h0[i].variance();
                let value = ProbValue::new(m, v.sqrt())
                    .max_mean(0.0)
                    .scale(decay);
                next.push(value);
            }
            h = next;
            trace!(
                step = t,
                total = h.iter().map(|p| p.mean).sum::<f64>(),
                "propagation step"
            );
        }

        for v in &h {
            ProbValue::checked(v.mean, v.std)?;
        }
        Ok(h)
    }
}
