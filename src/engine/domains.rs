//! Career and relationship scores, driven by the composite ten-god
//! energies the same way the wealth index is. Each firing rule appends a
//! detail line.

use super::GraphEngine;
use crate::activation::{penalty_nonlinear, sigmoid_threshold, softplus_threshold, PenaltyKind};
use crate::engine::strength::StrengthOutcome;
use crate::engine::ten_gods::TenGodProjection;
use crate::prob::ProbValue;
use crate::tables::TenGodGroup;

/// Seal capacity needed to turn officer pressure into authority; the same
/// ratio the adjacency conduit uses.
const CONDUIT_RATIO: f64 = 0.8;

impl<'a> GraphEngine<'a> {
    pub(crate) fn career_score(
        &self,
        strength: &StrengthOutcome,
        projection: &TenGodProjection,
    ) -> (ProbValue, Vec<String>) {
        let nl = &self.config().nonlinear;
        let sn = strength.normalized;
        let officer = projection.composite(TenGodGroup::Officer);
        let resource = projection.composite(TenGodGroup::Resource);
        let output = projection.composite(TenGodGroup::Output);
        let wealth = projection.composite(TenGodGroup::Wealth);
        let companion = projection.composite(TenGodGroup::Companion);
        let total = projection.total().max(f64::EPSILON);

        let mut details = Vec::new();
        let mut score = 20.0 * sn - 5.0;

        if sn >= 0.5 {
            // A chart that can carry its officer turns it into rank.
            let authority = officer.mean * 1.5;
            score += authority;
            if authority > 1.0 {
                details.push(format!("career: officer carried as authority (+{authority:.1})"));
            }
        } else if resource.mean >= CONDUIT_RATIO * officer.mean && resource.mean > 0.0 {
            // Seal conduit: pressure routed through the resource.
            let routed = officer.mean * 1.2;
            score += routed;
            details.push(format!(
                "career: seal conduit converts pressure into authority (+{routed:.1})"
            ));
        } else {
            let pressure = officer.mean / total;
            let out = penalty_nonlinear(
                sn,
                PenaltyKind::SevenKill,
                pressure * 2.0,
                companion.mean / total > 0.2,
                false,
                40.0,
                nl,
            );
            score -= out.penalty;
            details.push(format!(
                "career: unmediated officer pressure (-{:.1})",
                out.penalty
            ));
        }

        // Output feeding wealth marks the builder's path.
        let chain_fraction = (output.mean + wealth.mean) / total;
        let chain = softplus_threshold(chain_fraction, 0.35, 0.1) * 40.0;
        if chain > 1.0 {
            score += chain;
            details.push(format!("career: output-wealth chain (+{chain:.1})"));
        }

        let std = (officer.variance() + resource.variance()).sqrt();
        (ProbValue::new(score.clamp(-100.0, 100.0), std), details)
    }

    pub(crate) fn relationship_score(
        &self,
        strength: &StrengthOutcome,
        projection: &TenGodProjection,
    ) -> (ProbValue, Vec<String>) {
        let partner = projection.composite(TenGodGroup::Wealth);
        let companion = projection.composite(TenGodGroup::Companion);
        let total = projection.total().max(f64::EPSILON);

        let mut details = Vec::new();
        let mut score = 10.0 + partner.mean * 1.2 + 10.0 * strength.normalized;

        // The spouse palace is the day branch, always node 5.
        let palace = 5usize;
        for (i, j, el) in &self.relations.six_combinations {
            if *i == palace || *j == palace {
                score += 15.0;
                details.push(format!(
                    "relationship: spouse palace bound in six-combination ({})",
                    el.name()
                ));
            }
        }
        for &(i, j) in &self.relations.clashes {
            if i == palace || j == palace {
                score -= 20.0;
                details.push("relationship: spouse palace clashed (-20)".to_string());
            }
        }
        for &(i, j) in &self.relations.harms {
            if i == palace || j == palace {
                score -= 10.0;
                details.push("relationship: spouse palace harmed (-10)".to_string());
            }
        }

        // Crowded companions compete for the partner star.
        let rivalry = sigmoid_threshold(companion.mean / total, 0.35, 10.0) * 30.0;
        if rivalry > 1.0 {
            score -= rivalry;
            details.push(format!("relationship: rob-wealth rivalry (-{rivalry:.1})"));
        }

        let std = (partner.variance() + companion.variance()).sqrt();
        (ProbValue::new(score.clamp(-100.0, 100.0), std), details)
    }
}
