//! Strength classification. Computed once, after propagation; the label is
//! authoritative and no downstream component may re-derive it from the
//! score.

use super::GraphEngine;
use crate::prob::ProbValue;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StrengthLabel {
    #[serde(rename = "Special_Strong")]
    SpecialStrong,
    Strong,
    Balanced,
    Weak,
    Follower,
}

#[derive(Debug, Clone)]
pub struct StrengthOutcome {
    pub score: f64,
    /// `score / 100`, the gate input for every non-linear activation.
    pub normalized: f64,
    pub self_team_ratio: f64,
    pub label: StrengthLabel,
    pub self_energy: f64,
    pub oppose_energy: f64,
    pub total_energy: f64,
    /// The day-master stem's own settled energy.
    pub day_master_energy: f64,
    pub unresolved_clashes: usize,
    pub instability: bool,
}

impl<'a> GraphEngine<'a> {
    pub(crate) fn classify_strength(&self, energies: &[ProbValue]) -> StrengthOutcome {
        let dm_el = self.day_master.element();
        // Self team: the day-master's element plus the one feeding it.
        let support_el = dm_el.generated_by();
        // Opposition: what it feeds, what it controls, what controls it.
        let output_el = dm_el.generates();
        let wealth_el = dm_el.controls();
        let officer_el = dm_el.controlled_by();

        let mut self_energy = 0.0;
        let mut oppose_energy = 0.0;
        let mut total_energy = 0.0;
        for (node, e) in self.nodes.iter().zip(energies) {
            let el = node.element();
            total_energy += e.mean;
            if el == dm_el || el == support_el {
                self_energy += e.mean;
            } else if el == output_el || el == wealth_el || el == officer_el {
                oppose_energy += e.mean;
            }
        }

        let contested = self_energy + oppose_energy;
        let score = if contested > 0.0 {
            100.0 * self_energy / contested
        } else {
            50.0
        };
        let self_team_ratio = if total_energy > 0.0 {
            self_energy / total_energy
        } else {
            0.0
        };
        let normalized = score / 100.0;

        let unresolved = self.relations.unresolved_clashes();
        let instability = unresolved >= 3;

        let st = &self.config().strength;
        // Short-circuit ladder; exactly one label comes out.
        let label = if score >= st.special_strong_score
            || self_team_ratio > st.special_strong_ratio
            || (score >= 75.0 && self_team_ratio > 0.60)
        {
            StrengthLabel::SpecialStrong
        } else if score <= 20.0 && oppose_energy > 4.0 * self_energy {
            StrengthLabel::Follower
        } else if score <= st.weak_threshold || normalized < 0.50 {
            StrengthLabel::Weak
        } else if score >= st.strong_threshold && !instability {
            StrengthLabel::Strong
        } else if score > st.net_force_override {
            // Net-force override: a lopsided chart stays Strong even when
            // instability blocked the ordinary rule.
            StrengthLabel::Strong
        } else {
            StrengthLabel::Balanced
        };

        let day_master_energy = energies[self.day_master_idx].mean;
        debug!(score, ratio = self_team_ratio, ?label, "strength classified");
        StrengthOutcome {
            score,
            normalized,
            self_team_ratio,
            label,
            self_energy,
            oppose_energy,
            total_energy,
            day_master_energy,
            unresolved_clashes: unresolved,
            instability,
        }
    }
}
