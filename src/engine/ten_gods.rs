//! Ten-god projection: every node's energy lands in exactly one of the ten
//! categories relative to the day-master; the five composites drive the
//! domain scores.

use super::{GraphEngine, TenGodSummary};
use crate::prob::ProbValue;
use crate::tables::{TenGod, TenGodGroup};

#[derive(Debug, Clone)]
pub struct TenGodProjection {
    pub per_god: [ProbValue; 10],
    pub composites: [ProbValue; 5],
}

impl TenGodProjection {
    pub fn god(&self, god: TenGod) -> ProbValue {
        self.per_god[god.index()]
    }

    pub fn composite(&self, group: TenGodGroup) -> ProbValue {
        self.composites[group.index()]
    }

    /// Composite with the largest projected energy.
    pub fn dominant_group(&self) -> TenGodGroup {
        let mut best = TenGodGroup::Companion;
        for g in TenGodGroup::ALL {
            if self.composite(g).mean > self.composite(best).mean {
                best = g;
            }
        }
        best
    }

    pub fn total(&self) -> f64 {
        self.composites.iter().map(|p| p.mean).sum()
    }

    pub fn summary(&self) -> TenGodSummary {
        TenGodSummary {
            self_support: self.composite(TenGodGroup::Companion),
            output: self.composite(TenGodGroup::Output),
            wealth: self.composite(TenGodGroup::Wealth),
            officer: self.composite(TenGodGroup::Officer),
            resource: self.composite(TenGodGroup::Resource),
        }
    }
}

impl<'a> GraphEngine<'a> {
    /// Particle weights are applied per node, before aggregation.
    pub(crate) fn project_ten_gods(&self, energies: &[ProbValue]) -> TenGodProjection {
        let particles = &self.config().particles;
        let mut per_god = [ProbValue::zero(); 10];
        let mut composites = [ProbValue::zero(); 5];

        for (node, e) in self.nodes.iter().zip(energies) {
            let god = TenGod::of(self.day_master, node.element(), node.polarity());
            let weighted = e.scale(particles.get(god));
            per_god[god.index()] += weighted;
            composites[god.group().index()] += weighted;
        }

        TenGodProjection {
            per_god,
            composites,
        }
    }
}
