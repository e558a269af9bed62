//! Phase 2: the dense signed adjacency matrix. `A[i][j]` is the influence
//! of node `j` on node `i`; contributions are additive and commutative at
//! construction time, so rule order cannot change the result.

use super::{GraphEngine, Symbol};
use crate::tables::{relations, Element};
use tracing::trace;

/// Participants in a stem transformation push and pull through their new
/// element, but at reduced weight.
const TRANSFORM_EDGE_DAMPING: f64 = 0.7;

impl<'a> GraphEngine<'a> {
    pub(crate) fn build_adjacency(&mut self) {
        let n = self.nodes.len();
        let flow = &self.config().flow;
        let inter = &self.config().interactions;

        // Symmetric relation bonuses, accumulated pair-wise first.
        let mut relation = vec![vec![0.0f64; n]; n];
        let add_pair = |m: &mut Vec<Vec<f64>>, a: usize, b: usize, w: f64| {
            m[a][b] += w;
            m[b][a] += w;
        };

        for (i, j, _) in &self.relations.stem_transformations {
            add_pair(&mut relation, *i, *j, 1.5 * flow.combination_bonus);
        }
        for (i, j, _) in &self.relations.six_combinations {
            add_pair(&mut relation, *i, *j, inter.six_harmony / 10.0);
        }
        for (members, _) in &self.relations.trines_full {
            add_pair(&mut relation, members[0], members[1], inter.trine_full / 10.0);
            add_pair(&mut relation, members[1], members[2], inter.trine_full / 10.0);
            add_pair(&mut relation, members[0], members[2], inter.trine_full / 10.0);
        }
        for (i, j, _) in &self.relations.trines_partial {
            add_pair(&mut relation, *i, *j, inter.trine_partial / 10.0);
        }
        for (i, j) in &self.relations.clashes {
            // clash_score is negative in the config convention.
            add_pair(&mut relation, *i, *j, inter.clash_score / 10.0 * flow.clash_damping);
        }
        for (i, j) in self
            .relations
            .punishments
            .iter()
            .chain(&self.relations.self_punishments)
        {
            add_pair(&mut relation, *i, *j, -inter.punishment_penalty / 10.0);
        }
        for (i, j) in &self.relations.harms {
            add_pair(&mut relation, *i, *j, -inter.harm_penalty / 10.0);
        }

        let mut a = vec![vec![0.0f64; n]; n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue; // never self-loops
                }
                let (el_i, damp_i) = self.effective_element(i);
                let (el_j, damp_j) = self.effective_element(j);
                let elemental_damp = damp_i.min(damp_j);

                let mut w = relation[i][j];
                if el_j.generates() == el_i {
                    w += 0.6 * flow.generation_efficiency * elemental_damp;
                }
                if el_j.controls() == el_i {
                    let ctl = -(0.3 * flow.control_impact.abs()) * elemental_damp;
                    w += self.mediated_control(i, j, el_i, el_j, ctl);
                }

                // Life-stage pre-multiplication on stem/branch edges.
                let stage = match (self.nodes[i].symbol, self.nodes[j].symbol) {
                    (Symbol::Stem(s), Symbol::Branch(b))
                    | (Symbol::Branch(b), Symbol::Stem(s)) => {
                        relations::life_stage(s, b).coefficient
                    }
                    _ => 1.0,
                };

                let d = self.nodes[i].position.distance(self.nodes[j].position);
                let decay = flow.spatial_decay[d.min(3)];

                a[i][j] = w * stage * decay;
            }
        }

        trace!(n, "adjacency built");
        self.adjacency = a;
    }

    /// Element a node acts through: its own, or the transformation target
    /// at reduced weight if it joined a stem combination.
    fn effective_element(&self, idx: usize) -> (Element, f64) {
        match self.relations.transformed_element(idx) {
            Some(el) => (el, TRANSFORM_EDGE_DAMPING),
            None => (self.nodes[idx].element(), 1.0),
        }
    }

    /// Mediation conduit. Where j controls i, a third node carrying the
    /// canonical mediator (generated by j, generating i) can turn the
    /// attack into flow, if it holds enough energy relative to the
    /// attacker.
    fn mediated_control(&self, i: usize, j: usize, _el_i: Element, el_j: Element, ctl: f64) -> f64 {
        let mediator = el_j.generates();
        let attacker_energy = self.nodes[j].initial_energy.mean.abs();
        if attacker_energy <= f64::EPSILON {
            return ctl;
        }
        let mediator_energy = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(k, node)| *k != i && *k != j && node.element() == mediator)
            .map(|(_, node)| node.initial_energy.mean)
            .fold(0.0f64, f64::max);
        if mediator_energy <= 0.0 {
            return ctl;
        }
        let ratio = mediator_energy / attacker_energy;
        if ratio >= 0.8 {
            // Full transformation: the conduit carries the controller's
            // push as generation.
            0.6 * self.config().flow.generation_efficiency
        } else {
            ctl * (1.0 - ratio / 0.8)
        }
    }
}
