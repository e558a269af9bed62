//! Phase 1: node initialisation. Builds the 8 original nodes (plus up to 4
//! dynamic ones), scans the chart for structural relations, and assigns
//! each node its initial energy with an uncertainty band.

use super::{GraphEngine, Node, Pillar, PillarPosition, Symbol};
use crate::error::EngineResult;
use crate::prob::ProbValue;
use crate::tables::{relations, tables, Element};
use tracing::debug;

/// Everything phase 2 and the scorers need to know about the chart's
/// structure, expressed as node-index pairs.
#[derive(Debug, Default)]
pub struct DetectedRelations {
    pub six_combinations: Vec<(usize, usize, Element)>,
    pub trines_full: Vec<([usize; 3], Element)>,
    pub trines_partial: Vec<(usize, usize, Element)>,
    pub clashes: Vec<(usize, usize)>,
    pub punishments: Vec<(usize, usize)>,
    pub self_punishments: Vec<(usize, usize)>,
    pub harms: Vec<(usize, usize)>,
    /// Stem five-combinations; participants are retargeted to the
    /// transformed element during adjacency construction.
    pub stem_transformations: Vec<(usize, usize, Element)>,
}

impl DetectedRelations {
    pub fn transformed_element(&self, idx: usize) -> Option<Element> {
        self.stem_transformations
            .iter()
            .find(|(a, b, _)| *a == idx || *b == idx)
            .map(|(_, _, e)| *e)
    }

    /// Trine participation of a node: 1.0 in a full frame, 0.5 in a
    /// partial one.
    pub fn trine_participation(&self, idx: usize) -> Option<f64> {
        if self.trines_full.iter().any(|(m, _)| m.contains(&idx)) {
            return Some(1.0);
        }
        if self
            .trines_partial
            .iter()
            .any(|(a, b, _)| *a == idx || *b == idx)
        {
            return Some(0.5);
        }
        None
    }

    /// A clash counts as resolved when either endpoint is bound into a
    /// six-combination or a full harmony frame.
    pub fn unresolved_clashes(&self) -> usize {
        self.clashes
            .iter()
            .filter(|(a, b)| !self.is_bound(*a) && !self.is_bound(*b))
            .count()
    }

    fn is_bound(&self, idx: usize) -> bool {
        self.six_combinations
            .iter()
            .any(|(a, b, _)| *a == idx || *b == idx)
            || self.trines_full.iter().any(|(m, _)| m.contains(&idx))
    }

    fn instability_events(&self) -> usize {
        self.clashes.len() + self.self_punishments.len()
    }
}

impl<'a> GraphEngine<'a> {
    pub(crate) fn initialize_nodes(&mut self) -> EngineResult<()> {
        let positions = [
            PillarPosition::Year,
            PillarPosition::Month,
            PillarPosition::Day,
            PillarPosition::Hour,
        ];
        let mut layout: Vec<(PillarPosition, Pillar)> = self
            .input()
            .pillars
            .iter()
            .zip(positions)
            .map(|(p, pos)| (pos, *p))
            .collect();
        if let Some(luck) = self.input().luck {
            layout.push((PillarPosition::Luck, luck));
        }
        if let Some(annual) = self.input().annual {
            layout.push((PillarPosition::Annual, annual));
        }

        let mut nodes = Vec::with_capacity(layout.len() * 2);
        for (pos, pillar) in &layout {
            nodes.push(Node {
                position: *pos,
                symbol: Symbol::Stem(pillar.stem),
                initial_energy: ProbValue::zero(),
                current_energy: ProbValue::zero(),
            });
            nodes.push(Node {
                position: *pos,
                symbol: Symbol::Branch(pillar.branch),
                initial_energy: ProbValue::zero(),
                current_energy: ProbValue::zero(),
            });
        }

        let detected = self.detect_relations(&nodes);
        let uncertainty =
            (0.02 + 0.02 * detected.instability_events() as f64).min(0.15);

        // Rooting scans the branch layout, so energies are computed against
        // the immutable symbol list rather than the node vec being filled.
        let symbols: Vec<(PillarPosition, Symbol)> =
            nodes.iter().map(|n| (n.position, n.symbol)).collect();
        for node in &mut nodes {
            let e = self.raw_energy_for(node.position, node.symbol, &symbols);
            node.initial_energy = ProbValue::checked(e, e * uncertainty)?;
            node.current_energy = node.initial_energy;
        }

        debug!(
            nodes = nodes.len(),
            uncertainty, "nodes initialised"
        );
        self.nodes = nodes;
        self.relations = detected;
        Ok(())
    }

    fn raw_energy_for(
        &self,
        pos: PillarPosition,
        symbol: Symbol,
        symbols: &[(PillarPosition, Symbol)],
    ) -> f64 {
        let s = &self.config().structure;
        let p = &self.config().physics;
        let mut e = match symbol {
            Symbol::Stem(stem) => {
                // Exposed symbols project more than hidden ones.
                let mut e = s.base_unit * pos.weight(self.config()) * s.exposed_boost;

                // Rooting: the strongest qualifying branch carries the root.
                let mut best: Option<f64> = None;
                for (bpos, bsym) in symbols {
                    let Symbol::Branch(branch) = *bsym else { continue };
                    let rooted = branch
                        .hidden_stems()
                        .iter()
                        .any(|h| h.stem.element() == stem.element());
                    if !rooted {
                        continue;
                    }
                    let base_factor = if *bpos == pos {
                        s.same_pillar_bonus
                    } else {
                        1.0 + (s.rooting_weight - 1.0) * 0.5
                    };
                    let factor = base_factor * relations::life_stage(stem, branch).coefficient;
                    best = Some(best.map_or(factor, |b: f64| b.max(factor)));
                }
                if let Some(f) = best {
                    e *= f;
                }
                e
            }
            Symbol::Branch(branch) => {
                let w = pos.weight(self.config());
                if pos == PillarPosition::Month {
                    // The month commander's primary element rides the
                    // seasonal weight; the stored remainder keeps the
                    // pillar weight.
                    let stored = branch.stored_fraction();
                    let primary = 1.0 - stored;
                    s.base_unit * (primary * p.month_weight + stored * w)
                } else {
                    let hidden_total: f64 =
                        branch.hidden_stems().iter().map(|h| h.weight).sum();
                    s.base_unit * hidden_total * w
                }
            }
        };

        let element = match symbol {
            Symbol::Stem(st) => st.element(),
            Symbol::Branch(b) => b.element(),
        };
        if let Some(geo) = &self.input().geo_modifiers {
            e *= geo.get(element);
        }
        if let Some(era) = &self.input().era {
            if era.element == element {
                e *= 1.0 + era.bonus;
            } else if era.element.controls() == element {
                e *= 1.0 - era.penalty;
            }
        }
        e
    }

    fn detect_relations(&mut self, nodes: &[Node]) -> DetectedRelations {
        let mut d = DetectedRelations::default();
        let combine_dynamic = self.config().flow.dynamic_nodes_form_combinations;
        let mut matches = Vec::new();

        // Stem five-combinations; each stem transforms at most once.
        let mut used = vec![false; nodes.len()];
        for i in 0..nodes.len() {
            let Some(a) = nodes[i].stem() else { continue };
            for j in (i + 1)..nodes.len() {
                let Some(b) = nodes[j].stem() else { continue };
                if used[i] || used[j] {
                    continue;
                }
                if !combine_dynamic
                    && (nodes[i].position.is_dynamic() || nodes[j].position.is_dynamic())
                {
                    continue;
                }
                if let Some(el) = relations::stem_combination(a, b) {
                    used[i] = true;
                    used[j] = true;
                    d.stem_transformations.push((i, j, el));
                    matches.push(format!(
                        "StemCombination: {}+{} ({})",
                        a.name(),
                        b.name(),
                        el.name()
                    ));
                }
            }
        }

        // Pairwise branch relations.
        for i in 0..nodes.len() {
            let Some(a) = nodes[i].branch() else { continue };
            for j in (i + 1)..nodes.len() {
                let Some(b) = nodes[j].branch() else { continue };
                let dynamic_pair =
                    nodes[i].position.is_dynamic() || nodes[j].position.is_dynamic();
                if combine_dynamic || !dynamic_pair {
                    if let Some(el) = relations::six_combination(a, b) {
                        d.six_combinations.push((i, j, el));
                        matches.push(format!(
                            "SixCombination: {}+{} ({})",
                            a.name(),
                            b.name(),
                            el.name()
                        ));
                    }
                }
                if relations::is_clash(a, b) {
                    d.clashes.push((i, j));
                    matches.push(format!("Clash: {}-{}", a.name(), b.name()));
                }
                if a == b && relations::is_self_punishment(a) {
                    d.self_punishments.push((i, j));
                    matches.push(format!("SelfPunishment: {}-{}", a.name(), b.name()));
                } else if relations::is_punishment(a, b) {
                    d.punishments.push((i, j));
                    matches.push(format!("Punishment: {}-{}", a.name(), b.name()));
                }
                if relations::is_harm(a, b) {
                    d.harms.push((i, j));
                    matches.push(format!("Harm: {}-{}", a.name(), b.name()));
                }
            }
        }

        // Harmony frames: full when all three members are present, partial
        // on two of three.
        for rule in &tables().three_harmonies {
            let mut members: Vec<Option<usize>> = vec![None; 3];
            for (idx, node) in nodes.iter().enumerate() {
                let Some(b) = node.branch() else { continue };
                if !combine_dynamic && node.position.is_dynamic() {
                    continue;
                }
                for (slot, m) in rule.triple.iter().enumerate() {
                    if b.index() == *m as usize && members[slot].is_none() {
                        members[slot] = Some(idx);
                    }
                }
            }
            let present: Vec<usize> = members.iter().flatten().copied().collect();
            match present.len() {
                3 => {
                    d.trines_full
                        .push(([present[0], present[1], present[2]], rule.element));
                    matches.push(format!(
                        "ThreeHarmony: {} ({})",
                        trine_label(nodes, &present),
                        rule.element.name()
                    ));
                }
                2 => {
                    d.trines_partial
                        .push((present[0], present[1], rule.element));
                    matches.push(format!(
                        "PartialHarmony: {} ({})",
                        trine_label(nodes, &present),
                        rule.element.name()
                    ));
                }
                _ => {}
            }
        }

        self.detected_matches = matches;
        d
    }
}

fn trine_label(nodes: &[Node], members: &[usize]) -> String {
    members
        .iter()
        .map(|&i| nodes[i].name())
        .collect::<Vec<_>>()
        .join("-")
}
