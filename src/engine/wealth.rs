//! Wealth index. The most non-linear scorer: vault open/collapse,
//! clash-of-month-commander, officer pressure and seal mediation all meet
//! here. Every rule that fires appends one human-readable detail line.

use super::GraphEngine;
use crate::activation::{
    penalty_nonlinear, sigmoid_threshold, vault_energy_nonlinear, PenaltyKind, VaultTrigger,
};
use crate::engine::strength::StrengthOutcome;
use crate::engine::ten_gods::TenGodProjection;
use crate::prob::ProbValue;
use crate::tables::{relations, Element};

/// Collapse losses dwarf what an open store yields; a broken tomb drains
/// an order of magnitude more than its charge.
const COLLAPSE_SCALE: f64 = 50.0;

/// Base magnitude of an unmediated seven-killings strike.
const SEVEN_KILL_BASE: f64 = 60.0;

impl<'a> GraphEngine<'a> {
    pub(crate) fn wealth_index(
        &self,
        energies: &[ProbValue],
        strength: &StrengthOutcome,
        projection: &TenGodProjection,
    ) -> (ProbValue, Vec<String>) {
        let cfg = self.config();
        let v = &cfg.vault;
        let nl = &cfg.nonlinear;
        let s = &cfg.structure;
        let inter = &cfg.interactions;

        let dm_el = self.day_master.element();
        let resource_el = dm_el.generated_by();
        let officer_el = dm_el.controlled_by();
        let sn = strength.normalized;
        let weak = sn < 0.5;

        let mut details = Vec::new();

        // Base line from the strength stage.
        let mut wealth_energy = if sn < 0.45 {
            let base = -10.0 - (1.0 - sn) * 10.0;
            details.push(format!("base line (weak chart): {base:.1}"));
            base
        } else {
            let base = sn * 15.0;
            details.push(format!("base line: {base:.1}"));
            base
        };

        // Leg-cutting applies before anything that could offset it.
        if let Some(annual) = self.input().annual {
            if annual.stem.element().controls() == annual.branch.element() {
                let p = if sn < 0.3 {
                    80.0
                } else if sn < 0.5 {
                    60.0
                } else {
                    20.0
                };
                wealth_energy -= p;
                details.push(format!(
                    "leg-cutting: annual stem {} severs its own branch {} (-{p:.0})",
                    annual.stem.name(),
                    annual.branch.name()
                ));
            }
        }

        let dynamic = self.dynamic_symbol_elements();
        let has_resource_help = dynamic.iter().any(|&e| e == resource_el);
        let has_peer_help = dynamic.iter().any(|&e| e == dm_el);

        // Favourable resource help from the moving pillars.
        let help_hits = dynamic.iter().filter(|&&e| e == resource_el).count();
        if help_hits > 0 {
            let per = if weak { 25.0 } else { 15.0 };
            wealth_energy += per * help_hits as f64;
            details.push(format!(
                "resource help from moving pillars: {help_hits} hit(s) at +{per:.0}"
            ));
            if projection.dominant_group() == crate::tables::TenGodGroup::Resource {
                wealth_energy += 30.0;
                details.push("seal privilege: resource dominates the chart (+30)".to_string());
            }
        }

        // Officer arriving with resource transforms pressure into rank.
        if self.annual_carries_officer(officer_el) && self.luck_carries_resource(resource_el) {
            let b = if weak { 80.0 } else { 60.0 };
            wealth_energy += b;
            details.push(format!(
                "officer-resource transformation: annual officer with luck seal (+{b:.0})"
            ));
        }

        // Vault logic over every Earth store in the graph.
        let mut cancelled: Vec<(usize, usize)> = Vec::new();
        let mut any_collapse = false;
        let mut boundary_cases = 0usize;
        for (k, node) in self.nodes.iter().enumerate() {
            let Some(branch) = node.branch() else { continue };
            if !branch.is_vault() {
                continue;
            }
            let e_in = energies[k].mean * branch.stored_fraction();
            if (e_in - v.threshold).abs() < 0.5 {
                boundary_cases += 1;
            }
            let charged = e_in >= v.threshold;

            let trigger = self.vault_trigger(k);
            let Some((trig, partner)) = trigger else {
                if charged {
                    // Sealed vault: its promise is damped, not released.
                    let gate = sigmoid_threshold(sn, nl.threshold, nl.steepness);
                    let contrib = s.base_unit * v.open_bonus * e_in * v.sealed_damping * gate;
                    wealth_energy += contrib;
                    details.push(format!(
                        "{} vault sealed: damped contribution +{contrib:.1}",
                        branch.name()
                    ));
                }
                continue;
            };

            let trine = self.relations.trine_participation(k);
            let clash_intensity = (inter.clash_score.abs() / 10.0) * cfg.flow.clash_damping;
            let open_base = s.base_unit * v.open_bonus * e_in * v.k_open;
            let deficit = (v.threshold - e_in).max(0.0) / v.threshold;
            let collapse_base =
                s.base_unit * COLLAPSE_SCALE * v.break_penalty * v.k_collapse * (1.0 + deficit);

            let out = vault_energy_nonlinear(
                sn,
                charged,
                trig,
                clash_intensity,
                trine.is_some(),
                trine.unwrap_or(0.0),
                open_base,
                collapse_base,
                nl,
            );
            wealth_energy += out.energy;
            for d in out.details {
                details.push(format!("{} {d}", branch.name()));
            }

            if charged && trig == VaultTrigger::Clash {
                cancelled.push((k, partner));
            } else if !charged {
                any_collapse = true;
            }
        }

        // Earth-vs-earth clash penalties, minus the ones an open vault
        // cancelled.
        for &(i, j) in &self.relations.clashes {
            let earthly = self.nodes[i].element() == Element::Earth
                && self.nodes[j].element() == Element::Earth;
            if !earthly {
                continue;
            }
            let was_cancelled = cancelled
                .iter()
                .any(|&(a, b)| (a == i && b == j) || (a == j && b == i));
            if was_cancelled {
                details.push(format!(
                    "earth clash penalty cancelled by open vault ({}-{})",
                    self.nodes[i].name(),
                    self.nodes[j].name()
                ));
            } else {
                wealth_energy += inter.clash_score;
                details.push(format!(
                    "earth clash penalty ({}-{}): {:.0}",
                    self.nodes[i].name(),
                    self.nodes[j].name(),
                    inter.clash_score
                ));
            }
        }

        // Clash of the month commander.
        if let Some(annual) = self.input().annual {
            let month_branch = self.input().pillars[1].branch;
            if relations::is_clash(annual.branch, month_branch) {
                if has_peer_help || has_resource_help {
                    let mag = wealth_energy.abs();
                    let p = if mag < 30.0 {
                        15.0
                    } else if mag < 60.0 {
                        20.0
                    } else {
                        30.0
                    };
                    wealth_energy -= p;
                    let via = if has_resource_help { "seal mediation" } else { "peer help" };
                    details.push(format!(
                        "month-commander clash ({}-{}) softened by {via}: -{p:.0}",
                        annual.branch.name(),
                        month_branch.name()
                    ));
                } else {
                    let p = if any_collapse { 150.0 } else { 120.0 };
                    wealth_energy -= p;
                    details.push(format!(
                        "month-commander clash ({}-{}) unmediated: -{p:.0}",
                        annual.branch.name(),
                        month_branch.name()
                    ));
                }
            }
        }

        // Seven-killings strike without seal or peers.
        let attackers = dynamic.iter().filter(|&&e| e == officer_el).count();
        if attackers > 0 && !has_resource_help && !has_peer_help {
            let out = penalty_nonlinear(
                sn,
                PenaltyKind::SevenKill,
                attackers as f64 * 0.8,
                false,
                false,
                SEVEN_KILL_BASE,
                nl,
            );
            wealth_energy -= out.penalty;
            details.extend(out.details);
        }

        // A weak chart buried under wealth cannot hold it.
        let wealth_el = dm_el.controls();
        let wealth_fraction = if strength.total_energy > 0.0 {
            self.nodes
                .iter()
                .zip(energies)
                .filter(|(n, _)| n.element() == wealth_el)
                .map(|(_, e)| e.mean)
                .sum::<f64>()
                / strength.total_energy
        } else {
            0.0
        };
        if sn < 0.30 && wealth_fraction > 0.55 && !has_resource_help {
            wealth_energy = -wealth_energy;
            details.push(
                "weak chart under heavy wealth: holdings invert into debt".to_string(),
            );
        }

        let score = wealth_energy.clamp(-100.0, 100.0);
        let std = 2.0 * strength.unresolved_clashes as f64 + 3.0 * boundary_cases as f64;
        (ProbValue::new(score, std), details)
    }

    /// Elements carried by the moving (luck/annual) pillars: stems and
    /// branch primaries.
    fn dynamic_symbol_elements(&self) -> Vec<Element> {
        let mut out = Vec::new();
        for pillar in [self.input().luck, self.input().annual].into_iter().flatten() {
            out.push(pillar.stem.element());
            out.push(pillar.branch.element());
        }
        out
    }

    fn annual_carries_officer(&self, officer_el: Element) -> bool {
        let Some(annual) = self.input().annual else {
            return false;
        };
        if annual.stem.element() == officer_el {
            return true;
        }
        annual.branch.is_vault()
            && annual
                .branch
                .hidden_stems()
                .iter()
                .any(|h| h.stem.element() == officer_el)
    }

    fn luck_carries_resource(&self, resource_el: Element) -> bool {
        let Some(luck) = self.input().luck else {
            return false;
        };
        luck.stem.element() == resource_el || luck.branch.element() == resource_el
    }

    /// What, if anything, hits this vault: a clash always counts, a
    /// punishment only when the config permits it to open stores.
    fn vault_trigger(&self, k: usize) -> Option<(VaultTrigger, usize)> {
        for &(i, j) in &self.relations.clashes {
            if i == k {
                return Some((VaultTrigger::Clash, j));
            }
            if j == k {
                return Some((VaultTrigger::Clash, i));
            }
        }
        if self.config().vault.punishment_opens {
            for &(i, j) in self
                .relations
                .punishments
                .iter()
                .chain(&self.relations.self_punishments)
            {
                if i == k {
                    return Some((VaultTrigger::Punishment, j));
                }
                if j == k {
                    return Some((VaultTrigger::Punishment, i));
                }
            }
        }
        None
    }
}
