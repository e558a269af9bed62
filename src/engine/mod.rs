//! The graph network engine: a four-pillar chart becomes a small
//! heterogeneous graph whose nodes carry five-element energies. Energies
//! are initialised from the domain tables, pushed through a signed
//! adjacency matrix by damped propagation, then projected onto ten-god
//! categories and domain scores.
//!
//! One engine instance per call; nothing is shared and nothing persists.

pub mod adjacency;
pub mod domains;
pub mod montecarlo;
pub mod nodes;
pub mod propagation;
pub mod strength;
pub mod ten_gods;
pub mod wealth;

#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::error::{EngineError, EngineResult};
use crate::prob::ProbValue;
use crate::tables::{Branch, Element, Polarity, Stem};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use montecarlo::{DistributionSummary, Percentiles};
pub use strength::{StrengthLabel, StrengthOutcome};
pub use ten_gods::TenGodProjection;

// === INPUT CONTRACT ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pillar {
    pub stem: Stem,
    pub branch: Branch,
}

/// Per-element multipliers from the birth location.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoModifiers {
    pub wood: f64,
    pub fire: f64,
    pub earth: f64,
    pub metal: f64,
    pub water: f64,
}

impl GeoModifiers {
    pub fn get(&self, element: Element) -> f64 {
        match element {
            Element::Wood => self.wood,
            Element::Fire => self.fire,
            Element::Earth => self.earth,
            Element::Metal => self.metal,
            Element::Water => self.water,
        }
    }
}

/// Era (calendar-cycle) modifier: one element gains, the element it
/// controls is penalised.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EraModifier {
    pub element: Element,
    pub bonus: f64,
    pub penalty: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisInput {
    /// Year, month, day, hour.
    pub pillars: [Pillar; 4],
    pub day_master: Stem,
    #[serde(default)]
    pub luck: Option<Pillar>,
    #[serde(default)]
    pub annual: Option<Pillar>,
    #[serde(default)]
    pub geo_modifiers: Option<GeoModifiers>,
    #[serde(default)]
    pub era: Option<EraModifier>,
    /// Whether solar-time correction was already applied during pillar
    /// derivation. Informational only; the pillars arrive resolved.
    #[serde(default)]
    pub solar_time_applied: bool,
}

// === GRAPH NODES ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PillarPosition {
    Year,
    Month,
    Day,
    Hour,
    Luck,
    Annual,
}

impl PillarPosition {
    /// Original pillar index; dynamic pillars have none.
    pub fn index(self) -> Option<usize> {
        match self {
            PillarPosition::Year => Some(0),
            PillarPosition::Month => Some(1),
            PillarPosition::Day => Some(2),
            PillarPosition::Hour => Some(3),
            PillarPosition::Luck | PillarPosition::Annual => None,
        }
    }

    pub fn weight(self, cfg: &Config) -> f64 {
        let w = &cfg.physics.pillar_weights;
        match self {
            PillarPosition::Year => w.year,
            PillarPosition::Month => w.month,
            PillarPosition::Day => w.day,
            PillarPosition::Hour => w.hour,
            PillarPosition::Luck | PillarPosition::Annual => 1.0,
        }
    }

    pub fn is_dynamic(self) -> bool {
        self.index().is_none()
    }

    /// Spatial distance between two positions. Dynamic pillars sit at
    /// distance 1 from the day pillar and 2 from everything else.
    pub fn distance(self, other: PillarPosition) -> usize {
        match (self.index(), other.index()) {
            (Some(a), Some(b)) => a.abs_diff(b),
            (None, Some(b)) | (Some(b), None) => {
                if b == 2 {
                    1
                } else {
                    2
                }
            }
            (None, None) => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Stem(Stem),
    Branch(Branch),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub position: PillarPosition,
    pub symbol: Symbol,
    pub initial_energy: ProbValue,
    pub current_energy: ProbValue,
}

impl Node {
    pub fn element(&self) -> Element {
        match self.symbol {
            Symbol::Stem(s) => s.element(),
            Symbol::Branch(b) => b.element(),
        }
    }

    pub fn polarity(&self) -> Polarity {
        match self.symbol {
            Symbol::Stem(s) => s.polarity(),
            Symbol::Branch(b) => b.polarity(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self.symbol {
            Symbol::Stem(s) => s.name(),
            Symbol::Branch(b) => b.name(),
        }
    }

    pub fn stem(&self) -> Option<Stem> {
        match self.symbol {
            Symbol::Stem(s) => Some(s),
            Symbol::Branch(_) => None,
        }
    }

    pub fn branch(&self) -> Option<Branch> {
        match self.symbol {
            Symbol::Branch(b) => Some(b),
            Symbol::Stem(_) => None,
        }
    }
}

// === RESULT CONTRACT ===

#[derive(Debug, Clone, Serialize)]
pub struct TenGodSummary {
    #[serde(rename = "self")]
    pub self_support: ProbValue,
    pub output: ProbValue,
    pub wealth: ProbValue,
    pub officer: ProbValue,
    pub resource: ProbValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct DomainScores {
    pub career: ProbValue,
    pub wealth: ProbValue,
    pub relationship: ProbValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub strength_score: f64,
    pub strength_label: StrengthLabel,
    pub self_team_ratio: f64,
    pub ten_gods: TenGodSummary,
    pub domains: DomainScores,
    /// Ordered rule firings, one string each.
    pub details: Vec<String>,
    pub detected_matches: Vec<String>,
}

// === ENGINE ===

pub struct GraphEngine<'a> {
    cfg: &'a Config,
    input: AnalysisInput,
    pub(crate) nodes: Vec<Node>,
    pub(crate) adjacency: Vec<Vec<f64>>,
    pub(crate) relations: nodes::DetectedRelations,
    pub(crate) day_master: Stem,
    pub(crate) day_master_idx: usize,
    pub(crate) detected_matches: Vec<String>,
}

impl<'a> GraphEngine<'a> {
    /// Validates the input and runs phases 1 and 2 (node initialisation
    /// and adjacency construction). The result is a ready-to-propagate
    /// graph; `run` and the Monte-Carlo sampler both start from here.
    pub fn new(input: &AnalysisInput, cfg: &'a Config) -> EngineResult<GraphEngine<'a>> {
        cfg.validate()?;
        let day_pillar_stem = input.pillars[2].stem;
        if input.day_master != day_pillar_stem {
            return Err(EngineError::InvalidDayMaster {
                declared: input.day_master.name().to_string(),
                actual: day_pillar_stem.name().to_string(),
            });
        }
        if let Some(geo) = &input.geo_modifiers {
            for e in Element::ALL {
                let v = geo.get(e);
                if !v.is_finite() || v <= 0.0 {
                    return Err(EngineError::ConfigOutOfRange {
                        field: "geoModifiers",
                        value: v,
                        range: "(0, inf) per element",
                    });
                }
            }
        }

        let mut engine = GraphEngine {
            cfg,
            input: input.clone(),
            nodes: Vec::new(),
            adjacency: Vec::new(),
            relations: nodes::DetectedRelations::default(),
            day_master: input.day_master,
            day_master_idx: 4, // day-pillar stem is always the fifth node
            detected_matches: Vec::new(),
        };
        engine.initialize_nodes()?;
        engine.build_adjacency();
        debug!(
            nodes = engine.nodes.len(),
            matches = engine.detected_matches.len(),
            solar_time = input.solar_time_applied,
            "graph constructed"
        );
        Ok(engine)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn config(&self) -> &Config {
        self.cfg
    }

    pub(crate) fn input(&self) -> &AnalysisInput {
        &self.input
    }

    pub(crate) fn initial_energies(&self) -> Vec<ProbValue> {
        self.nodes.iter().map(|n| n.initial_energy).collect()
    }

    /// Phase 3 onward: propagate to equilibrium, classify, project and
    /// score. Mutates the nodes' current energies.
    pub fn run(&mut self) -> EngineResult<Analysis> {
        let h0 = self.initial_energies();
        let energies = self.propagate(&h0)?;
        for (node, e) in self.nodes.iter_mut().zip(energies.iter()) {
            node.current_energy = *e;
        }
        let (analysis, _) = self.score(&energies)?;
        Ok(analysis)
    }

    /// Scores a propagated energy vector. Pure with respect to the engine
    /// state, so the Monte-Carlo sampler can call it repeatedly.
    pub(crate) fn score(
        &self,
        energies: &[ProbValue],
    ) -> EngineResult<(Analysis, StrengthOutcome)> {
        let strength = self.classify_strength(energies);
        let projection = self.project_ten_gods(energies);
        let mut details = Vec::new();

        let (wealth, wealth_details) = self.wealth_index(energies, &strength, &projection);
        details.extend(wealth_details);
        let (career, career_details) = self.career_score(&strength, &projection);
        details.extend(career_details);
        let (relationship, rel_details) = self.relationship_score(&strength, &projection);
        details.extend(rel_details);

        for v in [wealth, career, relationship] {
            ProbValue::checked(v.mean, v.std)?;
        }

        let analysis = Analysis {
            strength_score: strength.score,
            strength_label: strength.label,
            self_team_ratio: strength.self_team_ratio,
            ten_gods: projection.summary(),
            domains: DomainScores {
                career,
                wealth,
                relationship,
            },
            details,
            detected_matches: self.detected_matches.clone(),
        };
        Ok((analysis, strength))
    }
}

// === FACADE ===

/// One-call analysis of a resolved chart. Deterministic, side-effect free
/// except for tracing.
pub fn analyze(input: &AnalysisInput, cfg: &Config) -> EngineResult<Analysis> {
    let mut engine = GraphEngine::new(input, cfg)?;
    engine.run()
}

/// Distribution mode: re-runs propagation and scoring over perturbed node
/// energies and reports per-field percentiles. Seeded explicitly.
pub fn analyze_distribution(
    input: &AnalysisInput,
    cfg: &Config,
    seed: u64,
    samples: usize,
) -> EngineResult<DistributionSummary> {
    let engine = GraphEngine::new(input, cfg)?;
    engine.distribution(seed, samples)
}
