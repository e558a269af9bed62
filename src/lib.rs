//! Deterministic destiny-physics engine.
//!
//! A four-pillar birth specification becomes a small heterogeneous graph:
//! nodes carry five-element energies, a signed adjacency matrix encodes
//! generation/control/combination/clash interactions, and damped
//! propagation settles the system before it is projected onto ten-god
//! categories and domain scores (career, wealth, relationship).
//!
//! The kernel is single-threaded, performs no I/O, and is bit-identical
//! across runs for identical inputs. Monte-Carlo distribution mode is
//! seeded explicitly.

pub mod activation;
pub mod config;
pub mod engine;
pub mod error;
pub mod prob;
pub mod tables;

pub use config::Config;
pub use engine::{
    analyze, analyze_distribution, Analysis, AnalysisInput, DistributionSummary, DomainScores,
    EraModifier, GeoModifiers, GraphEngine, Pillar, StrengthLabel, TenGodSummary,
};
pub use error::{EngineError, EngineResult};
pub use prob::ProbValue;
