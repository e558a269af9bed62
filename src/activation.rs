//! Non-linear activation library. Pure stateless functions over plain
//! floats; the engine calls these wherever a hard threshold would make a
//! score jump discontinuously under small numeric jitter.

use crate::config::NonlinearConfig;

/// `scale * ln(1 + exp((x - threshold) / scale))`: a smooth ramp that is
/// ~0 below the threshold and ~linear above it.
pub fn softplus_threshold(x: f64, threshold: f64, scale: f64) -> f64 {
    let z = (x - threshold) / scale;
    // ln(1+exp(z)) overflows for large z; use the stable split.
    if z > 30.0 {
        scale * z
    } else {
        scale * z.exp().ln_1p()
    }
}

/// Logistic gate centred on `threshold`.
pub fn sigmoid_threshold(x: f64, threshold: f64, steepness: f64) -> f64 {
    1.0 / (1.0 + (-steepness * (x - threshold)).exp())
}

/// Signed power law around a phase point. Odd in `x - phase_point`.
pub fn phase_transition_energy(x: f64, phase_point: f64, exponent: f64) -> f64 {
    let d = x - phase_point;
    d.signum() * d.abs().powf(exponent)
}

/// WKB-style barrier transmission: 1.0 once the energy clears the barrier,
/// exponentially small below it.
pub fn quantum_tunneling_probability(energy: f64, barrier_height: f64, barrier_width: f64) -> f64 {
    (-2.0 * barrier_width * (barrier_height - energy).max(0.0).sqrt()).exp()
}

/// Share of a broken store's charge that leaks away through the barrier.
const VAULT_LEAK_FRACTION: f64 = 0.1;

/// What touched the store: an opposing-branch clash or a punishment
/// (punishments only count when the config allows them to open vaults).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultTrigger {
    Clash,
    Punishment,
}

impl VaultTrigger {
    pub fn label(self) -> &'static str {
        match self {
            VaultTrigger::Clash => "clash",
            VaultTrigger::Punishment => "punishment",
        }
    }
}

#[derive(Debug, Clone)]
pub struct VaultOutcome {
    pub energy: f64,
    pub gate: f64,
    pub details: Vec<String>,
}

/// Energy released (or lost) when a trigger hits an Earth store.
///
/// `is_vault` carries the caller's inside-energy classification: a charged
/// store opens, a depleted one collapses. The sigmoid gate on normalized
/// strength decides how much of either outcome the day-master can actually
/// hold on to; the phase-transition term amplifies decisive charts and the
/// tunnelling term keeps both paths away from hard zero.
#[allow(clippy::too_many_arguments)]
pub fn vault_energy_nonlinear(
    strength_norm: f64,
    is_vault: bool,
    trigger: VaultTrigger,
    clash_intensity: f64,
    has_trine: bool,
    trine_completeness: f64,
    base_bonus: f64,
    base_penalty: f64,
    cfg: &NonlinearConfig,
) -> VaultOutcome {
    let gate = sigmoid_threshold(strength_norm, cfg.threshold, cfg.steepness);
    let tunneling =
        quantum_tunneling_probability(strength_norm, cfg.barrier_height, cfg.barrier_width);
    let mut details = Vec::new();

    if is_vault {
        let intensity = 1.0 + clash_intensity * cfg.clash_intensity_weight;
        let mut energy = base_bonus * gate * intensity;
        // Charts decisively past the phase point get amplified.
        let phase = phase_transition_energy(strength_norm, cfg.phase_point, cfg.critical_exponent);
        if phase > 0.0 {
            energy *= 1.0 + phase;
        }
        // Even a weak day-master extracts a tunnelling floor from an open store.
        let floor = base_bonus * tunneling * cfg.clash_intensity_weight;
        if energy < floor {
            details.push(format!(
                "vault open ({}): tunnelling floor {:.1} engaged",
                trigger.label(),
                floor
            ));
            energy = floor;
        } else {
            details.push(format!(
                "vault open ({}): gate {:.2}, intensity x{:.2}",
                trigger.label(),
                gate,
                intensity
            ));
        }
        VaultOutcome { energy, gate, details }
    } else {
        let trine_damping = if has_trine {
            1.0 - cfg.trine_effect_weight * trine_completeness.clamp(0.0, 1.0)
        } else {
            1.0
        };
        let penalty = base_penalty * (1.0 - gate) * trine_damping;
        // Tunnelling leakage: stored energy escapes through the broken
        // barrier on top of the collapse itself.
        let leakage = base_penalty * tunneling * VAULT_LEAK_FRACTION;
        let energy = -(penalty + leakage);
        details.push(format!(
            "tomb collapse ({}): gate {:.2}, trine damping x{:.2}, leakage {:.2}",
            trigger.label(),
            gate,
            trine_damping,
            tunneling
        ));
        VaultOutcome { energy, gate, details }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenaltyKind {
    ClashCommander,
    SevenKill,
    LegCut,
}

impl PenaltyKind {
    pub fn label(self) -> &'static str {
        match self {
            PenaltyKind::ClashCommander => "clash-of-month-commander",
            PenaltyKind::SevenKill => "seven-killings",
            PenaltyKind::LegCut => "leg-cutting",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PenaltyOutcome {
    pub penalty: f64,
    pub details: Vec<String>,
}

/// Smooth penalty: full weight on a weak day-master, fading out as the
/// chart strengthens; help and mediation reduce it multiplicatively.
pub fn penalty_nonlinear(
    strength_norm: f64,
    kind: PenaltyKind,
    intensity: f64,
    has_help: bool,
    has_mediation: bool,
    base_penalty: f64,
    cfg: &NonlinearConfig,
) -> PenaltyOutcome {
    // sigmoid(-strength): the complement of the strength gate.
    let weakness = 1.0 - sigmoid_threshold(strength_norm, cfg.threshold, cfg.steepness);
    let mut penalty = base_penalty * weakness * (1.0 + intensity * cfg.clash_intensity_weight);
    let mut details = vec![format!(
        "{}: weakness gate {:.2}, intensity x{:.2}",
        kind.label(),
        weakness,
        1.0 + intensity * cfg.clash_intensity_weight
    )];
    if has_help {
        penalty *= cfg.help_factor;
        details.push(format!("{}: peer help x{:.2}", kind.label(), cfg.help_factor));
    }
    if has_mediation {
        penalty *= cfg.mediation_factor;
        details.push(format!(
            "{}: seal mediation x{:.2}",
            kind.label(),
            cfg.mediation_factor
        ));
    }
    PenaltyOutcome { penalty, details }
}
