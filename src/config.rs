//! Engine configuration. Every tunable has a documented default; values
//! outside their documented range are rejected outright, never clamped.

use crate::error::{EngineError, EngineResult};
use crate::tables::TenGod;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub structure: StructureConfig,
    pub physics: PhysicsConfig,
    pub flow: FlowConfig,
    pub interactions: InteractionConfig,
    pub vault: VaultConfig,
    pub nonlinear: NonlinearConfig,
    pub strength: StrengthConfig,
    pub particles: ParticleWeights,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StructureConfig {
    pub base_unit: f64,
    pub rooting_weight: f64,
    pub same_pillar_bonus: f64,
    pub exposed_boost: f64,
}

impl Default for StructureConfig {
    fn default() -> Self {
        StructureConfig {
            base_unit: 10.0,
            rooting_weight: 1.5,
            same_pillar_bonus: 1.5,
            exposed_boost: 1.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PillarWeightConfig {
    pub year: f64,
    pub month: f64,
    pub day: f64,
    pub hour: f64,
}

impl Default for PillarWeightConfig {
    fn default() -> Self {
        PillarWeightConfig {
            year: 1.0,
            month: 1.3,
            day: 1.0,
            hour: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhysicsConfig {
    pub pillar_weights: PillarWeightConfig,
    /// Seasonal multiplier on the month branch's primary element. Must not
    /// fall below the month pillar weight.
    pub month_weight: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            pillar_weights: PillarWeightConfig::default(),
            month_weight: 1.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlowConfig {
    pub generation_efficiency: f64,
    /// Negative by convention; the adjacency builder takes |value| and
    /// negates.
    pub control_impact: f64,
    pub combination_bonus: f64,
    pub clash_damping: f64,
    pub damping: f64,
    pub global_entropy: f64,
    pub spatial_decay: [f64; 4],
    pub propagation_iterations: usize,
    /// Whether luck/annual nodes participate in combinations symmetrically
    /// with the original pillars.
    pub dynamic_nodes_form_combinations: bool,
}

impl Default for FlowConfig {
    fn default() -> Self {
        FlowConfig {
            generation_efficiency: 0.25,
            control_impact: -0.3,
            combination_bonus: 1.5,
            clash_damping: 1.0,
            damping: 0.9,
            global_entropy: 0.05,
            spatial_decay: [1.0, 0.6, 0.3, 0.15],
            propagation_iterations: 10,
            dynamic_nodes_form_combinations: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InteractionConfig {
    pub six_harmony: f64,
    pub trine_full: f64,
    pub trine_partial: f64,
    pub clash_score: f64,
    pub punishment_penalty: f64,
    pub harm_penalty: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        InteractionConfig {
            six_harmony: 12.0,
            trine_full: 18.0,
            trine_partial: 6.0,
            clash_score: -8.0,
            punishment_penalty: 3.0,
            harm_penalty: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VaultConfig {
    /// Inside-energy at or above this classifies the store as Vault,
    /// below as Tomb.
    pub threshold: f64,
    pub sealed_damping: f64,
    pub open_bonus: f64,
    pub punishment_opens: bool,
    pub break_penalty: f64,
    pub k_open: f64,
    pub k_collapse: f64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        VaultConfig {
            threshold: 2.0,
            sealed_damping: 0.4,
            open_bonus: 1.5,
            punishment_opens: false,
            break_penalty: 0.5,
            k_open: 2.5,
            k_collapse: 1.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NonlinearConfig {
    pub threshold: f64,
    pub scale: f64,
    pub steepness: f64,
    pub phase_point: f64,
    pub critical_exponent: f64,
    pub barrier_height: f64,
    pub barrier_width: f64,
    pub clash_intensity_weight: f64,
    pub trine_effect_weight: f64,
    pub mediation_factor: f64,
    pub help_factor: f64,
}

impl Default for NonlinearConfig {
    fn default() -> Self {
        NonlinearConfig {
            threshold: 0.5,
            scale: 10.0,
            steepness: 10.0,
            phase_point: 0.5,
            critical_exponent: 2.0,
            barrier_height: 0.6,
            barrier_width: 1.0,
            clash_intensity_weight: 0.5,
            trine_effect_weight: 0.3,
            mediation_factor: 0.3,
            help_factor: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StrengthConfig {
    pub strong_threshold: f64,
    pub special_strong_score: f64,
    pub special_strong_ratio: f64,
    pub weak_threshold: f64,
    /// Net-force override at the Strong/Balanced boundary.
    pub net_force_override: f64,
}

impl Default for StrengthConfig {
    fn default() -> Self {
        StrengthConfig {
            strong_threshold: 55.0,
            special_strong_score: 80.0,
            special_strong_ratio: 0.65,
            weak_threshold: 25.0,
            net_force_override: 75.0,
        }
    }
}

/// Per-god multipliers applied before ten-god aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleWeights {
    #[serde(rename = "BiJian")]
    pub bi_jian: f64,
    #[serde(rename = "JieCai")]
    pub jie_cai: f64,
    #[serde(rename = "ShiShen")]
    pub shi_shen: f64,
    #[serde(rename = "ShangGuan")]
    pub shang_guan: f64,
    #[serde(rename = "ZhengCai")]
    pub zheng_cai: f64,
    #[serde(rename = "PianCai")]
    pub pian_cai: f64,
    #[serde(rename = "ZhengGuan")]
    pub zheng_guan: f64,
    #[serde(rename = "QiSha")]
    pub qi_sha: f64,
    #[serde(rename = "ZhengYin")]
    pub zheng_yin: f64,
    #[serde(rename = "PianYin")]
    pub pian_yin: f64,
}

impl Default for ParticleWeights {
    fn default() -> Self {
        ParticleWeights {
            bi_jian: 1.5,
            jie_cai: 1.5,
            shi_shen: 1.4,
            shang_guan: 1.2,
            zheng_cai: 1.3,
            pian_cai: 1.5,
            zheng_guan: 0.9,
            qi_sha: 1.15,
            zheng_yin: 0.9,
            pian_yin: 0.9,
        }
    }
}

impl ParticleWeights {
    pub fn get(&self, god: TenGod) -> f64 {
        match god {
            TenGod::BiJian => self.bi_jian,
            TenGod::JieCai => self.jie_cai,
            TenGod::ShiShen => self.shi_shen,
            TenGod::ShangGuan => self.shang_guan,
            TenGod::ZhengCai => self.zheng_cai,
            TenGod::PianCai => self.pian_cai,
            TenGod::ZhengGuan => self.zheng_guan,
            TenGod::QiSha => self.qi_sha,
            TenGod::ZhengYin => self.zheng_yin,
            TenGod::PianYin => self.pian_yin,
        }
    }
}

impl Config {
    pub fn validate(&self) -> EngineResult<()> {
        fn check(ok: bool, field: &'static str, value: f64, range: &'static str) -> EngineResult<()> {
            if ok {
                Ok(())
            } else {
                Err(EngineError::ConfigOutOfRange { field, value, range })
            }
        }

        let s = &self.structure;
        check(s.base_unit > 0.0, "structure.baseUnit", s.base_unit, "(0, inf)")?;
        check(
            (1.0..=3.0).contains(&s.rooting_weight),
            "structure.rootingWeight",
            s.rooting_weight,
            "[1, 3]",
        )?;
        check(
            (1.0..=3.0).contains(&s.same_pillar_bonus),
            "structure.samePillarBonus",
            s.same_pillar_bonus,
            "[1, 3]",
        )?;
        check(
            (1.0..=2.0).contains(&s.exposed_boost),
            "structure.exposedBoost",
            s.exposed_boost,
            "[1, 2]",
        )?;

        let p = &self.physics;
        for (field, v) in [
            ("physics.pillarWeights.year", p.pillar_weights.year),
            ("physics.pillarWeights.month", p.pillar_weights.month),
            ("physics.pillarWeights.day", p.pillar_weights.day),
            ("physics.pillarWeights.hour", p.pillar_weights.hour),
        ] {
            check(v > 0.0, field, v, "(0, inf)")?;
        }
        check(
            p.month_weight >= p.pillar_weights.month,
            "physics.monthWeight",
            p.month_weight,
            "[pillarWeights.month, inf)",
        )?;

        let f = &self.flow;
        check(
            (0.0..=1.0).contains(&f.generation_efficiency) && f.generation_efficiency > 0.0,
            "flow.generationEfficiency",
            f.generation_efficiency,
            "(0, 1]",
        )?;
        check(
            f.control_impact <= 0.0,
            "flow.controlImpact",
            f.control_impact,
            "(-inf, 0]",
        )?;
        check(
            (0.0..1.0).contains(&f.damping),
            "flow.damping",
            f.damping,
            "[0, 1)",
        )?;
        check(
            (0.0..1.0).contains(&f.global_entropy),
            "flow.globalEntropy",
            f.global_entropy,
            "[0, 1)",
        )?;
        for (i, d) in f.spatial_decay.iter().enumerate() {
            check(
                (0.0..=1.0).contains(d) && *d > 0.0,
                "flow.spatialDecay",
                *d,
                "(0, 1] per entry",
            )?;
            if i > 0 {
                check(
                    *d <= f.spatial_decay[i - 1],
                    "flow.spatialDecay",
                    *d,
                    "non-increasing",
                )?;
            }
        }
        check(
            (1..=1000).contains(&f.propagation_iterations),
            "flow.propagationIterations",
            f.propagation_iterations as f64,
            "[1, 1000]",
        )?;

        let v = &self.vault;
        check(v.threshold > 0.0, "vault.threshold", v.threshold, "(0, inf)")?;
        check(
            (0.3..=0.5).contains(&v.sealed_damping),
            "vault.sealedDamping",
            v.sealed_damping,
            "[0.3, 0.5]",
        )?;
        check(
            (2.0..=3.0).contains(&v.k_open),
            "vault.kOpen",
            v.k_open,
            "[2, 3]",
        )?;
        check(
            v.k_collapse >= 1.0,
            "vault.kCollapse",
            v.k_collapse,
            "[1, inf)",
        )?;

        let n = &self.nonlinear;
        check(n.scale > 0.0, "nonlinear.scale", n.scale, "(0, inf)")?;
        check(n.steepness > 0.0, "nonlinear.steepness", n.steepness, "(0, inf)")?;
        check(
            n.critical_exponent >= 1.0,
            "nonlinear.criticalExponent",
            n.critical_exponent,
            "[1, inf)",
        )?;
        check(
            n.barrier_width >= 0.0,
            "nonlinear.barrierWidth",
            n.barrier_width,
            "[0, inf)",
        )?;
        check(
            (0.0..=1.0).contains(&n.mediation_factor),
            "nonlinear.mediationFactor",
            n.mediation_factor,
            "[0, 1]",
        )?;
        check(
            (0.0..=1.0).contains(&n.help_factor),
            "nonlinear.helpFactor",
            n.help_factor,
            "[0, 1]",
        )?;

        let st = &self.strength;
        check(
            st.weak_threshold > 0.0 && st.weak_threshold < st.strong_threshold,
            "strength.weakThreshold",
            st.weak_threshold,
            "(0, strongThreshold)",
        )?;
        check(
            st.strong_threshold < st.special_strong_score && st.special_strong_score <= 100.0,
            "strength.specialStrongScore",
            st.special_strong_score,
            "(strongThreshold, 100]",
        )?;
        check(
            (0.0..=1.0).contains(&st.special_strong_ratio),
            "strength.specialStrongRatio",
            st.special_strong_ratio,
            "[0, 1]",
        )?;
        check(
            st.net_force_override >= st.strong_threshold,
            "strength.netForceOverride",
            st.net_force_override,
            "[strongThreshold, 100]",
        )?;

        for god in [
            TenGod::BiJian,
            TenGod::JieCai,
            TenGod::ShiShen,
            TenGod::ShangGuan,
            TenGod::ZhengCai,
            TenGod::PianCai,
            TenGod::ZhengGuan,
            TenGod::QiSha,
            TenGod::ZhengYin,
            TenGod::PianYin,
        ] {
            let w = self.particles.get(god);
            check(w > 0.0, "particles", w, "(0, inf) per god")?;
        }

        Ok(())
    }
}
