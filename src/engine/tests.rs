#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::engine::{analyze, analyze_distribution, AnalysisInput, GraphEngine, Pillar};
    use crate::engine::{GeoModifiers, StrengthLabel};
    use crate::prob::ProbValue;
    use crate::tables::{Branch, Stem};

    fn pillar(stem: i64, branch: i64) -> Pillar {
        Pillar {
            stem: Stem::new(stem).unwrap(),
            branch: Branch::new(branch).unwrap(),
        }
    }

    fn chart(pillars: [(i64, i64); 4]) -> AnalysisInput {
        AnalysisInput {
            pillars: [
                pillar(pillars[0].0, pillars[0].1),
                pillar(pillars[1].0, pillars[1].1),
                pillar(pillars[2].0, pillars[2].1),
                pillar(pillars[3].0, pillars[3].1),
            ],
            day_master: Stem::new(pillars[2].0).unwrap(),
            luck: None,
            annual: None,
            geo_modifiers: None,
            era: None,
            solar_time_applied: false,
        }
    }

    fn consts(means: &[f64]) -> Vec<ProbValue> {
        means.iter().map(|&m| ProbValue::constant(m)).collect()
    }

    /// Balanced chart: Jia day-master, no vault, no clash, no stem
    /// combination anywhere. Node order: S2,B2,S8,B2,S0,B9,S4,B6.
    fn balanced_chart() -> AnalysisInput {
        chart([(2, 2), (8, 2), (0, 9), (4, 6)])
    }

    /// Vault chart: Chen in the month, Xu arriving with the annual pillar.
    /// Nodes: S2,B2,S4,B4,S6,B0,S8,B9,S0,B10 (day-master Geng).
    fn vault_chart() -> AnalysisInput {
        let mut input = chart([(2, 2), (4, 4), (6, 0), (8, 9)]);
        input.annual = Some(pillar(0, 10));
        input
    }

    // === P1: DETERMINISM ===

    #[test]
    fn test_analysis_is_deterministic() {
        let cfg = Config::default();
        let input = vault_chart();
        let a = analyze(&input, &cfg).unwrap();
        let b = analyze(&input, &cfg).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_distribution_reproducible_for_fixed_seed() {
        let cfg = Config::default();
        let input = balanced_chart();
        let a = analyze_distribution(&input, &cfg, 99, 64).unwrap();
        let b = analyze_distribution(&input, &cfg, 99, 64).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
        assert!(a.wealth.p5 <= a.wealth.p50 && a.wealth.p50 <= a.wealth.p95);
    }

    // === P2: NON-NEGATIVE ENERGIES ===

    #[test]
    fn test_energies_stay_non_negative() {
        // Clash-heavy chart: Zi-Wu and Mao-You both present.
        let input = chart([(0, 0), (2, 6), (6, 3), (8, 9)]);
        let cfg = Config::default();
        let mut engine = GraphEngine::new(&input, &cfg).unwrap();
        for node in &engine.nodes {
            assert!(node.initial_energy.mean >= 0.0);
        }
        engine.run().unwrap();
        for node in &engine.nodes {
            assert!(node.current_energy.mean >= 0.0, "node {}", node.name());
        }
    }

    // === P3: STRENGTH MONOTONICITY ===

    #[test]
    fn test_seasonal_root_weight_does_not_weaken_day_master() {
        // The month branch Yin roots the Jia day-master; pushing the
        // seasonal weight up must not lower the strength score.
        let input = balanced_chart();
        let cfg_low = Config::default();
        let mut cfg_high = Config::default();
        cfg_high.physics.month_weight = 2.0;
        let low = analyze(&input, &cfg_low).unwrap();
        let high = analyze(&input, &cfg_high).unwrap();
        assert!(high.strength_score >= low.strength_score - 1e-9);
    }

    // === P4 / LABEL LADDER ===

    #[test]
    fn test_balanced_baseline_scenario() {
        // self (Wood/Water): nodes 1,2,3,4 at 13 each = 52.
        // oppose (Fire/Earth/Metal): nodes 0,5,6,7 at 12 each = 48.
        // score = 100 * 52 / 100 = 52 -> Balanced.
        let cfg = Config::default();
        let engine = GraphEngine::new(&balanced_chart(), &cfg).unwrap();
        let energies = consts(&[12.0, 13.0, 13.0, 13.0, 13.0, 12.0, 12.0, 12.0]);
        let (analysis, strength) = engine.score(&energies).unwrap();

        assert_eq!(analysis.strength_label, StrengthLabel::Balanced);
        assert!((analysis.strength_score - 52.0).abs() < 1e-9);
        assert!(analysis.strength_score >= 50.0 && analysis.strength_score <= 55.0);
        assert!(!strength.instability);
        // Wealth is the bare base line: 0.52 * 15 = 7.8.
        assert!((analysis.domains.wealth.mean - 7.8).abs() < 1e-9);
        assert!(analysis.domains.wealth.mean >= -10.0 && analysis.domains.wealth.mean <= 30.0);
        for d in &analysis.details {
            let lower = d.to_lowercase();
            assert!(!lower.contains("vault") && !lower.contains("tomb") && !lower.contains("clash"));
        }
    }

    #[test]
    fn test_strong_label_without_instability() {
        // self 60 / oppose 40 -> score 60, ratio 0.60: Strong, not
        // Special_Strong (needs ratio > 0.65 or score >= 75).
        let cfg = Config::default();
        let engine = GraphEngine::new(&balanced_chart(), &cfg).unwrap();
        let energies = consts(&[10.0, 15.0, 15.0, 15.0, 15.0, 10.0, 10.0, 10.0]);
        let (analysis, _) = engine.score(&energies).unwrap();
        assert_eq!(analysis.strength_label, StrengthLabel::Strong);
    }

    #[test]
    fn test_label_matches_published_ladder() {
        // The returned label must be re-derivable from score + ratio alone
        // on a chart without instability.
        let cfg = Config::default();
        let engine = GraphEngine::new(&balanced_chart(), &cfg).unwrap();
        for energies in [
            consts(&[12.0, 13.0, 13.0, 13.0, 13.0, 12.0, 12.0, 12.0]),
            consts(&[10.0, 15.0, 15.0, 15.0, 15.0, 10.0, 10.0, 10.0]),
            consts(&[25.0, 5.0, 5.0, 5.0, 5.0, 25.0, 25.0, 25.0]),
            consts(&[2.0, 25.0, 25.0, 25.0, 25.0, 2.0, 2.0, 2.0]),
        ] {
            let (analysis, strength) = engine.score(&energies).unwrap();
            let score = analysis.strength_score;
            let ratio = analysis.self_team_ratio;
            let expected = if score >= 80.0 || ratio > 0.65 || (score >= 75.0 && ratio > 0.60) {
                StrengthLabel::SpecialStrong
            } else if score <= 20.0 && strength.oppose_energy > 4.0 * strength.self_energy {
                StrengthLabel::Follower
            } else if score <= 25.0 || score < 50.0 {
                StrengthLabel::Weak
            } else if score >= 55.0 {
                StrengthLabel::Strong
            } else {
                StrengthLabel::Balanced
            };
            assert_eq!(analysis.strength_label, expected, "score {score} ratio {ratio}");
        }
    }

    // === VAULT SCENARIOS ===

    #[test]
    fn test_vault_open_scenario() {
        // Chen (node 3) holds E_in = 7.5 * 0.4 = 3.0 >= threshold 2.0 and
        // is clashed by the annual Xu (node 9, also charged). Strength:
        // self 70 / oppose 20 -> score 77.8, gate ~0.94. Both stores open
        // for ~160 each; the final score saturates the +100 clamp and the
        // Chen-Xu earth clash penalty is cancelled.
        let cfg = Config::default();
        let engine = GraphEngine::new(&vault_chart(), &cfg).unwrap();
        assert_eq!(engine.node_count(), 10);
        let energies = consts(&[2.0, 3.0, 20.0, 7.5, 20.0, 5.0, 5.0, 15.0, 5.0, 7.5]);
        let (analysis, _) = engine.score(&energies).unwrap();

        assert!((analysis.domains.wealth.mean - 100.0).abs() < 1e-9);
        assert!(analysis.details.iter().any(|d| d.contains("vault open")));
        assert!(analysis
            .details
            .iter()
            .any(|d| d.contains("earth clash penalty cancelled")));
    }

    #[test]
    fn test_tomb_break_scenario() {
        // Same chart, but both stores hold only E_in = 2.0 * 0.4 = 0.8 <
        // threshold: tomb collapse on both, clash penalty kept, the total
        // pins the -100 clamp.
        let cfg = Config::default();
        let engine = GraphEngine::new(&vault_chart(), &cfg).unwrap();
        let energies = consts(&[2.0, 3.0, 20.0, 2.0, 20.0, 5.0, 5.0, 15.0, 5.0, 2.0]);
        let (analysis, _) = engine.score(&energies).unwrap();

        assert!((analysis.domains.wealth.mean + 100.0).abs() < 1e-9);
        assert!(analysis.details.iter().any(|d| d.contains("tomb collapse")));
        assert!(analysis
            .details
            .iter()
            .any(|d| d.contains("earth clash penalty (")));
        assert!(!analysis
            .details
            .iter()
            .any(|d| d.contains("earth clash penalty cancelled")));
    }

    #[test]
    fn test_vault_symmetry_on_earth_clash_pair() {
        // P5: swapping which vault sits in the chart and which arrives
        // with the annual pillar must not change the net wealth when both
        // classify the same way.
        let cfg = Config::default();
        let mut swapped = chart([(2, 2), (4, 10), (6, 0), (8, 9)]);
        swapped.annual = Some(pillar(0, 4));

        let a = GraphEngine::new(&vault_chart(), &cfg).unwrap();
        let b = GraphEngine::new(&swapped, &cfg).unwrap();
        // Same energies per slot; Chen and Xu share the 0.4 stored
        // fraction, so inside energies match pairwise.
        let energies = consts(&[2.0, 3.0, 20.0, 7.5, 20.0, 5.0, 5.0, 15.0, 5.0, 7.5]);
        let (ra, _) = a.score(&energies).unwrap();
        let (rb, _) = b.score(&energies).unwrap();
        assert!((ra.domains.wealth.mean - rb.domains.wealth.mean).abs() < 1e-9);
    }

    #[test]
    fn test_sealed_vault_contributes_damped() {
        // No clash anywhere: the charged Chen store stays sealed and only
        // its damped promise counts. self 62.5 / oppose 15 -> score 80.6,
        // sealed contribution = 10*1.5*3.0*0.4*gate(0.806) ~ 17.2 on top
        // of the 12.1 base line.
        let cfg = Config::default();
        let input = chart([(2, 2), (4, 4), (6, 0), (8, 9)]);
        let engine = GraphEngine::new(&input, &cfg).unwrap();
        let energies = consts(&[2.0, 3.0, 20.0, 7.5, 20.0, 5.0, 5.0, 15.0]);
        let (analysis, _) = engine.score(&energies).unwrap();

        assert_eq!(analysis.strength_label, StrengthLabel::SpecialStrong);
        assert!(analysis.details.iter().any(|d| d.contains("vault sealed")));
        assert!(analysis.domains.wealth.mean > 25.0 && analysis.domains.wealth.mean < 35.0);
    }

    #[test]
    fn test_punishment_opens_vault_only_when_permitted() {
        // Wei and Xu share a punishment group but do not clash. With the
        // flag off both charged stores stay sealed; with it on they open.
        let input = chart([(2, 7), (4, 10), (6, 0), (8, 9)]);
        let energies = consts(&[2.0, 7.5, 20.0, 7.5, 20.0, 5.0, 5.0, 15.0]);

        let cfg_sealed = Config::default();
        let engine = GraphEngine::new(&input, &cfg_sealed).unwrap();
        let (sealed, _) = engine.score(&energies).unwrap();
        assert!(sealed.details.iter().any(|d| d.contains("vault sealed")));
        assert!(!sealed.details.iter().any(|d| d.contains("vault open")));

        let mut cfg_open = Config::default();
        cfg_open.vault.punishment_opens = true;
        let engine = GraphEngine::new(&input, &cfg_open).unwrap();
        let (opened, _) = engine.score(&energies).unwrap();
        assert!(opened
            .details
            .iter()
            .any(|d| d.contains("vault open (punishment)")));
        assert!(opened.domains.wealth.mean > sealed.domains.wealth.mean);
    }

    // === MONTH-COMMANDER CLASH ===

    /// Weak Jia chart whose month commander Zi is clashed by the annual
    /// Wu. Nodes: S6,B5,S8,B0,S0,B9,S4,B5,(luck),(annual).
    fn commander_chart(luck: (i64, i64)) -> AnalysisInput {
        let mut input = chart([(6, 5), (8, 0), (0, 9), (4, 5)]);
        input.luck = Some(pillar(luck.0, luck.1));
        input.annual = Some(pillar(2, 6));
        input
    }

    #[test]
    fn test_month_commander_clash_with_mediation() {
        // Luck Hai supplies the Water seal: the clash penalty drops to the
        // smallest tier and the detail names the mediation.
        let cfg = Config::default();
        let engine = GraphEngine::new(&commander_chart((6, 11)), &cfg).unwrap();
        let energies = consts(&[
            15.0, 10.0, 7.0, 7.5, 7.0, 15.0, 10.0, 10.0, 1.0, 1.0, 10.0, 10.0,
        ]);
        let (analysis, _) = engine.score(&energies).unwrap();

        assert!(analysis
            .details
            .iter()
            .any(|d| d.contains("seal mediation")));
        assert!(analysis.domains.wealth.mean > -20.0 && analysis.domains.wealth.mean < 5.0);
    }

    #[test]
    fn test_month_commander_clash_unhelped_is_fatal() {
        // No resource, no peer anywhere in the moving pillars: -120 flat,
        // plus an unmediated seven-killings strike. The clamp floors the
        // final score and the label stays Weak.
        let cfg = Config::default();
        let engine = GraphEngine::new(&commander_chart((6, 5)), &cfg).unwrap();
        let energies = consts(&[
            15.0, 10.0, 7.0, 7.5, 7.0, 15.0, 10.0, 10.0, 1.0, 1.0, 10.0, 10.0,
        ]);
        let (analysis, _) = engine.score(&energies).unwrap();

        assert_eq!(analysis.strength_label, StrengthLabel::Weak);
        assert!((analysis.domains.wealth.mean + 100.0).abs() < 1e-9);
        assert!(analysis
            .details
            .iter()
            .any(|d| d.contains("unmediated: -120")));
    }

    #[test]
    fn test_help_never_scores_below_unhelped() {
        // P6: all else equal, the mediated variant dominates.
        let cfg = Config::default();
        let energies = consts(&[
            15.0, 10.0, 7.0, 7.5, 7.0, 15.0, 10.0, 10.0, 1.0, 1.0, 10.0, 10.0,
        ]);
        let helped = GraphEngine::new(&commander_chart((6, 11)), &cfg).unwrap();
        let unhelped = GraphEngine::new(&commander_chart((6, 5)), &cfg).unwrap();
        let (h, _) = helped.score(&energies).unwrap();
        let (u, _) = unhelped.score(&energies).unwrap();
        assert!(h.domains.wealth.mean >= u.domains.wealth.mean);
    }

    // === FOLLOWER ===

    #[test]
    fn test_follower_candidate() {
        // Rootless Jia against a chart saturated with Metal/Fire: the
        // day-master cannot stand and follows the dominant force.
        let input = chart([(6, 9), (7, 8), (0, 9), (6, 5)]);
        let cfg = Config::default();
        let analysis = analyze(&input, &cfg).unwrap();
        assert_eq!(analysis.strength_label, StrengthLabel::Follower);
        assert!(analysis.strength_score <= 20.0);
        assert!(analysis.self_team_ratio < 0.2);
    }

    // === ADJACENCY STRUCTURE ===

    #[test]
    fn test_adjacency_has_no_self_loops() {
        let cfg = Config::default();
        let engine = GraphEngine::new(&vault_chart(), &cfg).unwrap();
        for i in 0..engine.node_count() {
            assert_eq!(engine.adjacency[i][i], 0.0);
        }
    }

    #[test]
    fn test_unmediated_control_edge_is_negative() {
        // Follower chart: year Geng (node 0) controls the Jia day-master
        // (node 4) with no Water conduit in sight. Distance 2 decay 0.3:
        // -(0.3 * 0.3) * 0.3 = -0.027.
        let input = chart([(6, 9), (7, 8), (0, 9), (6, 5)]);
        let cfg = Config::default();
        let engine = GraphEngine::new(&input, &cfg).unwrap();
        assert!((engine.adjacency[4][0] + 0.027).abs() < 1e-9);
    }

    #[test]
    fn test_conduit_turns_control_into_generation() {
        // Balanced chart: the day branch You controls the day-master, but
        // the month stem Ren carries enough Water to route the attack as
        // generation. The edge comes out positive.
        let cfg = Config::default();
        let engine = GraphEngine::new(&balanced_chart(), &cfg).unwrap();
        assert!(engine.adjacency[4][5] > 0.0);
    }

    // === MODIFIERS & OPTIONALS ===

    #[test]
    fn test_missing_optionals_are_neutral() {
        let cfg = Config::default();
        let engine = GraphEngine::new(&balanced_chart(), &cfg).unwrap();
        assert_eq!(engine.node_count(), 8);
        let engine = GraphEngine::new(&vault_chart(), &cfg).unwrap();
        assert_eq!(engine.node_count(), 10);
    }

    #[test]
    fn test_geo_modifier_shifts_strength() {
        let cfg = Config::default();
        let plain = analyze(&balanced_chart(), &cfg).unwrap();
        let mut boosted_input = balanced_chart();
        boosted_input.geo_modifiers = Some(GeoModifiers {
            wood: 1.5,
            fire: 1.0,
            earth: 1.0,
            metal: 1.0,
            water: 1.0,
        });
        let boosted = analyze(&boosted_input, &cfg).unwrap();
        assert!(boosted.strength_score > plain.strength_score);
    }

    #[test]
    fn test_era_modifier_shifts_strength() {
        use crate::engine::EraModifier;
        use crate::tables::Element;
        let cfg = Config::default();
        let plain = analyze(&balanced_chart(), &cfg).unwrap();
        let mut input = balanced_chart();
        input.era = Some(EraModifier {
            element: Element::Wood,
            bonus: 0.2,
            penalty: 0.1,
        });
        let with_era = analyze(&input, &cfg).unwrap();
        assert!(with_era.strength_score > plain.strength_score);
    }

    // === P8: MONTE-CARLO WIDENING ===

    #[test]
    fn test_wider_input_std_widens_percentiles() {
        let cfg = Config::default();
        let engine = GraphEngine::new(&balanced_chart(), &cfg).unwrap();
        let h0 = engine.initial_energies();
        let h_wide: Vec<ProbValue> = h0
            .iter()
            .map(|p| ProbValue::new(p.mean, p.std * 3.0))
            .collect();
        let narrow = engine.distribution_from(&h0, 7, 300).unwrap();
        let wide = engine.distribution_from(&h_wide, 7, 300).unwrap();
        assert!(wide.strength_score.spread() >= narrow.strength_score.spread());
        assert!(wide.wealth.spread() >= narrow.wealth.spread());
    }

    // === ERRORS ===

    #[test]
    fn test_inconsistent_day_master_rejected() {
        let mut input = balanced_chart();
        input.day_master = Stem::new(1).unwrap();
        let cfg = Config::default();
        let err = analyze(&input, &cfg).unwrap_err();
        assert!(err.to_string().contains("day-master"));
    }

    #[test]
    fn test_invalid_config_rejected_before_work() {
        let mut cfg = Config::default();
        cfg.flow.damping = 1.5;
        assert!(analyze(&balanced_chart(), &cfg).is_err());
    }

    #[test]
    fn test_input_parses_from_wire_document() {
        let raw = r#"{
            "pillars": [
                {"stem": 2, "branch": 2},
                {"stem": 8, "branch": 2},
                {"stem": 0, "branch": 9},
                {"stem": 4, "branch": 6}
            ],
            "dayMaster": 0
        }"#;
        let parsed: AnalysisInput = serde_json::from_str(raw).unwrap();
        let built = balanced_chart();
        assert_eq!(parsed.pillars, built.pillars);
        assert!(parsed.luck.is_none() && parsed.annual.is_none());
        // Out-of-range symbols are rejected at the boundary.
        assert!(serde_json::from_str::<AnalysisInput>(&raw.replace(": 9", ": 14")).is_err());
    }

    // === DETECTED MATCHES ===

    #[test]
    fn test_detected_matches_report_structures() {
        // Vault chart: Chen+You six-combination, Chen-Xu clash, You-Xu
        // harm, plus two partial harmony frames.
        let cfg = Config::default();
        let analysis = analyze(&vault_chart(), &cfg).unwrap();
        assert!(analysis
            .detected_matches
            .iter()
            .any(|m| m.starts_with("SixCombination: Chen+You")));
        assert!(analysis
            .detected_matches
            .iter()
            .any(|m| m.starts_with("Clash: Chen-Xu")));
        assert!(analysis
            .detected_matches
            .iter()
            .any(|m| m.starts_with("Harm: You-Xu")));
        assert!(analysis
            .detected_matches
            .iter()
            .any(|m| m.starts_with("PartialHarmony:")));
    }
}
