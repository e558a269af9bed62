//! Static domain tables: the two symbol alphabets, the five-element cycle
//! and every fixed relation between symbols (combinations, clashes,
//! punishments, harms, life stages).
//!
//! The tables themselves live in an embedded JSON document and are parsed
//! and validated exactly once; all lookups after that are index-based.
//! Human-readable names are a labelling layer only.

pub mod relations;

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

pub const STEM_COUNT: usize = 10;
pub const BRANCH_COUNT: usize = 12;

/// The four Earth stores (Chou, Chen, Wei, Xu).
pub const VAULT_BRANCHES: [u8; 4] = [1, 4, 7, 10];

// === ELEMENTS & POLARITY ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    Wood,
    Fire,
    Earth,
    Metal,
    Water,
}

impl Element {
    pub const ALL: [Element; 5] = [
        Element::Wood,
        Element::Fire,
        Element::Earth,
        Element::Metal,
        Element::Water,
    ];

    pub fn index(self) -> usize {
        match self {
            Element::Wood => 0,
            Element::Fire => 1,
            Element::Earth => 2,
            Element::Metal => 3,
            Element::Water => 4,
        }
    }

    /// Generation cycle: Wood feeds Fire feeds Earth feeds Metal feeds Water.
    pub fn generates(self) -> Element {
        match self {
            Element::Wood => Element::Fire,
            Element::Fire => Element::Earth,
            Element::Earth => Element::Metal,
            Element::Metal => Element::Water,
            Element::Water => Element::Wood,
        }
    }

    /// Control cycle: Wood breaks Earth, Earth dams Water, Water quenches
    /// Fire, Fire melts Metal, Metal cuts Wood.
    pub fn controls(self) -> Element {
        match self {
            Element::Wood => Element::Earth,
            Element::Earth => Element::Water,
            Element::Water => Element::Fire,
            Element::Fire => Element::Metal,
            Element::Metal => Element::Wood,
        }
    }

    pub fn generated_by(self) -> Element {
        match self {
            Element::Fire => Element::Wood,
            Element::Earth => Element::Fire,
            Element::Metal => Element::Earth,
            Element::Water => Element::Metal,
            Element::Wood => Element::Water,
        }
    }

    pub fn controlled_by(self) -> Element {
        match self {
            Element::Earth => Element::Wood,
            Element::Water => Element::Earth,
            Element::Fire => Element::Water,
            Element::Metal => Element::Fire,
            Element::Wood => Element::Metal,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Element::Wood => "Wood",
            Element::Fire => "Fire",
            Element::Earth => "Earth",
            Element::Metal => "Metal",
            Element::Water => "Water",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    Yang,
    Yin,
}

// === SYMBOL ALPHABETS ===

/// One of the ten stems, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Stem(u8);

impl Stem {
    pub fn new(index: i64) -> EngineResult<Self> {
        if (0..STEM_COUNT as i64).contains(&index) {
            Ok(Stem(index as u8))
        } else {
            Err(EngineError::InvalidSymbol { kind: "stem", index })
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn element(self) -> Element {
        tables().stems[self.index()].element
    }

    pub fn polarity(self) -> Polarity {
        tables().stems[self.index()].polarity
    }

    pub fn name(self) -> &'static str {
        &tables().stems[self.index()].name
    }
}

impl TryFrom<u8> for Stem {
    type Error = EngineError;
    fn try_from(v: u8) -> EngineResult<Self> {
        Stem::new(v as i64)
    }
}

impl From<Stem> for u8 {
    fn from(s: Stem) -> u8 {
        s.0
    }
}

/// One of the twelve branches, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Branch(u8);

impl Branch {
    pub fn new(index: i64) -> EngineResult<Self> {
        if (0..BRANCH_COUNT as i64).contains(&index) {
            Ok(Branch(index as u8))
        } else {
            Err(EngineError::InvalidSymbol { kind: "branch", index })
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn element(self) -> Element {
        tables().branches[self.index()].element
    }

    /// Branches alternate polarity by index, Zi being Yang.
    pub fn polarity(self) -> Polarity {
        if self.0 % 2 == 0 {
            Polarity::Yang
        } else {
            Polarity::Yin
        }
    }

    pub fn name(self) -> &'static str {
        &tables().branches[self.index()].name
    }

    pub fn hidden_stems(self) -> &'static [HiddenStem] {
        &tables().branches[self.index()].hidden
    }

    pub fn is_vault(self) -> bool {
        VAULT_BRANCHES.contains(&self.0)
    }

    /// Fraction of the branch's hidden weight stored in non-primary
    /// elements. Non-zero only for the four vaults.
    pub fn stored_fraction(self) -> f64 {
        let primary = self.element();
        self.hidden_stems()
            .iter()
            .filter(|h| h.stem.element() != primary)
            .map(|h| h.weight)
            .sum()
    }
}

impl TryFrom<u8> for Branch {
    type Error = EngineError;
    fn try_from(v: u8) -> EngineResult<Self> {
        Branch::new(v as i64)
    }
}

impl From<Branch> for u8 {
    fn from(b: Branch) -> u8 {
        b.0
    }
}

// === TEN GODS ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TenGod {
    BiJian,
    JieCai,
    ShiShen,
    ShangGuan,
    ZhengCai,
    PianCai,
    ZhengGuan,
    QiSha,
    ZhengYin,
    PianYin,
}

/// The five composite categories driving domain scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TenGodGroup {
    Companion,
    Output,
    Wealth,
    Officer,
    Resource,
}

impl TenGodGroup {
    pub const ALL: [TenGodGroup; 5] = [
        TenGodGroup::Companion,
        TenGodGroup::Output,
        TenGodGroup::Wealth,
        TenGodGroup::Officer,
        TenGodGroup::Resource,
    ];

    pub fn index(self) -> usize {
        match self {
            TenGodGroup::Companion => 0,
            TenGodGroup::Output => 1,
            TenGodGroup::Wealth => 2,
            TenGodGroup::Officer => 3,
            TenGodGroup::Resource => 4,
        }
    }
}

impl TenGod {
    pub const ALL: [TenGod; 10] = [
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
    ];

    pub fn index(self) -> usize {
        match self {
            TenGod::BiJian => 0,
            TenGod::JieCai => 1,
            TenGod::ShiShen => 2,
            TenGod::ShangGuan => 3,
            TenGod::ZhengCai => 4,
            TenGod::PianCai => 5,
            TenGod::ZhengGuan => 6,
            TenGod::QiSha => 7,
            TenGod::ZhengYin => 8,
            TenGod::PianYin => 9,
        }
    }

    /// Relation of a target (element, polarity) to the day-master. The even
    /// (Zheng) forms are the same-polarity ones, uniformly across all five
    /// pairs.
    pub fn of(day_master: Stem, element: Element, polarity: Polarity) -> TenGod {
        let dm_el = day_master.element();
        let same = day_master.polarity() == polarity;
        if element == dm_el {
            if same {
                TenGod::BiJian
            } else {
                TenGod::JieCai
            }
        } else if dm_el.generates() == element {
            if same {
                TenGod::ShiShen
            } else {
                TenGod::ShangGuan
            }
        } else if dm_el.controls() == element {
            if same {
                TenGod::ZhengCai
            } else {
                TenGod::PianCai
            }
        } else if element.controls() == dm_el {
            if same {
                TenGod::ZhengGuan
            } else {
                TenGod::QiSha
            }
        } else {
            // Only the generates-day-master case is left.
            if same {
                TenGod::ZhengYin
            } else {
                TenGod::PianYin
            }
        }
    }

    pub fn group(self) -> TenGodGroup {
        match self {
            TenGod::BiJian | TenGod::JieCai => TenGodGroup::Companion,
            TenGod::ShiShen | TenGod::ShangGuan => TenGodGroup::Output,
            TenGod::ZhengCai | TenGod::PianCai => TenGodGroup::Wealth,
            TenGod::ZhengGuan | TenGod::QiSha => TenGodGroup::Officer,
            TenGod::ZhengYin | TenGod::PianYin => TenGodGroup::Resource,
        }
    }

    /// Stable key, matching the particle-weight table in the config.
    pub fn key(self) -> &'static str {
        match self {
            TenGod::BiJian => "BiJian",
            TenGod::JieCai => "JieCai",
            TenGod::ShiShen => "ShiShen",
            TenGod::ShangGuan => "ShangGuan",
            TenGod::ZhengCai => "ZhengCai",
            TenGod::PianCai => "PianCai",
            TenGod::ZhengGuan => "ZhengGuan",
            TenGod::QiSha => "QiSha",
            TenGod::ZhengYin => "ZhengYin",
            TenGod::PianYin => "PianYin",
        }
    }
}

// === TABLE DOCUMENT ===

#[derive(Debug, Clone, Deserialize)]
pub struct StemRecord {
    pub name: String,
    pub element: Element,
    pub polarity: Polarity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HiddenStem {
    pub stem: Stem,
    pub weight: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BranchRecord {
    pub name: String,
    pub element: Element,
    pub hidden: Vec<HiddenStem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PairRule {
    pub pair: [u8; 2],
    pub element: Element,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrineRule {
    pub triple: [u8; 3],
    pub element: Element,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StageRecord {
    pub name: String,
    pub coefficient: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LifeStageTable {
    /// The twelve stages of the cycle, in traversal order from LongLife.
    pub stages: Vec<StageRecord>,
    /// Per stem: the branch where the cycle starts. Yang stems traverse
    /// forward, Yin stems backward.
    pub start: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PillarWeights {
    pub year: f64,
    pub month: f64,
    pub day: f64,
    pub hour: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableSet {
    pub stems: Vec<StemRecord>,
    pub branches: Vec<BranchRecord>,
    pub six_combinations: Vec<PairRule>,
    pub three_harmonies: Vec<TrineRule>,
    pub stem_combinations: Vec<PairRule>,
    pub clashes: Vec<[u8; 2]>,
    pub punishments: Vec<Vec<u8>>,
    pub self_punishments: Vec<u8>,
    pub harms: Vec<[u8; 2]>,
    pub life_stages: LifeStageTable,
    pub pillar_weights: PillarWeights,
}

const EMBEDDED_TABLES: &str = include_str!("tables.json");

const STAGE_COEFFICIENTS: [f64; 6] = [0.3, 0.5, 0.8, 1.0, 1.2, 1.5];

impl TableSet {
    /// Parses and validates a table document. Any structural defect is a
    /// `MissingTable` error; lookups never re-validate.
    pub fn load(doc: &str) -> EngineResult<TableSet> {
        let set: TableSet = serde_json::from_str(doc)
            .map_err(|e| EngineError::MissingTable(format!("parse failure: {e}")))?;
        set.validate()?;
        Ok(set)
    }

    fn validate(&self) -> EngineResult<()> {
        fn bad(msg: String) -> EngineResult<()> {
            Err(EngineError::MissingTable(msg))
        }

        if self.stems.len() != STEM_COUNT {
            return bad(format!("expected 10 stems, got {}", self.stems.len()));
        }
        if self.branches.len() != BRANCH_COUNT {
            return bad(format!("expected 12 branches, got {}", self.branches.len()));
        }
        for (i, b) in self.branches.iter().enumerate() {
            if b.hidden.is_empty() || b.hidden.len() > 3 {
                return bad(format!("branch {i} has {} hidden stems", b.hidden.len()));
            }
            let sum: f64 = b.hidden.iter().map(|h| h.weight).sum();
            if (sum - 1.0).abs() > 1e-9 {
                return bad(format!("branch {i} hidden weights sum to {sum}"));
            }
        }
        if self.six_combinations.len() != 6 {
            return bad("expected 6 six-combinations".into());
        }
        if self.three_harmonies.len() != 4 {
            return bad("expected 4 three-harmonies".into());
        }
        if self.stem_combinations.len() != 5 {
            return bad("expected 5 stem-combinations".into());
        }
        // Every branch sits in exactly one harmony frame.
        for b in 0..BRANCH_COUNT as u8 {
            let frames = self
                .three_harmonies
                .iter()
                .filter(|t| t.triple.contains(&b))
                .count();
            if frames != 1 {
                return bad(format!("branch {b} appears in {frames} harmony frames"));
            }
        }
        if self.clashes.len() != 6 {
            return bad("expected 6 clash pairs".into());
        }
        if self.harms.len() != 6 {
            return bad("expected 6 harm pairs".into());
        }
        for group in &self.punishments {
            if group.len() < 2 || group.len() > 3 {
                return bad(format!("punishment group of size {}", group.len()));
            }
            if group.iter().any(|&b| b as usize >= BRANCH_COUNT) {
                return bad("punishment branch out of range".into());
            }
        }
        if self.life_stages.stages.len() != 12 {
            return bad(format!(
                "expected 12 life stages, got {}",
                self.life_stages.stages.len()
            ));
        }
        if self.life_stages.start.len() != STEM_COUNT {
            return bad("expected a life-stage start per stem".into());
        }
        for s in &self.life_stages.stages {
            if !STAGE_COEFFICIENTS.iter().any(|&c| (c - s.coefficient).abs() < 1e-12) {
                return bad(format!(
                    "stage {} has non-canonical coefficient {}",
                    s.name, s.coefficient
                ));
            }
        }
        Ok(())
    }
}

lazy_static::lazy_static! {
    static ref TABLES: TableSet = TableSet::load(EMBEDDED_TABLES)
        .expect("embedded table document failed validation");
}

/// The process-wide table set. Immutable and freely sharable.
pub fn tables() -> &'static TableSet {
    &TABLES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_tables_load() {
        let t = tables();
        assert_eq!(t.stems.len(), 10);
        assert_eq!(t.branches.len(), 12);
        // Zi hides only Gui.
        assert_eq!(t.branches[0].hidden.len(), 1);
        assert_eq!(t.branches[0].hidden[0].stem.index(), 9);
    }

    #[test]
    fn test_stem_element_pairing() {
        // S0,S1 Wood; S2,S3 Fire; S4,S5 Earth; S6,S7 Metal; S8,S9 Water.
        let expected = [
            Element::Wood,
            Element::Wood,
            Element::Fire,
            Element::Fire,
            Element::Earth,
            Element::Earth,
            Element::Metal,
            Element::Metal,
            Element::Water,
            Element::Water,
        ];
        for i in 0..10 {
            let s = Stem::new(i as i64).unwrap();
            assert_eq!(s.element(), expected[i]);
            let pol = if i % 2 == 0 { Polarity::Yang } else { Polarity::Yin };
            assert_eq!(s.polarity(), pol);
        }
    }

    #[test]
    fn test_cycles_are_closed() {
        for e in Element::ALL {
            assert_eq!(e.generates().generated_by(), e);
            assert_eq!(e.controls().controlled_by(), e);
        }
    }

    #[test]
    fn test_invalid_symbols_rejected() {
        assert!(Stem::new(10).is_err());
        assert!(Stem::new(-1).is_err());
        assert!(Branch::new(12).is_err());
    }

    #[test]
    fn test_ten_god_assignment() {
        // Day-master Jia (Yang Wood).
        let dm = Stem::new(0).unwrap();
        // Jia vs Jia: same element, same polarity -> BiJian.
        assert_eq!(TenGod::of(dm, Element::Wood, Polarity::Yang), TenGod::BiJian);
        // Yi: same element, opposite polarity -> JieCai.
        assert_eq!(TenGod::of(dm, Element::Wood, Polarity::Yin), TenGod::JieCai);
        // Wood generates Fire: Yang Fire -> ShiShen.
        assert_eq!(TenGod::of(dm, Element::Fire, Polarity::Yang), TenGod::ShiShen);
        // Wood controls Earth: Yin Earth -> PianCai.
        assert_eq!(TenGod::of(dm, Element::Earth, Polarity::Yin), TenGod::PianCai);
        // Metal controls Wood: Yang Metal -> ZhengGuan (same polarity is even).
        assert_eq!(TenGod::of(dm, Element::Metal, Polarity::Yang), TenGod::ZhengGuan);
        // Water generates Wood: Yin Water -> PianYin.
        assert_eq!(TenGod::of(dm, Element::Water, Polarity::Yin), TenGod::PianYin);
    }

    #[test]
    fn test_vault_stored_fraction() {
        // Chen stores Wood 0.3 + Water 0.1 behind Earth 0.6.
        let chen = Branch::new(4).unwrap();
        assert!(chen.is_vault());
        assert!((chen.stored_fraction() - 0.4).abs() < 1e-12);
        // Zi is pure Water, nothing stored.
        let zi = Branch::new(0).unwrap();
        assert!(!zi.is_vault());
        assert_eq!(zi.stored_fraction(), 0.0);
    }

    #[test]
    fn test_malformed_document_rejected() {
        let doc = r#"{ "stems": [] }"#;
        assert!(TableSet::load(doc).is_err());
    }
}
