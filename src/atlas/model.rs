//! Typed views of the Atlas Academy JSON documents.
//! Only the fields the bot actually reads are modeled; serde ignores the rest.
//! The nice API uses camelCase keys except for sval entries, which are PascalCase.

use serde::Deserialize;
use std::collections::HashMap;

/// A skill or a noble phantasm from the nice API. NPs are the same document
/// shape with `card` present, which is what enables overcharge formatting.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: i64,
    #[serde(default)]
    pub num: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub card: Option<String>,
    #[serde(default)]
    pub cool_down: Vec<i64>,
    #[serde(default)]
    pub functions: Vec<Function>,
}

impl Skill {
    pub fn is_noble_phantasm(&self) -> bool {
        self.card.is_some()
    }
}

/// One atomic effect within a skill.
#[derive(Debug, Clone, Deserialize)]
pub struct Function {
    #[serde(rename = "funcType")]
    pub func_type: String,
    #[serde(rename = "funcTargetType", default)]
    pub func_target_type: String,
    #[serde(rename = "funcTargetTeam", default)]
    pub func_target_team: String,
    #[serde(rename = "funcPopupText", default)]
    pub func_popup_text: String,
    #[serde(default)]
    pub functvals: Vec<TraitVal>,
    #[serde(rename = "funcquestTvals", default)]
    pub funcquest_tvals: Vec<TraitVal>,
    #[serde(default)]
    pub buffs: Vec<Buff>,
    #[serde(default)]
    pub svals: Vec<Sval>,
    #[serde(default)]
    pub svals2: Vec<Sval>,
    #[serde(default)]
    pub svals3: Vec<Sval>,
    #[serde(default)]
    pub svals4: Vec<Sval>,
    #[serde(default)]
    pub svals5: Vec<Sval>,
}

impl Function {
    /// Buff type tag of the first buff descriptor, or empty.
    pub fn buff_type(&self) -> &str {
        self.buffs.first().map(|b| b.buff_type.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buff {
    #[serde(rename = "type", default)]
    pub buff_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ck_self_indv: Vec<TraitVal>,
    #[serde(default)]
    pub ck_op_indv: Vec<TraitVal>,
}

/// One per-level parameter record. Presence/absence of fields and cross-entry
/// equality drive the formatting decisions in the description generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Sval {
    #[serde(default)]
    pub value: Option<i64>,
    #[serde(default)]
    pub correction: Option<i64>,
    #[serde(default)]
    pub rate: Option<i64>,
    #[serde(default)]
    pub turn: Option<i64>,
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub use_rate: Option<i64>,
    #[serde(default)]
    pub target: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TraitVal {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// Full nice servant document (`lore=true`), as rendered on the servant pages.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Servant {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ruby: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub rarity: u8,
    #[serde(default)]
    pub attribute: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub cards: Vec<String>,
    #[serde(default)]
    pub traits: Vec<TraitVal>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub noble_phantasms: Vec<Skill>,
    #[serde(default)]
    pub skill_materials: HashMap<String, MaterialSet>,
    #[serde(default)]
    pub ascension_materials: HashMap<String, MaterialSet>,
    #[serde(default)]
    pub extra_assets: ExtraAssets,
    #[serde(default)]
    pub profile: Option<Profile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraAssets {
    #[serde(default)]
    pub faces: AssetSet,
    #[serde(default)]
    pub chara_graph: AssetSet,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetSet {
    #[serde(default)]
    pub ascension: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub cv: String,
    #[serde(default)]
    pub illustrator: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialSet {
    #[serde(default)]
    pub items: Vec<ItemAmount>,
    #[serde(default)]
    pub qp: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemAmount {
    pub item: Item,
    #[serde(default)]
    pub amount: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// Basic servant entity from search endpoints and reverse mappings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicServant {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Basic skill/NP entity with its reverse servant mapping.
#[derive(Debug, Clone, Deserialize)]
pub struct BasicSkill {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub reverse: Option<SkillReverse>,
}

impl BasicSkill {
    pub fn servants(&self) -> &[BasicServant] {
        self.reverse.as_ref().map(|r| r.basic.servant.as_slice()).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillReverse {
    #[serde(default)]
    pub basic: SkillReverseBasic,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillReverseBasic {
    #[serde(default)]
    pub servant: Vec<BasicServant>,
}

/// Basic function entity with its reverse skill/NP mapping.
#[derive(Debug, Clone, Deserialize)]
pub struct BasicFunction {
    pub id: i64,
    #[serde(default)]
    pub reverse: Option<FunctionReverse>,
}

impl BasicFunction {
    pub fn skills(&self) -> &[BasicSkill] {
        self.reverse.as_ref().map(|r| r.basic.skill.as_slice()).unwrap_or(&[])
    }

    pub fn noble_phantasms(&self) -> &[BasicSkill] {
        self.reverse.as_ref().map(|r| r.basic.np.as_slice()).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionReverse {
    #[serde(default)]
    pub basic: FunctionReverseBasic,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionReverseBasic {
    #[serde(default)]
    pub skill: Vec<BasicSkill>,
    #[serde(rename = "NP", default)]
    pub np: Vec<BasicSkill>,
}

/// Basic buff entity with its reverse function mapping.
#[derive(Debug, Clone, Deserialize)]
pub struct BasicBuff {
    pub id: i64,
    #[serde(default)]
    pub reverse: Option<BuffReverse>,
}

impl BasicBuff {
    pub fn functions(&self) -> &[BasicFunction] {
        self.reverse.as_ref().map(|r| r.basic.function.as_slice()).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuffReverse {
    #[serde(default)]
    pub basic: BuffReverseBasic,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuffReverseBasic {
    #[serde(default)]
    pub function: Vec<BasicFunction>,
}

/// Voice-actor entry from the CV exports.
#[derive(Debug, Clone, Deserialize)]
pub struct CvEntry {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}
