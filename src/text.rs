//! Turns nice skill/NP documents into readable effect descriptions.
//!
//! The Atlas API gives every effect as a "function" with per-level (and, for
//! noble phantasms, per-overcharge-stage) parameter tables. Nothing in the
//! payload says how a value should be displayed; the scaling and layout are
//! inferred from the funcType/buff type tags and from which sval fields are
//! present and whether they vary across entries.

use crate::atlas::model::{Function, Skill, Sval};
use convert_case::{Case, Casing};
use std::collections::HashMap;
use std::sync::Arc;

/// Rate/UseRate of exactly 100.0% — chance text is omitted.
const RATE_ALWAYS: i64 = 1000;
/// Upstream sentinel meaning "always applies" on certain effect kinds, not 500%.
const RATE_GUARANTEED: i64 = 5000;
/// functvals IDs at or above this are card-type traits and are not resolved.
const CARD_TRAIT_FLOOR: i64 = 5000;
/// ckOpIndv IDs below this resolve through the trait table; the rest carry
/// their own name in the payload.
const NAMED_TRAIT_CEILING: i64 = 3000;
/// Sub-skill expansion stops here; upstream data could self-reference.
const MAX_SUB_SKILL_DEPTH: u8 = 1;

#[derive(Debug, thiserror::Error)]
pub enum DescribeError {
    #[error("function `{func_type}` has no level-1 parameter entry")]
    EmptySvals { func_type: String },
}

/// Trait table plus prefetched sub-skills, immutable for the duration of one
/// description. Built by the atlas layer; tests construct it directly.
pub struct Lookups {
    traits: Arc<HashMap<String, String>>,
    sub_skills: HashMap<i64, Option<Skill>>,
}

impl Lookups {
    pub fn new(traits: Arc<HashMap<String, String>>, sub_skills: HashMap<i64, Option<Skill>>) -> Self {
        Self { traits, sub_skills }
    }

    fn sub_skill(&self, id: i64) -> Option<&Skill> {
        self.sub_skills.get(&id).and_then(|skill| skill.as_ref())
    }

    /// Display form of a trait ID. Card traits (IDs starting with 4) read fine
    /// bare; everything else links to the Atlas DB entity search. Unknown IDs
    /// render as "Unknown" rather than failing.
    pub fn trait_desc(&self, trait_id: i64) -> String {
        let id = trait_id.to_string();
        let name = self.traits.get(&id).map(String::as_str).unwrap_or("unknown");
        let name = title_case(name);
        if id.starts_with('4') {
            return name;
        }
        format!("[{name}](https://apps.atlasacademy.io/db/JP/entities?trait={id})")
    }
}

/// Whether a noble-phantasm function's numbers move with skill level, with
/// overcharge stage, both, or neither. Only level 1 vs 2 and overcharge
/// stage 1 are inspected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Variance {
    pub level: bool,
    pub overcharge: bool,
}

pub fn np_variance(function: &Function) -> Variance {
    let first = match function.svals.first() {
        Some(first) => first,
        None => return Variance::default(),
    };
    let level = function
        .svals
        .get(1)
        .map_or(false, |second| second.value != first.value);
    let overcharge = function.svals2.first().map_or(false, |stage2| {
        stage2.value != first.value || stage2.correction != first.correction
    });
    Variance { level, overcharge }
}

/// Skill IDs referenced by Function-type buffs at the top level of `skill`.
/// The atlas layer resolves these before composing, which is also what keeps
/// sub-skill expansion to a single level.
pub fn sub_skill_refs(skill: &Skill) -> Vec<i64> {
    skill
        .functions
        .iter()
        .filter(|f| f.func_target_team != "enemy" && f.func_type != "none")
        .filter(|f| f.buff_type().ends_with("Function"))
        .filter_map(|f| f.svals.first().and_then(|sval| sval.value))
        .collect()
}

/// Full description of a skill or noble phantasm, one line per fragment.
pub fn describe_skill(skill: &Skill, lookups: &Lookups) -> Result<String, DescribeError> {
    describe_skill_at(skill, lookups, 0)
}

fn describe_skill_at(skill: &Skill, lookups: &Lookups, depth: u8) -> Result<String, DescribeError> {
    let mut lines: Vec<String> = Vec::new();
    if depth == 0 {
        if let Some(cooldown) = skill.cool_down.first() {
            lines.push(format!("**Base Cooldown:** {cooldown}"));
        }
    }

    let is_np = skill.is_noble_phantasm();
    let mut index = 0;
    for function in &skill.functions {
        let function_lines = describe_function(function, is_np, depth, index, lookups)?;
        if function_lines.is_empty() {
            continue;
        }
        index += 1;
        lines.extend(function_lines);
    }
    Ok(lines.join("\n"))
}

/// Description lines for one function: the effect line itself, then optional
/// chance, use-chance, and value-list lines. Enemy-side and "none" functions
/// yield nothing and consume no effect index.
fn describe_function(
    function: &Function,
    is_np: bool,
    depth: u8,
    index: usize,
    lookups: &Lookups,
) -> Result<Vec<String>, DescribeError> {
    if function.func_target_team == "enemy" || function.func_type == "none" {
        return Ok(Vec::new());
    }

    let first = *function
        .svals
        .first()
        .ok_or_else(|| DescribeError::EmptySvals {
            func_type: function.func_type.clone(),
        })?;

    let variance = if is_np {
        np_variance(function)
    } else {
        Variance::default()
    };

    let buff_type = function.buff_type();
    let func_type = function.func_type.as_str();

    let mut target_vals_text = String::new();
    if !function.functvals.is_empty() {
        let names: Vec<String> = function
            .functvals
            .iter()
            .filter(|tval| tval.id < CARD_TRAIT_FLOOR)
            .map(|tval| lookups.trait_desc(tval.id))
            .collect();
        if !names.is_empty() {
            target_vals_text = format!(" with trait [{}]", names.join(", "));
        }
    }

    let mut values_text = String::new();
    let mut is_single_value = false;
    if let Some(value) = first.value {
        if buff_type.ends_with("Function") {
            // The value is itself a skill ID; expand it one level deep.
            values_text = sub_skill_description(value, depth, lookups)?;
        } else if function.svals.iter().all(|sval| sval.value == first.value) {
            if is_np && variance.overcharge {
                values_text = overcharge_values(function, buff_type, func_type, false);
            } else {
                is_single_value = true;
                values_text = if buff_type == "addIndividuality" {
                    lookups.trait_desc(value)
                } else {
                    format_value(value, buff_type, func_type)
                };
            }
        } else {
            let per_level: Vec<String> = function
                .svals
                .iter()
                .enumerate()
                .map(|(i, sval)| {
                    let raw = sval.value.unwrap_or(value);
                    format!("{}{}", format_value(raw, buff_type, func_type), subscript(i + 1))
                })
                .collect();
            let np_text = if is_np && variance.level { " (Level)" } else { "" };
            values_text = format!("Value{}: {}", np_text, per_level.join(" · "));
            if is_np && variance.overcharge {
                values_text.push('\n');
                values_text.push_str(&overcharge_values(function, buff_type, func_type, true));
            }
        }
    }

    let chances_text = rate_text(function, first.rate, |sval| sval.rate);
    let usechance_text = rate_text(function, first.use_rate, |sval| sval.use_rate);

    let mut duration = Vec::new();
    if let Some(count) = first.count.filter(|count| *count > 0) {
        duration.push(format!("{count} Times"));
    }
    if let Some(turn) = first.turn.filter(|turn| *turn > 0) {
        duration.push(format!("{turn} Turns"));
    }
    let turns_count_text = if duration.is_empty() {
        String::new()
    } else {
        format!("({})", duration.join(", "))
    };

    let sub_prefix = if depth > 0 { "└Sub-" } else { "" };
    let number = index + 1;
    let target = title_case(&function.func_target_type);
    let inline_value = if is_single_value {
        format!(" ({values_text})")
    } else {
        String::new()
    };

    let effect_line = if func_type == "damageNpIndividual" {
        match first.target.map(|id| lookups.trait_desc(id)) {
            Some(bonus) => format!(
                "**{sub_prefix}Effect {number}**: Deals damage to [{target}] with bonus damage to [{bonus}]"
            ),
            None => format!("**{sub_prefix}Effect {number}**: Deals damage to [{target}]"),
        }
    } else if func_type.starts_with("damageNp") {
        format!("**{sub_prefix}Effect {number}**: Deals damage to [{target}]")
    } else {
        let effect = if func_type.starts_with("addState") {
            addstate_effect(function, lookups)
        } else if !function.func_popup_text.is_empty() {
            function.func_popup_text.clone()
        } else {
            title_case(func_type)
        };
        format!(
            "**{sub_prefix}Effect {number}**: {effect}{inline_value} to [{target}]{target_vals_text} {turns_count_text}"
        )
        .trim_end()
        .to_string()
    };

    let mut lines = vec![effect_line];
    if let Some(chances) = chances_text {
        lines.push(chances);
    }
    if let Some(usechance) = usechance_text {
        lines.push(usechance);
    }
    if !values_text.is_empty() && !is_single_value {
        lines.push(values_text);
    }
    Ok(lines)
}

/// addState effect labels come from the buff type rather than the popup text,
/// qualified by quest fields, self-individuality cards, and opponent traits.
fn addstate_effect(function: &Function, lookups: &Lookups) -> String {
    let mut effect = format!("Grants [{}]", title_case(function.buff_type()));

    if !function.funcquest_tvals.is_empty() {
        let fields: Vec<String> = function
            .funcquest_tvals
            .iter()
            .map(|tval| title_case(&tval.name))
            .collect();
        effect.push_str(&format!(" on [{}]", fields.join(", ")));
    }

    if let Some(buff) = function.buffs.first() {
        if !buff.ck_self_indv.is_empty() {
            let cards: Vec<String> = buff
                .ck_self_indv
                .iter()
                .map(|tval| title_case(&tval.name))
                .collect();
            effect.push_str(&format!(" to [{}]", cards.join(", ")));
        }
        if !buff.ck_op_indv.is_empty() {
            let against: Vec<String> = buff
                .ck_op_indv
                .iter()
                .map(|tval| {
                    if tval.id < NAMED_TRAIT_CEILING {
                        lookups.trait_desc(tval.id)
                    } else {
                        title_case(&tval.name)
                    }
                })
                .collect();
            effect.push_str(&format!(" against [{}]", against.join(", ")));
        }
    }

    effect
}

fn sub_skill_description(id: i64, depth: u8, lookups: &Lookups) -> Result<String, DescribeError> {
    if depth >= MAX_SUB_SKILL_DEPTH {
        return Ok(unavailable_sub_skill(id));
    }
    match lookups.sub_skill(id) {
        Some(sub) => describe_skill_at(sub, lookups, depth + 1),
        None => Ok(unavailable_sub_skill(id)),
    }
}

fn unavailable_sub_skill(id: i64) -> String {
    format!("└Sub-skill {id}: unavailable")
}

/// "Chance:" fragment for Rate/UseRate. 1000 reads as plain 100% and 5000 is
/// the upstream "always" sentinel; both suppress the fragment entirely.
fn rate_text(
    function: &Function,
    first: Option<i64>,
    field: impl Fn(&Sval) -> Option<i64>,
) -> Option<String> {
    let rate = first?;
    if rate == RATE_ALWAYS || rate == RATE_GUARANTEED {
        return None;
    }
    if function.svals.iter().all(|sval| field(sval).unwrap_or(rate) == rate) {
        return Some(format!("Chance: {}%", trim_decimal(rate as f64 / 10.0)));
    }
    let per_level: Vec<String> = function
        .svals
        .iter()
        .enumerate()
        .map(|(i, sval)| {
            let raw = field(sval).unwrap_or(rate);
            format!("{}{}%", trim_decimal(raw as f64 / 10.0), subscript(i + 1))
        })
        .collect();
    Some(format!("Chance: {}", per_level.join(" · ")))
}

/// First-entry values (or Corrections) across the five overcharge stage tables.
fn overcharge_values(function: &Function, buff_type: &str, func_type: &str, use_correction: bool) -> String {
    let stages = [
        &function.svals,
        &function.svals2,
        &function.svals3,
        &function.svals4,
        &function.svals5,
    ];
    let mut parts = Vec::new();
    for (i, stage) in stages.iter().enumerate() {
        let sval = match stage.first() {
            Some(sval) => sval,
            None => continue,
        };
        let raw = match if use_correction { sval.correction } else { sval.value } {
            Some(raw) => raw,
            None => continue,
        };
        parts.push(format!("{}{}", format_value(raw, buff_type, func_type), subscript(i + 1)));
    }
    format!("Value (Overcharge): {}", parts.join(" - "))
}

/// Scale a raw sval integer into its display form. The rules key off the buff
/// type tag first, falling back to the function type when no buff is attached.
pub fn format_value(raw: i64, buff_type: &str, func_type: &str) -> String {
    if buff_type.is_empty() {
        if func_type == "gainNp" || func_type == "lossNp" {
            return format!("{}%", trim_decimal(raw as f64 / 100.0));
        }
        if func_type.starts_with("damageNp") {
            return format!("{}%", trim_decimal(raw as f64 / 10.0));
        }
    }
    if buff_type == "upChagetd" {
        // Literal upstream tag; this one is stored unscaled. Do not "fix" the
        // spelling — it must match the payload byte for byte.
        return raw.to_string();
    }
    if buff_type.starts_with("up") || buff_type.starts_with("down") || buff_type.starts_with("donotAct") {
        return format!("{}%", trim_decimal(raw as f64 / 10.0));
    }
    if buff_type.starts_with("regainNp") {
        return format!("{}%", trim_decimal(raw as f64 / 100.0));
    }
    raw.to_string()
}

/// f64 Display is already the shortest round-trip form, so 30.0 prints as "30"
/// and 12.5 stays "12.5".
fn trim_decimal(value: f64) -> String {
    format!("{value}")
}

fn subscript(n: usize) -> String {
    n.to_string()
        .chars()
        .map(|c| match c.to_digit(10) {
            // U+2080..U+2089 are the subscript digits, in order.
            Some(digit) => char::from_u32(0x2080 + digit).unwrap_or(c),
            None => c,
        })
        .collect()
}

/// "upAtk" -> "Up Atk". API tags are camelCase; Discord output wants words.
pub fn title_case(tag: &str) -> String {
    if tag.is_empty() {
        return String::new();
    }
    tag.to_case(Case::Title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture_lookups() -> Lookups {
        let mut traits = HashMap::new();
        traits.insert("2019".to_string(), "demonic".to_string());
        traits.insert("301".to_string(), "alignmentGood".to_string());
        traits.insert("4001".to_string(), "cardArts".to_string());
        Lookups::new(Arc::new(traits), HashMap::new())
    }

    fn skill(value: serde_json::Value) -> Skill {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn formats_buff_values_by_tag_family() {
        assert_eq!(format_value(300, "upAtk", "addState"), "30%");
        assert_eq!(format_value(125, "downDefence", "addState"), "12.5%");
        assert_eq!(format_value(500, "donotActCommandtype", "addState"), "50%");
        assert_eq!(format_value(200, "regainNp", "addState"), "2%");
        assert_eq!(format_value(3000, "", "gainNp"), "30%");
        assert_eq!(format_value(10000, "", "lossNp"), "100%");
        assert_eq!(format_value(1000, "", "damageNpIndividual"), "100%");
        assert_eq!(format_value(3, "avoidance", "addState"), "3");
        assert_eq!(format_value(42, "", "gainStar"), "42");
    }

    #[test]
    fn up_chagetd_stays_unscaled() {
        // Historical tag match, spelling and all; the up* scaling must not apply.
        assert_eq!(format_value(2, "upChagetd", "addState"), "2");
        assert_eq!(format_value(300, "upCommandall", "addState"), "30%");
    }

    #[test]
    fn subscripts_and_decimals() {
        assert_eq!(subscript(1), "₁");
        assert_eq!(subscript(12), "₁₂");
        assert_eq!(trim_decimal(30.0), "30");
        assert_eq!(trim_decimal(12.5), "12.5");
    }

    #[test]
    fn title_cases_api_tags() {
        assert_eq!(title_case("upAtk"), "Up Atk");
        assert_eq!(title_case("ptAll"), "Pt All");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn trait_desc_links_and_card_traits() {
        let lookups = fixture_lookups();
        assert_eq!(
            lookups.trait_desc(2019),
            "[Demonic](https://apps.atlasacademy.io/db/JP/entities?trait=2019)"
        );
        // Card traits render bare.
        assert_eq!(lookups.trait_desc(4001), "Card Arts");
        // Unknown IDs degrade to a placeholder, never an error.
        assert_eq!(
            lookups.trait_desc(9999),
            "[Unknown](https://apps.atlasacademy.io/db/JP/entities?trait=9999)"
        );
    }

    #[test]
    fn variance_ignores_later_overcharge_stages() {
        let function: Function = serde_json::from_value(json!({
            "funcType": "damageNp",
            "svals":  [{"Value": 6000}, {"Value": 6000}],
            "svals2": [{"Value": 6000}],
            "svals3": [{"Value": 999999, "Correction": 12345}],
            "svals5": [{"Value": 1}]
        }))
        .unwrap();
        assert_eq!(np_variance(&function), Variance::default());
    }

    #[test]
    fn variance_by_level_and_overcharge() {
        let by_level: Function = serde_json::from_value(json!({
            "funcType": "damageNp",
            "svals":  [{"Value": 6000}, {"Value": 7500}],
            "svals2": [{"Value": 6000}]
        }))
        .unwrap();
        assert_eq!(np_variance(&by_level), Variance { level: true, overcharge: false });

        let by_correction: Function = serde_json::from_value(json!({
            "funcType": "damageNpIndividual",
            "svals":  [{"Value": 6000, "Correction": 1500}, {"Value": 6000, "Correction": 1500}],
            "svals2": [{"Value": 6000, "Correction": 2000}]
        }))
        .unwrap();
        assert_eq!(np_variance(&by_correction), Variance { level: false, overcharge: true });
    }

    #[test]
    fn grants_buff_with_turns() {
        let skill = skill(json!({
            "id": 1,
            "name": "Charisma",
            "coolDown": [7],
            "functions": [{
                "funcType": "addState",
                "funcTargetType": "ptAll",
                "funcTargetTeam": "player",
                "funcPopupText": "Attack Up",
                "buffs": [{"type": "upAtk"}],
                "svals": [{"Rate": 1000, "Turn": 3, "Value": 300}]
            }]
        }));
        let desc = describe_skill(&skill, &fixture_lookups()).unwrap();
        assert_eq!(
            desc,
            "**Base Cooldown:** 7\n**Effect 1**: Grants [Up Atk] (30%) to [Pt All] (3 Turns)"
        );
    }

    #[test]
    fn skipped_functions_consume_no_index() {
        let skill = skill(json!({
            "id": 1,
            "name": "Test",
            "functions": [
                {"funcType": "gainNp", "funcTargetType": "enemyAll", "funcTargetTeam": "enemy",
                 "svals": [{"Value": 10000}]},
                {"funcType": "none", "funcTargetType": "self", "funcTargetTeam": "player",
                 "svals": [{"Value": 1}]},
                {"funcType": "gainStar", "funcTargetType": "self", "funcTargetTeam": "player",
                 "funcPopupText": "Gain Critical Stars",
                 "svals": [{"Rate": 1000, "Value": 10}]}
            ]
        }));
        let desc = describe_skill(&skill, &fixture_lookups()).unwrap();
        assert_eq!(desc, "**Effect 1**: Gain Critical Stars (10) to [Self]");
    }

    #[test]
    fn empty_svals_is_a_hard_error() {
        let skill = skill(json!({
            "id": 1,
            "name": "Broken",
            "functions": [{"funcType": "gainStar", "funcTargetTeam": "player", "svals": []}]
        }));
        let err = describe_skill(&skill, &fixture_lookups()).unwrap_err();
        assert!(matches!(err, DescribeError::EmptySvals { .. }));
    }

    #[test]
    fn np_level_variance_without_overcharge() {
        let skill = skill(json!({
            "id": 2,
            "name": "Test NP",
            "card": "buster",
            "functions": [{
                "funcType": "damageNp",
                "funcTargetType": "enemyAll",
                "funcTargetTeam": "playerAndEnemy",
                "svals":  [{"Rate": 1000, "Value": 6000}, {"Rate": 1000, "Value": 7500},
                           {"Rate": 1000, "Value": 9000}, {"Rate": 1000, "Value": 9750},
                           {"Rate": 1000, "Value": 10500}],
                "svals2": [{"Rate": 1000, "Value": 6000}],
                "svals3": [{"Rate": 1000, "Value": 6000}],
                "svals4": [{"Rate": 1000, "Value": 6000}],
                "svals5": [{"Rate": 1000, "Value": 6000}]
            }]
        }));
        let desc = describe_skill(&skill, &fixture_lookups()).unwrap();
        assert_eq!(
            desc,
            "**Effect 1**: Deals damage to [Enemy All]\n\
             Value (Level): 600%₁ · 750%₂ · 900%₃ · 975%₄ · 1050%₅"
        );
    }

    #[test]
    fn np_overcharge_correction_list() {
        let skill = skill(json!({
            "id": 3,
            "name": "Supereffective NP",
            "card": "arts",
            "functions": [{
                "funcType": "damageNpIndividual",
                "funcTargetType": "enemyAll",
                "funcTargetTeam": "playerAndEnemy",
                "svals":  [{"Rate": 1000, "Value": 6000, "Correction": 1500, "Target": 2019},
                           {"Rate": 1000, "Value": 7500, "Correction": 1500, "Target": 2019}],
                "svals2": [{"Rate": 1000, "Value": 6000, "Correction": 2000, "Target": 2019}],
                "svals3": [{"Rate": 1000, "Value": 6000, "Correction": 2500, "Target": 2019}],
                "svals4": [{"Rate": 1000, "Value": 6000, "Correction": 3000, "Target": 2019}],
                "svals5": [{"Rate": 1000, "Value": 6000, "Correction": 3500, "Target": 2019}]
            }]
        }));
        let desc = describe_skill(&skill, &fixture_lookups()).unwrap();
        let lines: Vec<&str> = desc.lines().collect();
        assert_eq!(
            lines[0],
            "**Effect 1**: Deals damage to [Enemy All] with bonus damage to \
             [[Demonic](https://apps.atlasacademy.io/db/JP/entities?trait=2019)]"
        );
        assert_eq!(lines[1], "Value (Level): 600%₁ · 750%₂");
        assert_eq!(
            lines[2],
            "Value (Overcharge): 150%₁ - 200%₂ - 250%₃ - 300%₄ - 350%₅"
        );
    }

    #[test]
    fn bonus_damage_resolves_on_the_flat_value_path_too() {
        // All levels equal: the generic value path would have skipped Target.
        let skill = skill(json!({
            "id": 4,
            "name": "Flat NP",
            "card": "buster",
            "functions": [{
                "funcType": "damageNpIndividual",
                "funcTargetType": "enemyOne",
                "funcTargetTeam": "playerAndEnemy",
                "svals":  [{"Rate": 1000, "Value": 6000, "Target": 2019}],
                "svals2": [{"Rate": 1000, "Value": 6000, "Target": 2019}]
            }]
        }));
        let desc = describe_skill(&skill, &fixture_lookups()).unwrap();
        assert!(desc.starts_with(
            "**Effect 1**: Deals damage to [Enemy One] with bonus damage to [[Demonic]"
        ));
    }

    #[test]
    fn chance_sentinels_suppress_chance_text() {
        for rate in [RATE_ALWAYS, RATE_GUARANTEED] {
            let skill = skill(json!({
                "id": 5,
                "name": "Test",
                "functions": [{
                    "funcType": "addState",
                    "funcTargetType": "self",
                    "funcTargetTeam": "player",
                    "buffs": [{"type": "avoidance"}],
                    "svals": [{"Rate": rate, "Turn": 1, "Count": 1, "Value": 0}]
                }]
            }));
            let desc = describe_skill(&skill, &fixture_lookups()).unwrap();
            assert!(!desc.contains("Chance"), "rate {rate} should not render: {desc}");
        }
    }

    #[test]
    fn chance_and_use_rate_lines() {
        let skill = skill(json!({
            "id": 6,
            "name": "Gamble",
            "functions": [{
                "funcType": "addState",
                "funcTargetType": "self",
                "funcTargetTeam": "player",
                "buffs": [{"type": "upCriticaldamage"}],
                "svals": [{"Rate": 600, "UseRate": 800, "Turn": 3, "Value": 500},
                          {"Rate": 650, "UseRate": 800, "Turn": 3, "Value": 500},
                          {"Rate": 700, "UseRate": 800, "Turn": 3, "Value": 500}]
            }]
        }));
        let desc = describe_skill(&skill, &fixture_lookups()).unwrap();
        let lines: Vec<&str> = desc.lines().collect();
        assert_eq!(
            lines[0],
            "**Effect 1**: Grants [Up Criticaldamage] (50%) to [Self] (3 Turns)"
        );
        assert_eq!(lines[1], "Chance: 60₁% · 65₂% · 70₃%");
        assert_eq!(lines[2], "Chance: 80%");
    }

    #[test]
    fn counts_and_turns_join_in_order() {
        let skill = skill(json!({
            "id": 7,
            "name": "Evade",
            "functions": [{
                "funcType": "addState",
                "funcTargetType": "self",
                "funcTargetTeam": "player",
                "buffs": [{"type": "avoidance"}],
                "svals": [{"Rate": 1000, "Turn": 3, "Count": 2, "Value": 0}]
            }]
        }));
        let desc = describe_skill(&skill, &fixture_lookups()).unwrap();
        assert_eq!(desc, "**Effect 1**: Grants [Avoidance] (0) to [Self] (2 Times, 3 Turns)");
    }

    #[test]
    fn addstate_qualifiers_in_order() {
        let skill = skill(json!({
            "id": 8,
            "name": "Field Buff",
            "functions": [{
                "funcType": "addState",
                "funcTargetType": "ptAll",
                "funcTargetTeam": "player",
                "funcquestTvals": [{"id": 94000046, "name": "cityStreet"}],
                "functvals": [{"id": 2019, "name": "demonic"}, {"id": 5010, "name": "notReachable"}],
                "buffs": [{"type": "upAtk",
                           "ckSelfIndv": [{"id": 4001, "name": "cardArts"}],
                           "ckOpIndv": [{"id": 2019, "name": "demonic"}, {"id": 4003, "name": "cardQuick"}]}],
                "svals": [{"Rate": 1000, "Turn": 3, "Value": 300}]
            }]
        }));
        let desc = describe_skill(&skill, &fixture_lookups()).unwrap();
        assert_eq!(
            desc,
            "**Effect 1**: Grants [Up Atk] on [City Street] to [Card Arts] against \
             [[Demonic](https://apps.atlasacademy.io/db/JP/entities?trait=2019), Card Quick] (30%) \
             to [Pt All] with trait [[Demonic](https://apps.atlasacademy.io/db/JP/entities?trait=2019)] (3 Turns)"
        );
    }

    #[test]
    fn add_individuality_renders_the_trait_name() {
        let skill = skill(json!({
            "id": 9,
            "name": "Mark",
            "functions": [{
                "funcType": "addState",
                "funcTargetType": "self",
                "funcTargetTeam": "player",
                "buffs": [{"type": "addIndividuality"}],
                "svals": [{"Rate": 1000, "Turn": 3, "Value": 2019}]
            }]
        }));
        let desc = describe_skill(&skill, &fixture_lookups()).unwrap();
        assert_eq!(
            desc,
            "**Effect 1**: Grants [Add Individuality] \
             ([Demonic](https://apps.atlasacademy.io/db/JP/entities?trait=2019)) to [Self] (3 Turns)"
        );
    }

    fn trigger_skill(sub: Option<Skill>) -> (Skill, Lookups) {
        let parent = skill(json!({
            "id": 10,
            "name": "Trigger",
            "coolDown": [8],
            "functions": [{
                "funcType": "addState",
                "funcTargetType": "self",
                "funcTargetTeam": "player",
                "buffs": [{"type": "delayFunction"}],
                "svals": [{"Rate": 1000, "Turn": 3, "Value": 970285}]
            }]
        }));
        let mut traits = HashMap::new();
        traits.insert("2019".to_string(), "demonic".to_string());
        let mut sub_skills = HashMap::new();
        sub_skills.insert(970285, sub);
        (parent, Lookups::new(Arc::new(traits), sub_skills))
    }

    #[test]
    fn sub_skill_expands_one_level() {
        let sub = skill(json!({
            "id": 970285,
            "name": "Hidden Effect",
            "coolDown": [9],
            "functions": [{
                "funcType": "addState",
                "funcTargetType": "self",
                "funcTargetTeam": "player",
                "buffs": [{"type": "upDefence"}],
                "svals": [{"Rate": 1000, "Turn": 1, "Value": 200}]
            }]
        }));
        let (parent, lookups) = trigger_skill(Some(sub));
        let desc = describe_skill(&parent, &lookups).unwrap();
        assert_eq!(
            desc,
            "**Base Cooldown:** 8\n\
             **Effect 1**: Grants [Delay Function] to [Self] (3 Turns)\n\
             **└Sub-Effect 1**: Grants [Up Defence] (20%) to [Self] (1 Turns)"
        );
    }

    #[test]
    fn missing_sub_skill_renders_a_placeholder() {
        let (parent, lookups) = trigger_skill(None);
        let desc = describe_skill(&parent, &lookups).unwrap();
        assert_eq!(
            desc,
            "**Base Cooldown:** 8\n\
             **Effect 1**: Grants [Delay Function] to [Self] (3 Turns)\n\
             └Sub-skill 970285: unavailable"
        );
    }

    #[test]
    fn describe_skill_is_idempotent() {
        let skill = skill(json!({
            "id": 11,
            "name": "Test",
            "coolDown": [7],
            "functions": [{
                "funcType": "gainNp",
                "funcTargetType": "self",
                "funcTargetTeam": "player",
                "funcPopupText": "Charge NP",
                "svals": [{"Rate": 1000, "Value": 3000}]
            }]
        }));
        let lookups = fixture_lookups();
        let first = describe_skill(&skill, &lookups).unwrap();
        let second = describe_skill(&skill, &lookups).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "**Base Cooldown:** 7\n**Effect 1**: Charge NP (30%) to [Self]");
    }

    #[test]
    fn sub_skill_refs_scans_function_buffs_only() {
        let skill = skill(json!({
            "id": 12,
            "name": "Mixed",
            "functions": [
                {"funcType": "addState", "funcTargetTeam": "player",
                 "buffs": [{"type": "deadFunction"}], "svals": [{"Value": 12345}]},
                {"funcType": "addState", "funcTargetTeam": "enemy",
                 "buffs": [{"type": "delayFunction"}], "svals": [{"Value": 777}]},
                {"funcType": "addState", "funcTargetTeam": "player",
                 "buffs": [{"type": "upAtk"}], "svals": [{"Value": 300}]}
            ]
        }));
        assert_eq!(sub_skill_refs(&skill), vec![12345]);
    }
}
