//! Effect-based search behind /skill, /np, and /skill-or-np.
//!
//! Each provided filter produces its own list of matching skills (via the
//! function, buff, and trait search endpoints); the result is the
//! order-preserving intersection of every list that was actually given.

use crate::atlas::model::{BasicFunction, BasicSkill};
use crate::atlas::{AtlasClient, SearchFlag, DB_BASE, DEFAULT_REGION};
use crate::commands::str_option;
use crate::discord::{InteractionRefs, BLURPLE};
use crate::text::title_case;
use anyhow::Result;
use twilight_model::application::interaction::application_command::CommandDataOption;
use twilight_model::channel::message::embed::EmbedField;
use twilight_model::channel::message::Embed;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder};

const SERVANTS_PER_PAGE: usize = 5;

pub struct SkillQuery {
    pub func_type: String,
    pub func_type2: String,
    pub target: String,
    pub buff: String,
    pub buff2: String,
    pub trait_id: String,
    pub region: String,
}

impl SkillQuery {
    pub fn from_options(options: &[CommandDataOption]) -> Self {
        let mut region = str_option(options, "region");
        if region.is_empty() {
            region = DEFAULT_REGION.to_string();
        }
        Self {
            func_type: str_option(options, "type"),
            func_type2: str_option(options, "type2"),
            target: str_option(options, "target"),
            buff: str_option(options, "buff"),
            buff2: str_option(options, "buff2"),
            trait_id: str_option(options, "trait"),
            region,
        }
    }

    /// True when no filter was given; region alone is not a filter.
    pub fn is_empty(&self) -> bool {
        self.func_type.is_empty()
            && self.func_type2.is_empty()
            && self.target.is_empty()
            && self.buff.is_empty()
            && self.buff2.is_empty()
            && self.trait_id.is_empty()
    }
}

pub async fn run(
    refs: &InteractionRefs<'_>,
    options: &[CommandDataOption],
    flags: &[SearchFlag],
) -> Result<()> {
    let query = SkillQuery::from_options(options);
    if query.is_empty() {
        return refs.reply_text("Invalid input.").await;
    }
    refs.defer().await?;
    let mut pages = Vec::new();
    for flag in flags {
        pages.extend(search_pages(&refs.state.atlas, &query, *flag).await?);
    }
    refs.send_pages(pages).await
}

async fn search_pages(atlas: &AtlasClient, query: &SkillQuery, flag: SearchFlag) -> Result<Vec<Embed>> {
    let region = query.region.as_str();
    let lists = [
        skills_with_type(atlas, &query.func_type, flag, &query.target, region).await?,
        skills_with_type(atlas, &query.func_type2, flag, &query.target, region).await?,
        skills_with_buff(atlas, &query.buff, flag, region).await?,
        skills_with_buff(atlas, &query.buff2, flag, region).await?,
        skills_with_trait(atlas, &query.trait_id, flag, &query.target, region).await?,
    ];
    let matched = common_elements(&lists);

    let header = query_embed(atlas, query, flag).await?;
    let mut pages: Vec<Embed> = Vec::new();
    let mut current = header.clone();
    let mut page_count = 0;
    let mut total = 0;

    for skill in &matched {
        // The basic document carries no skill type; fetch the nice one to
        // filter out passives, as the original did.
        let details = match atlas.nice_skill(flag, skill.id, region).await? {
            Some(details) => details,
            None => continue,
        };
        if details.kind.as_deref() == Some("passive") {
            continue;
        }

        let mut seen: Vec<String> = Vec::new();
        for servant in skill.servants() {
            if servant.name.is_empty() || (servant.kind != "normal" && servant.kind != "heroine") {
                continue;
            }
            let label = format!("{} ({})", servant.name, title_case(&servant.class_name));
            if seen.contains(&label) {
                continue;
            }
            seen.push(label.clone());
            total += 1;
            if page_count >= SERVANTS_PER_PAGE {
                pages.push(current);
                current = header.clone();
                page_count = 0;
            }
            current.fields.push(EmbedField {
                inline: false,
                name: format!("{total}: {label}"),
                value: format!(
                    "[{}]({DB_BASE}/{region}/{}/{})",
                    skill.name,
                    flag.db_path(),
                    skill.id
                ),
            });
            page_count += 1;
        }
    }

    if total == 0 {
        current.fields.push(EmbedField {
            inline: false,
            name: "Not found.".to_owned(),
            value: "Try different parameters".to_owned(),
        });
    }
    pages.push(current);

    for page in &mut pages {
        page.description = Some(format!("{total} matching servant entries"));
    }
    Ok(pages)
}

async fn skills_with_type(
    atlas: &AtlasClient,
    func_type: &str,
    flag: SearchFlag,
    target: &str,
    region: &str,
) -> Result<Option<Vec<BasicSkill>>> {
    if func_type.is_empty() {
        return Ok(None);
    }
    let functions = atlas.functions_search(func_type, target, region).await?;
    Ok(Some(skills_from_functions(&functions, flag)))
}

async fn skills_with_buff(
    atlas: &AtlasClient,
    buff_type: &str,
    flag: SearchFlag,
    region: &str,
) -> Result<Option<Vec<BasicSkill>>> {
    if buff_type.is_empty() {
        return Ok(None);
    }
    let buffs = atlas.buff_search(buff_type, region).await?;
    let mut skills = Vec::new();
    for buff in &buffs {
        skills.extend(skills_from_functions(buff.functions(), flag));
    }
    Ok(Some(skills))
}

async fn skills_with_trait(
    atlas: &AtlasClient,
    trait_id: &str,
    flag: SearchFlag,
    target: &str,
    region: &str,
) -> Result<Option<Vec<BasicSkill>>> {
    if trait_id.is_empty() {
        return Ok(None);
    }
    match flag {
        SearchFlag::Skill => {
            let functions = atlas.functions_by_trait(trait_id, target, region).await?;
            Ok(Some(skills_from_functions(&functions, flag)))
        }
        SearchFlag::NoblePhantasm => Ok(Some(atlas.nps_by_trait(trait_id, region).await?)),
    }
}

/// Skills (or NPs) reachable from a function list, dropping unnamed and
/// passive entries and anything owned only by equips or enemies.
fn skills_from_functions(functions: &[BasicFunction], flag: SearchFlag) -> Vec<BasicSkill> {
    let mut found = Vec::new();
    for function in functions {
        let skills = match flag {
            SearchFlag::Skill => function.skills(),
            SearchFlag::NoblePhantasm => function.noble_phantasms(),
        };
        for skill in skills {
            if skill.name.is_empty() || skill.kind == "passive" {
                continue;
            }
            let owned_by_servant = skill
                .servants()
                .iter()
                .any(|servant| {
                    !servant.name.is_empty()
                        && servant.kind != "servantEquip"
                        && servant.kind != "enemy"
                });
            if owned_by_servant {
                found.push(skill.clone());
            }
        }
    }
    found
}

/// Order-preserving, deduplicated intersection by skill id. Lists that were
/// not provided (None) are ignored; a provided-but-empty list means no result.
fn common_elements(lists: &[Option<Vec<BasicSkill>>]) -> Vec<BasicSkill> {
    let mut common: Option<Vec<BasicSkill>> = None;
    for list in lists.iter().flatten() {
        if list.is_empty() {
            return Vec::new();
        }
        common = Some(match common {
            None => list.clone(),
            Some(kept) => kept
                .into_iter()
                .filter(|skill| list.iter().any(|other| other.id == skill.id))
                .collect(),
        });
    }
    let mut result: Vec<BasicSkill> = Vec::new();
    for skill in common.unwrap_or_default() {
        if !result.iter().any(|existing| existing.id == skill.id) {
            result.push(skill);
        }
    }
    result
}

/// Header embed echoing the search parameters back, one field per filter.
async fn query_embed(atlas: &AtlasClient, query: &SkillQuery, flag: SearchFlag) -> Result<Embed> {
    let mut builder = EmbedBuilder::new().title(flag.heading()).color(BLURPLE);
    if !query.func_type.is_empty() {
        builder = builder.field(EmbedFieldBuilder::new("Type 1", title_case(&query.func_type)).inline());
    }
    if !query.func_type2.is_empty() {
        builder = builder.field(EmbedFieldBuilder::new("Type 2", title_case(&query.func_type2)).inline());
    }
    if !query.target.is_empty() {
        builder = builder.field(EmbedFieldBuilder::new("Target", title_case(&query.target)).inline());
    }
    if !query.buff.is_empty() {
        builder = builder.field(EmbedFieldBuilder::new("Buff 1", title_case(&query.buff)).inline());
    }
    if !query.buff2.is_empty() {
        builder = builder.field(EmbedFieldBuilder::new("Buff 2", title_case(&query.buff2)).inline());
    }
    if !query.trait_id.is_empty() {
        let traits = atlas.traits().await?;
        let name = traits
            .get(&query.trait_id)
            .cloned()
            .unwrap_or_else(|| "unknown".to_owned());
        builder = builder.field(EmbedFieldBuilder::new("Affected Trait", title_case(&name)).inline());
    }
    builder = builder.field(EmbedFieldBuilder::new("Region", query.region.clone()).inline());
    Ok(builder.build())
}
