//! /servant: search by name, voice actor, or class, then render the servant's
//! info as embed pages. Skill and NP bodies come from the description
//! generator rather than the upstream blurbs, so every effect shows its
//! actual numbers.

use crate::atlas::model::{Servant, Skill};
use crate::atlas::{AtlasClient, DB_BASE, DEFAULT_REGION};
use crate::commands::str_option;
use crate::discord::{
    button_rows, truncate_for_embed, InteractionRefs, BLURPLE, EMBED_FIELD_LIMIT,
};
use crate::text::{describe_skill, title_case, Lookups};
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use twilight_model::application::interaction::application_command::CommandDataOption;
use twilight_model::channel::message::Embed;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder, ImageSource};

const MAX_MATCH_BUTTONS: usize = 25;

pub async fn run(refs: &InteractionRefs<'_>, options: &[CommandDataOption]) -> Result<()> {
    let name = str_option(options, "servant-name");
    let cv = str_option(options, "cv");
    let class_name = str_option(options, "class-name");
    let mut region = str_option(options, "region");
    if region.is_empty() {
        region = DEFAULT_REGION.to_string();
    }

    if name.is_empty() && cv.is_empty() && class_name.is_empty() {
        return refs.reply_text("Invalid input.").await;
    }

    refs.defer().await?;
    let matches = refs
        .state
        .atlas
        .servant_search(&name, &cv, &class_name, &region)
        .await?;

    match matches.len() {
        0 => refs.update_text("Not found.").await,
        1 => {
            let pages = load_pages(&refs.state.atlas, matches[0].id, &region).await?;
            refs.send_pages(pages).await
        }
        _ => {
            let mut embed = EmbedBuilder::new()
                .title(format!("{} matches found.", matches.len()))
                .color(BLURPLE);
            if !name.is_empty() {
                embed = embed.field(EmbedFieldBuilder::new("Servant name", name.clone()).inline());
            }
            if !cv.is_empty() {
                let cv_name = refs.state.atlas.cv_name(&cv, &region).await?;
                embed = embed.field(EmbedFieldBuilder::new("CV", cv_name).inline());
            }
            if !class_name.is_empty() {
                embed = embed.field(EmbedFieldBuilder::new("Class", title_case(&class_name)).inline());
            }
            embed = embed.field(EmbedFieldBuilder::new("Region", region.clone()).inline());

            let listing: Vec<String> = matches
                .iter()
                .take(MAX_MATCH_BUTTONS)
                .enumerate()
                .map(|(i, servant)| {
                    format!("{}: {} ({})", i + 1, servant.name, title_case(&servant.class_name))
                })
                .collect();
            let embed = embed.description(listing.join("\n")).build();
            let buttons: Vec<(String, String)> = matches
                .iter()
                .take(MAX_MATCH_BUTTONS)
                .enumerate()
                .map(|(i, servant)| (format!("servant:{}:{region}", servant.id), (i + 1).to_string()))
                .collect();
            refs.send_embed_with_components(embed, button_rows(buttons)).await
        }
    }
}

/// A pick button from the multi-match chooser: `servant:<id>:<region>`.
pub async fn select(refs: &InteractionRefs<'_>, custom_id: &str) -> Result<()> {
    let mut parts = custom_id.splitn(3, ':');
    parts.next(); // "servant"
    let id: i64 = parts
        .next()
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| anyhow!("malformed servant pick id `{custom_id}`"))?;
    let region = parts.next().unwrap_or(DEFAULT_REGION).to_string();

    // Ack first: building the pages needs several Atlas round trips.
    refs.ack_component().await?;
    let pages = load_pages(&refs.state.atlas, id, &region).await?;
    refs.send_pages(pages).await
}

async fn load_pages(atlas: &AtlasClient, id: i64, region: &str) -> Result<Vec<Embed>> {
    let servant = atlas
        .servant_by_id(id, region)
        .await?
        .with_context(|| format!("servant {id} not found"))?;
    let lookups = atlas.servant_lookups(&servant, region).await?;
    servant_pages(&servant, &lookups, region)
}

/// Everything shown for one servant, one embed per page.
fn servant_pages(servant: &Servant, lookups: &Lookups, region: &str) -> Result<Vec<Embed>> {
    let mut pages = Vec::new();
    let caption = format!("{} ({})", servant.name, title_case(&servant.class_name));
    let face = servant
        .extra_assets
        .faces
        .ascension
        .get("1")
        .or_else(|| servant.extra_assets.faces.ascension.get("0"))
        .cloned();

    // Basic info
    let mut basic = EmbedBuilder::new().title("Basic Info").color(BLURPLE);
    if let Some(face) = &face {
        basic = basic.thumbnail(ImageSource::url(face)?);
    }
    let mut display_name = servant.name.clone();
    if region == "JP" && !servant.ruby.is_empty() && servant.ruby != servant.name {
        display_name.push('\n');
        display_name.push_str(&servant.ruby);
    }
    basic = basic.field(EmbedFieldBuilder::new("Name", display_name).inline());
    let rarity = if servant.rarity == 0 {
        "☆".to_owned()
    } else {
        "★".repeat(servant.rarity as usize)
    };
    basic = basic.field(EmbedFieldBuilder::new("Rarity", rarity).inline());
    basic = basic.field(EmbedFieldBuilder::new("Class", title_case(&servant.class_name)).inline());
    basic = basic.field(EmbedFieldBuilder::new("Attribute", title_case(&servant.attribute)).inline());
    let card_layout: String = servant
        .cards
        .iter()
        .filter_map(|card| card.chars().next())
        .map(|initial| initial.to_ascii_uppercase())
        .collect();
    if !card_layout.is_empty() {
        basic = basic.field(EmbedFieldBuilder::new("Cards", card_layout).inline());
    }

    // Alignments are the 3-digit trait IDs starting with 3; display traits are
    // the 4-digit ones starting with 2.
    let mut alignments = Vec::new();
    let mut other_traits = Vec::new();
    for tval in &servant.traits {
        let id = tval.id.to_string();
        if id.starts_with('3') && id.len() == 3 {
            alignments.push(title_case(&tval.name.replace("alignment", "")));
        }
        if id.starts_with('2') && id.len() == 4 {
            other_traits.push(title_case(&tval.name));
        }
    }
    if !alignments.is_empty() {
        basic = basic.field(EmbedFieldBuilder::new("Alignments", alignments.join(" ")).inline());
    }
    if !other_traits.is_empty() {
        basic = basic.field(EmbedFieldBuilder::new("Traits", other_traits.join(", ")));
    }
    basic = basic.field(EmbedFieldBuilder::new("Gender", title_case(&servant.gender)).inline());
    if let Some(profile) = &servant.profile {
        if !profile.cv.is_empty() {
            basic = basic.field(EmbedFieldBuilder::new("Voice Actor", profile.cv.clone()).inline());
        }
        if !profile.illustrator.is_empty() {
            basic = basic
                .field(EmbedFieldBuilder::new("Illustrator", profile.illustrator.clone()).inline());
        }
    }
    pages.push(basic.build());

    // Skills, in slot order then unlock order (strengthened versions last)
    if !servant.skills.is_empty() {
        let mut embed = EmbedBuilder::new()
            .title("Skills")
            .description(caption.clone())
            .color(BLURPLE);
        if let Some(face) = &face {
            embed = embed.thumbnail(ImageSource::url(face)?);
        }
        let mut skills: Vec<&Skill> = servant.skills.iter().collect();
        skills.sort_by_key(|skill| (skill.num.unwrap_or(0), skill.id));
        for skill in skills {
            let body = describe_skill(skill, lookups)?;
            let body = if body.is_empty() {
                "No effect data.".to_owned()
            } else {
                body
            };
            embed = embed.field(EmbedFieldBuilder::new(
                format!("Skill {}: {}", skill.num.unwrap_or(0), skill.name),
                truncate_for_embed(&body, EMBED_FIELD_LIMIT),
            ));
        }
        pages.push(embed.build());
    }

    // Skill materials
    if !servant.skill_materials.is_empty() {
        let mut embed = EmbedBuilder::new()
            .title("Skill Materials")
            .description(caption.clone())
            .color(BLURPLE);
        for (level, mats) in sorted_numeric(&servant.skill_materials) {
            let mut lines: Vec<String> = mats
                .items
                .iter()
                .map(|entry| {
                    format!(
                        "[{}]({DB_BASE}/{region}/item/{}) x {}",
                        entry.item.name, entry.item.id, entry.amount
                    )
                })
                .collect();
            lines.push(format!("QP: {}", group_digits(mats.qp)));
            embed = embed.field(
                EmbedFieldBuilder::new(format!("{}→{}:", level - 1, level), lines.join("\n"))
                    .inline(),
            );
        }
        pages.push(embed.build());
    }

    // Noble phantasms
    if !servant.noble_phantasms.is_empty() {
        let mut embed = EmbedBuilder::new()
            .title("Noble Phantasms")
            .description(caption.clone())
            .color(BLURPLE);
        if let Some(face) = &face {
            embed = embed.thumbnail(ImageSource::url(face)?);
        }
        for (i, np) in servant.noble_phantasms.iter().enumerate() {
            let body = describe_skill(np, lookups)?;
            let body = if body.is_empty() {
                "No effect data.".to_owned()
            } else {
                body
            };
            embed = embed.field(EmbedFieldBuilder::new(
                format!(
                    "Noble Phantasm {}: {} {} ({})",
                    i + 1,
                    np.name,
                    np.rank.as_deref().unwrap_or(""),
                    capitalize(np.card.as_deref().unwrap_or("")),
                ),
                truncate_for_embed(&body, EMBED_FIELD_LIMIT),
            ));
        }
        pages.push(embed.build());
    }

    // One page per ascension art
    for (index, (_, image_url)) in sorted_numeric(&servant.extra_assets.chara_graph.ascension)
        .into_iter()
        .enumerate()
    {
        let mut embed = EmbedBuilder::new()
            .title(format!("Ascension #{}", index + 1))
            .description(caption.clone())
            .color(BLURPLE);
        if let Some(mats) = servant.ascension_materials.get(&index.to_string()) {
            let mut lines: Vec<String> = mats
                .items
                .iter()
                .map(|entry| {
                    format!(
                        "[{}]({DB_BASE}/{region}/item/{}) x {}",
                        entry.item.name, entry.item.id, entry.amount
                    )
                })
                .collect();
            lines.push(format!("QP: {}", group_digits(mats.qp)));
            embed = embed.field(EmbedFieldBuilder::new("Required Materials", lines.join("\n")));
        }
        embed = embed.image(ImageSource::url(image_url)?);
        pages.push(embed.build());
    }

    Ok(pages)
}

/// String-keyed maps from the API are really int-keyed; sort them that way.
fn sorted_numeric<T>(map: &HashMap<String, T>) -> Vec<(i64, &T)> {
    let mut entries: Vec<(i64, &T)> = map
        .iter()
        .filter_map(|(key, value)| key.parse().ok().map(|n| (n, value)))
        .collect();
    entries.sort_by_key(|(n, _)| *n);
    entries
}

fn group_digits(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 {
        format!("-{out}")
    } else {
        out
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
