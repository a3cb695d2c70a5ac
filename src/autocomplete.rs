//! Autocomplete sources for the command options: enum tables and the trait
//! and CV lists, all served from the cached exports. Filtering matches the
//! raw tag and its title-cased form, case-insensitively.

use crate::atlas::AtlasClient;
use crate::commands::focused_option;
use crate::discord::InteractionRefs;
use crate::text::title_case;
use anyhow::Result;
use twilight_model::application::command::{CommandOptionChoice, CommandOptionChoiceValue};
use twilight_model::application::interaction::application_command::CommandDataOption;

const MAX_CHOICES: usize = 24;

pub async fn run(
    refs: &InteractionRefs<'_>,
    command: &str,
    options: &[CommandDataOption],
) -> Result<()> {
    let focused = match focused_option(options) {
        Some(focused) => focused,
        None => return refs.autocomplete(Vec::new()).await,
    };
    let (name, partial) = focused;
    let atlas = &refs.state.atlas;
    let choices = match (command, name) {
        (_, "region") => region_choices(),
        ("servant", "cv") => cv_choices(atlas, partial).await?,
        ("servant", "class-name") => enum_choices(atlas, "SvtClass", partial).await?,
        (_, "type" | "type2") => enum_choices(atlas, "NiceFuncType", partial).await?,
        (_, "target") => enum_choices(atlas, "NiceFuncTargetType", partial).await?,
        (_, "buff" | "buff2") => enum_choices(atlas, "NiceBuffType", partial).await?,
        (_, "trait") => trait_choices(atlas, partial).await?,
        _ => Vec::new(),
    };
    refs.autocomplete(choices).await
}

fn region_choices() -> Vec<CommandOptionChoice> {
    vec![
        choice("NA".to_owned(), "NA".to_owned()),
        choice("JP".to_owned(), "JP".to_owned()),
    ]
}

async fn enum_choices(
    atlas: &AtlasClient,
    enum_type: &str,
    partial: &str,
) -> Result<Vec<CommandOptionChoice>> {
    let table = atlas.enum_table(enum_type).await?;
    let needle = partial.to_uppercase();
    Ok(table
        .values()
        .filter(|option| matches_filter(option, &needle))
        .take(MAX_CHOICES)
        .map(|option| choice(title_case(option), option.clone()))
        .collect())
}

/// Display traits are the 4-digit IDs starting with 2; the choice value is
/// the trait ID itself, which is what the search endpoints take.
async fn trait_choices(atlas: &AtlasClient, partial: &str) -> Result<Vec<CommandOptionChoice>> {
    let traits = atlas.traits().await?;
    let needle = partial.to_uppercase();
    let mut entries: Vec<(&String, &String)> = traits
        .iter()
        .filter(|(id, name)| is_display_trait(id) && matches_filter(name, &needle))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    Ok(entries
        .into_iter()
        .take(MAX_CHOICES)
        .map(|(id, name)| choice(title_case(name), id.clone()))
        .collect())
}

async fn cv_choices(atlas: &AtlasClient, partial: &str) -> Result<Vec<CommandOptionChoice>> {
    let list = atlas.cv_choices().await?;
    let needle = partial.to_uppercase();
    Ok(list
        .iter()
        .filter(|(_, label)| needle.is_empty() || label.to_uppercase().contains(&needle))
        .take(MAX_CHOICES)
        .map(|(id, label)| choice(label.clone(), id.to_string()))
        .collect())
}

fn is_display_trait(id: &str) -> bool {
    id.starts_with('2') && id.len() == 4
}

fn matches_filter(option: &str, needle: &str) -> bool {
    needle.is_empty()
        || option.to_uppercase().contains(needle)
        || title_case(option).to_uppercase().contains(needle)
}

fn choice(name: String, value: String) -> CommandOptionChoice {
    CommandOptionChoice {
        name,
        name_localizations: None,
        value: CommandOptionChoiceValue::String(value),
    }
}
