//! This contains all the slash commands the bot understands.
//! Adding a command here registers it with Discord on startup; the event
//! listener dispatches on the names defined here.

use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::application_command::{
    CommandDataOption, CommandOptionValue,
};
use twilight_util::builder::command::{CommandBuilder, StringBuilder};

pub fn all() -> Vec<Command> {
    vec![
        servant(),
        effect_filter_command(
            "skill",
            "Search for servants with skills that match the specified parameters",
        ),
        effect_filter_command(
            "np",
            "Search for servants with NP that matches the specified parameters",
        ),
        effect_filter_command(
            "skill-or-np",
            "Search for servants with NP and/or skills that match the specified parameters",
        ),
    ]
}

fn servant() -> Command {
    CommandBuilder::new("servant", "Servant info lookup", CommandType::ChatInput)
        .option(StringBuilder::new("servant-name", "Servant name"))
        .option(StringBuilder::new("cv", "Voice actor").autocomplete(true))
        .option(StringBuilder::new("class-name", "Class name").autocomplete(true))
        .option(region_option())
        .build()
}

/// /skill, /np, and /skill-or-np take the same filter set.
fn effect_filter_command(name: &str, description: &str) -> Command {
    let mut builder = CommandBuilder::new(name, description, CommandType::ChatInput);
    for option in [
        StringBuilder::new("type", "Effect 1").autocomplete(true),
        StringBuilder::new("type2", "Effect 2").autocomplete(true),
        StringBuilder::new("target", "Target").autocomplete(true),
        StringBuilder::new("buff", "Buff 1").autocomplete(true),
        StringBuilder::new("buff2", "Buff 2").autocomplete(true),
        StringBuilder::new("trait", "Affected trait").autocomplete(true),
        region_option(),
    ] {
        builder = builder.option(option);
    }
    builder.build()
}

fn region_option() -> StringBuilder {
    StringBuilder::new("region", "Region (Default: JP)").autocomplete(true)
}

/// String option by name, or empty when absent — every option here is
/// optional and the handlers treat empty as "not given", as the original did.
pub fn str_option(options: &[CommandDataOption], name: &str) -> String {
    options
        .iter()
        .find(|option| option.name == name)
        .and_then(|option| match &option.value {
            CommandOptionValue::String(value) => Some(value.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

/// The option the user is currently typing into, for autocomplete dispatch.
pub fn focused_option(options: &[CommandDataOption]) -> Option<(&str, &str)> {
    options.iter().find_map(|option| match &option.value {
        CommandOptionValue::Focused(partial, _) => Some((option.name.as_str(), partial.as_str())),
        _ => None,
    })
}
