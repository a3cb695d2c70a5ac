use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use twilight_gateway::{Event, Intents, Shard, ShardId};
use twilight_http::Client as HttpClient;
use twilight_model::application::interaction::{Interaction, InteractionData, InteractionType};

use crate::atlas::SearchFlag;
use crate::discord::{BotState, InteractionRefs};

mod atlas;
mod autocomplete;
mod commands;
mod config;
mod discord;
mod search;
mod servant;
mod text;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let token = config::discord_token()?;
    let http = HttpClient::new(token.clone());
    let application_id = http.current_user_application().await?.model().await?.id;

    let state = Arc::new(BotState::new(http, application_id));
    state
        .http
        .interaction(application_id)
        .set_global_commands(&commands::all())
        .await
        .context("failed to register slash commands")?;
    info!("slash commands registered");

    // Slash commands arrive over the gateway without any privileged intents.
    let mut shard = Shard::new(ShardId::ONE, token, Intents::empty());
    loop {
        let event = match shard.next_event().await {
            Ok(event) => event,
            Err(source) => {
                warn!(?source, "error receiving gateway event");
                if source.is_fatal() {
                    break;
                }
                continue;
            }
        };
        match event {
            Event::Ready(ready) => info!(user = %ready.user.name, "connected"),
            Event::InteractionCreate(interaction) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let interaction = interaction.0;
                    if let Err(source) = handle_interaction(&state, &interaction).await {
                        error!(?source, "interaction handler failed");
                        report_failure(&state, &interaction).await;
                    }
                });
            }
            _ => {}
        }
    }

    Ok(())
}

async fn handle_interaction(state: &BotState, interaction: &Interaction) -> Result<()> {
    let refs = InteractionRefs { state, interaction };
    match interaction.kind {
        InteractionType::ApplicationCommand => {
            let data = match &interaction.data {
                Some(InteractionData::ApplicationCommand(data)) => data,
                _ => return Ok(()),
            };
            match data.name.as_str() {
                "servant" => servant::run(&refs, &data.options).await,
                "skill" => search::run(&refs, &data.options, &[SearchFlag::Skill]).await,
                "np" => search::run(&refs, &data.options, &[SearchFlag::NoblePhantasm]).await,
                "skill-or-np" => {
                    search::run(
                        &refs,
                        &data.options,
                        &[SearchFlag::Skill, SearchFlag::NoblePhantasm],
                    )
                    .await
                }
                unknown => {
                    warn!(command = unknown, "unknown command");
                    Ok(())
                }
            }
        }
        InteractionType::ApplicationCommandAutocomplete => {
            let data = match &interaction.data {
                Some(InteractionData::ApplicationCommand(data)) => data,
                _ => return Ok(()),
            };
            autocomplete::run(&refs, &data.name, &data.options).await
        }
        InteractionType::MessageComponent => {
            let data = match &interaction.data {
                Some(InteractionData::MessageComponent(data)) => data,
                _ => return Ok(()),
            };
            let custom_id = data.custom_id.as_str();
            if custom_id.starts_with("page:") {
                refs.flip_page(custom_id).await
            } else if custom_id.starts_with("servant:") {
                servant::select(&refs, custom_id).await
            } else {
                refs.ack_component().await
            }
        }
        _ => Ok(()),
    }
}

/// Best effort: replace whatever the deferred response was going to be with a
/// plain failure note so the user is not left with an eternal "thinking…".
async fn report_failure(state: &BotState, interaction: &Interaction) {
    match state
        .http
        .interaction(state.application_id)
        .update_response(&interaction.token)
        .content(Some("Something went wrong while talking to Atlas Academy."))
    {
        Ok(update) => {
            if let Err(source) = update.await {
                warn!(?source, "could not report failure to the user");
            }
        }
        Err(source) => warn!(?source, "could not build failure report"),
    }
}
