//! Layer between the bot code and the Discord library.
//!
//! Everything that touches twilight's interaction surface funnels through
//! here, so a twilight upgrade (or swap) stays contained in one file. The
//! paginator mirrors the Prev/Next page flipping the bot's replies need:
//! multi-page responses register their embed list against the response
//! message ID and button presses re-render from that registry.

use crate::atlas::AtlasClient;
use anyhow::Result;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use twilight_http::Client as HttpClient;
use twilight_model::application::command::CommandOptionChoice;
use twilight_model::application::interaction::Interaction;
use twilight_model::channel::message::component::{ActionRow, Button, ButtonStyle};
use twilight_model::channel::message::embed::EmbedFooter;
use twilight_model::channel::message::{Component, Embed};
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::marker::{ApplicationMarker, MessageMarker};
use twilight_model::id::Id;
use twilight_util::builder::InteractionResponseDataBuilder;

pub const BLURPLE: u32 = 0x5865F2;
pub const EMBED_FIELD_LIMIT: usize = 1024;

const PAGINATOR_TTL: Duration = Duration::from_secs(60 * 60);
const PAGINATOR_CAP: usize = 256;

pub struct BotState {
    pub http: HttpClient,
    pub application_id: Id<ApplicationMarker>,
    pub atlas: AtlasClient,
    paginators: DashMap<Id<MessageMarker>, Paginator>,
}

struct Paginator {
    pages: Vec<Embed>,
    current: usize,
    created: Instant,
}

impl BotState {
    pub fn new(http: HttpClient, application_id: Id<ApplicationMarker>) -> Self {
        Self {
            http,
            application_id,
            atlas: AtlasClient::new(),
            paginators: DashMap::new(),
        }
    }

    fn register_paginator(&self, message_id: Id<MessageMarker>, pages: Vec<Embed>) {
        if self.paginators.len() >= PAGINATOR_CAP {
            self.paginators
                .retain(|_, paginator| paginator.created.elapsed() < PAGINATOR_TTL);
        }
        self.paginators.insert(
            message_id,
            Paginator {
                pages,
                current: 0,
                created: Instant::now(),
            },
        );
    }
}

/// The standard amount of info the interaction handlers take.
pub struct InteractionRefs<'a> {
    pub state: &'a BotState,
    pub interaction: &'a Interaction,
}

impl InteractionRefs<'_> {
    async fn respond(&self, response: &InteractionResponse) -> Result<()> {
        self.state
            .http
            .interaction(self.state.application_id)
            .create_response(self.interaction.id, &self.interaction.token, response)
            .await?;
        Ok(())
    }

    /// Acknowledge now, answer later; the Atlas round trips can outlast
    /// Discord's three-second response window.
    pub async fn defer(&self) -> Result<()> {
        self.respond(&InteractionResponse {
            kind: InteractionResponseType::DeferredChannelMessageWithSource,
            data: None,
        })
        .await
    }

    /// Immediate plain-text reply, for input validation failures.
    pub async fn reply_text(&self, content: &str) -> Result<()> {
        self.respond(&InteractionResponse {
            kind: InteractionResponseType::ChannelMessageWithSource,
            data: Some(InteractionResponseDataBuilder::new().content(content).build()),
        })
        .await
    }

    /// Plain-text answer to an already-deferred interaction.
    pub async fn update_text(&self, content: &str) -> Result<()> {
        self.state
            .http
            .interaction(self.state.application_id)
            .update_response(&self.interaction.token)
            .content(Some(content))?
            .await?;
        Ok(())
    }

    /// Answer a deferred interaction with embed pages. A single page is sent
    /// bare; more pages get nav buttons and land in the paginator registry.
    pub async fn send_pages(&self, mut pages: Vec<Embed>) -> Result<()> {
        if pages.is_empty() {
            return self.update_text("No result.").await;
        }
        if pages.len() == 1 {
            let embeds = [pages.remove(0)];
            self.state
                .http
                .interaction(self.state.application_id)
                .update_response(&self.interaction.token)
                .embeds(Some(&embeds))?
                // clears chooser buttons when a pick resolves to a single page
                .components(Some(&[]))?
                .await?;
            return Ok(());
        }

        let total = pages.len();
        let embeds = [with_footer(pages[0].clone(), 0, total)];
        let components = [nav_row(0, total)];
        let message = self
            .state
            .http
            .interaction(self.state.application_id)
            .update_response(&self.interaction.token)
            .embeds(Some(&embeds))?
            .components(Some(&components))?
            .await?
            .model()
            .await?;
        self.state.register_paginator(message.id, pages);
        Ok(())
    }

    /// Answer a deferred interaction with one embed plus arbitrary components
    /// (the servant multi-match chooser).
    pub async fn send_embed_with_components(
        &self,
        embed: Embed,
        components: Vec<Component>,
    ) -> Result<()> {
        let embeds = [embed];
        self.state
            .http
            .interaction(self.state.application_id)
            .update_response(&self.interaction.token)
            .embeds(Some(&embeds))?
            .components(Some(&components))?
            .await?;
        Ok(())
    }

    /// Replace the message a component interaction came from.
    pub async fn update_message(&self, embeds: Vec<Embed>, components: Vec<Component>) -> Result<()> {
        self.respond(&InteractionResponse {
            kind: InteractionResponseType::UpdateMessage,
            data: Some(
                InteractionResponseDataBuilder::new()
                    .embeds(embeds)
                    .components(components)
                    .build(),
            ),
        })
        .await
    }

    /// No-op acknowledgement for components we can no longer serve.
    pub async fn ack_component(&self) -> Result<()> {
        self.respond(&InteractionResponse {
            kind: InteractionResponseType::DeferredUpdateMessage,
            data: None,
        })
        .await
    }

    pub async fn autocomplete(&self, choices: Vec<CommandOptionChoice>) -> Result<()> {
        self.respond(&InteractionResponse {
            kind: InteractionResponseType::ApplicationCommandAutocompleteResult,
            data: Some(InteractionResponseDataBuilder::new().choices(choices).build()),
        })
        .await
    }

    /// Handle a `page:prev` / `page:next` press against the registry. Unknown
    /// or expired messages get a bare acknowledgement.
    pub async fn flip_page(&self, custom_id: &str) -> Result<()> {
        let message_id = match self.interaction.message.as_ref() {
            Some(message) => message.id,
            None => return self.ack_component().await,
        };
        let (embed, row) = {
            let mut entry = match self.state.paginators.get_mut(&message_id) {
                Some(entry) => entry,
                None => return self.ack_component().await,
            };
            let total = entry.pages.len();
            match custom_id {
                "page:next" if entry.current + 1 < total => entry.current += 1,
                "page:prev" => entry.current = entry.current.saturating_sub(1),
                _ => {}
            }
            let current = entry.current;
            (
                with_footer(entry.pages[current].clone(), current, total),
                nav_row(current, total),
            )
            // entry drops here; never hold a dashmap guard across an await
        };
        self.update_message(vec![embed], vec![row]).await
    }
}

fn with_footer(mut embed: Embed, index: usize, total: usize) -> Embed {
    embed.footer = Some(EmbedFooter {
        icon_url: None,
        proxy_icon_url: None,
        text: format!("Page {} of {}", index + 1, total),
    });
    embed
}

fn nav_row(current: usize, total: usize) -> Component {
    Component::ActionRow(ActionRow {
        components: vec![
            nav_button("page:prev", "◀ Prev", current == 0),
            nav_button("page:next", "Next ▶", current + 1 >= total),
        ],
    })
}

fn nav_button(custom_id: &str, label: &str, disabled: bool) -> Component {
    Component::Button(Button {
        custom_id: Some(custom_id.to_owned()),
        disabled,
        emoji: None,
        label: Some(label.to_owned()),
        style: ButtonStyle::Secondary,
        url: None,
    })
}

/// Numbered pick buttons, five per action row, at most five rows.
pub fn button_rows(buttons: Vec<(String, String)>) -> Vec<Component> {
    buttons
        .chunks(5)
        .take(5)
        .map(|chunk| {
            Component::ActionRow(ActionRow {
                components: chunk
                    .iter()
                    .map(|(custom_id, label)| {
                        Component::Button(Button {
                            custom_id: Some(custom_id.clone()),
                            disabled: false,
                            emoji: None,
                            label: Some(label.clone()),
                            style: ButtonStyle::Primary,
                            url: None,
                        })
                    })
                    .collect(),
            })
        })
        .collect()
}

/// Discord rejects embed field values over 1024 chars; cut and mark instead.
pub fn truncate_for_embed(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_for_embed("short", 1024), "short");
        let long = "★".repeat(2000);
        let cut = truncate_for_embed(&long, 1024);
        assert_eq!(cut.chars().count(), 1024);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn nav_buttons_disable_at_the_edges() {
        let disabled_flags = |component: &Component| match component {
            Component::ActionRow(row) => row
                .components
                .iter()
                .map(|inner| match inner {
                    Component::Button(button) => button.disabled,
                    _ => panic!("expected button"),
                })
                .collect::<Vec<_>>(),
            _ => panic!("expected action row"),
        };
        assert_eq!(disabled_flags(&nav_row(0, 3)), vec![true, false]);
        assert_eq!(disabled_flags(&nav_row(2, 3)), vec![false, true]);
    }

    #[test]
    fn pick_buttons_chunk_into_rows() {
        let buttons: Vec<(String, String)> = (1..=12)
            .map(|n| (format!("servant:{n}:JP"), n.to_string()))
            .collect();
        let rows = button_rows(buttons);
        assert_eq!(rows.len(), 3);
        match &rows[0] {
            Component::ActionRow(row) => assert_eq!(row.components.len(), 5),
            _ => panic!("expected action row"),
        }
    }
}
