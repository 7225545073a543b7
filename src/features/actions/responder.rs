//! Where action output goes
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Slash replies can be deferred while a program runs
//! - 1.0.0: Interaction, message, and channel responders

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serenity::http::Http;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::channel::Message;
use serenity::model::id::ChannelId;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::core::truncate_for_message;

/// Sink for replies to whoever triggered a definition
#[async_trait]
pub trait Responder: Send + Sync {
    /// Answer the invoker
    async fn reply(&self, content: &str, ephemeral: bool) -> Result<()>;

    /// Post to an arbitrary channel
    async fn send(&self, channel_id: u64, content: &str) -> Result<()>;

    /// Signal that a reply will take a while
    async fn defer(&self, _ephemeral: bool) -> Result<()> {
        Ok(())
    }
}

const FRESH: u8 = 0;
const DEFERRED: u8 = 1;
const RESPONDED: u8 = 2;

/// Replies to a slash command interaction
///
/// The first reply becomes the interaction response (or fills in a deferred one);
/// later replies are sent as follow-ups.
pub struct InteractionResponder {
    http: Arc<Http>,
    interaction: ApplicationCommandInteraction,
    state: AtomicU8,
}

impl InteractionResponder {
    pub fn new(http: Arc<Http>, interaction: ApplicationCommandInteraction) -> Self {
        Self {
            http,
            interaction,
            state: AtomicU8::new(FRESH),
        }
    }
}

#[async_trait]
impl Responder for InteractionResponder {
    async fn reply(&self, content: &str, ephemeral: bool) -> Result<()> {
        let content = truncate_for_message(content);
        match self.state.swap(RESPONDED, Ordering::SeqCst) {
            FRESH => {
                self.interaction
                    .create_interaction_response(&self.http, |response| {
                        response
                            .kind(InteractionResponseType::ChannelMessageWithSource)
                            .interaction_response_data(|message| {
                                message.content(&content).ephemeral(ephemeral)
                            })
                    })
                    .await?;
            }
            DEFERRED => {
                self.interaction
                    .edit_original_interaction_response(&self.http, |response| {
                        response.content(&content)
                    })
                    .await?;
            }
            _ => {
                self.interaction
                    .create_followup_message(&self.http, |message| {
                        message.content(&content).ephemeral(ephemeral)
                    })
                    .await?;
            }
        }
        Ok(())
    }

    async fn send(&self, channel_id: u64, content: &str) -> Result<()> {
        ChannelId(channel_id)
            .say(&self.http, truncate_for_message(content))
            .await?;
        Ok(())
    }

    async fn defer(&self, ephemeral: bool) -> Result<()> {
        if self
            .state
            .compare_exchange(FRESH, DEFERRED, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(());
        }
        self.interaction
            .create_interaction_response(&self.http, |response| {
                response
                    .kind(InteractionResponseType::DeferredChannelMessageWithSource)
                    .interaction_response_data(|message| message.ephemeral(ephemeral))
            })
            .await?;
        Ok(())
    }
}

/// Replies to a prefixed text message; ephemeral has no meaning here
pub struct MessageResponder {
    http: Arc<Http>,
    message: Message,
}

impl MessageResponder {
    pub fn new(http: Arc<Http>, message: Message) -> Self {
        Self { http, message }
    }
}

#[async_trait]
impl Responder for MessageResponder {
    async fn reply(&self, content: &str, _ephemeral: bool) -> Result<()> {
        let content = truncate_for_message(content);
        self.message
            .channel_id
            .send_message(&self.http, |m| {
                m.content(&content).reference_message(&self.message)
            })
            .await?;
        Ok(())
    }

    async fn send(&self, channel_id: u64, content: &str) -> Result<()> {
        ChannelId(channel_id)
            .say(&self.http, truncate_for_message(content))
            .await?;
        Ok(())
    }

    async fn defer(&self, _ephemeral: bool) -> Result<()> {
        self.message.channel_id.broadcast_typing(&self.http).await?;
        Ok(())
    }
}

/// For event listeners, which have nobody to reply to
pub struct ChannelResponder {
    http: Arc<Http>,
}

impl ChannelResponder {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Responder for ChannelResponder {
    async fn reply(&self, _content: &str, _ephemeral: bool) -> Result<()> {
        Err(anyhow!("Event listeners cannot reply, use a send action or an exec channel_id"))
    }

    async fn send(&self, channel_id: u64, content: &str) -> Result<()> {
        ChannelId(channel_id)
            .say(&self.http, truncate_for_message(content))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// What a recording responder saw
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Sent {
        Reply { content: String, ephemeral: bool },
        Channel { channel_id: u64, content: String },
        Deferred,
    }

    /// Responder that remembers everything instead of talking to Discord
    #[derive(Default)]
    pub struct RecordingResponder {
        pub sent: Mutex<Vec<Sent>>,
        pub fail_replies: bool,
    }

    impl RecordingResponder {
        pub fn failing() -> Self {
            Self {
                fail_replies: true,
                ..Default::default()
            }
        }

        pub fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        pub fn replies(&self) -> Vec<String> {
            self.sent()
                .into_iter()
                .filter_map(|s| match s {
                    Sent::Reply { content, .. } => Some(content),
                    _ => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl Responder for RecordingResponder {
        async fn reply(&self, content: &str, ephemeral: bool) -> Result<()> {
            if self.fail_replies {
                return Err(anyhow!("replies disabled"));
            }
            self.sent.lock().unwrap().push(Sent::Reply {
                content: content.to_string(),
                ephemeral,
            });
            Ok(())
        }

        async fn send(&self, channel_id: u64, content: &str) -> Result<()> {
            self.sent.lock().unwrap().push(Sent::Channel {
                channel_id,
                content: content.to_string(),
            });
            Ok(())
        }

        async fn defer(&self, _ephemeral: bool) -> Result<()> {
            self.sent.lock().unwrap().push(Sent::Deferred);
            Ok(())
        }
    }
}
