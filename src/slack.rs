use async_trait::async_trait;
use serde::Deserialize;
use slack_morphism::prelude::*;
use tracing::debug;

use crate::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
}

impl ChannelInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A history message reduced to what the ranking needs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageInfo {
    pub reactions: Vec<ReactionInfo>,
}

/// One emoji on one message. `count` is the number of users who applied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionInfo {
    pub name: String,
    pub count: u64,
}

impl ReactionInfo {
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

#[async_trait]
pub trait ChannelLister: Send + Sync {
    async fn list_channels(&self) -> Result<Vec<ChannelInfo>>;
}

#[async_trait]
pub trait HistoryFetcher: Send + Sync {
    /// Fetch at most `limit` of the most recent messages. Single page only.
    async fn fetch_history(&self, channel_id: &str, limit: u16) -> Result<Vec<MessageInfo>>;
}

#[async_trait]
pub trait MessagePoster: Send + Sync {
    async fn post_message(&self, channel: &str, text: &str) -> Result<()>;
}

/// Slack Web API backed implementation of the three capabilities
pub struct SlackWorkspace {
    client: SlackHyperClient,
    token: SlackApiToken,
    exclude_archived: bool,
}

impl SlackWorkspace {
    pub fn new(token: &str, exclude_archived: bool) -> Result<Self> {
        let connector =
            SlackClientHyperConnector::new().map_err(|e| AppError::SlackApi(e.to_string()))?;

        Ok(Self {
            client: SlackClient::new(connector),
            token: SlackApiToken::new(SlackApiTokenValue(token.to_string())),
            exclude_archived,
        })
    }
}

#[async_trait]
impl ChannelLister for SlackWorkspace {
    async fn list_channels(&self) -> Result<Vec<ChannelInfo>> {
        let session = self.client.open_session(&self.token);

        let request = SlackApiConversationsListRequest::new()
            .with_limit(1000)
            .with_exclude_archived(self.exclude_archived)
            .with_types(vec![SlackConversationType::Public]);

        let response = session
            .conversations_list(&request)
            .await
            .map_err(|e| AppError::SlackApi(e.to_string()))?;

        Ok(response
            .channels
            .into_iter()
            .map(|channel| ChannelInfo {
                id: channel.id.0,
                name: channel.name.unwrap_or_else(|| "unknown".to_string()),
            })
            .collect())
    }
}

#[async_trait]
impl HistoryFetcher for SlackWorkspace {
    async fn fetch_history(&self, channel_id: &str, limit: u16) -> Result<Vec<MessageInfo>> {
        let session = self.client.open_session(&self.token);

        let request = SlackApiConversationsHistoryRequest::new()
            .with_channel(SlackChannelId(channel_id.to_string()))
            .with_limit(limit);

        let response = session
            .conversations_history(&request)
            .await
            .map_err(|e| AppError::SlackApi(e.to_string()))?;

        debug!(
            channel_id,
            messages = response.messages.len(),
            "fetched channel history"
        );

        Ok(response.messages.iter().map(message_info).collect())
    }
}

#[async_trait]
impl MessagePoster for SlackWorkspace {
    async fn post_message(&self, channel: &str, text: &str) -> Result<()> {
        let session = self.client.open_session(&self.token);

        let request = SlackApiChatPostMessageRequest::new(
            SlackChannelId(channel.to_string()),
            SlackMessageContent::new().with_text(text.to_string()),
        );

        session
            .chat_post_message(&request)
            .await
            .map_err(|e| AppError::SlackApi(e.to_string()))?;

        Ok(())
    }
}

fn message_info(message: &SlackHistoryMessage) -> MessageInfo {
    let reactions = message
        .content
        .reactions
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|r| ReactionInfo {
            name: r.name.0.clone(),
            count: r.count as u64,
        })
        .collect();

    MessageInfo { reactions }
}
