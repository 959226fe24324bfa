use std::time::Duration;

use tracing::{debug, warn};

use crate::counter::CounterStore;
use crate::slack::{ChannelInfo, HistoryFetcher, MessageInfo};
use crate::{AppError, Result};

/// Upper bound on messages requested per channel (one page, no cursor follow-up)
pub const HISTORY_LIMIT: u16 = 1000;

#[derive(Debug, Clone)]
pub struct AggregationOptions {
    pub history_limit: u16,
    pub timeout: Option<Duration>,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            history_limit: HISTORY_LIMIT,
            timeout: None,
        }
    }
}

/// What one channel contributed to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    Aggregated { messages: usize, reactions: usize },
    Failed(String),
}

impl ChannelOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ChannelOutcome::Failed(_))
    }
}

/// Fetch `channel`'s recent history and fold its reactions into `store`.
///
/// The channel's bucket must already exist. Failures are logged and reported
/// in the outcome; they never propagate.
pub async fn aggregate_channel(
    fetcher: &dyn HistoryFetcher,
    store: &CounterStore,
    channel: &ChannelInfo,
    options: &AggregationOptions,
) -> ChannelOutcome {
    let result = fetch_history(fetcher, channel, options)
        .await
        .and_then(|messages| {
            let reactions = fold_messages(store, &channel.name, &messages)?;
            Ok((messages.len(), reactions))
        });

    match result {
        Ok((messages, reactions)) => {
            debug!(
                channel = %channel.name,
                messages,
                reactions,
                "aggregated channel"
            );
            ChannelOutcome::Aggregated {
                messages,
                reactions,
            }
        }
        Err(e) => {
            warn!(channel = %channel.name, channel_id = %channel.id, error = %e, "skipping channel");
            ChannelOutcome::Failed(e.to_string())
        }
    }
}

async fn fetch_history(
    fetcher: &dyn HistoryFetcher,
    channel: &ChannelInfo,
    options: &AggregationOptions,
) -> Result<Vec<MessageInfo>> {
    let call = fetcher.fetch_history(&channel.id, options.history_limit);

    match options.timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| AppError::HistoryTimeout {
                channel: channel.name.clone(),
                secs: limit.as_secs(),
            })?,
        None => call.await,
    }
}

/// Add every reaction of every message to the global tally and to
/// `channel`'s bucket, using the reaction's user count as the delta.
///
/// Returns the number of reaction entries folded.
pub fn fold_messages(store: &CounterStore, channel: &str, messages: &[MessageInfo]) -> Result<usize> {
    let mut folded = 0;
    for message in messages {
        for reaction in &message.reactions {
            store.record(channel, &reaction.name, reaction.count)?;
            folded += 1;
        }
    }
    Ok(folded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slack::ReactionInfo;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedHistory {
        messages: Vec<MessageInfo>,
        requested: Mutex<Vec<(String, u16)>>,
    }

    impl FixedHistory {
        fn new(messages: Vec<MessageInfo>) -> Self {
            Self {
                messages,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HistoryFetcher for FixedHistory {
        async fn fetch_history(&self, channel_id: &str, limit: u16) -> Result<Vec<MessageInfo>> {
            self.requested
                .lock()
                .unwrap()
                .push((channel_id.to_string(), limit));
            Ok(self.messages.clone())
        }
    }

    struct FailingHistory;

    #[async_trait]
    impl HistoryFetcher for FailingHistory {
        async fn fetch_history(&self, _channel_id: &str, _limit: u16) -> Result<Vec<MessageInfo>> {
            Err(AppError::SlackApi("not_in_channel".to_string()))
        }
    }

    struct StalledHistory;

    #[async_trait]
    impl HistoryFetcher for StalledHistory {
        async fn fetch_history(&self, _channel_id: &str, _limit: u16) -> Result<Vec<MessageInfo>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }
    }

    fn message(reactions: &[(&str, u64)]) -> MessageInfo {
        MessageInfo {
            reactions: reactions
                .iter()
                .map(|(name, count)| ReactionInfo::new(*name, *count))
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_aggregate_uses_reaction_count_as_delta() {
        let fetcher = FixedHistory::new(vec![
            message(&[("+1", 2), ("tada", 1)]),
            message(&[]),
            message(&[("+1", 1)]),
        ]);
        let store = CounterStore::new();
        let channel = ChannelInfo::new("C1", "general");
        store.ensure_channel_bucket("general");

        let outcome =
            aggregate_channel(&fetcher, &store, &channel, &AggregationOptions::default()).await;

        assert_eq!(
            outcome,
            ChannelOutcome::Aggregated {
                messages: 3,
                reactions: 3
            }
        );
        let general = store.snapshot_channel("general");
        assert_eq!(general.get("+1"), Some(&3));
        assert_eq!(general.get("tada"), Some(&1));
        assert_eq!(store.snapshot_global(), general);
    }

    #[tokio::test]
    async fn test_aggregate_requests_by_id_with_limit() {
        let fetcher = FixedHistory::new(Vec::new());
        let store = CounterStore::new();
        store.ensure_channel_bucket("dev");

        aggregate_channel(
            &fetcher,
            &store,
            &ChannelInfo::new("C2", "dev"),
            &AggregationOptions::default(),
        )
        .await;

        let requested = fetcher.requested.lock().unwrap();
        assert_eq!(*requested, vec![("C2".to_string(), HISTORY_LIMIT)]);
    }

    #[tokio::test]
    async fn test_aggregate_fetch_failure_contributes_nothing() {
        let store = CounterStore::new();
        store.ensure_channel_bucket("general");
        store.increment_global("+1", 4);

        let outcome = aggregate_channel(
            &FailingHistory,
            &store,
            &ChannelInfo::new("C1", "general"),
            &AggregationOptions::default(),
        )
        .await;

        assert!(outcome.is_failed());
        assert!(store.snapshot_channel("general").is_empty());
        assert_eq!(store.snapshot_global().get("+1"), Some(&4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_aggregate_timeout_is_a_channel_failure() {
        let store = CounterStore::new();
        store.ensure_channel_bucket("slow");
        let options = AggregationOptions {
            timeout: Some(Duration::from_secs(5)),
            ..AggregationOptions::default()
        };

        let outcome = aggregate_channel(
            &StalledHistory,
            &store,
            &ChannelInfo::new("C9", "slow"),
            &options,
        )
        .await;

        assert_eq!(
            outcome,
            ChannelOutcome::Failed("history fetch for #slow timed out after 5s".to_string())
        );
    }

    #[tokio::test]
    async fn test_aggregate_without_bucket_fails() {
        let fetcher = FixedHistory::new(vec![message(&[("+1", 1)])]);
        let store = CounterStore::new();

        let outcome = aggregate_channel(
            &fetcher,
            &store,
            &ChannelInfo::new("C1", "general"),
            &AggregationOptions::default(),
        )
        .await;

        assert!(outcome.is_failed());
        assert!(store.snapshot_global().is_empty());
    }

    #[test]
    fn test_fold_messages_counts_entries() {
        let store = CounterStore::new();
        store.ensure_channel_bucket("dev");

        let folded = fold_messages(
            &store,
            "dev",
            &[message(&[("+1", 2)]), message(&[("+1", 5), ("eyes", 1)])],
        )
        .unwrap();

        assert_eq!(folded, 3);
        assert_eq!(store.snapshot_channel("dev").get("+1"), Some(&7));
    }
}
