//! One aggregation task per channel, joined before anything is ranked.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::aggregator::{AggregationOptions, ChannelOutcome, aggregate_channel};
use crate::counter::{CounterSnapshot, CounterStore};
use crate::ranking::{ReportLimits, render_report};
use crate::slack::{ChannelInfo, HistoryFetcher};
use crate::AppError;

#[derive(Debug, Clone, Default)]
pub struct FanOutOptions {
    pub aggregation: AggregationOptions,
    /// Cap on concurrently running history fetches; `None` runs every channel at once
    pub max_concurrent: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub fan_out: FanOutOptions,
    pub limits: ReportLimits,
}

/// Per-channel results in channel-list order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutSummary {
    pub outcomes: Vec<(String, ChannelOutcome)>,
}

impl FanOutSummary {
    pub fn failed_channels(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_failed())
            .map(|(channel, _)| channel.as_str())
            .collect()
    }

    pub fn aggregated(&self) -> usize {
        self.outcomes.len() - self.failed_channels().len()
    }
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub report: String,
    pub snapshot: CounterSnapshot,
    pub summary: FanOutSummary,
}

/// Aggregate every channel concurrently into `store` and wait for all of them.
///
/// Each channel's bucket is created before its task is spawned. Returns only
/// after every task has finished, so `store` is quiescent afterwards.
pub async fn fan_out(
    channels: &[ChannelInfo],
    fetcher: Arc<dyn HistoryFetcher>,
    store: Arc<CounterStore>,
    options: &FanOutOptions,
) -> FanOutSummary {
    let semaphore = options.max_concurrent.map(|n| Arc::new(Semaphore::new(n.max(1))));

    let mut handles = Vec::with_capacity(channels.len());
    for channel in channels {
        info!(channel_id = %channel.id, channel = %channel.name, "aggregating channel");
        store.ensure_channel_bucket(&channel.name);

        let channel = channel.clone();
        let fetcher = Arc::clone(&fetcher);
        let store = Arc::clone(&store);
        let semaphore = semaphore.clone();
        let aggregation = options.aggregation.clone();

        handles.push(tokio::spawn(async move {
            let _permit = match semaphore {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };
            aggregate_channel(fetcher.as_ref(), &store, &channel, &aggregation).await
        }));
    }

    let results = join_all(handles).await;

    let outcomes = channels
        .iter()
        .zip(results)
        .map(|(channel, result)| {
            let outcome = result.unwrap_or_else(|e| {
                error!(channel = %channel.name, error = %e, "aggregation task did not complete");
                ChannelOutcome::Failed(AppError::TaskJoin(e.to_string()).to_string())
            });
            (channel.name.clone(), outcome)
        })
        .collect();

    FanOutSummary { outcomes }
}

/// Aggregate `channels` and render the report from the joined tallies.
pub async fn run(
    channels: &[ChannelInfo],
    fetcher: Arc<dyn HistoryFetcher>,
    options: &RunOptions,
) -> RunOutput {
    let store = Arc::new(CounterStore::new());
    let summary = fan_out(channels, fetcher, Arc::clone(&store), &options.fan_out).await;

    let snapshot = store.snapshot();
    let report = render_report(&snapshot, &options.limits);

    info!(
        channels = channels.len(),
        aggregated = summary.aggregated(),
        failed = summary.failed_channels().len(),
        reactions = snapshot.global.len(),
        "aggregation finished"
    );

    RunOutput {
        report,
        snapshot,
        summary,
    }
}
