use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::aggregator::AggregationOptions;
use crate::error::{AppError, Result};
use crate::fanout::{FanOutOptions, RunOptions, RunOutput, run};
use crate::load_token;
use crate::ranking::{RankingExport, ReportLimits};
use crate::settings::Settings;
use crate::slack::{ChannelLister, HistoryFetcher, MessagePoster, SlackWorkspace};

/// Where the report ended up after `rank`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Skipped,
    Posted { channel: String },
    Failed { channel: String, error: String },
}

#[derive(Debug, Clone)]
pub struct RankOutcome {
    pub output: RunOutput,
    pub delivery: Delivery,
}

#[derive(Debug, Clone, Default)]
pub struct RankRequest<'a> {
    pub dry_run: bool,
    pub channel: Option<&'a str>,
    pub json: Option<&'a Path>,
}

impl Settings {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            fan_out: FanOutOptions {
                aggregation: AggregationOptions {
                    history_limit: self.fetch.page_size(),
                    timeout: self.fetch.timeout(),
                },
                max_concurrent: self.fetch.concurrency_limit(),
            },
            limits: ReportLimits {
                top_total: self.report.top_total,
                top_per_channel: self.report.top_per_channel,
            },
        }
    }
}

pub async fn run_rank(
    settings_path: &str,
    dry_run: bool,
    channel: Option<String>,
    json: Option<String>,
) -> Result<()> {
    let token = load_token()?;
    let settings = Settings::load_from(Path::new(settings_path))?;
    let workspace = Arc::new(SlackWorkspace::new(&token, settings.fetch.exclude_archived)?);

    let request = RankRequest {
        dry_run,
        channel: channel.as_deref(),
        json: json.as_deref().map(Path::new),
    };

    let outcome = rank(
        workspace.as_ref(),
        workspace.clone(),
        workspace.as_ref(),
        &settings,
        &request,
    )
    .await?;

    match outcome.delivery {
        Delivery::Failed { channel, error } => Err(AppError::SlackApi(format!(
            "report computed but posting to {} failed: {}",
            channel, error
        ))),
        Delivery::Posted { channel } => {
            println!("Report posted to {}.", channel);
            Ok(())
        }
        Delivery::Skipped => Ok(()),
    }
}

/// List channels, aggregate, print the report and deliver it.
///
/// Listing failures abort before any aggregation. A failed post is reported in
/// the returned [`Delivery`] after the report has been printed.
pub async fn rank(
    lister: &dyn ChannelLister,
    fetcher: Arc<dyn HistoryFetcher>,
    poster: &dyn MessagePoster,
    settings: &Settings,
    request: &RankRequest<'_>,
) -> Result<RankOutcome> {
    let channels = lister.list_channels().await?;
    info!(channels = channels.len(), "listed channels");

    let output = run(&channels, fetcher, &settings.run_options()).await;

    println!("{}", output.report);

    if let Some(path) = request.json {
        RankingExport::from_snapshot(&output.snapshot).write_json(path)?;
        println!("Rankings written to {}.", path.display());
    }

    let delivery = if request.dry_run {
        Delivery::Skipped
    } else {
        let channel = request
            .channel
            .unwrap_or(settings.report.channel.as_str())
            .to_string();
        match poster.post_message(&channel, &output.report).await {
            Ok(()) => Delivery::Posted { channel },
            Err(e) => {
                error!(channel = %channel, error = %e, "failed to post report");
                Delivery::Failed {
                    channel,
                    error: e.to_string(),
                }
            }
        }
    };

    Ok(RankOutcome { output, delivery })
}

pub async fn run_list_channels(settings_path: &str) -> Result<()> {
    let token = load_token()?;
    let settings = Settings::load_from(Path::new(settings_path))?;
    let workspace = SlackWorkspace::new(&token, settings.fetch.exclude_archived)?;

    let channels = workspace.list_channels().await?;
    for channel in &channels {
        println!("{} {}", channel.id, channel.name);
    }

    println!("{} channels.", channels.len());
    Ok(())
}
