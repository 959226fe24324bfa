use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::counter::{CounterSnapshot, ReactionTally};
use crate::{AppError, Result};

pub const TOTAL_HEADER: &str = "Total";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub name: String,
    pub value: u64,
}

impl RankedEntry {
    pub fn new(name: impl Into<String>, value: u64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Entries ordered by value descending, then name ascending
pub type RankedList = Vec<RankedEntry>;

/// How many entries each report section shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportLimits {
    pub top_total: usize,
    pub top_per_channel: usize,
}

impl Default for ReportLimits {
    fn default() -> Self {
        Self {
            top_total: 20,
            top_per_channel: 5,
        }
    }
}

pub fn rank(tally: &ReactionTally) -> RankedList {
    let mut entries: RankedList = tally
        .iter()
        .map(|(name, value)| RankedEntry::new(name.clone(), *value))
        .collect();

    entries.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    entries
}

/// Ranked tallies of every channel with at least one non-zero count, by channel name
pub fn rank_channels(snapshot: &CounterSnapshot) -> Vec<ChannelRanking> {
    let mut channels: Vec<ChannelRanking> = snapshot
        .channels
        .iter()
        .filter(|(_, tally)| tally.values().any(|count| *count > 0))
        .map(|(channel, tally)| ChannelRanking {
            channel: channel.clone(),
            entries: rank(tally),
        })
        .collect();

    channels.sort_by(|a, b| a.channel.cmp(&b.channel));
    channels
}

/// Render the text report posted to Slack.
///
/// ```text
/// Total
/// 1 :+1: 5
/// 2 :tada: 1
///
/// #general
/// 1 :+1: 3
/// ```
pub fn render_report(snapshot: &CounterSnapshot, limits: &ReportLimits) -> String {
    let mut text = String::new();

    text.push_str(TOTAL_HEADER);
    text.push('\n');
    push_entries(&mut text, &rank(&snapshot.global), limits.top_total);

    for ranking in rank_channels(snapshot) {
        text.push_str(&format!("\n#{}\n", ranking.channel));
        push_entries(&mut text, &ranking.entries, limits.top_per_channel);
    }

    text
}

fn push_entries(text: &mut String, entries: &[RankedEntry], limit: usize) {
    for (idx, entry) in entries.iter().take(limit).enumerate() {
        text.push_str(&format!("{} :{}: {}\n", idx + 1, entry.name, entry.value));
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelRanking {
    pub channel: String,
    pub entries: RankedList,
}

/// Untruncated rankings written by `rank --json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingExport {
    pub total: RankedList,
    pub channels: Vec<ChannelRanking>,
}

impl RankingExport {
    pub fn from_snapshot(snapshot: &CounterSnapshot) -> Self {
        Self {
            total: rank(&snapshot.global),
            channels: rank_channels(snapshot),
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| AppError::WriteFile {
            path: path.display().to_string(),
            source: e,
        })?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| AppError::JsonSerialize(e.to_string()))?;
        Ok(())
    }
}
