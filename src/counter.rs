//! Two-level reaction tally shared by every aggregation task.
//!
//! A single mutex guards both the global tally and the per-channel buckets, so
//! one reaction event updates both under one acquisition.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{AppError, Result};

/// Reaction name to cumulative count
pub type ReactionTally = HashMap<String, u64>;

/// Channel name to that channel's tally
pub type ChannelTallyMap = HashMap<String, ReactionTally>;

#[derive(Debug, Default)]
struct Tallies {
    global: ReactionTally,
    channels: ChannelTallyMap,
}

#[derive(Debug, Default)]
pub struct CounterStore {
    inner: Mutex<Tallies>,
}

/// Point-in-time copy of a [`CounterStore`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub global: ReactionTally,
    pub channels: ChannelTallyMap,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Increments never leave the maps half-written, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Tallies> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn increment_global(&self, name: &str, delta: u64) {
        let mut tallies = self.lock();
        *tallies.global.entry(name.to_string()).or_insert(0) += delta;
    }

    /// Create an empty bucket for `channel`. No-op if it already exists.
    pub fn ensure_channel_bucket(&self, channel: &str) {
        let mut tallies = self.lock();
        tallies.channels.entry(channel.to_string()).or_default();
    }

    pub fn increment_channel(&self, channel: &str, name: &str, delta: u64) -> Result<()> {
        let mut tallies = self.lock();
        let bucket = tallies
            .channels
            .get_mut(channel)
            .ok_or_else(|| AppError::MissingChannelBucket(channel.to_string()))?;
        *bucket.entry(name.to_string()).or_insert(0) += delta;
        Ok(())
    }

    /// Apply one reaction to the global tally and to `channel`'s bucket.
    ///
    /// Nothing is written when the bucket is missing.
    pub fn record(&self, channel: &str, name: &str, delta: u64) -> Result<()> {
        let mut tallies = self.lock();
        let bucket = tallies
            .channels
            .get_mut(channel)
            .ok_or_else(|| AppError::MissingChannelBucket(channel.to_string()))?;
        *bucket.entry(name.to_string()).or_insert(0) += delta;
        *tallies.global.entry(name.to_string()).or_insert(0) += delta;
        Ok(())
    }

    pub fn snapshot_global(&self) -> ReactionTally {
        self.lock().global.clone()
    }

    /// Copy of one channel's tally; empty if the channel has no bucket.
    pub fn snapshot_channel(&self, channel: &str) -> ReactionTally {
        self.lock().channels.get(channel).cloned().unwrap_or_default()
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        let tallies = self.lock();
        CounterSnapshot {
            global: tallies.global.clone(),
            channels: tallies.channels.clone(),
        }
    }
}
