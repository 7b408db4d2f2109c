//! Rollups of the balancer action log and the split change log.
//!
//! Each log is reduced twice with the same reduction: once over the whole
//! stream and once per UTC hour. Hourly buckets are always returned in
//! ascending time order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::records::{ActionLogEntry, ChangeLogEntry, CollectionShape};

/// `what` of a balancer round in `config.actionlog`.
pub const BALANCER_ROUND: &str = "balancer.round";

/// `what` values counted as splits in `config.changelog`.
pub const SPLIT_KINDS: [&str; 2] = ["split", "multi-split"];

/// Bucket label format: the event time truncated to the top of its hour.
pub const HOUR_FORMAT: &str = "%Y-%m-%dT%H:00:00.000Z";

/// Formats the hour bucket label of a timestamp.
pub fn hour_label(time: &DateTime<Utc>) -> String {
    time.format(HOUR_FORMAT).to_string()
}

/// Parses an hour bucket label back into a timestamp.
pub fn parse_hour(label: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(label)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// A balancer round extracted from an action log entry.
#[derive(Clone, Debug, PartialEq)]
pub struct BalancerRoundSample {
    /// When the round was logged.
    pub time: DateTime<Utc>,
    /// Round duration, if recorded.
    pub execution_time_millis: Option<u64>,
    /// Chunks migrated, if recorded.
    pub chunks_moved: Option<u64>,
    /// Round hit an error.
    pub error_occurred: bool,
}

impl BalancerRoundSample {
    /// Returns `None` for entries that are not balancer rounds.
    pub fn from_entry(entry: &ActionLogEntry) -> Option<Self> {
        if entry.what != BALANCER_ROUND {
            return None;
        }
        Some(Self {
            time: entry.time,
            execution_time_millis: entry.details.execution_time_millis,
            chunks_moved: entry.details.chunks_moved,
            error_occurred: entry.details.error_occurred == Some(true),
        })
    }
}

#[derive(Default)]
struct RoundTotals {
    rounds: u64,
    chunks_moved: u64,
    errors: u64,
    timed_rounds: u64,
    total_millis: u128,
    max_millis: Option<u64>,
}

impl RoundTotals {
    fn add(&mut self, sample: &BalancerRoundSample) {
        self.rounds += 1;
        self.chunks_moved += sample.chunks_moved.unwrap_or(0);
        if sample.error_occurred {
            self.errors += 1;
        }
        // rounds without a duration still count toward moved/errors
        if let Some(ms) = sample.execution_time_millis {
            self.timed_rounds += 1;
            self.total_millis += u128::from(ms);
            self.max_millis = Some(self.max_millis.map_or(ms, |m| m.max(ms)));
        }
    }

    fn average_millis(&self) -> Option<f64> {
        if self.timed_rounds == 0 {
            None
        } else {
            Some(self.total_millis as f64 / self.timed_rounds as f64)
        }
    }
}

/// Whole-stream statistics of the balancer log.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BalancerRollup {
    /// Balancer rounds seen.
    pub rounds: u64,
    /// Sum of chunks moved.
    pub total_chunks_moved: u64,
    /// Rounds that hit an error.
    pub total_errors: u64,
    /// Mean round duration; `None` when no round recorded one.
    pub average_execution_time: Option<f64>,
    /// Longest round duration.
    pub max_execution_time: Option<u64>,
}

/// Balancer activity within one UTC hour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalancerHour {
    /// Bucket label, e.g. `2024-01-01T10:00:00.000Z`.
    pub hour: String,
    /// Bucket start.
    pub time: DateTime<Utc>,
    /// Rounds in the hour.
    pub rounds: u64,
    /// Mean round duration in the hour.
    pub average_execution_time: Option<f64>,
    /// Chunks moved in the hour.
    pub total_chunks_moved: u64,
    /// Rounds with errors in the hour.
    pub total_errors: u64,
}

/// Aggregated `config.actionlog`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BalancerLog {
    /// Collection shape; `capped` is `None` when the collection is absent.
    pub shape: CollectionShape,
    /// Whole-stream rollup.
    pub stats: BalancerRollup,
    /// Hourly buckets, oldest first.
    pub rounds: Vec<BalancerHour>,
}

impl BalancerLog {
    /// Reduces action log entries; non-round entries are ignored.
    pub fn from_entries(shape: CollectionShape, entries: &[ActionLogEntry]) -> Self {
        let mut totals = RoundTotals::default();
        let mut hours: BTreeMap<String, RoundTotals> = BTreeMap::new();

        for sample in entries.iter().filter_map(BalancerRoundSample::from_entry) {
            totals.add(&sample);
            hours.entry(hour_label(&sample.time)).or_default().add(&sample);
        }

        let mut rounds: Vec<BalancerHour> = hours
            .into_iter()
            .filter_map(|(hour, t)| {
                let time = parse_hour(&hour)?;
                Some(BalancerHour {
                    average_execution_time: t.average_millis(),
                    total_chunks_moved: t.chunks_moved,
                    total_errors: t.errors,
                    rounds: t.rounds,
                    time,
                    hour,
                })
            })
            .collect();
        rounds.sort_by_key(|r| r.time);

        let stats = BalancerRollup {
            rounds: totals.rounds,
            total_chunks_moved: totals.chunks_moved,
            total_errors: totals.errors,
            average_execution_time: totals.average_millis(),
            max_execution_time: totals.max_millis,
        };
        tracing::debug!(
            "actionlog: {} rounds in {} hourly buckets, {} chunks moved",
            stats.rounds,
            rounds.len(),
            stats.total_chunks_moved
        );
        Self {
            shape,
            stats,
            rounds,
        }
    }

    /// Whether `config.actionlog` exists.
    pub fn exists(&self) -> bool {
        self.shape.exists()
    }
}

/// Splits within one UTC hour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitHour {
    /// Bucket label.
    pub hour: String,
    /// Bucket start.
    pub time: DateTime<Utc>,
    /// Splits in the hour.
    pub total: u64,
}

/// Aggregated `config.changelog`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitLog {
    /// Collection shape.
    pub shape: CollectionShape,
    /// Splits across the whole stream.
    pub total_splits: u64,
    /// Hourly buckets, oldest first.
    pub splits: Vec<SplitHour>,
}

impl SplitLog {
    /// Counts `split` and `multi-split` entries that carry a time.
    pub fn from_entries(shape: CollectionShape, entries: &[ChangeLogEntry]) -> Self {
        let mut hours: BTreeMap<String, u64> = BTreeMap::new();
        for entry in entries
            .iter()
            .filter(|e| SPLIT_KINDS.contains(&e.what.as_str()))
        {
            let Some(time) = entry.time else { continue };
            *hours.entry(hour_label(&time)).or_default() += 1;
        }

        let mut splits: Vec<SplitHour> = hours
            .into_iter()
            .filter_map(|(hour, total)| {
                let time = parse_hour(&hour)?;
                Some(SplitHour { hour, time, total })
            })
            .collect();
        splits.sort_by_key(|s| s.time);
        let total_splits = splits.iter().map(|s| s.total).sum();

        tracing::debug!(
            "changelog: {} splits in {} hourly buckets",
            total_splits,
            splits.len()
        );
        Self {
            shape,
            total_splits,
            splits,
        }
    }

    /// Whether `config.changelog` exists.
    pub fn exists(&self) -> bool {
        self.shape.exists()
    }
}
