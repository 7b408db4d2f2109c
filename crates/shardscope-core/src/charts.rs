//! Time series handed to chart renderers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::eventlog::{BalancerLog, SplitLog};

/// Charts available over the event logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Average balancer round time per hour.
    MigrationTime,
    /// Chunks moved and errors per hour.
    MigrationStats,
    /// Chunk splits per hour.
    Splits,
}

impl ChartKind {
    /// All charts, in menu order.
    pub const ALL: [ChartKind; 3] = [
        ChartKind::MigrationTime,
        ChartKind::MigrationStats,
        ChartKind::Splits,
    ];

    /// Chart title.
    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::MigrationTime => "Average Chunk Migration Time",
            ChartKind::MigrationStats => "Chunk Migration Counts",
            ChartKind::Splits => "No. of Chunk Splits",
        }
    }

    /// Builds the series from the aggregated logs.
    pub fn series(&self, actions: &BalancerLog, changes: &SplitLog) -> ChartSeries {
        let (columns, rows): (Vec<&str>, Vec<Vec<Value>>) = match self {
            ChartKind::MigrationTime => (
                vec!["Date/Time", "Execution Time"],
                actions
                    .rounds
                    .iter()
                    .map(|r| vec![json!(r.hour), json!(r.average_execution_time)])
                    .collect(),
            ),
            ChartKind::MigrationStats => (
                vec!["Date/Time", "Chunks Moved", "Error Count"],
                actions
                    .rounds
                    .iter()
                    .map(|r| {
                        vec![
                            json!(r.hour),
                            json!(r.total_chunks_moved),
                            json!(r.total_errors),
                        ]
                    })
                    .collect(),
            ),
            ChartKind::Splits => (
                vec!["Date/Time", "Splits"],
                changes
                    .splits
                    .iter()
                    .map(|s| vec![json!(s.hour), json!(s.total)])
                    .collect(),
            ),
        };
        ChartSeries {
            kind: *self,
            title: self.title().to_string(),
            columns: columns.into_iter().map(String::from).collect(),
            rows,
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChartKind::MigrationTime => "migration_time",
            ChartKind::MigrationStats => "migration_stats",
            ChartKind::Splits => "splits",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartKind::ALL
            .into_iter()
            .find(|k| k.to_string() == s)
            .ok_or_else(|| format!("unsupported chart {}", s))
    }
}

/// Column-oriented chart data, one row per hour, oldest first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Which chart.
    pub kind: ChartKind,
    /// Chart title.
    pub title: String,
    /// Column headers; the first is always the hour.
    pub columns: Vec<String>,
    /// Data rows.
    pub rows: Vec<Vec<Value>>,
}

impl ChartSeries {
    /// True when there is nothing to plot.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
