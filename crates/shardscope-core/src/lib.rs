#![warn(missing_docs)]

//! shardscope engine: joins sharded-cluster config metadata into a topology,
//! rolls the balancer and split logs up into hourly series, and evaluates the
//! anomaly and upgrade-advisory rules over the result.
//!
//! Pipeline: Snapshot → TopologyBuilder → TopologyModel ─┐
//!           Snapshot → BalancerLog / SplitLog ──────────┴→ AnomalyEngine → Findings → Renderer

pub mod advisory;
pub mod anomaly;
pub mod charts;
pub mod error;
pub mod eventlog;
pub mod inspect;
pub mod records;
pub mod render;
pub mod topology;

pub use advisory::{Advisory, AdvisoryRef, AdvisorySource, AdvisoryTable, NoAdvisories, VersionOrdering};
pub use anomaly::{AnomalyEngine, AnomalyThresholds, Finding};
pub use charts::{ChartKind, ChartSeries};
pub use error::{Result, ScopeError};
pub use eventlog::{BalancerHour, BalancerLog, BalancerRollup, SplitHour, SplitLog};
pub use inspect::{ClusterSnapshot, InspectConfig, InspectionReport, Inspector, LogSnapshot};
pub use records::{
    ActionLogEntry, ChangeLogEntry, ChunkGroup, ChunkRecord, CollectionShape, DatabaseRecord,
    NamespaceRecord, RoutingInstanceRecord, ShardRecord, VersionRecord,
};
pub use render::{EnglishRenderer, WarningRenderer};
pub use topology::{
    AddressingMode, ClusterVersion, NameValue, NamespaceTally, Origin, ShardTally,
    TopologyBuilder, TopologyModel,
};
