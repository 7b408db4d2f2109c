//! One inspection pass over a config-database snapshot.
//!
//! Topology Builder, then both log rollups, then the anomaly rules. Each pass
//! is independent; nothing is kept between snapshots.

use std::borrow::Cow;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::advisory::{AdvisorySource, VersionOrdering};
use crate::anomaly::{AnomalyEngine, AnomalyThresholds, Finding};
use crate::charts::{ChartKind, ChartSeries};
use crate::error::Result;
use crate::eventlog::{BalancerLog, SplitLog};
use crate::records::{
    group_chunks, ActionLogEntry, ChangeLogEntry, ChunkGroup, ChunkRecord, CollectionShape,
    DatabaseRecord, NamespaceRecord, RoutingInstanceRecord, ShardRecord, VersionRecord,
};
use crate::render::{EnglishRenderer, WarningRenderer};
use crate::topology::{ClusterVersion, TopologyBuilder, TopologyModel};

/// A log collection: its shape and its entries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogSnapshot<T> {
    /// Collection shape from `collStats`.
    #[serde(default)]
    pub shape: CollectionShape,
    /// Log entries in any order.
    #[serde(default = "Vec::new")]
    pub entries: Vec<T>,
}

impl<T> Default for LogSnapshot<T> {
    fn default() -> Self {
        Self {
            shape: CollectionShape::default(),
            entries: Vec::new(),
        }
    }
}

/// Everything the metadata provider read from the config database.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    /// Version reported by the router the snapshot was taken through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// `config.version`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_version: Option<VersionRecord>,
    /// `config.shards`.
    #[serde(default)]
    pub shards: Vec<ShardRecord>,
    /// `config.mongos`.
    #[serde(default)]
    pub mongos: Vec<RoutingInstanceRecord>,
    /// `config.databases`.
    #[serde(default)]
    pub databases: Vec<DatabaseRecord>,
    /// `config.collections`.
    #[serde(default)]
    pub collections: Vec<NamespaceRecord>,
    /// Chunks already grouped by shard and namespace.
    #[serde(default)]
    pub chunk_groups: Vec<ChunkGroup>,
    /// Raw chunks, grouped on load when `chunk_groups` is empty.
    #[serde(default)]
    pub chunks: Vec<ChunkRecord>,
    /// `config.actionlog`.
    #[serde(default)]
    pub actionlog: LogSnapshot<ActionLogEntry>,
    /// `config.changelog`.
    #[serde(default)]
    pub changelog: LogSnapshot<ChangeLogEntry>,
}

impl ClusterSnapshot {
    /// Parses a JSON snapshot.
    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    /// Reads a JSON snapshot file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Chunk groups to fold, grouping raw chunks if only those were supplied.
    pub fn chunk_groups(&self) -> Cow<'_, [ChunkGroup]> {
        if !self.chunk_groups.is_empty() {
            if !self.chunks.is_empty() {
                tracing::warn!(
                    "snapshot has both chunk groups and raw chunks; ignoring {} raw chunks",
                    self.chunks.len()
                );
            }
            Cow::Borrowed(&self.chunk_groups)
        } else {
            Cow::Owned(group_chunks(&self.chunks))
        }
    }
}

/// Per-pass settings. Passed explicitly; there is no process-wide state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InspectConfig {
    /// Version to assume when the snapshot does not report one.
    pub mongo_version: Option<String>,
    /// Rule thresholds.
    pub thresholds: AnomalyThresholds,
    /// Ordering used for advisory range matching.
    pub version_ordering: VersionOrdering,
}

/// Output of one pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InspectionReport {
    /// Consolidated topology.
    pub topology: TopologyModel,
    /// Balancer log rollup.
    pub actions: BalancerLog,
    /// Split log rollup.
    pub changes: SplitLog,
    /// Structured rule results in rule order.
    pub findings: Vec<Finding>,
    /// Rendered findings.
    pub warnings: Vec<String>,
    /// At least one advisory covers the cluster version.
    pub upgrade_recommended: bool,
    /// One-paragraph overview.
    pub summary: String,
}

impl InspectionReport {
    /// Chart series over this report's logs.
    pub fn chart(&self, kind: ChartKind) -> ChartSeries {
        kind.series(&self.actions, &self.changes)
    }
}

/// Runs inspection passes.
#[derive(Clone, Debug, Default)]
pub struct Inspector {
    config: InspectConfig,
}

impl Inspector {
    /// Creates an inspector.
    pub fn new(config: InspectConfig) -> Self {
        Self { config }
    }

    /// Inspects a snapshot, rendering warnings in English.
    pub fn inspect(
        &self,
        snapshot: &ClusterSnapshot,
        advisories: &dyn AdvisorySource,
    ) -> Result<InspectionReport> {
        self.inspect_with(snapshot, advisories, &EnglishRenderer)
    }

    /// Inspects a snapshot with a custom renderer.
    pub fn inspect_with(
        &self,
        snapshot: &ClusterSnapshot,
        advisories: &dyn AdvisorySource,
        renderer: &dyn WarningRenderer,
    ) -> Result<InspectionReport> {
        let version = ClusterVersion::resolve(
            snapshot.version.as_deref(),
            self.config.mongo_version.as_deref(),
        )?;
        tracing::info!(
            "inspecting cluster version {} (major {})",
            version.version,
            version.major_version.as_deref().unwrap_or("unknown")
        );

        let topology = TopologyBuilder::new(version)
            .config_version(snapshot.config_version.clone())
            .shards(snapshot.shards.iter().cloned())
            .namespaces(snapshot.collections.iter().cloned())
            .routers(snapshot.mongos.iter().cloned())
            .databases(snapshot.databases.iter().cloned())
            .build(&snapshot.chunk_groups())?;

        let actions = BalancerLog::from_entries(
            snapshot.actionlog.shape.clone(),
            &snapshot.actionlog.entries,
        );
        let changes = SplitLog::from_entries(
            snapshot.changelog.shape.clone(),
            &snapshot.changelog.entries,
        );

        let engine = AnomalyEngine::new(
            self.config.thresholds.clone(),
            self.config.version_ordering,
        );
        let findings = engine.evaluate(&topology, &actions, &changes, advisories);
        let warnings = renderer.render_all(&findings);
        let upgrade_recommended = findings
            .iter()
            .any(|f| matches!(f, Finding::UpgradeRecommended { .. }));
        let summary = EnglishRenderer.summary(&topology);

        Ok(InspectionReport {
            topology,
            actions,
            changes,
            findings,
            warnings,
            upgrade_recommended,
            summary,
        })
    }
}
