//! Raw config-database records as the metadata provider hands them over.
//!
//! Field names follow what the config database stores (`_id`, `maxSize`,
//! `noBalance`, ...) so a JSON dump of the collections deserializes directly.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// One entry of `config.shards`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardRecord {
    /// Shard identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Replica set connection string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Legacy capacity limit in megabytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<i64>,
    /// Operational state code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<i32>,
}

/// One entry of `config.collections`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceRecord {
    /// Namespace, `database.collection`.
    #[serde(rename = "_id")]
    pub id: String,
    /// Shard key specification, field order preserved.
    #[serde(default)]
    pub key: Map<String, Value>,
    /// Whether the shard key is unique.
    #[serde(default)]
    pub unique: bool,
    /// Balancing disabled for this namespace.
    #[serde(default)]
    pub no_balance: bool,
    /// Soft-deleted flag. Absent on current versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropped: Option<bool>,
    /// Binary key chunks use to reference this namespace on newer clusters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
}

impl NamespaceRecord {
    /// Whether the record belongs to the active set.
    pub fn is_active(&self) -> bool {
        !self.dropped.unwrap_or(false)
    }

    /// Shard key fields in declaration order.
    pub fn key_fields(&self) -> Vec<&str> {
        self.key.keys().map(String::as_str).collect()
    }
}

/// One entry of `config.databases`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseRecord {
    /// Database name.
    #[serde(rename = "_id")]
    pub id: String,
    /// Primary shard.
    #[serde(default)]
    pub primary: String,
    /// Sharding enabled. Absent on newer versions.
    #[serde(default)]
    pub partitioned: bool,
}

/// One entry of `config.mongos`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingInstanceRecord {
    /// `host:port` of the router.
    #[serde(rename = "_id")]
    pub id: String,
    /// Advertised server version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mongo_version: Option<String>,
    /// Last heartbeat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ping: Option<DateTime<Utc>>,
    /// Uptime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up: Option<i64>,
    /// Waiting for config changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiting: Option<bool>,
    /// First registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Fully qualified host names the router advertises.
    #[serde(
        rename = "advisoryHostFQDNs",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub advisory_host_fqdns: Option<Vec<String>>,
}

impl RoutingInstanceRecord {
    /// `major.minor` prefix of the advertised version, when it has one.
    pub fn major_version(&self) -> Option<String> {
        self.mongo_version.as_deref().and_then(major_version_of)
    }
}

/// The single `config.version` document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    /// Cluster identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    /// Config metadata version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<i32>,
    /// Oldest metadata version still understood.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_compatible_version: Option<i32>,
}

/// One physical chunk from `config.chunks`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Owning shard.
    pub shard: String,
    /// Namespace, on clusters that address chunks by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ns: Option<String>,
    /// Namespace binary key, on clusters that address chunks by UUID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    /// Jumbo flag; absent means false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jumbo: Option<bool>,
}

/// Chunks grouped by (shard, namespace key) with their counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkGroup {
    /// Owning shard.
    pub shard: String,
    /// Namespace. Filled in during folding when the group is addressed by binary key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ns: Option<String>,
    /// Namespace binary key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    /// Number of chunks in the group.
    pub chunks: u64,
    /// Number of those chunks flagged jumbo.
    #[serde(default)]
    pub jumbo: u64,
}

/// Groups physical chunks by shard and namespace key, counting jumbo chunks.
///
/// Output is sorted by shard, then binary key, then namespace.
pub fn group_chunks(chunks: &[ChunkRecord]) -> Vec<ChunkGroup> {
    let mut groups: BTreeMap<(String, Option<Uuid>, Option<String>), (u64, u64)> = BTreeMap::new();
    for chunk in chunks {
        let key = (chunk.shard.clone(), chunk.uuid, chunk.ns.clone());
        let tally = groups.entry(key).or_default();
        tally.0 += 1;
        if chunk.jumbo == Some(true) {
            tally.1 += 1;
        }
    }
    groups
        .into_iter()
        .map(|((shard, uuid, ns), (chunks, jumbo))| ChunkGroup {
            shard,
            ns,
            uuid,
            chunks,
            jumbo,
        })
        .collect()
}

/// Shape of a log collection as reported by `collStats`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionShape {
    /// `None` when the collection does not exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capped: Option<bool>,
    /// Configured maximum size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
}

impl CollectionShape {
    /// Shape of a capped collection.
    pub fn capped(max_size: u64) -> Self {
        Self {
            capped: Some(true),
            max_size: Some(max_size),
        }
    }

    /// Shape of an existing, uncapped collection.
    pub fn uncapped() -> Self {
        Self {
            capped: Some(false),
            max_size: None,
        }
    }

    /// Whether the collection exists at all.
    pub fn exists(&self) -> bool {
        self.capped.is_some()
    }

    /// Whether the collection exists and is capped.
    pub fn is_capped(&self) -> bool {
        self.capped == Some(true)
    }
}

/// `details` of a `config.actionlog` entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDetails {
    /// Round duration in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_millis: Option<u64>,
    /// Chunks migrated during the round.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks_moved: Option<u64>,
    /// Whether the round hit an error. Stored misspelled by the server.
    #[serde(rename = "errorOccured", default, skip_serializing_if = "Option::is_none")]
    pub error_occurred: Option<bool>,
}

/// One entry of `config.actionlog`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    /// Action name, `balancer.round` for balancer rounds.
    pub what: String,
    /// When the action was logged.
    pub time: DateTime<Utc>,
    /// Round details.
    #[serde(default)]
    pub details: ActionDetails,
}

/// One entry of `config.changelog`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    /// Change name, e.g. `split`, `multi-split`, `moveChunk.commit`.
    pub what: String,
    /// When the change was logged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    /// Namespace the change applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ns: Option<String>,
}

/// `major.minor` prefix of a dotted version string.
pub fn major_version_of(version: &str) -> Option<String> {
    let toks: Vec<&str> = version.split('.').collect();
    if toks.len() < 2 {
        return None;
    }
    Some(toks[..2].join("."))
}
