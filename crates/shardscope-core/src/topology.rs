//! Cluster topology assembled from config metadata.
//!
//! The builder joins chunk groups to shards and namespaces and tallies chunk
//! placement. Chunks reference their namespace either by name or, on newer
//! clusters, by the namespace's binary key; the mode is decided once per
//! snapshot from the first chunk group.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{Result, ScopeError};
use crate::records::{
    major_version_of, ChunkGroup, DatabaseRecord, NamespaceRecord, RoutingInstanceRecord,
    ShardRecord, VersionRecord,
};

/// Number of named slices in a chunk distribution; the rest are folded together.
pub const DISTRIBUTION_TOP_N: usize = 10;

/// Label of the folded remainder slice.
pub const OTHERS_LABEL: &str = "Beyond the top 10";

/// How chunk records reference their namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressingMode {
    /// Chunks carry the namespace name in `ns`.
    ByNamespaceId,
    /// Chunks carry the namespace binary key in `uuid`.
    ByBinaryKey,
}

impl AddressingMode {
    /// Decides the snapshot-wide mode from the probe (first) chunk group.
    pub fn probe(groups: &[ChunkGroup]) -> Self {
        groups
            .first()
            .map(Self::of)
            .unwrap_or(AddressingMode::ByNamespaceId)
    }

    /// Mode a single chunk group is addressed with.
    pub fn of(group: &ChunkGroup) -> Self {
        if group.uuid.is_some() {
            AddressingMode::ByBinaryKey
        } else {
            AddressingMode::ByNamespaceId
        }
    }
}

impl fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressingMode::ByNamespaceId => write!(f, "namespace-id addressing"),
            AddressingMode::ByBinaryKey => write!(f, "binary-key addressing"),
        }
    }
}

/// Where a tally entry came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Backed by a catalog record.
    Catalog,
    /// Synthesized because a chunk referenced an unknown shard or namespace.
    Placeholder,
}

/// A shard with its chunk placement tallies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShardTally {
    /// Shard identifier.
    pub id: String,
    /// Replica set connection string.
    pub host: Option<String>,
    /// Legacy capacity limit.
    pub max_size: Option<i64>,
    /// Operational state code.
    pub state: Option<i32>,
    /// Chunks owned by the shard.
    pub chunks: u64,
    /// Jumbo chunks owned by the shard.
    pub jumbo: u64,
    /// Catalog record or placeholder.
    pub origin: Origin,
    /// Chunks per namespace on this shard.
    pub namespaces: BTreeMap<String, u64>,
}

impl ShardTally {
    /// Creates a zero tally from a catalog record.
    pub fn from_record(record: ShardRecord) -> Self {
        Self {
            id: record.id,
            host: record.host,
            max_size: record.max_size,
            state: record.state,
            chunks: 0,
            jumbo: 0,
            origin: Origin::Catalog,
            namespaces: BTreeMap::new(),
        }
    }

    /// Creates a zero tally for a shard missing from the catalog.
    pub fn placeholder(id: &str) -> Self {
        Self {
            id: id.to_string(),
            host: None,
            max_size: None,
            state: None,
            chunks: 0,
            jumbo: 0,
            origin: Origin::Placeholder,
            namespaces: BTreeMap::new(),
        }
    }

    /// Whether this shard was synthesized during folding.
    pub fn is_placeholder(&self) -> bool {
        self.origin == Origin::Placeholder
    }

    fn record(&mut self, ns: &str, chunks: u64, jumbo: u64) {
        self.chunks += chunks;
        self.jumbo += jumbo;
        *self.namespaces.entry(ns.to_string()).or_default() += chunks;
    }
}

/// A sharded namespace with its chunk placement tallies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamespaceTally {
    /// Namespace, `database.collection`.
    pub id: String,
    /// Shard key specification.
    pub key: Map<String, Value>,
    /// Unique shard key.
    pub unique: bool,
    /// Balancing disabled.
    pub no_balance: bool,
    /// Binary key, if the catalog stores one.
    pub uuid: Option<Uuid>,
    /// Chunks of this namespace across all shards.
    pub chunks: u64,
    /// Catalog record or placeholder.
    pub origin: Origin,
    /// Chunks per shard for this namespace.
    pub shards: BTreeMap<String, u64>,
}

impl NamespaceTally {
    /// Creates a zero tally from a catalog record.
    pub fn from_record(record: NamespaceRecord) -> Self {
        Self {
            id: record.id,
            key: record.key,
            unique: record.unique,
            no_balance: record.no_balance,
            uuid: record.uuid,
            chunks: 0,
            origin: Origin::Catalog,
            shards: BTreeMap::new(),
        }
    }

    /// Creates a zero tally for a namespace missing from the catalog.
    pub fn placeholder(id: &str) -> Self {
        Self {
            id: id.to_string(),
            key: Map::new(),
            unique: false,
            no_balance: false,
            uuid: None,
            chunks: 0,
            origin: Origin::Placeholder,
            shards: BTreeMap::new(),
        }
    }

    /// Whether this namespace was synthesized during folding.
    pub fn is_placeholder(&self) -> bool {
        self.origin == Origin::Placeholder
    }

    /// Shard key rendered as `{ brand: 1, year: 1 }`.
    pub fn key_display(&self) -> String {
        if self.key.is_empty() {
            return "{}".to_string();
        }
        let fields: Vec<String> = self
            .key
            .iter()
            .map(|(field, dir)| match dir {
                Value::String(s) => format!("{}: \"{}\"", field, s),
                other => format!("{}: {}", field, other),
            })
            .collect();
        format!("{{ {} }}", fields.join(", "))
    }

    fn record(&mut self, shard: &str, chunks: u64) {
        self.chunks += chunks;
        *self.shards.entry(shard.to_string()).or_default() += chunks;
    }
}

/// The cluster's own version and where it came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterVersion {
    /// Raw version string, e.g. `7.0.1`.
    pub version: String,
    /// `major.minor` prefix.
    pub major_version: Option<String>,
    /// The version was supplied by the operator rather than read from the cluster.
    pub is_user_version: bool,
}

impl ClusterVersion {
    /// Version reported by the cluster itself.
    pub fn reported(version: &str) -> Self {
        Self {
            version: version.to_string(),
            major_version: major_version_of(version),
            is_user_version: false,
        }
    }

    /// Version supplied by the operator, e.g. for a restored config dump.
    pub fn supplied(version: &str) -> Self {
        Self {
            is_user_version: true,
            ..Self::reported(version)
        }
    }

    /// Picks the reported version, falling back to the supplied one.
    pub fn resolve(reported: Option<&str>, supplied: Option<&str>) -> Result<Self> {
        match (reported, supplied) {
            (Some(v), _) if !v.is_empty() => Ok(Self::reported(v)),
            (_, Some(v)) if !v.is_empty() => Ok(Self::supplied(v)),
            _ => Err(ScopeError::MissingVersion),
        }
    }
}

/// One slice of a chunk distribution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameValue {
    /// Namespace or shard name.
    pub name: String,
    /// Chunk count.
    pub value: u64,
}

/// Consolidated topology of one snapshot. Read-only once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopologyModel {
    /// Cluster version.
    pub version: ClusterVersion,
    /// `config.version` document.
    pub config_version: Option<VersionRecord>,
    /// How chunks referenced namespaces in this snapshot.
    pub addressing: AddressingMode,
    /// Shards by id.
    pub shards: BTreeMap<String, ShardTally>,
    /// Active namespaces by id.
    pub namespaces: BTreeMap<String, NamespaceTally>,
    /// Routers, most recent heartbeat first.
    pub routers: Vec<RoutingInstanceRecord>,
    /// Most recent router heartbeat.
    pub last_ping: Option<DateTime<Utc>>,
    /// Databases, partitioned first, then by name.
    pub databases: Vec<DatabaseRecord>,
    /// Chunk groups with their namespace resolved.
    pub chunk_groups: Vec<ChunkGroup>,
}

impl TopologyModel {
    /// Total chunks across all shards.
    pub fn total_chunks(&self) -> u64 {
        self.shards.values().map(|s| s.chunks).sum()
    }

    /// Total jumbo chunks across all shards.
    pub fn total_jumbo(&self) -> u64 {
        self.shards.values().map(|s| s.jumbo).sum()
    }

    /// Number of shards with a `maxSize` configured.
    pub fn shards_with_max_size(&self) -> usize {
        self.shards.values().filter(|s| s.max_size.is_some()).count()
    }

    /// Whether a router runs the cluster's `major.minor` version.
    ///
    /// Routers whose version has fewer than two components are not judged.
    pub fn router_version_matches(&self, router: &RoutingInstanceRecord) -> Option<bool> {
        router
            .major_version()
            .map(|major| Some(major.as_str()) == self.version.major_version.as_deref())
    }

    /// Number of routers on a different `major.minor` than the cluster.
    pub fn mismatched_routers(&self) -> usize {
        self.routers
            .iter()
            .filter(|r| self.router_version_matches(r) == Some(false))
            .count()
    }

    /// Namespaces ordered by chunk count, largest first.
    pub fn ranked_namespaces(&self) -> Vec<&NamespaceTally> {
        let mut ranked: Vec<&NamespaceTally> = self.namespaces.values().collect();
        ranked.sort_by(|a, b| b.chunks.cmp(&a.chunks).then_with(|| a.id.cmp(&b.id)));
        ranked
    }

    /// Chunk distribution of a shard across namespaces.
    pub fn shard_distribution(&self, shard_id: &str) -> Option<Vec<NameValue>> {
        self.shards
            .get(shard_id)
            .map(|s| distribution(&s.namespaces))
    }

    /// Chunk distribution of a namespace across shards.
    pub fn namespace_distribution(&self, ns: &str) -> Option<Vec<NameValue>> {
        self.namespaces.get(ns).map(|n| distribution(&n.shards))
    }

    /// Ids of shards synthesized during folding.
    pub fn placeholder_shards(&self) -> Vec<&str> {
        self.shards
            .values()
            .filter(|s| s.is_placeholder())
            .map(|s| s.id.as_str())
            .collect()
    }

    /// Ids of namespaces synthesized during folding.
    pub fn placeholder_namespaces(&self) -> Vec<&str> {
        self.namespaces
            .values()
            .filter(|n| n.is_placeholder())
            .map(|n| n.id.as_str())
            .collect()
    }
}

/// Largest slices first, everything past the top N folded into one slice.
fn distribution(counts: &BTreeMap<String, u64>) -> Vec<NameValue> {
    let mut sorted: Vec<(&String, &u64)> = counts.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let mut slices: Vec<NameValue> = sorted
        .iter()
        .take(DISTRIBUTION_TOP_N)
        .map(|(name, value)| NameValue {
            name: (*name).clone(),
            value: **value,
        })
        .collect();
    let others: u64 = sorted.iter().skip(DISTRIBUTION_TOP_N).map(|(_, v)| **v).sum();
    if others > 0 {
        slices.push(NameValue {
            name: OTHERS_LABEL.to_string(),
            value: others,
        });
    }
    slices
}

/// Joins raw config records into a [`TopologyModel`].
///
/// Shards and namespaces must be supplied before [`TopologyBuilder::build`];
/// the binary-key index is populated from the namespace records.
pub struct TopologyBuilder {
    version: ClusterVersion,
    config_version: Option<VersionRecord>,
    shards: BTreeMap<String, ShardTally>,
    namespaces: BTreeMap<String, NamespaceTally>,
    key_index: HashMap<Uuid, String>,
    routers: Vec<RoutingInstanceRecord>,
    databases: Vec<DatabaseRecord>,
}

impl TopologyBuilder {
    /// Creates an empty builder for a cluster at the given version.
    pub fn new(version: ClusterVersion) -> Self {
        Self {
            version,
            config_version: None,
            shards: BTreeMap::new(),
            namespaces: BTreeMap::new(),
            key_index: HashMap::new(),
            routers: Vec::new(),
            databases: Vec::new(),
        }
    }

    /// Sets the `config.version` document.
    pub fn config_version(mut self, record: Option<VersionRecord>) -> Self {
        self.config_version = record;
        self
    }

    /// Adds shard records.
    pub fn shards(mut self, records: impl IntoIterator<Item = ShardRecord>) -> Self {
        for record in records {
            self.shards
                .insert(record.id.clone(), ShardTally::from_record(record));
        }
        self
    }

    /// Adds namespace records, skipping dropped ones, and indexes their binary keys.
    pub fn namespaces(mut self, records: impl IntoIterator<Item = NamespaceRecord>) -> Self {
        for record in records.into_iter().filter(NamespaceRecord::is_active) {
            if let Some(uuid) = record.uuid {
                self.key_index.insert(uuid, record.id.clone());
            }
            self.namespaces
                .insert(record.id.clone(), NamespaceTally::from_record(record));
        }
        self
    }

    /// Adds router records.
    pub fn routers(mut self, records: impl IntoIterator<Item = RoutingInstanceRecord>) -> Self {
        self.routers.extend(records);
        self
    }

    /// Adds database records.
    pub fn databases(mut self, records: impl IntoIterator<Item = DatabaseRecord>) -> Self {
        self.databases.extend(records);
        self
    }

    /// Folds chunk groups into the shard and namespace tallies.
    ///
    /// Fails with [`ScopeError::MixedAddressing`] before touching any tally if
    /// the groups do not all use the probe group's addressing mode.
    pub fn build(mut self, groups: &[ChunkGroup]) -> Result<TopologyModel> {
        let mode = AddressingMode::probe(groups);
        if let Some(bad) = groups.iter().find(|g| AddressingMode::of(g) != mode) {
            return Err(ScopeError::MixedAddressing {
                expected: mode,
                found: AddressingMode::of(bad),
                shard: bad.shard.clone(),
            });
        }
        if mode == AddressingMode::ByBinaryKey {
            let unkeyed = self.namespaces.values().filter(|n| n.uuid.is_none()).count();
            if unkeyed > 0 {
                tracing::warn!(
                    "{} namespaces have no binary key; their chunks cannot be resolved",
                    unkeyed
                );
            }
        }
        tracing::debug!(
            "folding {} chunk groups using {} ({} keyed namespaces)",
            groups.len(),
            mode,
            self.key_index.len()
        );

        let mut resolved = Vec::with_capacity(groups.len());
        for group in groups {
            let ns = self.resolve_namespace(mode, group);
            self.shard_entry(&group.shard)
                .record(&ns, group.chunks, group.jumbo);
            self.namespace_entry(&ns).record(&group.shard, group.chunks);
            resolved.push(ChunkGroup {
                ns: Some(ns),
                ..group.clone()
            });
        }

        self.routers.sort_by(|a, b| b.ping.cmp(&a.ping));
        let last_ping = self.routers.first().and_then(|r| r.ping);
        self.databases.sort_by(|a, b| {
            b.partitioned
                .cmp(&a.partitioned)
                .then_with(|| a.id.cmp(&b.id))
        });

        let model = TopologyModel {
            version: self.version,
            config_version: self.config_version,
            addressing: mode,
            shards: self.shards,
            namespaces: self.namespaces,
            routers: self.routers,
            last_ping,
            databases: self.databases,
            chunk_groups: resolved,
        };
        tracing::info!(
            "topology: {} shards, {} namespaces, {} routers, {} chunks",
            model.shards.len(),
            model.namespaces.len(),
            model.routers.len(),
            model.total_chunks()
        );
        Ok(model)
    }

    /// Unresolvable keys resolve to the empty namespace.
    fn resolve_namespace(&self, mode: AddressingMode, group: &ChunkGroup) -> String {
        match mode {
            AddressingMode::ByNamespaceId => group.ns.clone().unwrap_or_default(),
            AddressingMode::ByBinaryKey => group
                .uuid
                .and_then(|key| self.key_index.get(&key).cloned())
                .unwrap_or_default(),
        }
    }

    fn shard_entry(&mut self, id: &str) -> &mut ShardTally {
        self.shards.entry(id.to_string()).or_insert_with(|| {
            tracing::debug!("chunk references unknown shard '{}', adding placeholder", id);
            ShardTally::placeholder(id)
        })
    }

    fn namespace_entry(&mut self, id: &str) -> &mut NamespaceTally {
        self.namespaces.entry(id.to_string()).or_insert_with(|| {
            tracing::debug!("chunk references unknown namespace '{}', adding placeholder", id);
            NamespaceTally::placeholder(id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shard(id: &str, max_size: Option<i64>) -> ShardRecord {
        ShardRecord {
            id: id.to_string(),
            host: Some(format!("{}/host-{}:27018", id, id)),
            max_size,
            state: Some(1),
        }
    }

    fn namespace(id: &str, uuid: Option<Uuid>) -> NamespaceRecord {
        NamespaceRecord {
            id: id.to_string(),
            uuid,
            ..Default::default()
        }
    }

    fn by_name(shard: &str, ns: &str, chunks: u64, jumbo: u64) -> ChunkGroup {
        ChunkGroup {
            shard: shard.to_string(),
            ns: Some(ns.to_string()),
            uuid: None,
            chunks,
            jumbo,
        }
    }

    fn by_key(shard: &str, uuid: Uuid, chunks: u64) -> ChunkGroup {
        ChunkGroup {
            shard: shard.to_string(),
            ns: None,
            uuid: Some(uuid),
            chunks,
            jumbo: 0,
        }
    }

    fn router(id: &str, version: &str, ping_secs: Option<i64>) -> RoutingInstanceRecord {
        RoutingInstanceRecord {
            id: id.to_string(),
            mongo_version: Some(version.to_string()),
            ping: ping_secs.and_then(|s| DateTime::from_timestamp(s, 0)),
            ..Default::default()
        }
    }

    fn builder() -> TopologyBuilder {
        TopologyBuilder::new(ClusterVersion::reported("7.0.1"))
    }

    #[test]
    fn test_fold_by_namespace_id() {
        let model = builder()
            .shards(vec![shard("s1", None), shard("s2", None)])
            .namespaces(vec![namespace("db.a", None), namespace("db.b", None)])
            .build(&[
                by_name("s1", "db.a", 5, 1),
                by_name("s1", "db.b", 3, 0),
                by_name("s2", "db.a", 4, 2),
            ])
            .unwrap();

        assert_eq!(model.addressing, AddressingMode::ByNamespaceId);
        assert_eq!(model.shards["s1"].chunks, 8);
        assert_eq!(model.shards["s1"].jumbo, 1);
        assert_eq!(model.shards["s2"].jumbo, 2);
        assert_eq!(model.namespaces["db.a"].chunks, 9);
        assert_eq!(model.namespaces["db.a"].shards["s2"], 4);
        assert_eq!(model.total_chunks(), 12);
        assert_eq!(model.total_jumbo(), 3);
    }

    #[test]
    fn test_fold_by_binary_key_resolves_names() {
        let ka = Uuid::new_v4();
        let kb = Uuid::new_v4();
        let model = builder()
            .shards(vec![shard("s1", None)])
            .namespaces(vec![namespace("db.a", Some(ka)), namespace("db.b", Some(kb))])
            .build(&[by_key("s1", ka, 7), by_key("s1", kb, 2)])
            .unwrap();

        assert_eq!(model.addressing, AddressingMode::ByBinaryKey);
        assert_eq!(model.namespaces["db.a"].chunks, 7);
        assert_eq!(model.namespaces["db.b"].chunks, 2);
        assert_eq!(model.chunk_groups[0].ns.as_deref(), Some("db.a"));
    }

    #[test]
    fn test_unresolved_binary_key_goes_to_empty_namespace() {
        let model = builder()
            .shards(vec![shard("s1", None)])
            .namespaces(vec![namespace("db.a", Some(Uuid::new_v4()))])
            .build(&[by_key("s1", Uuid::new_v4(), 4)])
            .unwrap();

        let empty = &model.namespaces[""];
        assert!(empty.is_placeholder());
        assert_eq!(empty.chunks, 4);
        assert_eq!(model.placeholder_namespaces(), vec![""]);
    }

    #[test]
    fn test_mixed_addressing_rejected() {
        let err = builder()
            .shards(vec![shard("s1", None)])
            .build(&[by_key("s1", Uuid::new_v4(), 1), by_name("s9", "db.a", 1, 0)])
            .unwrap_err();
        match err {
            ScopeError::MixedAddressing {
                expected,
                found,
                shard,
            } => {
                assert_eq!(expected, AddressingMode::ByBinaryKey);
                assert_eq!(found, AddressingMode::ByNamespaceId);
                assert_eq!(shard, "s9");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_unknown_shard_becomes_placeholder() {
        let model = builder()
            .shards(vec![shard("s1", None)])
            .namespaces(vec![namespace("db.a", None)])
            .build(&[by_name("ghost", "db.a", 2, 0)])
            .unwrap();

        assert!(model.shards["ghost"].is_placeholder());
        assert!(!model.shards["s1"].is_placeholder());
        assert_eq!(model.shards["ghost"].chunks, 2);
        assert_eq!(model.placeholder_shards(), vec!["ghost"]);
    }

    #[test]
    fn test_dropped_namespaces_excluded() {
        let dropped = NamespaceRecord {
            id: "db.old".to_string(),
            dropped: Some(true),
            ..Default::default()
        };
        let model = builder()
            .namespaces(vec![namespace("db.a", None), dropped])
            .build(&[])
            .unwrap();
        assert_eq!(model.namespaces.len(), 1);
        assert!(model.namespaces.contains_key("db.a"));
    }

    #[test]
    fn test_routers_sorted_by_ping() {
        let model = builder()
            .routers(vec![
                router("m1", "7.0.1", Some(100)),
                router("m2", "7.0.1", None),
                router("m3", "7.0.1", Some(300)),
            ])
            .build(&[])
            .unwrap();
        let ids: Vec<&str> = model.routers.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["m3", "m1", "m2"]);
        assert_eq!(model.last_ping, DateTime::from_timestamp(300, 0));
    }

    #[test]
    fn test_mismatched_routers() {
        let model = builder()
            .routers(vec![
                router("m1", "7.0.4", None),
                router("m2", "6.0.12", None),
                router("m3", "7", None),
                router("m4", "5.0.1", None),
            ])
            .build(&[])
            .unwrap();
        assert_eq!(model.mismatched_routers(), 2);
        assert_eq!(model.router_version_matches(&model.routers[0]), Some(true));
    }

    #[test]
    fn test_databases_partitioned_first() {
        let db = |id: &str, partitioned: bool| DatabaseRecord {
            id: id.to_string(),
            primary: "s1".to_string(),
            partitioned,
        };
        let model = builder()
            .databases(vec![db("zeta", false), db("beta", true), db("alpha", false)])
            .build(&[])
            .unwrap();
        let ids: Vec<&str> = model.databases.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["beta", "alpha", "zeta"]);
    }

    #[test]
    fn test_shards_with_max_size() {
        let model = builder()
            .shards(vec![shard("s1", None), shard("s2", None), shard("s3", Some(5000))])
            .build(&[])
            .unwrap();
        assert_eq!(model.shards_with_max_size(), 1);
    }

    #[test]
    fn test_distribution_folds_beyond_top_n() {
        let groups: Vec<ChunkGroup> = (0..13)
            .map(|i| by_name("s1", &format!("db.c{:02}", i), 20 - i, 0))
            .collect();
        let model = builder().build(&groups).unwrap();
        let slices = model.shard_distribution("s1").unwrap();
        assert_eq!(slices.len(), DISTRIBUTION_TOP_N + 1);
        assert_eq!(slices[0].name, "db.c00");
        assert_eq!(slices[0].value, 20);
        let last = slices.last().unwrap();
        assert_eq!(last.name, OTHERS_LABEL);
        assert_eq!(last.value, 10 + 9 + 8);
        assert!(model.shard_distribution("nope").is_none());
    }

    #[test]
    fn test_ranked_namespaces() {
        let model = builder()
            .build(&[
                by_name("s1", "db.small", 1, 0),
                by_name("s1", "db.big", 9, 0),
                by_name("s2", "db.mid", 5, 0),
            ])
            .unwrap();
        let ids: Vec<&str> = model.ranked_namespaces().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["db.big", "db.mid", "db.small"]);
    }

    #[test]
    fn test_cluster_version_resolution() {
        let v = ClusterVersion::resolve(Some("7.0.1"), Some("6.0")).unwrap();
        assert_eq!(v.version, "7.0.1");
        assert!(!v.is_user_version);

        let v = ClusterVersion::resolve(None, Some("6.0.3")).unwrap();
        assert!(v.is_user_version);
        assert_eq!(v.major_version.as_deref(), Some("6.0"));

        assert!(matches!(
            ClusterVersion::resolve(None, None),
            Err(ScopeError::MissingVersion)
        ));
    }

    #[test]
    fn test_key_display() {
        let record: NamespaceRecord =
            serde_json::from_str(r#"{"_id": "a.b", "key": {"brand": 1, "_id": "hashed"}}"#).unwrap();
        let tally = NamespaceTally::from_record(record);
        assert_eq!(tally.key_display(), "{ brand: 1, _id: \"hashed\" }");
    }
}
