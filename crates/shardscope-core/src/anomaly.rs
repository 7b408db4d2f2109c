//! Anomaly and upgrade-advisory rules evaluated over an assembled snapshot.
//!
//! Rules run in a fixed order and each contributes at most one finding, so the
//! output order is stable across runs and independent of severity.

use serde::{Deserialize, Serialize};

use crate::advisory::{AdvisoryRef, AdvisorySource, VersionOrdering};
use crate::eventlog::{BalancerLog, SplitLog};
use crate::topology::TopologyModel;

/// Namespace count above which the cluster is flagged as hard to operate.
pub const DEFAULT_MAX_NAMESPACES: usize = 10_000;

/// A rule result with its parameters. Rendering happens separately.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// More sharded namespaces than the threshold.
    TooManyNamespaces {
        /// Namespaces in the snapshot.
        count: usize,
        /// Threshold exceeded.
        threshold: usize,
    },
    /// No router has ever registered; likely a restored config dump.
    NoRoutingInstances,
    /// Routers running a different `major.minor` than the cluster.
    MismatchedRouterVersions {
        /// Routers on another version.
        count: usize,
    },
    /// Shards with the legacy `maxSize` limit.
    ShardsWithMaxSize {
        /// Shards with a limit.
        count: usize,
    },
    /// `config.actionlog` does not exist.
    BalancerLogMissing,
    /// `config.actionlog` exists but is not capped.
    BalancerLogNotCapped,
    /// `config.changelog` is not capped.
    SplitLogNotCapped,
    /// The cluster version is covered by known advisories.
    UpgradeRecommended {
        /// Matching advisories, by name.
        advisories: Vec<AdvisoryRef>,
    },
}

/// Tunable rule thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnomalyThresholds {
    /// See [`DEFAULT_MAX_NAMESPACES`].
    pub max_namespaces: usize,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            max_namespaces: DEFAULT_MAX_NAMESPACES,
        }
    }
}

/// Evaluates the rule set.
#[derive(Clone, Debug, Default)]
pub struct AnomalyEngine {
    thresholds: AnomalyThresholds,
    ordering: VersionOrdering,
}

impl AnomalyEngine {
    /// Creates an engine with the given thresholds and version ordering.
    pub fn new(thresholds: AnomalyThresholds, ordering: VersionOrdering) -> Self {
        Self {
            thresholds,
            ordering,
        }
    }

    /// Runs every rule in order.
    pub fn evaluate(
        &self,
        model: &TopologyModel,
        actions: &BalancerLog,
        changes: &SplitLog,
        advisories: &dyn AdvisorySource,
    ) -> Vec<Finding> {
        let mut findings = Vec::new();

        if model.namespaces.len() > self.thresholds.max_namespaces {
            findings.push(Finding::TooManyNamespaces {
                count: model.namespaces.len(),
                threshold: self.thresholds.max_namespaces,
            });
        }

        if model.routers.is_empty() {
            findings.push(Finding::NoRoutingInstances);
        } else {
            let count = model.mismatched_routers();
            if count > 0 {
                findings.push(Finding::MismatchedRouterVersions { count });
            }
        }

        let count = model.shards_with_max_size();
        if count > 0 {
            findings.push(Finding::ShardsWithMaxSize { count });
        }

        match actions.shape.capped {
            None => findings.push(Finding::BalancerLogMissing),
            Some(false) => findings.push(Finding::BalancerLogNotCapped),
            Some(true) => {}
        }

        // changelog always exists on a config server
        if !changes.shape.is_capped() {
            findings.push(Finding::SplitLogNotCapped);
        }

        let matched = self.upgrade_advisories(&model.version.version, advisories);
        if !matched.is_empty() {
            findings.push(Finding::UpgradeRecommended {
                advisories: matched,
            });
        }

        tracing::info!("anomaly rules produced {} findings", findings.len());
        findings
    }

    /// Advisories covering `version`; empty when the table is unavailable.
    pub fn upgrade_advisories(
        &self,
        version: &str,
        advisories: &dyn AdvisorySource,
    ) -> Vec<AdvisoryRef> {
        match advisories.advisory_table() {
            Ok(table) => table.matching(version, self.ordering),
            Err(e) => {
                tracing::warn!("skipping upgrade advisories: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::{Advisory, AdvisoryTable, NoAdvisories};
    use crate::records::{CollectionShape, NamespaceRecord, RoutingInstanceRecord, ShardRecord};
    use crate::topology::{ClusterVersion, TopologyBuilder};

    fn router(version: &str) -> RoutingInstanceRecord {
        RoutingInstanceRecord {
            id: format!("mongos-{}", version),
            mongo_version: Some(version.to_string()),
            ..Default::default()
        }
    }

    fn healthy_logs() -> (BalancerLog, SplitLog) {
        (
            BalancerLog::from_entries(CollectionShape::capped(1 << 20), &[]),
            SplitLog::from_entries(CollectionShape::capped(10 << 20), &[]),
        )
    }

    fn model_with(routers: Vec<RoutingInstanceRecord>, shards: Vec<ShardRecord>) -> TopologyModel {
        TopologyBuilder::new(ClusterVersion::reported("7.0.1"))
            .routers(routers)
            .shards(shards)
            .build(&[])
            .unwrap()
    }

    fn table(entries: &[(&str, &str, &str)]) -> AdvisoryTable {
        AdvisoryTable::new(entries.iter().map(|(name, low, high)| {
            (
                name.to_string(),
                Advisory {
                    url: format!("https://advisories.example/{}", name),
                    versions: vec![[low.to_string(), high.to_string()]],
                },
            )
        }))
    }

    #[test]
    fn test_clean_cluster_has_no_findings() {
        let (actions, changes) = healthy_logs();
        let model = model_with(vec![router("7.0.1")], vec![]);
        let findings = AnomalyEngine::default().evaluate(&model, &actions, &changes, &NoAdvisories);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_no_routers_skips_version_rule() {
        let (actions, changes) = healthy_logs();
        let model = model_with(vec![], vec![]);
        let findings = AnomalyEngine::default().evaluate(&model, &actions, &changes, &NoAdvisories);
        assert_eq!(findings, vec![Finding::NoRoutingInstances]);
    }

    #[test]
    fn test_mismatched_router_count() {
        let (actions, changes) = healthy_logs();
        let model = model_with(
            vec![router("7.0.1"), router("6.0.3"), router("5.0.20")],
            vec![],
        );
        let findings = AnomalyEngine::default().evaluate(&model, &actions, &changes, &NoAdvisories);
        assert_eq!(findings, vec![Finding::MismatchedRouterVersions { count: 2 }]);
    }

    #[test]
    fn test_log_shape_rules() {
        let model = model_with(vec![router("7.0.1")], vec![]);
        let engine = AnomalyEngine::default();
        let missing = BalancerLog::from_entries(CollectionShape::default(), &[]);
        let uncapped = BalancerLog::from_entries(CollectionShape::uncapped(), &[]);
        let changes = SplitLog::from_entries(CollectionShape::uncapped(), &[]);

        let findings = engine.evaluate(&model, &missing, &changes, &NoAdvisories);
        assert_eq!(
            findings,
            vec![Finding::BalancerLogMissing, Finding::SplitLogNotCapped]
        );
        let findings = engine.evaluate(&model, &uncapped, &changes, &NoAdvisories);
        assert_eq!(
            findings,
            vec![Finding::BalancerLogNotCapped, Finding::SplitLogNotCapped]
        );
    }

    #[test]
    fn test_namespace_threshold() {
        let (actions, changes) = healthy_logs();
        let model = TopologyBuilder::new(ClusterVersion::reported("7.0.1"))
            .routers(vec![router("7.0.1")])
            .namespaces((0..4).map(|i| NamespaceRecord {
                id: format!("db.c{}", i),
                ..Default::default()
            }))
            .build(&[])
            .unwrap();
        let engine = AnomalyEngine::new(
            AnomalyThresholds { max_namespaces: 3 },
            VersionOrdering::Lexicographic,
        );
        let findings = engine.evaluate(&model, &actions, &changes, &NoAdvisories);
        assert_eq!(
            findings,
            vec![Finding::TooManyNamespaces {
                count: 4,
                threshold: 3
            }]
        );
    }

    #[test]
    fn test_upgrade_advisories_joined() {
        let (actions, changes) = healthy_logs();
        let model = model_with(vec![router("7.0.1")], vec![]);
        let advisories = table(&[("X", "7.0.0", "7.0.5"), ("Y", "6.9", "7.0.2"), ("Z", "8.0.0", "8.0.1")]);
        let findings = AnomalyEngine::default().evaluate(&model, &actions, &changes, &advisories);
        match &findings[..] {
            [Finding::UpgradeRecommended { advisories }] => {
                let names: Vec<&str> = advisories.iter().map(|a| a.name.as_str()).collect();
                assert_eq!(names, vec!["X", "Y"]);
            }
            other => panic!("unexpected findings: {:?}", other),
        }
    }

    #[test]
    fn test_rule_order_is_fixed() {
        let actions = BalancerLog::from_entries(CollectionShape::default(), &[]);
        let changes = SplitLog::from_entries(CollectionShape::uncapped(), &[]);
        let model = model_with(
            vec![router("6.0.1")],
            vec![ShardRecord {
                id: "s1".to_string(),
                max_size: Some(5000),
                ..Default::default()
            }],
        );
        let advisories = table(&[("X", "7.0.0", "7.0.5")]);
        let findings = AnomalyEngine::default().evaluate(&model, &actions, &changes, &advisories);
        assert_eq!(findings.len(), 5);
        assert_eq!(findings[0], Finding::MismatchedRouterVersions { count: 1 });
        assert_eq!(findings[1], Finding::ShardsWithMaxSize { count: 1 });
        assert_eq!(findings[2], Finding::BalancerLogMissing);
        assert_eq!(findings[3], Finding::SplitLogNotCapped);
        assert!(matches!(findings[4], Finding::UpgradeRecommended { .. }));
    }
}
