use serde::{Deserialize, Serialize};
use shardscope_core::{AnomalyThresholds, InspectConfig, VersionOrdering};
use shardscope_core::anomaly::DEFAULT_MAX_NAMESPACES;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Published advisory table, fetched when no local copy exists.
pub const DEFAULT_ADVISORY_URL: &str =
    "https://raw.githubusercontent.com/simagix/bond/main/tickets.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MgmtConfig {
    pub bind_addr: SocketAddr,
    pub snapshot_path: Option<PathBuf>,
    pub mongo_version: Option<String>,
    pub advisory_path: PathBuf,
    pub advisory_url: Option<String>,
    pub max_namespaces: usize,
    pub version_ordering: VersionOrdering,
}

impl Default for MgmtConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3618)),
            snapshot_path: None,
            mongo_version: None,
            advisory_path: PathBuf::from("tickets.json"),
            advisory_url: Some(DEFAULT_ADVISORY_URL.to_string()),
            max_namespaces: DEFAULT_MAX_NAMESPACES,
            version_ordering: VersionOrdering::default(),
        }
    }
}

impl MgmtConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        match ext.to_lowercase().as_str() {
            "toml" => {
                let config: MgmtConfig = toml::from_str(&contents)?;
                Ok(config)
            }
            "json" => {
                let config: MgmtConfig = serde_json::from_str(&contents)?;
                Ok(config)
            }
            _ => anyhow::bail!("Unsupported config file extension: {}", ext),
        }
    }

    /// Per-pass settings for the inspector.
    pub fn inspect_config(&self) -> InspectConfig {
        InspectConfig {
            mongo_version: self.mongo_version.clone(),
            thresholds: AnomalyThresholds {
                max_namespaces: self.max_namespaces,
            },
            version_ordering: self.version_ordering,
        }
    }
}
