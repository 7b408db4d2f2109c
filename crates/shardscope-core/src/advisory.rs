//! Version advisory table: named upgrade advisories and the version ranges they cover.
//!
//! The table is a JSON object keyed by advisory name:
//!
//! ```json
//! { "SERVER-12345": { "id": "https://jira.example/SERVER-12345",
//!                     "versions": [["6.0.0", "6.0.5"], ["7.0.0", "7.0.2"]] } }
//! ```

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScopeError};

/// How version strings are compared against advisory ranges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionOrdering {
    /// Plain string comparison. `"10.0" < "9.0"` under this ordering.
    #[default]
    Lexicographic,
    /// Dot-separated components compared numerically where both parse.
    Numeric,
}

impl VersionOrdering {
    /// Compares two version strings.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            VersionOrdering::Lexicographic => a.cmp(b),
            VersionOrdering::Numeric => compare_numeric(a, b),
        }
    }

    /// Whether `version` lies in the inclusive range `[low, high]`.
    pub fn in_range(&self, version: &str, low: &str, high: &str) -> bool {
        self.compare(version, low) != Ordering::Less
            && self.compare(version, high) != Ordering::Greater
    }
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(nx), Ok(ny)) => nx.cmp(&ny),
                    _ => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// One advisory: a reference URL and the inclusive version ranges it affects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    /// Reference URL. Stored under `id` in the published table.
    #[serde(rename = "id")]
    pub url: String,
    /// Inclusive `[low, high]` ranges.
    #[serde(default)]
    pub versions: Vec<[String; 2]>,
}

impl Advisory {
    /// Whether any range covers `version`.
    pub fn covers(&self, version: &str, ordering: VersionOrdering) -> bool {
        self.versions
            .iter()
            .any(|[low, high]| ordering.in_range(version, low, high))
    }
}

/// A matched advisory, ready to be linked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryRef {
    /// Advisory name.
    pub name: String,
    /// Reference URL.
    pub url: String,
}

/// Advisories by name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdvisoryTable {
    advisories: BTreeMap<String, Advisory>,
}

impl AdvisoryTable {
    /// Creates a table from (name, advisory) pairs.
    pub fn new(advisories: impl IntoIterator<Item = (String, Advisory)>) -> Self {
        Self {
            advisories: advisories.into_iter().collect(),
        }
    }

    /// Parses the published JSON form.
    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    /// Reads and parses a table file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Number of advisories.
    pub fn len(&self) -> usize {
        self.advisories.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.advisories.is_empty()
    }

    /// Advisories covering `version`, by name. Each advisory appears at most once.
    pub fn matching(&self, version: &str, ordering: VersionOrdering) -> Vec<AdvisoryRef> {
        self.advisories
            .iter()
            .filter(|(_, advisory)| advisory.covers(version, ordering))
            .map(|(name, advisory)| AdvisoryRef {
                name: name.clone(),
                url: advisory.url.clone(),
            })
            .collect()
    }
}

/// Supplies the advisory table to the anomaly engine.
pub trait AdvisorySource {
    /// Loads the table. Errors are treated as "no advisory applicable".
    fn advisory_table(&self) -> Result<AdvisoryTable>;
}

impl AdvisorySource for AdvisoryTable {
    fn advisory_table(&self) -> Result<AdvisoryTable> {
        Ok(self.clone())
    }
}

/// Reads the table from a JSON file on every lookup.
#[derive(Clone, Debug)]
pub struct FileAdvisories {
    path: PathBuf,
}

impl FileAdvisories {
    /// Creates a source over `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AdvisorySource for FileAdvisories {
    fn advisory_table(&self) -> Result<AdvisoryTable> {
        AdvisoryTable::from_file(&self.path).map_err(|e| {
            ScopeError::AdvisoryUnavailable(format!("{}: {}", self.path.display(), e))
        })
    }
}

/// A source that is never available.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAdvisories;

impl AdvisorySource for NoAdvisories {
    fn advisory_table(&self) -> Result<AdvisoryTable> {
        Err(ScopeError::AdvisoryUnavailable(
            "no advisory table configured".to_string(),
        ))
    }
}
