//! Turns structured findings into display strings.

use crate::anomaly::Finding;
use crate::topology::TopologyModel;

/// Renders findings for display.
pub trait WarningRenderer {
    /// Renders one finding.
    fn render(&self, finding: &Finding) -> String;

    /// Renders findings, preserving order.
    fn render_all(&self, findings: &[Finding]) -> Vec<String> {
        findings.iter().map(|f| self.render(f)).collect()
    }
}

/// English messages with `,` thousands separators and HTML advisory links.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnglishRenderer;

impl WarningRenderer for EnglishRenderer {
    fn render(&self, finding: &Finding) -> String {
        match finding {
            Finding::TooManyNamespaces { count, .. } => format!(
                "You have a lot of collections: {}.",
                group_thousands(*count as u64)
            ),
            Finding::NoRoutingInstances => {
                "No mongos instance was found, probably a restored cluster from a config database dump."
                    .to_string()
            }
            Finding::MismatchedRouterVersions { count } => format!(
                "Mismatched major version of mongos: {}.",
                group_thousands(*count as u64)
            ),
            Finding::ShardsWithMaxSize { count } => format!(
                "{} shards have 'maxSize' configured.",
                group_thousands(*count as u64)
            ),
            Finding::BalancerLogMissing => "Collection config.actionlog doesn't exist.".to_string(),
            Finding::BalancerLogNotCapped => {
                "Collection config.actionlog is not a capped collection.".to_string()
            }
            Finding::SplitLogNotCapped => {
                "Collection config.changelog is not a capped collection.".to_string()
            }
            Finding::UpgradeRecommended { advisories } => {
                let links: Vec<String> = advisories
                    .iter()
                    .map(|a| format!("<a href='{}'>{}</a>", a.url, a.name))
                    .collect();
                format!(
                    "Suggest upgrade to latest MongoDB version, see {} for details.",
                    join_series(&links)
                )
            }
        }
    }
}

impl EnglishRenderer {
    /// One-paragraph overview of the topology.
    pub fn summary(&self, model: &TopologyModel) -> String {
        format!(
            "The cluster is running version {}. It consists of {} and {}. There are {} across {}.",
            model.version.version,
            plural(model.shards.len(), "shard", "s"),
            plural(model.routers.len(), "mongos instance", "s"),
            plural(model.namespaces.len(), "sharded collection", "s"),
            plural(model.databases.len(), "database", "s"),
        )
    }
}

/// `1234567` → `"1,234,567"`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `"A"`, `"A and B"`, `"A, B, and C"`.
pub fn join_series(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{} and {}", a, b),
        [rest @ .., last] => format!("{}, and {}", rest.join(", "), last),
    }
}

/// `0` → `"no shard"`, `1` → `"1 shard"`, `1200` → `"1,200 shards"`.
pub fn plural(n: usize, word: &str, tail: &str) -> String {
    match n {
        0 => format!("no {}", word),
        1 => format!("1 {}", word),
        _ => format!("{} {}{}", group_thousands(n as u64), word, tail),
    }
}

/// Round or move durations: milliseconds below a second, otherwise the largest sensible unit.
pub fn format_millis(ms: f64) -> String {
    if ms <= 0.0 {
        return String::new();
    }
    if ms < 1000.0 {
        return format!("{} ms", ms.round() as u64);
    }
    let secs = ms / 1000.0;
    if secs < 60.0 {
        format!("{:.1} seconds", secs)
    } else if secs < 3600.0 {
        format!("{:.1} minutes", secs / 60.0)
    } else if secs < 86400.0 {
        format!("{:.1} hours", secs / 3600.0)
    } else {
        format!("{:.1} days", secs / 86400.0)
    }
}

/// Collection sizes in binary units.
pub fn format_storage_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
