use crate::advisory_cache::AdvisoryCache;
use crate::api::DataApi;
use crate::config::MgmtConfig;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shardscope_core::render::{format_millis, format_storage_size, group_thousands};
use shardscope_core::{
    AdvisorySource, ClusterSnapshot, InspectionReport, Inspector, VersionOrdering,
};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Namespaces listed in the text report.
pub const REPORT_TOP_NAMESPACES: usize = 23;

#[derive(Parser)]
#[command(name = "shardscope")]
#[command(about = "Sharded cluster config metadata inspector", long_about = None)]
pub struct Cli {
    /// Version to assume when the snapshot has none (restored config dumps).
    #[arg(long, global = true, env = "SHARDSCOPE_MONGO_VERSION")]
    pub mongo_version: Option<String>,

    /// Debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Inspect a snapshot and print the report.
    Report {
        snapshot: PathBuf,
        #[arg(long)]
        json: bool,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        advisories: Option<PathBuf>,
    },
    /// Inspect a snapshot and serve the result over HTTP.
    Serve {
        #[arg(short, long, default_value = "/etc/shardscope/shardscope.toml")]
        config: PathBuf,
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// List advisories covering a version.
    Advisory {
        version: String,
        #[arg(long)]
        advisories: Option<PathBuf>,
        #[arg(long)]
        numeric: bool,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match &self.command {
            Command::Report {
                snapshot,
                json,
                config,
                advisories,
            } => {
                let config = self.load_config(config.as_deref(), advisories.as_deref())?;
                let report = inspect_file(&config, snapshot).await?;
                if *json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print!("{}", render_text(&report));
                }
                Ok(())
            }
            Command::Serve { config, snapshot } => {
                let mut config = if config.exists() {
                    self.load_config(Some(config.as_path()), None)?
                } else {
                    tracing::warn!("Config file not found, using defaults: {}", config.display());
                    self.load_config(None, None)?
                };
                if let Some(path) = snapshot {
                    config.snapshot_path = Some(path.clone());
                }
                let path = config
                    .snapshot_path
                    .clone()
                    .context("no snapshot given; pass --snapshot or set snapshot_path")?;
                let report = inspect_file(&config, &path).await?;
                DataApi::new(report, config.bind_addr).serve().await
            }
            Command::Advisory {
                version,
                advisories,
                numeric,
            } => {
                let config = self.load_config(None, advisories.as_deref())?;
                let table = AdvisoryCache::from_config(&config)
                    .load()
                    .await
                    .context("advisory table unavailable")?;
                let ordering = if *numeric {
                    VersionOrdering::Numeric
                } else {
                    config.version_ordering
                };
                let matches = table.matching(version, ordering);
                if matches.is_empty() {
                    println!("No advisories cover version {}", version);
                }
                for advisory in matches {
                    println!("{}\t{}", advisory.name, advisory.url);
                }
                Ok(())
            }
        }
    }

    fn load_config(&self, path: Option<&Path>, advisories: Option<&Path>) -> Result<MgmtConfig> {
        let mut config = match path {
            Some(path) => MgmtConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => MgmtConfig::default(),
        };
        if let Some(version) = &self.mongo_version {
            config.mongo_version = Some(version.clone());
        }
        if let Some(advisories) = advisories {
            config.advisory_path = advisories.to_path_buf();
        }
        Ok(config)
    }
}

async fn inspect_file(config: &MgmtConfig, path: &Path) -> Result<InspectionReport> {
    let snapshot = ClusterSnapshot::from_file(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let advisories = AdvisoryCache::from_config(config).source().await;
    inspect_snapshot(config, &snapshot, &advisories)
}

pub fn inspect_snapshot(
    config: &MgmtConfig,
    snapshot: &ClusterSnapshot,
    advisories: &dyn AdvisorySource,
) -> Result<InspectionReport> {
    Ok(Inspector::new(config.inspect_config()).inspect(snapshot, advisories)?)
}

/// Plain-text rendering of a report for the terminal.
pub fn render_text(report: &InspectionReport) -> String {
    let topology = &report.topology;
    let mut out = String::new();

    let _ = writeln!(out, "{}", report.summary);
    if let Some(ping) = topology.last_ping {
        let _ = writeln!(out, "Last mongos ping: {}", ping.to_rfc3339());
    }

    let _ = writeln!(out, "\nShards");
    for shard in topology.shards.values() {
        let _ = writeln!(
            out,
            "  {:<24} {:>12} chunks {:>8} jumbo  {}",
            shard.id,
            group_thousands(shard.chunks),
            group_thousands(shard.jumbo),
            shard.host.as_deref().unwrap_or("(unknown)")
        );
    }

    let _ = writeln!(out, "\nTop namespaces by chunks");
    for ns in topology.ranked_namespaces().iter().take(REPORT_TOP_NAMESPACES) {
        let name = if ns.id.is_empty() { "(unresolved)" } else { &ns.id };
        let _ = writeln!(
            out,
            "  {:<40} {:>12}  {}",
            name,
            group_thousands(ns.chunks),
            ns.key_display()
        );
    }

    let _ = writeln!(out, "\nDatabases");
    for db in &topology.databases {
        let _ = writeln!(
            out,
            "  {:<24} primary {:<16} {}",
            db.id,
            db.primary,
            if db.partitioned { "partitioned" } else { "" }
        );
    }

    let stats = &report.actions.stats;
    let _ = writeln!(out, "\nBalancer");
    let _ = writeln!(
        out,
        "  {} rounds, {} chunks moved, {} errors",
        group_thousands(stats.rounds),
        group_thousands(stats.total_chunks_moved),
        group_thousands(stats.total_errors)
    );
    if let Some(avg) = stats.average_execution_time {
        let _ = writeln!(out, "  average round time {}", format_millis(avg));
    }
    if let Some(max) = report.actions.shape.max_size {
        let _ = writeln!(out, "  config.actionlog size {}", format_storage_size(max));
    }
    let _ = writeln!(
        out,
        "  {} chunk splits",
        group_thousands(report.changes.total_splits)
    );

    if !report.warnings.is_empty() {
        let _ = writeln!(out, "\nWarnings");
        for warning in &report.warnings {
            let _ = writeln!(out, "  * {}", warning);
        }
    }
    out
}
