//! Config file → snapshot → advisory cache → data API, end to end.

use std::io::Write;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use shardscope_core::ClusterSnapshot;
use shardscope_mgmt::cli::inspect_snapshot;
use shardscope_mgmt::{AdvisoryCache, DataApi, MgmtConfig};
use tempfile::{NamedTempFile, TempDir};
use tower::ServiceExt;

const SNAPSHOT: &str = r#"{
    "version": "6.0.3",
    "shards": [{"_id": "shard01", "host": "rs1/a:27018"}, {"_id": "shard02", "host": "rs2/b:27018"}],
    "mongos": [
        {"_id": "m1:27017", "mongoVersion": "6.0.3", "ping": "2024-02-01T10:00:00Z"},
        {"_id": "m2:27017", "mongoVersion": "5.0.14", "ping": "2024-02-01T11:00:00Z"}
    ],
    "databases": [{"_id": "app", "primary": "shard01", "partitioned": true}],
    "collections": [{"_id": "app.events", "key": {"tenant": 1, "ts": 1}}],
    "chunks": [
        {"shard": "shard01", "ns": "app.events"},
        {"shard": "shard02", "ns": "app.events"},
        {"shard": "shard02", "ns": "app.events"}
    ],
    "actionlog": {"shape": {"capped": true, "maxSize": 2097152}, "entries": []},
    "changelog": {"shape": {"capped": false}, "entries": [
        {"what": "split", "time": "2024-02-01T10:15:00Z", "ns": "app.events"},
        {"what": "multi-split", "time": "2024-02-01T10:45:00Z", "ns": "app.events"}
    ]}
}"#;

const TICKETS: &str = r#"{
    "SERVER-70000": {"id": "https://tickets.example/SERVER-70000", "versions": [["6.0.0", "6.0.4"]]}
}"#;

#[tokio::test]
async fn test_config_driven_report_served_over_http() {
    let dir = TempDir::new().unwrap();
    let tickets = dir.path().join("tickets.json");
    std::fs::write(&tickets, TICKETS).unwrap();

    let mut config_file = NamedTempFile::with_suffix(".json").unwrap();
    write!(
        config_file,
        "{}",
        serde_json::json!({
            "bind_addr": "127.0.0.1:0",
            "advisory_path": tickets,
            "advisory_url": null
        })
    )
    .unwrap();
    let config = MgmtConfig::from_file(config_file.path()).unwrap();

    let snapshot = ClusterSnapshot::from_json(SNAPSHOT).unwrap();
    let advisories = AdvisoryCache::from_config(&config).source().await;
    let report = inspect_snapshot(&config, &snapshot, &advisories).unwrap();
    assert!(report.upgrade_recommended);
    assert_eq!(
        report.warnings,
        vec![
            "Mismatched major version of mongos: 1.".to_string(),
            "Collection config.changelog is not a capped collection.".to_string(),
            "Suggest upgrade to latest MongoDB version, see <a href='https://tickets.example/SERVER-70000'>SERVER-70000</a> for details.".to_string(),
        ]
    );

    let router = Arc::new(DataApi::new(report, config.bind_addr)).router();
    let request = Request::builder()
        .uri("/api/v1/data/info")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["topology"]["routers"][0]["_id"], "m2:27017");
    assert_eq!(json["changes"]["total_splits"], 2);

    let request = Request::builder()
        .uri("/api/v1/charts/splits")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["rows"][0][0], "2024-02-01T10:00:00.000Z");
    assert_eq!(json["rows"][0][1], 2);
}

#[tokio::test]
async fn test_missing_advisories_do_not_block_inspection() {
    let dir = TempDir::new().unwrap();
    let config = MgmtConfig {
        advisory_path: dir.path().join("tickets.json"),
        advisory_url: None,
        ..MgmtConfig::default()
    };
    let snapshot = ClusterSnapshot::from_json(SNAPSHOT).unwrap();
    let advisories = AdvisoryCache::from_config(&config).source().await;
    let report = inspect_snapshot(&config, &snapshot, &advisories).unwrap();
    assert!(!report.upgrade_recommended);
    assert_eq!(report.warnings.len(), 2);
}
