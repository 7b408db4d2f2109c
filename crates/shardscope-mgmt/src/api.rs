use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shardscope_core::{ChartKind, ChartSeries, InspectionReport, NameValue};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unsupported attribute {0}")]
    UnsupportedAttribute(String),
    #[error("unsupported chart {0}")]
    UnsupportedChart(String),
    #[error("shard {0} not found")]
    ShardNotFound(String),
    #[error("namespace {0} not found")]
    NamespaceNotFound(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::UnsupportedAttribute(_) | ApiError::UnsupportedChart(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::ShardNotFound(_) | ApiError::NamespaceNotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "ok": 0, "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

/// Chunk distribution of one shard or namespace, top slices first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionResponse {
    pub name: String,
    pub title: String,
    pub slices: Vec<NameValue>,
}

/// Serves one inspection report. The report is immutable for the server's lifetime.
#[derive(Clone)]
pub struct DataApi {
    report: Arc<InspectionReport>,
    bind_addr: SocketAddr,
}

impl DataApi {
    pub fn new(report: InspectionReport, bind_addr: SocketAddr) -> Self {
        Self {
            report: Arc::new(report),
            bind_addr,
        }
    }

    pub fn router(self: Arc<Self>) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/api/v1/data/:attr", get(data_handler))
            .route("/api/v1/charts/:attr", get(chart_handler))
            .route(
                "/api/v1/shards/:shard/distribution",
                get(shard_distribution_handler),
            )
            .route(
                "/api/v1/namespaces/:ns/distribution",
                get(namespace_distribution_handler),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(self)
    }

    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = self.bind_addr;
        let router = Arc::new(self).router();

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("data API listening on {}", addr);

        axum::serve(listener, router.into_make_service()).await?;
        Ok(())
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn data_handler(
    State(state): State<Arc<DataApi>>,
    Path(attr): Path<String>,
) -> Result<Response, ApiError> {
    if attr == "info" {
        Ok(Json(state.report.as_ref()).into_response())
    } else {
        Err(ApiError::UnsupportedAttribute(attr))
    }
}

async fn chart_handler(
    State(state): State<Arc<DataApi>>,
    Path(attr): Path<String>,
) -> Result<Json<ChartSeries>, ApiError> {
    let kind: ChartKind = attr
        .parse()
        .map_err(|_| ApiError::UnsupportedChart(attr.clone()))?;
    Ok(Json(state.report.chart(kind)))
}

async fn shard_distribution_handler(
    State(state): State<Arc<DataApi>>,
    Path(shard): Path<String>,
) -> Result<Json<DistributionResponse>, ApiError> {
    let slices = state
        .report
        .topology
        .shard_distribution(&shard)
        .ok_or_else(|| ApiError::ShardNotFound(shard.clone()))?;
    Ok(Json(DistributionResponse {
        title: format!("Chunks Distribution of Shard {}", shard),
        name: shard,
        slices,
    }))
}

async fn namespace_distribution_handler(
    State(state): State<Arc<DataApi>>,
    Path(ns): Path<String>,
) -> Result<Json<DistributionResponse>, ApiError> {
    let slices = state
        .report
        .topology
        .namespace_distribution(&ns)
        .ok_or_else(|| ApiError::NamespaceNotFound(ns.clone()))?;
    Ok(Json(DistributionResponse {
        title: format!("Chunks Distribution of {}", ns),
        name: ns,
        slices,
    }))
}
