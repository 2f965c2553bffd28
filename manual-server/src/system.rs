use axum::{extract::State, routing::get, Json};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::{
    serialized::{Metrics, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    get,
    path = "/api/metrics",
    tag = "system",
    responses(
        (status = 200, body = Metrics, description = "Current host resource usage")
    )
)]
async fn metrics(State(context): State<ServerContext>) -> Json<Metrics> {
    let sample = context.manual.monitor.sample().await;

    Json(sample.to_serialized())
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "The server is alive")
    )
)]
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "time": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    }))
}

pub fn router() -> Router {
    Router::new().route("/metrics", get(metrics))
}
