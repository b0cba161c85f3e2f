use crate::error::ApiResult;
use crate::metrics::{SNAPSHOT_DURATION_SEC, SNAPSHOT_TOTAL};
use crate::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

pub async fn snapshot(State(app): State<AppState>) -> ApiResult<Json<Value>> {
    let t0 = std::time::Instant::now();
    let result = app.store.admin_snapshot().await;
    SNAPSHOT_DURATION_SEC.observe(t0.elapsed().as_secs_f64());
    match result {
        Ok(id) => {
            SNAPSHOT_TOTAL.with_label_values(&["ok"]).inc();
            tracing::info!(snapshot = %id, "snapshot written");
            Ok(Json(json!({ "snapshot_id": id })))
        }
        Err(e) => {
            SNAPSHOT_TOTAL.with_label_values(&["error"]).inc();
            Err(e.into())
        }
    }
}

pub async fn manifest(State(app): State<AppState>) -> ApiResult<Json<Value>> {
    Ok(Json(app.store.admin_manifest().await?))
}
