use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::json;

use super::bad_json;
use crate::error::Result;
use crate::middleware::MaybeCaller;
use crate::services::CreateReportRequest;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/reports", post(create_report))
}

async fn create_report(
    State(state): State<AppState>,
    MaybeCaller(caller): MaybeCaller,
    payload: std::result::Result<Json<CreateReportRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let Json(request) = payload.map_err(bad_json)?;
    let report = state.reports.create(caller.as_ref(), request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "ok": true,
            "report": {
                "id": report.id,
                "createdAt": report.created_at.to_rfc3339(),
            },
        })),
    ))
}
