use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::{bad_json, bad_path};
use crate::error::Result;
use crate::middleware::MaybeCaller;
use crate::models::ReportDetail;
use crate::services::{ModerationOutcome, ModerationRequest, ModerationSummary};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(summary))
        .route("/action", post(apply_action))
        .route("/:user_id", get(user_reports))
}

async fn summary(
    State(state): State<AppState>,
    MaybeCaller(caller): MaybeCaller,
) -> Result<Json<ModerationSummary>> {
    Ok(Json(state.moderation.summary(caller.as_ref()).await?))
}

#[derive(Debug, Serialize)]
pub struct UserReportsResponse {
    pub reports: Vec<ReportDetail>,
}

async fn user_reports(
    State(state): State<AppState>,
    MaybeCaller(caller): MaybeCaller,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<UserReportsResponse>> {
    let Path(user_id) = path.map_err(bad_path)?;
    let reports = state.moderation.user_reports(caller.as_ref(), user_id).await?;
    Ok(Json(UserReportsResponse { reports }))
}

async fn apply_action(
    State(state): State<AppState>,
    MaybeCaller(caller): MaybeCaller,
    payload: std::result::Result<Json<ModerationRequest>, JsonRejection>,
) -> Result<Json<ModerationOutcome>> {
    let Json(request) = payload.map_err(bad_json)?;
    Ok(Json(state.moderation.act(caller.as_ref(), request).await?))
}
