use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    routing::{get, post},
    Json, Router,
};

use super::{bad_json, bad_path};
use crate::error::Result;
use crate::middleware::MaybeCaller;
use crate::models::RatingDistribution;
use crate::services::{ReviewListing, ReviewSubmission, SubmitReviewRequest};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", post(submit_review))
        .route("/movies/:id/reviews", get(list_reviews))
        .route("/users/:id/rating-stats", get(rating_stats))
}

async fn submit_review(
    State(state): State<AppState>,
    MaybeCaller(caller): MaybeCaller,
    payload: std::result::Result<Json<SubmitReviewRequest>, JsonRejection>,
) -> Result<Json<ReviewSubmission>> {
    let Json(request) = payload.map_err(bad_json)?;
    let submission = state.reviews.submit(caller.as_ref(), request).await?;
    Ok(Json(submission))
}

async fn list_reviews(
    State(state): State<AppState>,
    MaybeCaller(caller): MaybeCaller,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<ReviewListing>> {
    let Path(movie_id) = path.map_err(bad_path)?;
    Ok(Json(state.reviews.list(caller.as_ref(), movie_id).await?))
}

async fn rating_stats(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<RatingDistribution>> {
    let Path(user_id) = path.map_err(bad_path)?;
    Ok(Json(state.reviews.rating_distribution(user_id).await?))
}
