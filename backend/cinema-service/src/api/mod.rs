mod moderation;
mod reports;
mod reviews;
mod search;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::Router;

use crate::error::AppError;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/search", search::routes())
        .nest("/admin/reports", moderation::routes())
        .merge(reviews::routes())
        .merge(reports::routes())
}

fn bad_query(rejection: QueryRejection) -> AppError {
    AppError::InvalidInput(rejection.body_text())
}

fn bad_path(rejection: PathRejection) -> AppError {
    AppError::InvalidInput(rejection.body_text())
}

fn bad_json(rejection: JsonRejection) -> AppError {
    AppError::InvalidInput(rejection.body_text())
}
