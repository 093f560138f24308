use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::bad_query;
use crate::error::Result;
use crate::models::UserSummary;
use crate::search::{
    FederatedOptions, FederatedResult, MovieSearchParams, MovieSearchResult, PeopleSearchParams,
    PeopleSearchResult,
};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/movies", get(search_movies))
        .route("/people", get(search_people))
        .route("/all", get(search_all))
        .route("/users", get(search_users))
}

async fn search_movies(
    State(state): State<AppState>,
    query: std::result::Result<Query<MovieSearchParams>, QueryRejection>,
) -> Result<Json<MovieSearchResult>> {
    let Query(params) = query.map_err(bad_query)?;
    Ok(Json(state.search.search_movies(params).await?))
}

async fn search_people(
    State(state): State<AppState>,
    query: std::result::Result<Query<PeopleSearchParams>, QueryRejection>,
) -> Result<Json<PeopleSearchResult>> {
    let Query(params) = query.map_err(bad_query)?;
    Ok(Json(state.search.search_people(params).await?))
}

/// Free-text part of a search query string. Filters for the same request
/// are read by a second `Query` extractor.
#[derive(Debug, Deserialize)]
pub struct TextQuery {
    pub query: Option<String>,
}

async fn search_all(
    State(state): State<AppState>,
    text: std::result::Result<Query<TextQuery>, QueryRejection>,
    options: std::result::Result<Query<FederatedOptions>, QueryRejection>,
) -> Result<Json<FederatedResult>> {
    let Query(text) = text.map_err(bad_query)?;
    let Query(options) = options.map_err(bad_query)?;

    let result = state
        .search
        .search_all(text.query.as_deref().unwrap_or_default(), options)
        .await?;
    Ok(Json(result))
}

#[derive(Debug, Serialize)]
pub struct UserSearchResponse {
    pub users: Vec<UserSummary>,
}

async fn search_users(
    State(state): State<AppState>,
    query: std::result::Result<Query<TextQuery>, QueryRejection>,
) -> Result<Json<UserSearchResponse>> {
    let Query(q) = query.map_err(bad_query)?;
    let users = state
        .search
        .search_users(q.query.as_deref().unwrap_or_default())
        .await;
    Ok(Json(UserSearchResponse { users }))
}
