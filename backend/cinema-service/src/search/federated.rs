use serde::{Deserialize, Serialize};

use super::movies::{validate_year, MovieSearchParams};
use super::people::{PeopleSearchParams, PersonSort};
use super::{normalize_query, MovieSort, SearchService};
use crate::error::Result;
use crate::models::{MovieHit, PersonRecord};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederatedOptions {
    pub genre: Option<String>,
    pub status: Option<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub movie_sort: Option<MovieSort>,
    pub director_sort: Option<PersonSort>,
    pub actor_sort: Option<PersonSort>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FederatedResult {
    pub movies: Vec<MovieHit>,
    pub directors: Vec<PersonRecord>,
    pub actors: Vec<PersonRecord>,
}

impl SearchService {
    /// Run movie, director and actor searches concurrently, each capped to
    /// the preview size. A failing branch comes back empty without
    /// affecting the other two.
    pub async fn search_all(&self, query: &str, options: FederatedOptions) -> Result<FederatedResult> {
        validate_year("yearFrom", options.year_from)?;
        validate_year("yearTo", options.year_to)?;

        let Some(query) = normalize_query(Some(query)) else {
            return Ok(FederatedResult::default());
        };
        let limit = Some(self.settings.preview_limit);

        let (movies, directors, actors) = tokio::join!(
            self.search_movies(MovieSearchParams {
                query: Some(query.clone()),
                genre: options.genre,
                status: options.status,
                year_from: options.year_from,
                year_to: options.year_to,
                sort_by: options.movie_sort,
                page: None,
                limit,
            }),
            self.search_people(PeopleSearchParams {
                query: Some(query.clone()),
                role: Some("director".to_string()),
                page: None,
                limit,
                sort_by: options.director_sort,
            }),
            self.search_people(PeopleSearchParams {
                query: Some(query.clone()),
                role: Some("actor".to_string()),
                page: None,
                limit,
                sort_by: options.actor_sort,
            }),
        );

        Ok(FederatedResult {
            movies: movies
                .map(|r| r.movies)
                .unwrap_or_else(|e| branch_failed("movies", e)),
            directors: directors
                .map(|r| r.people)
                .unwrap_or_else(|e| branch_failed("directors", e)),
            actors: actors
                .map(|r| r.people)
                .unwrap_or_else(|e| branch_failed("actors", e)),
        })
    }
}

fn branch_failed<T>(branch: &str, error: crate::error::AppError) -> Vec<T> {
    tracing::warn!(branch = branch, error = %error, "Federated search branch rejected");
    Vec::new()
}
