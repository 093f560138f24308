use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::criteria::{MovieCriteria, MovieSort, StatusMode, TextTier, YearRange};
use super::{normalize_query, PageWindow, Pagination, SearchService};
use crate::db::MovieOrder;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{MovieHit, MovieRecord};

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieSearchParams {
    pub query: Option<String>,
    pub genre: Option<String>,
    pub status: Option<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub sort_by: Option<MovieSort>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovieSearchResult {
    pub movies: Vec<MovieHit>,
    pub pagination: Pagination,
}

impl MovieSearchResult {
    pub fn empty() -> Self {
        Self {
            movies: Vec::new(),
            pagination: Pagination::empty(),
        }
    }
}

/// One page of results split by relevance tier. Without a text query every
/// record lands in `primary`.
struct TieredPage {
    primary: Vec<MovieRecord>,
    secondary: Vec<MovieRecord>,
    total: i64,
}

/// Room left on a page that ran out of title hits, if synopsis hits remain
/// to fill it.
fn top_up_capacity(skip: i64, limit: i64, fetched: i64, total: i64) -> Option<i64> {
    let remaining = limit - fetched;
    if remaining > 0 && skip + fetched < total {
        Some(remaining)
    } else {
        None
    }
}

fn rank_by_rating(hits: &mut [MovieHit]) {
    hits.sort_by(|a, b| b.rating.total_cmp(&a.rating));
}

pub(super) fn validate_year(name: &str, year: Option<i32>) -> Result<()> {
    match year {
        Some(y) if !(MIN_YEAR..=MAX_YEAR).contains(&y) => Err(AppError::InvalidInput(format!(
            "{} must be between {} and {}",
            name, MIN_YEAR, MAX_YEAR
        ))),
        _ => Ok(()),
    }
}

impl SearchService {
    /// Search approved (or explicitly filtered) movies. Title hits always
    /// precede synopsis-only hits across the whole paginated sequence.
    pub async fn search_movies(&self, params: MovieSearchParams) -> Result<MovieSearchResult> {
        let window = self.page_window(params.page, params.limit)?;
        validate_year("yearFrom", params.year_from)?;
        validate_year("yearTo", params.year_to)?;

        let sort = params.sort_by.unwrap_or_default();
        if sort == MovieSort::Popularity {
            tracing::debug!("Popularity sort has no backing metric, using default order");
        }

        let criteria = MovieCriteria {
            status: StatusMode::from_input(params.status.as_deref()),
            genre: params.genre,
            years: YearRange {
                from: params.year_from,
                to: params.year_to,
            },
            query: normalize_query(params.query.as_deref()),
        };

        match self.fetch_movies(&criteria, sort, window, Utc::now()).await {
            Ok(result) => {
                metrics::record_search("movies", "ok");
                Ok(result)
            }
            Err(e) => {
                tracing::error!(
                    error = ?e,
                    query = ?criteria.query,
                    page = window.page,
                    "Movie search failed, returning empty result"
                );
                metrics::record_search("movies", "degraded");
                Ok(MovieSearchResult::empty())
            }
        }
    }

    async fn fetch_movies(
        &self,
        criteria: &MovieCriteria,
        sort: MovieSort,
        window: PageWindow,
        now: DateTime<Utc>,
    ) -> anyhow::Result<MovieSearchResult> {
        let PageWindow { page, limit, skip } = window;
        let order = sort.order();

        let tiered = if criteria.query.is_some() {
            self.fetch_tiered(criteria, order, skip, limit, now).await?
        } else {
            let filter = criteria.to_filter(now, TextTier::Any);
            let (total, primary) = tokio::try_join!(
                self.store.count_movies(&filter),
                self.store.find_movies(&filter, order, limit, skip),
            )?;
            TieredPage {
                primary,
                secondary: Vec::new(),
                total,
            }
        };

        let mut primary: Vec<MovieHit> = tiered.primary.into_iter().map(MovieHit::from).collect();
        let mut secondary: Vec<MovieHit> = tiered.secondary.into_iter().map(MovieHit::from).collect();

        // Average rating is computed, so it can only be ranked after fetch,
        // one tier at a time.
        if sort == MovieSort::Rating {
            rank_by_rating(&mut primary);
            rank_by_rating(&mut secondary);
        }
        primary.append(&mut secondary);

        Ok(MovieSearchResult {
            movies: primary,
            pagination: Pagination::new(tiered.total, limit, page),
        })
    }

    /// Paginate over the virtual sequence `title hits ++ synopsis-only hits`.
    async fn fetch_tiered(
        &self,
        criteria: &MovieCriteria,
        order: MovieOrder,
        skip: i64,
        limit: i64,
        now: DateTime<Utc>,
    ) -> anyhow::Result<TieredPage> {
        let title_filter = criteria.to_filter(now, TextTier::TitleHits);
        let synopsis_filter = criteria.to_filter(now, TextTier::SynopsisOnly);

        let (title_total, synopsis_total) = tokio::try_join!(
            self.store.count_movies(&title_filter),
            self.store.count_movies(&synopsis_filter),
        )?;
        let total = title_total + synopsis_total;

        if skip < title_total {
            let primary = self
                .store
                .find_movies(&title_filter, order, limit, skip)
                .await?;

            let secondary = match top_up_capacity(skip, limit, primary.len() as i64, total) {
                Some(remaining) => {
                    self.store
                        .find_movies(&synopsis_filter, order, remaining, 0)
                        .await?
                }
                None => Vec::new(),
            };

            Ok(TieredPage {
                primary,
                secondary,
                total,
            })
        } else {
            let secondary = self
                .store
                .find_movies(&synopsis_filter, order, limit, skip - title_total)
                .await?;

            Ok(TieredPage {
                primary: Vec::new(),
                secondary,
                total,
            })
        }
    }
}
