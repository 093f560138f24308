// Review service - one bounded review per (user, movie)
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::db::CatalogStore;
use crate::error::{AppError, Result};
use crate::middleware::Caller;
use crate::models::{NewReview, RatingDistribution, ReviewRecord, ReviewStats, ReviewWithAuthor};

pub struct ReviewService {
    store: Arc<dyn CatalogStore>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReviewRequest {
    pub movie_id: Option<i64>,
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i32>,
    #[validate(length(max = 2000))]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewSubmission {
    pub review: ReviewRecord,
    pub stats: ReviewStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListing {
    pub reviews: Vec<ReviewWithAuthor>,
    pub stats: ReviewStats,
    pub user_review: Option<ReviewRecord>,
}

impl ReviewService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Create or overwrite the caller's review of a movie. Submitting twice
    /// keeps a single review holding the latest rating and content.
    pub async fn submit(&self, caller: Option<&Caller>, request: SubmitReviewRequest) -> Result<ReviewSubmission> {
        let caller = caller.ok_or(AppError::Unauthorized)?;

        request
            .validate()
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;

        let movie_id = match request.movie_id {
            Some(id) if id > 0 => id,
            _ => return Err(AppError::InvalidInput("movieId must be a positive integer".to_string())),
        };
        let rating = match request.rating {
            Some(r) => r,
            None => return Err(AppError::InvalidInput("rating is required".to_string())),
        };
        let content = request
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        if !self.store.movie_exists(movie_id).await? {
            return Err(AppError::NotFound(format!("Movie {} not found", movie_id)));
        }

        let review = self
            .store
            .upsert_review(&NewReview {
                user_id: caller.id,
                movie_id,
                rating,
                content,
            })
            .await?;
        let stats = self.store.review_stats(movie_id).await?;

        tracing::info!(
            user_id = caller.id,
            movie_id = movie_id,
            rating = rating,
            "Review saved"
        );

        Ok(ReviewSubmission { review, stats })
    }

    /// Reviews of a movie with aggregate stats and, when signed in, the
    /// caller's own review.
    pub async fn list(&self, caller: Option<&Caller>, movie_id: i64) -> Result<ReviewListing> {
        if movie_id <= 0 {
            return Err(AppError::InvalidInput("movieId must be a positive integer".to_string()));
        }

        let own_review = async {
            match caller {
                Some(c) => self.store.find_review(c.id, movie_id).await,
                None => Ok(None),
            }
        };

        let (reviews, stats, user_review) = tokio::try_join!(
            self.store.list_reviews(movie_id),
            self.store.review_stats(movie_id),
            own_review,
        )?;

        Ok(ReviewListing {
            reviews,
            stats,
            user_review,
        })
    }

    pub async fn rating_distribution(&self, user_id: i64) -> Result<RatingDistribution> {
        if user_id <= 0 {
            return Err(AppError::InvalidInput("userId must be a positive integer".to_string()));
        }

        let ratings = self.store.user_ratings(user_id).await?;
        Ok(RatingDistribution::from_ratings(&ratings))
    }
}
