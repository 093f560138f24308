use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub id: i64,
    pub user_id: i64,
    pub movie_id: i64,
    pub rating: i32,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Review joined with the public fields of its author.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithAuthor {
    pub id: i64,
    pub user_id: i64,
    pub movie_id: i64,
    pub rating: i32,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub user_id: i64,
    pub movie_id: i64,
    pub rating: i32,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub count: i64,
    pub avg_rating: f64,
}

/// Per-star counts of one user's ratings on the 1..=5 scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingDistribution {
    pub buckets: [i64; MAX_RATING as usize],
    pub total: i64,
}

impl RatingDistribution {
    /// Ratings outside 1..=5 are not counted.
    pub fn from_ratings(ratings: &[i32]) -> Self {
        let mut buckets = [0i64; MAX_RATING as usize];
        for rating in ratings {
            if (MIN_RATING..=MAX_RATING).contains(rating) {
                buckets[(*rating - MIN_RATING) as usize] += 1;
            }
        }
        let total = buckets.iter().sum();
        Self { buckets, total }
    }

    pub fn count(&self, rating: i32) -> i64 {
        if (MIN_RATING..=MAX_RATING).contains(&rating) {
            self.buckets[(rating - MIN_RATING) as usize]
        } else {
            0
        }
    }
}
