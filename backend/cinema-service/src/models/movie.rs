use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MovieStatus {
    Draft,
    Approved,
}

impl MovieStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovieStatus::Draft => "draft",
            MovieStatus::Approved => "approved",
        }
    }
}

/// Movie row as returned by the catalog store, with its genre names and
/// the raw ratings of every review attached.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRecord {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub synopsis: Option<String>,
    pub status: String,
    pub release_date: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
    pub poster_url: Option<String>,
    pub trailer_url: Option<String>,
    pub submitted_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub genres: Vec<String>,
    #[serde(skip_serializing)]
    pub ratings: Vec<i32>,
}

impl MovieRecord {
    /// Arithmetic mean of the review ratings, 0 when the movie has none.
    pub fn average_rating(&self) -> f64 {
        if self.ratings.is_empty() {
            return 0.0;
        }
        let sum: i64 = self.ratings.iter().map(|r| *r as i64).sum();
        sum as f64 / self.ratings.len() as f64
    }

    pub fn release_year(&self) -> String {
        self.release_date
            .map(|d| format!("{:04}", d.year()))
            .unwrap_or_default()
    }
}

/// Search result entry: the stored movie plus values computed after fetch.
#[derive(Debug, Clone, Serialize)]
pub struct MovieHit {
    #[serde(flatten)]
    pub movie: MovieRecord,
    pub rating: f64,
    pub year: String,
}

impl From<MovieRecord> for MovieHit {
    fn from(movie: MovieRecord) -> Self {
        let rating = movie.average_rating();
        let year = movie.release_year();
        Self { movie, rating, year }
    }
}
