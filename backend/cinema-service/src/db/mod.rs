mod audit;
mod catalog;
mod moderation;
mod query;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;
use crate::models::{
    MovieRecord, NewReport, NewReview, PersonRecord, ReportDetailRow, ReportGroup, ReportRecord,
    ReviewRecord, ReviewStats, ReviewWithAuthor, UserRecord, UserSummary,
};

pub use catalog::PgCatalogStore;
pub use moderation::PgModerationStore;
pub use query::*;

#[derive(Clone)]
pub struct Database {
    pub pg: PgPool,
}

impl Database {
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let pg = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect(&config.database.url)
            .await?;

        tracing::info!("PostgreSQL connection pool established");

        Ok(Self { pg })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pg).await?;
        tracing::info!("Database migrations completed");
        Ok(())
    }
}

/// Read access to movies and people plus the review table.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn count_movies(&self, filter: &MovieFilter) -> Result<i64>;

    async fn find_movies(
        &self,
        filter: &MovieFilter,
        order: MovieOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MovieRecord>>;

    async fn count_people(&self, filter: &PersonFilter) -> Result<i64>;

    /// People with at most [`CREDIT_PREVIEW_LIMIT`] credits attached each.
    async fn find_people(
        &self,
        filter: &PersonFilter,
        order: PersonOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PersonRecord>>;

    /// Users whose name or username contains `query`, case-insensitive.
    async fn find_users_by_name(&self, query: &str, limit: i64) -> Result<Vec<UserSummary>>;

    async fn movie_exists(&self, movie_id: i64) -> Result<bool>;

    /// Insert or overwrite the single review a user holds on a movie.
    async fn upsert_review(&self, review: &NewReview) -> Result<ReviewRecord>;

    async fn review_stats(&self, movie_id: i64) -> Result<ReviewStats>;

    /// Reviews of a movie, newest first.
    async fn list_reviews(&self, movie_id: i64) -> Result<Vec<ReviewWithAuthor>>;

    async fn find_review(&self, user_id: i64, movie_id: i64) -> Result<Option<ReviewRecord>>;

    async fn user_ratings(&self, user_id: i64) -> Result<Vec<i32>>;
}

/// Users, reports and the audit trail.
#[async_trait]
pub trait ModerationStore: Send + Sync {
    async fn find_user(&self, user_id: i64) -> Result<Option<UserRecord>>;

    async fn find_users(&self, user_ids: &[i64]) -> Result<Vec<UserRecord>>;

    /// User-targeted reports grouped by target, most reported first.
    async fn group_user_reports(&self, limit: i64) -> Result<Vec<ReportGroup>>;

    async fn pending_user_report_stats(&self) -> Result<PendingStats>;

    /// Every report against one user, newest first, with reporter fields.
    async fn list_user_reports(&self, target_id: i64) -> Result<Vec<ReportDetailRow>>;

    async fn create_report(&self, report: &NewReport) -> Result<ReportRecord>;

    /// Apply every operation in one transaction. Either all of them are
    /// committed or none is.
    async fn transact(&self, ops: &[ModerationOp]) -> Result<()>;
}
