use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;

use super::query::{
    like_pattern, MovieFilter, MovieOrder, PersonFilter, PersonOrder, ReleaseBound, TextMatch,
    CREDIT_PREVIEW_LIMIT,
};
use super::CatalogStore;
use crate::models::{
    CreditPreview, MovieRecord, NewReview, PersonRecord, ReviewRecord, ReviewStats,
    ReviewWithAuthor, UserSummary,
};

const MOVIE_COLUMNS: &str = r#"
    SELECT m.id, m.slug, m.title, m.synopsis, m.status, m.release_date, m.duration,
           m.poster_url, m.trailer_url, m.submitted_by, m.created_at,
           ARRAY(
               SELECT g.name FROM movie_genres mg
               JOIN genres g ON g.id = mg.genre_id
               WHERE mg.movie_id = m.id
               ORDER BY g.name
           ) AS genres,
           ARRAY(SELECT r.rating FROM reviews r WHERE r.movie_id = m.id) AS ratings
    FROM movies m
"#;

const PERSON_COLUMNS: &str = r#"
    SELECT p.id, p.slug, p.name, p.birth_date, p.image_url, p.user_id,
           (SELECT COUNT(*) FROM movie_people mp WHERE mp.person_id = p.id)::BIGINT AS credit_count
    FROM people p
"#;

/// PostgreSQL catalog store
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn credit_previews(&self, person_ids: &[i64]) -> Result<HashMap<i64, Vec<CreditPreview>>> {
        if person_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, CreditPreview>(
            r#"
            SELECT person_id, movie_id, movie_title, role, character_name
            FROM (
                SELECT mp.person_id, mp.movie_id, m.title AS movie_title, mp.role, mp.character_name,
                       ROW_NUMBER() OVER (PARTITION BY mp.person_id ORDER BY mp.id) AS rn
                FROM movie_people mp
                JOIN movies m ON m.id = mp.movie_id
                WHERE mp.person_id = ANY($1)
            ) credits
            WHERE rn <= $2
            ORDER BY person_id, rn
            "#,
        )
        .bind(person_ids)
        .bind(CREDIT_PREVIEW_LIMIT as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load credit previews")?;

        let mut previews: HashMap<i64, Vec<CreditPreview>> = HashMap::new();
        for row in rows {
            previews.entry(row.person_id).or_default().push(row);
        }
        Ok(previews)
    }
}

fn push_movie_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &MovieFilter) {
    qb.push(" WHERE m.status = ");
    qb.push_bind(filter.status.clone());

    for bound in &filter.release_bounds {
        match bound {
            ReleaseBound::After(at) => {
                qb.push(" AND m.release_date > ");
                qb.push_bind(*at);
            }
            ReleaseBound::OnOrAfter(at) => {
                qb.push(" AND m.release_date >= ");
                qb.push_bind(*at);
            }
            ReleaseBound::OnOrBefore(at) => {
                qb.push(" AND m.release_date <= ");
                qb.push_bind(*at);
            }
        }
    }

    if let Some(slug) = &filter.genre_slug {
        qb.push(
            " AND EXISTS (SELECT 1 FROM movie_genres mg JOIN genres g ON g.id = mg.genre_id \
             WHERE mg.movie_id = m.id AND g.slug = ",
        );
        qb.push_bind(slug.clone());
        qb.push(")");
    }

    match &filter.text {
        TextMatch::Unfiltered => {}
        TextMatch::Title(text) => {
            qb.push(" AND m.title ILIKE ");
            qb.push_bind(like_pattern(text));
        }
        TextMatch::SynopsisNotTitle(text) => {
            let pattern = like_pattern(text);
            qb.push(" AND m.synopsis ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" AND m.title NOT ILIKE ");
            qb.push_bind(pattern);
        }
    }
}

fn push_person_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &PersonFilter) {
    qb.push(" WHERE p.name ILIKE ");
    qb.push_bind(like_pattern(&filter.name_contains));

    if let Some(role) = filter.role {
        qb.push(
            " AND EXISTS (SELECT 1 FROM movie_people mp WHERE mp.person_id = p.id AND mp.role = ANY(",
        );
        qb.push_bind(role.roles());
        qb.push("))");
    }
}

fn movie_order_clause(order: MovieOrder) -> &'static str {
    match order {
        MovieOrder::ReleaseDateDesc => " ORDER BY m.release_date DESC NULLS LAST, m.id DESC",
        MovieOrder::CreatedAtDesc => " ORDER BY m.created_at DESC, m.id DESC",
    }
}

fn person_order_clause(order: PersonOrder) -> &'static str {
    match order {
        PersonOrder::NameAsc => " ORDER BY p.name ASC, p.id ASC",
        PersonOrder::NameDesc => " ORDER BY p.name DESC, p.id ASC",
        PersonOrder::CreditsDesc => " ORDER BY credit_count DESC, p.id ASC",
        PersonOrder::BirthDateAsc => " ORDER BY p.birth_date ASC NULLS LAST, p.id ASC",
        PersonOrder::BirthDateDesc => " ORDER BY p.birth_date DESC NULLS LAST, p.id ASC",
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn count_movies(&self, filter: &MovieFilter) -> Result<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM movies m");
        push_movie_filter(&mut qb, filter);

        let count = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count movies")?;

        Ok(count)
    }

    async fn find_movies(
        &self,
        filter: &MovieFilter,
        order: MovieOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MovieRecord>> {
        let mut qb = QueryBuilder::<Postgres>::new(MOVIE_COLUMNS);
        push_movie_filter(&mut qb, filter);
        qb.push(movie_order_clause(order));
        qb.push(" LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let movies = qb
            .build_query_as::<MovieRecord>()
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch movies")?;

        Ok(movies)
    }

    async fn count_people(&self, filter: &PersonFilter) -> Result<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM people p");
        push_person_filter(&mut qb, filter);

        let count = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count people")?;

        Ok(count)
    }

    async fn find_people(
        &self,
        filter: &PersonFilter,
        order: PersonOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PersonRecord>> {
        let mut qb = QueryBuilder::<Postgres>::new(PERSON_COLUMNS);
        push_person_filter(&mut qb, filter);
        qb.push(person_order_clause(order));
        qb.push(" LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let mut people = qb
            .build_query_as::<PersonRecord>()
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch people")?;

        let ids: Vec<i64> = people.iter().map(|p| p.id).collect();
        let mut previews = self.credit_previews(&ids).await?;
        for person in &mut people {
            person.movies = previews.remove(&person.id).unwrap_or_default();
        }

        Ok(people)
    }

    async fn find_users_by_name(&self, query: &str, limit: i64) -> Result<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT id, name, username, avatar_url
            FROM users
            WHERE name ILIKE $1 OR username ILIKE $1
            ORDER BY id
            LIMIT $2
            "#,
        )
        .bind(like_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to search users")?;

        Ok(users)
    }

    async fn movie_exists(&self, movie_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM movies WHERE id = $1)")
            .bind(movie_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check movie existence")?;

        Ok(exists)
    }

    async fn upsert_review(&self, review: &NewReview) -> Result<ReviewRecord> {
        let record = sqlx::query_as::<_, ReviewRecord>(
            r#"
            INSERT INTO reviews (user_id, movie_id, rating, content)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, movie_id)
            DO UPDATE SET
                rating = EXCLUDED.rating,
                content = EXCLUDED.content,
                updated_at = NOW()
            RETURNING id, user_id, movie_id, rating, content, created_at, updated_at
            "#,
        )
        .bind(review.user_id)
        .bind(review.movie_id)
        .bind(review.rating)
        .bind(&review.content)
        .fetch_one(&self.pool)
        .await
        .context("Failed to upsert review")?;

        Ok(record)
    }

    async fn review_stats(&self, movie_id: i64) -> Result<ReviewStats> {
        let stats = sqlx::query_as::<_, ReviewStats>(
            r#"
            SELECT
                COUNT(*)::BIGINT AS count,
                COALESCE(AVG(rating), 0)::FLOAT8 AS avg_rating
            FROM reviews
            WHERE movie_id = $1
            "#,
        )
        .bind(movie_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to compute review stats")?;

        Ok(stats)
    }

    async fn list_reviews(&self, movie_id: i64) -> Result<Vec<ReviewWithAuthor>> {
        let reviews = sqlx::query_as::<_, ReviewWithAuthor>(
            r#"
            SELECT r.id, r.user_id, r.movie_id, r.rating, r.content, r.created_at, r.updated_at,
                   u.name, u.username, u.avatar_url
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.movie_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            "#,
        )
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list reviews")?;

        Ok(reviews)
    }

    async fn find_review(&self, user_id: i64, movie_id: i64) -> Result<Option<ReviewRecord>> {
        let review = sqlx::query_as::<_, ReviewRecord>(
            r#"
            SELECT id, user_id, movie_id, rating, content, created_at, updated_at
            FROM reviews
            WHERE user_id = $1 AND movie_id = $2
            "#,
        )
        .bind(user_id)
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch review")?;

        Ok(review)
    }

    async fn user_ratings(&self, user_id: i64) -> Result<Vec<i32>> {
        let ratings = sqlx::query_scalar::<_, i32>("SELECT rating FROM reviews WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch user ratings")?;

        Ok(ratings)
    }
}
