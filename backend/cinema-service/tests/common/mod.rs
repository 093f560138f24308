//! In-memory stores for integration tests.
//!
//! Filtering and ordering follow the SQL issued by the Postgres stores:
//! case-insensitive substring matches, undated rows sorted last, id as the
//! final tiebreak. Both stores can be told to fail so degradation and
//! rollback paths can be exercised without a database.

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};

use cinema_service::config::{ModerationSettings, SearchSettings};
use cinema_service::db::{
    CatalogStore, ModerationOp, ModerationStore, MovieFilter, MovieOrder, PendingStats,
    PersonFilter, PersonOrder, RoleFilter, TextMatch, CREDIT_PREVIEW_LIMIT,
};
use cinema_service::middleware::Caller;
use cinema_service::models::{
    CreditPreview, MovieRecord, NewAuditLog, NewReport, NewReview, PersonRecord, ReportDetailRow,
    ReportGroup, ReportRecord, ReviewRecord, ReviewStats, ReviewWithAuthor, UserRecord, UserRole,
    UserSummary,
};
use cinema_service::AppState;

pub const TEST_SECRET: &str = "test-secret";

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Descending order with `None` after every value, like `DESC NULLS LAST`.
fn desc_nulls_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn asc_nulls_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn page<T>(rows: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    rows.into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn ts(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// Approved movie released `id` days after 2000-01-01.
pub fn movie(id: i64, title: &str, synopsis: &str) -> MovieRecord {
    MovieRecord {
        id,
        slug: title.to_lowercase().replace(' ', "-"),
        title: title.to_string(),
        synopsis: Some(synopsis.to_string()),
        status: "approved".to_string(),
        release_date: Some(ts(2000, 1, 1) + Duration::days(id)),
        duration: Some(100),
        poster_url: None,
        trailer_url: None,
        submitted_by: None,
        created_at: ts(2020, 1, 1) + Duration::hours(id),
        genres: Vec::new(),
        ratings: Vec::new(),
    }
}

pub fn person(id: i64, name: &str, birth_date: Option<(i32, u32, u32)>, roles: &[&str]) -> PersonRecord {
    let movies: Vec<CreditPreview> = roles
        .iter()
        .enumerate()
        .map(|(i, role)| CreditPreview {
            person_id: id,
            movie_id: 1000 + i as i64,
            movie_title: format!("Feature {}", i + 1),
            role: role.to_string(),
            character_name: None,
        })
        .collect();

    PersonRecord {
        id,
        slug: name.to_lowercase().replace(' ', "-"),
        name: name.to_string(),
        birth_date: birth_date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        image_url: None,
        user_id: None,
        credit_count: movies.len() as i64,
        movies,
    }
}

pub fn user(id: i64, username: &str, role: UserRole) -> UserRecord {
    UserRecord {
        id,
        email: format!("{}@example.com", username),
        username: Some(username.to_string()),
        name: Some(username.to_string()),
        role: role.as_str().to_string(),
        status: "active".to_string(),
        email_verified: None,
        created_at: ts(2023, 1, 1),
    }
}

pub fn report(id: i64, reporter_id: i64, target_id: i64, status: &str, created_at: DateTime<Utc>) -> ReportRecord {
    ReportRecord {
        id,
        reporter_id,
        target_type: "user".to_string(),
        target_id,
        reason: format!("report {}", id),
        status: status.to_string(),
        created_at,
    }
}

pub fn caller(id: i64, role: UserRole) -> Caller {
    Caller { id, role }
}

pub fn app_state(catalog: &MemoryCatalog, moderation: &MemoryModeration) -> AppState {
    AppState::new(
        Arc::new(catalog.clone()),
        Arc::new(moderation.clone()),
        SearchSettings::default(),
        ModerationSettings::default(),
        TEST_SECRET,
    )
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CatalogData {
    movies: Vec<(MovieRecord, Vec<String>)>,
    people: Vec<PersonRecord>,
    users: Vec<UserSummary>,
    reviews: Vec<ReviewRecord>,
    next_review_id: i64,
}

#[derive(Clone, Default)]
pub struct MemoryCatalog {
    data: Arc<Mutex<CatalogData>>,
    failing: Arc<AtomicBool>,
    /// People queries restricted to this role fail; others are unaffected.
    failing_role: Arc<Mutex<Option<RoleFilter>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_movie(&self, movie: MovieRecord, genre_slugs: &[&str]) {
        let slugs = genre_slugs.iter().map(|s| s.to_string()).collect();
        self.data.lock().unwrap().movies.push((movie, slugs));
    }

    pub fn add_person(&self, person: PersonRecord) {
        self.data.lock().unwrap().people.push(person);
    }

    pub fn add_user(&self, id: i64, name: &str, username: &str) {
        self.data.lock().unwrap().users.push(UserSummary {
            id,
            name: Some(name.to_string()),
            username: Some(username.to_string()),
            avatar_url: None,
        });
    }

    pub fn add_review(&self, user_id: i64, movie_id: i64, rating: i32) {
        let mut data = self.data.lock().unwrap();
        data.next_review_id += 1;
        let id = data.next_review_id;
        let now = Utc::now();
        data.reviews.push(ReviewRecord {
            id,
            user_id,
            movie_id,
            rating,
            content: None,
            created_at: now,
            updated_at: now,
        });
    }

    /// Make every subsequent query fail.
    pub fn fail_queries(&self, failing: bool) {
        self.failing.store(failing, AtomicOrdering::SeqCst);
    }

    /// Make people queries filtered by `role` fail.
    pub fn fail_role_queries(&self, role: Option<RoleFilter>) {
        *self.failing_role.lock().unwrap() = role;
    }

    pub fn reviews(&self) -> Vec<ReviewRecord> {
        self.data.lock().unwrap().reviews.clone()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(AtomicOrdering::SeqCst) {
            bail!("catalog store unavailable");
        }
        Ok(())
    }

    fn matching_movies(&self, filter: &MovieFilter) -> Vec<MovieRecord> {
        let data = self.data.lock().unwrap();
        data.movies
            .iter()
            .filter(|(m, slugs)| {
                m.status == filter.status
                    && filter.release_bounds.iter().all(|b| b.accepts(m.release_date))
                    && filter
                        .genre_slug
                        .as_ref()
                        .map_or(true, |g| slugs.contains(g))
                    && match &filter.text {
                        TextMatch::Unfiltered => true,
                        TextMatch::Title(q) => contains_ci(&m.title, q),
                        TextMatch::SynopsisNotTitle(q) => {
                            m.synopsis.as_deref().map_or(false, |s| contains_ci(s, q))
                                && !contains_ci(&m.title, q)
                        }
                    }
            })
            .map(|(m, _)| {
                let mut movie = m.clone();
                movie.ratings = data
                    .reviews
                    .iter()
                    .filter(|r| r.movie_id == m.id)
                    .map(|r| r.rating)
                    .collect();
                movie
            })
            .collect()
    }

    fn check_people(&self, filter: &PersonFilter) -> Result<()> {
        self.check()?;
        let failing_role = *self.failing_role.lock().unwrap();
        if failing_role.is_some() && filter.role == failing_role {
            bail!("people store unavailable for {:?}", filter.role);
        }
        Ok(())
    }

    fn matching_people(&self, filter: &PersonFilter) -> Vec<PersonRecord> {
        let roles = filter.role.map(|r| r.roles());
        self.data
            .lock()
            .unwrap()
            .people
            .iter()
            .filter(|p| contains_ci(&p.name, &filter.name_contains))
            .filter(|p| match &roles {
                Some(roles) => p.movies.iter().any(|c| roles.contains(&c.role)),
                None => true,
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn count_movies(&self, filter: &MovieFilter) -> Result<i64> {
        self.check()?;
        Ok(self.matching_movies(filter).len() as i64)
    }

    async fn find_movies(
        &self,
        filter: &MovieFilter,
        order: MovieOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MovieRecord>> {
        self.check()?;
        let mut movies = self.matching_movies(filter);
        movies.sort_by(|a, b| {
            let primary = match order {
                MovieOrder::ReleaseDateDesc => desc_nulls_last(&a.release_date, &b.release_date),
                MovieOrder::CreatedAtDesc => b.created_at.cmp(&a.created_at),
            };
            primary.then(b.id.cmp(&a.id))
        });
        Ok(page(movies, limit, offset))
    }

    async fn count_people(&self, filter: &PersonFilter) -> Result<i64> {
        self.check_people(filter)?;
        Ok(self.matching_people(filter).len() as i64)
    }

    async fn find_people(
        &self,
        filter: &PersonFilter,
        order: PersonOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PersonRecord>> {
        self.check_people(filter)?;
        let mut people = self.matching_people(filter);
        people.sort_by(|a, b| {
            let primary = match order {
                PersonOrder::NameAsc => a.name.cmp(&b.name),
                PersonOrder::NameDesc => b.name.cmp(&a.name),
                PersonOrder::CreditsDesc => b.credit_count.cmp(&a.credit_count),
                PersonOrder::BirthDateAsc => asc_nulls_last(&a.birth_date, &b.birth_date),
                PersonOrder::BirthDateDesc => desc_nulls_last(&a.birth_date, &b.birth_date),
            };
            primary.then(a.id.cmp(&b.id))
        });

        let mut people = page(people, limit, offset);
        for person in &mut people {
            person.movies.truncate(CREDIT_PREVIEW_LIMIT);
        }
        Ok(people)
    }

    async fn find_users_by_name(&self, query: &str, limit: i64) -> Result<Vec<UserSummary>> {
        self.check()?;
        let mut users: Vec<UserSummary> = self
            .data
            .lock()
            .unwrap()
            .users
            .iter()
            .filter(|u| {
                u.name.as_deref().map_or(false, |n| contains_ci(n, query))
                    || u.username.as_deref().map_or(false, |n| contains_ci(n, query))
            })
            .cloned()
            .collect();
        users.sort_by_key(|u| u.id);
        Ok(page(users, limit, 0))
    }

    async fn movie_exists(&self, movie_id: i64) -> Result<bool> {
        self.check()?;
        Ok(self
            .data
            .lock()
            .unwrap()
            .movies
            .iter()
            .any(|(m, _)| m.id == movie_id))
    }

    async fn upsert_review(&self, review: &NewReview) -> Result<ReviewRecord> {
        self.check()?;
        let mut data = self.data.lock().unwrap();
        let now = Utc::now();

        if let Some(existing) = data
            .reviews
            .iter_mut()
            .find(|r| r.user_id == review.user_id && r.movie_id == review.movie_id)
        {
            existing.rating = review.rating;
            existing.content = review.content.clone();
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        data.next_review_id += 1;
        let record = ReviewRecord {
            id: data.next_review_id,
            user_id: review.user_id,
            movie_id: review.movie_id,
            rating: review.rating,
            content: review.content.clone(),
            created_at: now,
            updated_at: now,
        };
        data.reviews.push(record.clone());
        Ok(record)
    }

    async fn review_stats(&self, movie_id: i64) -> Result<ReviewStats> {
        self.check()?;
        let ratings: Vec<i32> = self
            .data
            .lock()
            .unwrap()
            .reviews
            .iter()
            .filter(|r| r.movie_id == movie_id)
            .map(|r| r.rating)
            .collect();

        if ratings.is_empty() {
            return Ok(ReviewStats::default());
        }
        let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
        Ok(ReviewStats {
            count: ratings.len() as i64,
            avg_rating: sum as f64 / ratings.len() as f64,
        })
    }

    async fn list_reviews(&self, movie_id: i64) -> Result<Vec<ReviewWithAuthor>> {
        self.check()?;
        let data = self.data.lock().unwrap();
        let authors: HashMap<i64, &UserSummary> = data.users.iter().map(|u| (u.id, u)).collect();

        let mut reviews: Vec<ReviewWithAuthor> = data
            .reviews
            .iter()
            .filter(|r| r.movie_id == movie_id)
            .filter_map(|r| {
                let author = authors.get(&r.user_id)?;
                Some(ReviewWithAuthor {
                    id: r.id,
                    user_id: r.user_id,
                    movie_id: r.movie_id,
                    rating: r.rating,
                    content: r.content.clone(),
                    created_at: r.created_at,
                    updated_at: r.updated_at,
                    name: author.name.clone(),
                    username: author.username.clone(),
                    avatar_url: author.avatar_url.clone(),
                })
            })
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(reviews)
    }

    async fn find_review(&self, user_id: i64, movie_id: i64) -> Result<Option<ReviewRecord>> {
        self.check()?;
        Ok(self
            .data
            .lock()
            .unwrap()
            .reviews
            .iter()
            .find(|r| r.user_id == user_id && r.movie_id == movie_id)
            .cloned())
    }

    async fn user_ratings(&self, user_id: i64) -> Result<Vec<i32>> {
        self.check()?;
        Ok(self
            .data
            .lock()
            .unwrap()
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.rating)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Moderation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ModerationData {
    pub users: Vec<UserRecord>,
    pub reports: Vec<ReportRecord>,
    pub audit_log: Vec<NewAuditLog>,
}

#[derive(Clone, Default)]
pub struct MemoryModeration {
    data: Arc<Mutex<ModerationData>>,
    /// Fail a transaction when it reaches the op at this index.
    fail_at_op: Arc<Mutex<Option<usize>>>,
}

impl MemoryModeration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: UserRecord) {
        self.data.lock().unwrap().users.push(user);
    }

    pub fn add_report(&self, report: ReportRecord) {
        self.data.lock().unwrap().reports.push(report);
    }

    pub fn fail_transaction_at(&self, op_index: Option<usize>) {
        *self.fail_at_op.lock().unwrap() = op_index;
    }

    pub fn snapshot(&self) -> ModerationData {
        self.data.lock().unwrap().clone()
    }

    pub fn user_status(&self, user_id: i64) -> Option<String> {
        self.data
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.status.clone())
    }

    pub fn report_statuses(&self, target_id: i64) -> Vec<String> {
        let mut reports: Vec<ReportRecord> = self
            .data
            .lock()
            .unwrap()
            .reports
            .iter()
            .filter(|r| r.target_id == target_id)
            .cloned()
            .collect();
        reports.sort_by_key(|r| r.id);
        reports.into_iter().map(|r| r.status).collect()
    }
}

#[async_trait]
impl ModerationStore for MemoryModeration {
    async fn find_user(&self, user_id: i64) -> Result<Option<UserRecord>> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.id == user_id)
            .cloned())
    }

    async fn find_users(&self, user_ids: &[i64]) -> Result<Vec<UserRecord>> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .users
            .iter()
            .filter(|u| user_ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn group_user_reports(&self, limit: i64) -> Result<Vec<ReportGroup>> {
        let mut groups: HashMap<i64, ReportGroup> = HashMap::new();
        for r in self
            .data
            .lock()
            .unwrap()
            .reports
            .iter()
            .filter(|r| r.target_type == "user")
        {
            let group = groups.entry(r.target_id).or_insert(ReportGroup {
                target_id: r.target_id,
                count: 0,
                last_at: None,
            });
            group.count += 1;
            group.last_at = group.last_at.max(Some(r.created_at));
        }

        let mut groups: Vec<ReportGroup> = groups.into_values().collect();
        groups.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then(b.last_at.cmp(&a.last_at))
                .then(a.target_id.cmp(&b.target_id))
        });
        Ok(page(groups, limit, 0))
    }

    async fn pending_user_report_stats(&self) -> Result<PendingStats> {
        let data = self.data.lock().unwrap();
        let pending: Vec<&ReportRecord> = data
            .reports
            .iter()
            .filter(|r| r.target_type == "user" && r.status == "pending")
            .collect();

        Ok(PendingStats {
            count: pending.len() as i64,
            oldest_at: pending.iter().map(|r| r.created_at).min(),
        })
    }

    async fn list_user_reports(&self, target_id: i64) -> Result<Vec<ReportDetailRow>> {
        let data = self.data.lock().unwrap();
        let mut rows: Vec<ReportDetailRow> = data
            .reports
            .iter()
            .filter(|r| r.target_type == "user" && r.target_id == target_id)
            .filter_map(|r| {
                let reporter = data.users.iter().find(|u| u.id == r.reporter_id)?;
                Some(ReportDetailRow {
                    id: r.id,
                    reason: r.reason.clone(),
                    status: r.status.clone(),
                    created_at: r.created_at,
                    reporter_id: reporter.id,
                    reporter_username: reporter.username.clone(),
                    reporter_email: reporter.email.clone(),
                })
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn create_report(&self, report: &NewReport) -> Result<ReportRecord> {
        let mut data = self.data.lock().unwrap();
        let id = data.reports.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let record = ReportRecord {
            id,
            reporter_id: report.reporter_id,
            target_type: report.target_type.as_str().to_string(),
            target_id: report.target_id,
            reason: report.reason.clone(),
            status: "pending".to_string(),
            created_at: Utc::now(),
        };
        data.reports.push(record.clone());
        Ok(record)
    }

    /// Ops run against a copy that only replaces the live data once every
    /// op has succeeded.
    async fn transact(&self, ops: &[ModerationOp]) -> Result<()> {
        let fail_at = *self.fail_at_op.lock().unwrap();
        let mut data = self.data.lock().unwrap();
        let mut working = data.clone();

        for (index, op) in ops.iter().enumerate() {
            if fail_at == Some(index) {
                bail!("injected failure at op {}", index);
            }
            match op {
                ModerationOp::SetUserStatus { user_id, status } => {
                    for u in working.users.iter_mut().filter(|u| u.id == *user_id) {
                        u.status = status.as_str().to_string();
                    }
                }
                ModerationOp::SettlePendingReports { target_id, status } => {
                    for r in working.reports.iter_mut().filter(|r| {
                        r.target_type == "user" && r.target_id == *target_id && r.status == "pending"
                    }) {
                        r.status = status.as_str().to_string();
                    }
                }
                ModerationOp::AppendAudit(entry) => working.audit_log.push(entry.clone()),
            }
        }

        *data = working;
        Ok(())
    }
}
