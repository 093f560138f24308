//! Catalog search: tiered movie search, people search, user lookup and the
//! "search everything" fan-out.
//!
//! Searches are a best-effort read path. Storage faults are logged and turned
//! into an empty, well-formed result; only malformed parameters are reported
//! back to the caller.

mod criteria;
mod federated;
mod movies;
mod people;
mod users;

use serde::Serialize;
use std::sync::Arc;

use crate::config::SearchSettings;
use crate::db::CatalogStore;
use crate::error::{AppError, Result};

pub use criteria::{MovieCriteria, MovieSort, StatusMode, TextTier, YearRange};
pub use federated::{FederatedOptions, FederatedResult};
pub use movies::{MovieSearchParams, MovieSearchResult};
pub use people::{PeopleSearchParams, PeopleSearchResult, PersonSort};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub pages: i64,
    pub current: i64,
}

impl Pagination {
    pub fn new(total: i64, limit: i64, current: i64) -> Self {
        let pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self { total, pages, current }
    }

    pub fn empty() -> Self {
        Self { total: 0, pages: 0, current: 1 }
    }
}

/// Validated paging parameters. `skip` is the row offset of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageWindow {
    page: i64,
    limit: i64,
    skip: i64,
}

impl PageWindow {
    /// Resolve page and limit into a window, rejecting values outside the
    /// accepted range or whose offset does not fit in an `i64`.
    fn resolve(settings: &SearchSettings, page: Option<i64>, limit: Option<i64>) -> Result<Self> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(settings.default_limit);

        if page < 1 {
            return Err(AppError::InvalidInput("page must be at least 1".to_string()));
        }
        if limit < 1 || limit > settings.max_limit {
            return Err(AppError::InvalidInput(format!(
                "limit must be between 1 and {}",
                settings.max_limit
            )));
        }
        let skip = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| AppError::InvalidInput("page out of range".to_string()))?;

        Ok(Self { page, limit, skip })
    }
}

pub struct SearchService {
    store: Arc<dyn CatalogStore>,
    settings: SearchSettings,
}

impl SearchService {
    pub fn new(store: Arc<dyn CatalogStore>, settings: SearchSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    fn page_window(&self, page: Option<i64>, limit: Option<i64>) -> Result<PageWindow> {
        PageWindow::resolve(&self.settings, page, limit)
    }
}

/// Trimmed query text, `None` when blank.
fn normalize_query(query: Option<&str>) -> Option<String> {
    query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(String::from)
}
