use serde::{Deserialize, Serialize};

use super::{normalize_query, Pagination, SearchService};
use crate::db::{PersonFilter, PersonOrder, RoleFilter, CREDIT_PREVIEW_LIMIT};
use crate::error::Result;
use crate::metrics;
use crate::models::PersonRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonSort {
    #[default]
    NameAsc,
    NameDesc,
    /// Most credited first.
    Popularity,
    Oldest,
    Youngest,
}

impl PersonSort {
    pub fn order(&self) -> PersonOrder {
        match self {
            PersonSort::NameAsc => PersonOrder::NameAsc,
            PersonSort::NameDesc => PersonOrder::NameDesc,
            PersonSort::Popularity => PersonOrder::CreditsDesc,
            PersonSort::Oldest => PersonOrder::BirthDateAsc,
            PersonSort::Youngest => PersonOrder::BirthDateDesc,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeopleSearchParams {
    pub query: Option<String>,
    pub role: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<PersonSort>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeopleSearchResult {
    pub people: Vec<PersonRecord>,
    pub pagination: Pagination,
}

impl PeopleSearchResult {
    pub fn empty() -> Self {
        Self {
            people: Vec::new(),
            pagination: Pagination::empty(),
        }
    }
}

impl SearchService {
    /// Name search over people. There is no browse mode: a blank query
    /// returns an empty result without touching the store.
    pub async fn search_people(&self, params: PeopleSearchParams) -> Result<PeopleSearchResult> {
        let window = self.page_window(params.page, params.limit)?;

        let Some(query) = normalize_query(params.query.as_deref()) else {
            return Ok(PeopleSearchResult::empty());
        };

        let filter = PersonFilter {
            name_contains: query,
            role: RoleFilter::from_input(params.role.as_deref()),
        };
        let order = params.sort_by.unwrap_or_default().order();

        let fetched = tokio::try_join!(
            self.store.find_people(&filter, order, window.limit, window.skip),
            self.store.count_people(&filter),
        );

        match fetched {
            Ok((mut people, total)) => {
                for person in &mut people {
                    person.movies.truncate(CREDIT_PREVIEW_LIMIT);
                }
                metrics::record_search("people", "ok");
                Ok(PeopleSearchResult {
                    people,
                    pagination: Pagination::new(total, window.limit, window.page),
                })
            }
            Err(e) => {
                tracing::error!(
                    error = ?e,
                    query = %filter.name_contains,
                    role = ?filter.role,
                    "People search failed, returning empty result"
                );
                metrics::record_search("people", "degraded");
                Ok(PeopleSearchResult::empty())
            }
        }
    }
}
