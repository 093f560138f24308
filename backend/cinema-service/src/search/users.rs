use super::SearchService;
use crate::metrics;
use crate::models::UserSummary;

const MIN_USER_QUERY_CHARS: usize = 3;
const USER_RESULT_LIMIT: i64 = 3;

impl SearchService {
    /// Quick user lookup by name or username. Short queries return nothing.
    pub async fn search_users(&self, query: &str) -> Vec<UserSummary> {
        let query = query.trim();
        if query.chars().count() < MIN_USER_QUERY_CHARS {
            return Vec::new();
        }

        match self.store.find_users_by_name(query, USER_RESULT_LIMIT).await {
            Ok(users) => {
                metrics::record_search("users", "ok");
                users
            }
            Err(e) => {
                tracing::error!(error = ?e, query = %query, "User search failed, returning empty result");
                metrics::record_search("users", "degraded");
                Vec::new()
            }
        }
    }
}
