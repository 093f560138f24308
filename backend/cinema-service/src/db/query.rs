//! Typed query shapes understood by the stores.

use chrono::{DateTime, Utc};

use crate::models::{CreditRole, NewAuditLog, ReportStatus, UserStatus};

/// Maximum number of credits attached to each person in search results.
pub const CREDIT_PREVIEW_LIMIT: usize = 3;

/// Role values that count as an acting credit.
pub const CAST_ROLE_ALIASES: [&str; 3] = ["actor", "cast", "actress"];

#[derive(Debug, Clone, PartialEq)]
pub struct MovieFilter {
    pub status: String,
    /// All bounds must hold.
    pub release_bounds: Vec<ReleaseBound>,
    pub genre_slug: Option<String>,
    pub text: TextMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseBound {
    After(DateTime<Utc>),
    OnOrAfter(DateTime<Utc>),
    OnOrBefore(DateTime<Utc>),
}

impl ReleaseBound {
    /// A movie without a release date never satisfies a bound.
    pub fn accepts(&self, release_date: Option<DateTime<Utc>>) -> bool {
        match (self, release_date) {
            (_, None) => false,
            (ReleaseBound::After(at), Some(d)) => d > *at,
            (ReleaseBound::OnOrAfter(at), Some(d)) => d >= *at,
            (ReleaseBound::OnOrBefore(at), Some(d)) => d <= *at,
        }
    }
}

/// Case-insensitive substring match on movie text fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextMatch {
    Unfiltered,
    Title(String),
    /// Synopsis contains the text while the title does not.
    SynopsisNotTitle(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieOrder {
    /// Release date newest first, undated movies last.
    ReleaseDateDesc,
    CreatedAtDesc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonFilter {
    pub name_contains: String,
    pub role: Option<RoleFilter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleFilter {
    Director,
    Cast,
}

impl RoleFilter {
    /// `director` selects directors; any other non-empty value selects cast.
    pub fn from_input(value: Option<&str>) -> Option<Self> {
        match value.map(str::trim) {
            None | Some("") => None,
            Some("director") => Some(RoleFilter::Director),
            Some(_) => Some(RoleFilter::Cast),
        }
    }

    pub fn roles(&self) -> Vec<String> {
        match self {
            RoleFilter::Director => vec![CreditRole::Director.as_str().to_string()],
            RoleFilter::Cast => CAST_ROLE_ALIASES.iter().map(|r| r.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonOrder {
    NameAsc,
    NameDesc,
    CreditsDesc,
    /// Birth date ascending, unknown birth dates last.
    BirthDateAsc,
    /// Birth date descending, unknown birth dates last.
    BirthDateDesc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct PendingStats {
    pub count: i64,
    pub oldest_at: Option<DateTime<Utc>>,
}

/// One statement of a moderation transaction.
#[derive(Debug, Clone)]
pub enum ModerationOp {
    SetUserStatus { user_id: i64, status: UserStatus },
    /// Move every pending report against the user to `status`.
    SettlePendingReports { target_id: i64, status: ReportStatus },
    AppendAudit(NewAuditLog),
}

/// `ILIKE` pattern matching `text` anywhere, with wildcards escaped.
pub fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
