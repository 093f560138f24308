use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{MovieFilter, MovieOrder, ReleaseBound, TextMatch};
use crate::models::MovieStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovieSort {
    #[default]
    Latest,
    /// Accepted but not backed by any popularity metric yet; orders like
    /// the default.
    Popularity,
    Rating,
}

impl MovieSort {
    pub fn order(&self) -> MovieOrder {
        match self {
            MovieSort::Latest => MovieOrder::ReleaseDateDesc,
            MovieSort::Popularity | MovieSort::Rating => MovieOrder::CreatedAtDesc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovieSort::Latest => "latest",
            MovieSort::Popularity => "popularity",
            MovieSort::Rating => "rating",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatusMode {
    /// Approved movies only.
    #[default]
    Visible,
    Released,
    ComingSoon,
    Exact(String),
}

impl StatusMode {
    pub fn from_input(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => StatusMode::Visible,
            Some("released") => StatusMode::Released,
            Some("coming_soon") => StatusMode::ComingSoon,
            Some(other) => StatusMode::Exact(other.to_string()),
        }
    }
}

/// Inclusive release-year range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YearRange {
    pub from: Option<i32>,
    pub to: Option<i32>,
}

impl YearRange {
    /// `from` starts at January 1st and `to` ends at December 31st, both at
    /// midnight UTC.
    fn bounds(&self) -> Vec<ReleaseBound> {
        let mut bounds = Vec::new();
        if let Some(start) = self.from.and_then(|y| Utc.with_ymd_and_hms(y, 1, 1, 0, 0, 0).single()) {
            bounds.push(ReleaseBound::OnOrAfter(start));
        }
        if let Some(end) = self.to.and_then(|y| Utc.with_ymd_and_hms(y, 12, 31, 0, 0, 0).single()) {
            bounds.push(ReleaseBound::OnOrBefore(end));
        }
        bounds
    }
}

/// Which slice of a text search a filter should select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTier {
    Any,
    TitleHits,
    SynopsisOnly,
}

/// Every filter dimension of a movie search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieCriteria {
    pub status: StatusMode,
    pub genre: Option<String>,
    pub years: YearRange,
    pub query: Option<String>,
}

impl MovieCriteria {
    /// Translate the criteria into the store's filter for one text tier.
    /// Status-driven and year-driven date bounds are kept side by side so
    /// both apply.
    pub fn to_filter(&self, now: DateTime<Utc>, tier: TextTier) -> MovieFilter {
        let approved = MovieStatus::Approved.as_str().to_string();
        let (status, mut release_bounds) = match &self.status {
            StatusMode::Visible => (approved, Vec::new()),
            StatusMode::Released => (approved, vec![ReleaseBound::OnOrBefore(now)]),
            StatusMode::ComingSoon => (approved, vec![ReleaseBound::After(now)]),
            StatusMode::Exact(status) => (status.clone(), Vec::new()),
        };
        release_bounds.extend(self.years.bounds());

        let text = match (tier, &self.query) {
            (_, None) | (TextTier::Any, _) => TextMatch::Unfiltered,
            (TextTier::TitleHits, Some(q)) => TextMatch::Title(q.clone()),
            (TextTier::SynopsisOnly, Some(q)) => TextMatch::SynopsisNotTitle(q.clone()),
        };

        MovieFilter {
            status,
            release_bounds,
            genre_slug: self.genre.clone().filter(|g| !g.is_empty()),
            text,
        }
    }
}
