use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditRole {
    Director,
    Writer,
    Cast,
}

impl CreditRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditRole::Director => "director",
            CreditRole::Writer => "writer",
            CreditRole::Cast => "cast",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub image_url: Option<String>,
    pub user_id: Option<i64>,
    pub credit_count: i64,
    /// Preview of the person's credits, never more than three entries.
    #[sqlx(skip)]
    pub movies: Vec<CreditPreview>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditPreview {
    #[serde(skip_serializing)]
    pub person_id: i64,
    pub movie_id: i64,
    pub movie_title: String,
    pub role: String,
    pub character_name: Option<String>,
}
