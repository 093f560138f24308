use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportTargetType {
    User,
    Movie,
    Comment,
}

impl ReportTargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportTargetType::User => "user",
            ReportTargetType::Movie => "movie",
            ReportTargetType::Comment => "comment",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(ReportTargetType::User),
            "movie" => Some(ReportTargetType::Movie),
            "comment" => Some(ReportTargetType::Comment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Resolved,
    Dismissed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Dismissed => "dismissed",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    pub id: i64,
    pub reporter_id: i64,
    pub target_type: String,
    pub target_id: i64,
    pub reason: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub reporter_id: i64,
    pub target_type: ReportTargetType,
    pub target_id: i64,
    pub reason: String,
}

/// Reports against one user, folded into a count and the latest timestamp.
#[derive(Debug, Clone, FromRow)]
pub struct ReportGroup {
    pub target_id: i64,
    pub count: i64,
    pub last_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReportDetailRow {
    pub id: i64,
    pub reason: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub reporter_id: i64,
    pub reporter_username: Option<String>,
    pub reporter_email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetail {
    pub id: i64,
    pub reason: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub reporter: ReporterRef,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReporterRef {
    pub id: i64,
    pub username: Option<String>,
    pub email: String,
}

impl From<ReportDetailRow> for ReportDetail {
    fn from(row: ReportDetailRow) -> Self {
        Self {
            id: row.id,
            reason: row.reason,
            status: row.status,
            created_at: row.created_at,
            reporter: ReporterRef {
                id: row.reporter_id,
                username: row.reporter_username,
                email: row.reporter_email,
            },
        }
    }
}
