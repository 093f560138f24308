// Report service - end users flag accounts, movies or comments
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::db::ModerationStore;
use crate::error::{AppError, Result};
use crate::middleware::Caller;
use crate::models::{NewReport, ReportRecord, ReportTargetType};

pub struct ReportService {
    store: Arc<dyn ModerationStore>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    pub target_type: Option<String>,
    pub target_id: Option<i64>,
    pub reason: Option<String>,
}

/// Reason after trimming, checked against the stored column bounds.
#[derive(Debug, Validate)]
struct ReportReason {
    #[validate(length(min = 3, max = 200))]
    text: String,
}

impl ReportService {
    pub fn new(store: Arc<dyn ModerationStore>) -> Self {
        Self { store }
    }

    /// File a pending report on behalf of the caller.
    pub async fn create(&self, caller: Option<&Caller>, request: CreateReportRequest) -> Result<ReportRecord> {
        let caller = caller.ok_or(AppError::Unauthorized)?;

        let target_type = request
            .target_type
            .as_deref()
            .and_then(ReportTargetType::parse)
            .ok_or_else(|| {
                AppError::InvalidInput("targetType must be one of user, movie, comment".to_string())
            })?;

        let target_id = match request.target_id {
            Some(id) if id > 0 => id,
            _ => return Err(AppError::InvalidInput("targetId must be a positive integer".to_string())),
        };

        let reason = ReportReason {
            text: request.reason.unwrap_or_default().trim().to_string(),
        };
        reason
            .validate()
            .map_err(|_| AppError::InvalidInput("reason must be 3 to 200 characters".to_string()))?;

        let report = self
            .store
            .create_report(&NewReport {
                reporter_id: caller.id,
                target_type,
                target_id,
                reason: reason.text,
            })
            .await?;

        tracing::info!(
            report_id = report.id,
            reporter = caller.id,
            target_type = target_type.as_str(),
            target_id = target_id,
            "Report created"
        );

        Ok(report)
    }
}
