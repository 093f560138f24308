// Moderation service - report aggregation and admin ban/dismiss actions
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ModerationSettings;
use crate::db::{ModerationOp, ModerationStore};
use crate::error::{AppError, Result};
use crate::metrics;
use crate::middleware::Caller;
use crate::models::{
    AuditAction, AuditTarget, NewAuditLog, ReportDetail, ReportStatus, UserRecord, UserRole,
    UserStatus,
};

pub struct ModerationService {
    store: Arc<dyn ModerationStore>,
    settings: ModerationSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    Ban,
    Dismiss,
}

impl ModerationAction {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ban" => Some(ModerationAction::Ban),
            "dismiss" => Some(ModerationAction::Dismiss),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::Ban => "ban",
            ModerationAction::Dismiss => "dismiss",
        }
    }
}

/// Raw action request; fields are checked by the service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationRequest {
    pub user_id: Option<i64>,
    pub action: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModerationOutcome {
    pub ok: bool,
    pub action: ModerationAction,
}

/// Public fields of a reported account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedUser {
    pub id: i64,
    pub username: Option<String>,
    pub display_name: String,
    pub email: String,
    pub status: String,
    pub role: String,
}

impl From<UserRecord> for ReportedUser {
    fn from(user: UserRecord) -> Self {
        Self {
            display_name: user.display_name(),
            id: user.id,
            username: user.username,
            email: user.email,
            status: user.status,
            role: user.role,
        }
    }
}

/// Report volume against one account. `user` is `None` when the account no
/// longer exists.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedUserRow {
    pub target_id: i64,
    pub user: Option<ReportedUser>,
    pub count: i64,
    pub last_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationSummary {
    pub rows: Vec<ReportedUserRow>,
    pub pending_count: i64,
    pub oldest_pending_at: Option<DateTime<Utc>>,
    pub reported_user_count: usize,
}

/// Statements making up one moderation action, in execution order.
fn action_ops(action: ModerationAction, admin_id: i64, user_id: i64) -> Vec<ModerationOp> {
    match action {
        ModerationAction::Ban => vec![
            ModerationOp::SetUserStatus {
                user_id,
                status: UserStatus::Banned,
            },
            ModerationOp::SettlePendingReports {
                target_id: user_id,
                status: ReportStatus::Resolved,
            },
            ModerationOp::AppendAudit(NewAuditLog {
                admin_id,
                action: AuditAction::BanUser,
                target_type: AuditTarget::User,
                target_id: user_id,
                details: serde_json::json!({ "reason": "reports" }),
            }),
        ],
        ModerationAction::Dismiss => vec![
            ModerationOp::SettlePendingReports {
                target_id: user_id,
                status: ReportStatus::Dismissed,
            },
            ModerationOp::AppendAudit(NewAuditLog {
                admin_id,
                action: AuditAction::DismissReports,
                target_type: AuditTarget::User,
                target_id: user_id,
                details: serde_json::json!({ "target": "user" }),
            }),
        ],
    }
}

fn validate_user_id(user_id: Option<i64>) -> Result<i64> {
    match user_id {
        Some(id) if id > 0 => Ok(id),
        _ => Err(AppError::InvalidInput("userId must be a positive integer".to_string())),
    }
}

impl ModerationService {
    pub fn new(store: Arc<dyn ModerationStore>, settings: ModerationSettings) -> Self {
        Self { store, settings }
    }

    /// Admin gate. The role is read back from storage on every call; the
    /// role carried by the session is ignored.
    async fn require_admin(&self, caller: &Caller) -> Result<i64> {
        let stored = self.store.find_user(caller.id).await?;

        match stored {
            Some(user) if user.role() == UserRole::Admin => Ok(user.id),
            _ => {
                tracing::warn!(
                    caller_id = caller.id,
                    session_role = caller.role.as_str(),
                    "Moderation access denied"
                );
                Err(AppError::Forbidden)
            }
        }
    }

    /// Reported accounts ordered by report count, plus backlog figures.
    pub async fn summary(&self, caller: Option<&Caller>) -> Result<ModerationSummary> {
        let caller = caller.ok_or(AppError::Unauthorized)?;
        self.require_admin(caller).await?;

        let (groups, pending) = tokio::try_join!(
            self.store.group_user_reports(self.settings.summary_limit),
            self.store.pending_user_report_stats(),
        )?;

        let ids: Vec<i64> = groups.iter().map(|g| g.target_id).collect();
        let mut users: HashMap<i64, UserRecord> = self
            .store
            .find_users(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let rows: Vec<ReportedUserRow> = groups
            .into_iter()
            .map(|g| ReportedUserRow {
                target_id: g.target_id,
                user: users.remove(&g.target_id).map(ReportedUser::from),
                count: g.count,
                last_at: g.last_at,
            })
            .collect();
        let reported_user_count = rows.iter().filter(|r| r.user.is_some()).count();

        Ok(ModerationSummary {
            rows,
            pending_count: pending.count,
            oldest_pending_at: pending.oldest_at,
            reported_user_count,
        })
    }

    /// Every report filed against one account, newest first.
    pub async fn user_reports(&self, caller: Option<&Caller>, user_id: i64) -> Result<Vec<ReportDetail>> {
        let caller = caller.ok_or(AppError::Unauthorized)?;
        let user_id = validate_user_id(Some(user_id))?;
        self.require_admin(caller).await?;

        let rows = self.store.list_user_reports(user_id).await?;
        Ok(rows.into_iter().map(ReportDetail::from).collect())
    }

    /// Ban the account or dismiss its pending reports. The state change and
    /// its audit entry commit together or not at all.
    pub async fn act(&self, caller: Option<&Caller>, request: ModerationRequest) -> Result<ModerationOutcome> {
        let caller = caller.ok_or(AppError::Unauthorized)?;
        let user_id = validate_user_id(request.user_id)?;
        let action = request
            .action
            .as_deref()
            .and_then(ModerationAction::parse)
            .ok_or_else(|| AppError::InvalidInput("action must be 'ban' or 'dismiss'".to_string()))?;

        let admin_id = self.require_admin(caller).await?;

        if self.store.find_user(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        let ops = action_ops(action, admin_id, user_id);
        if let Err(e) = self.store.transact(&ops).await {
            tracing::error!(
                error = ?e,
                admin_id = admin_id,
                target_id = user_id,
                action = action.as_str(),
                "Moderation transaction rolled back"
            );
            metrics::record_moderation_action(action.as_str(), "failed");
            return Err(AppError::Storage(e));
        }

        tracing::info!(
            admin_id = admin_id,
            target_id = user_id,
            action = action.as_str(),
            "Moderation action applied"
        );
        metrics::record_moderation_action(action.as_str(), "applied");

        Ok(ModerationOutcome { ok: true, action })
    }
}
