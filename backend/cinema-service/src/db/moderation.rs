use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use super::audit::insert_audit_log;
use super::query::{ModerationOp, PendingStats};
use super::ModerationStore;
use crate::models::{NewReport, ReportDetailRow, ReportGroup, ReportRecord, UserRecord};

const USER_COLUMNS: &str =
    "id, email, username, name, role, status, email_verified, created_at";

/// PostgreSQL moderation store
#[derive(Clone)]
pub struct PgModerationStore {
    pool: PgPool,
}

impl PgModerationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ModerationStore for PgModerationStore {
    async fn find_user(&self, user_id: i64) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user")?;

        Ok(user)
    }

    async fn find_users(&self, user_ids: &[i64]) -> Result<Vec<UserRecord>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let users = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE id = ANY($1)",
            USER_COLUMNS
        ))
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch users")?;

        Ok(users)
    }

    async fn group_user_reports(&self, limit: i64) -> Result<Vec<ReportGroup>> {
        let groups = sqlx::query_as::<_, ReportGroup>(
            r#"
            SELECT target_id, COUNT(*)::BIGINT AS count, MAX(created_at) AS last_at
            FROM reports
            WHERE target_type = 'user'
            GROUP BY target_id
            ORDER BY count DESC, last_at DESC, target_id ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to group user reports")?;

        Ok(groups)
    }

    async fn pending_user_report_stats(&self) -> Result<PendingStats> {
        let stats = sqlx::query_as::<_, PendingStats>(
            r#"
            SELECT COUNT(*)::BIGINT AS count, MIN(created_at) AS oldest_at
            FROM reports
            WHERE target_type = 'user' AND status = 'pending'
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to compute pending report stats")?;

        Ok(stats)
    }

    async fn list_user_reports(&self, target_id: i64) -> Result<Vec<ReportDetailRow>> {
        let rows = sqlx::query_as::<_, ReportDetailRow>(
            r#"
            SELECT r.id, r.reason, r.status, r.created_at,
                   u.id AS reporter_id, u.username AS reporter_username, u.email AS reporter_email
            FROM reports r
            JOIN users u ON u.id = r.reporter_id
            WHERE r.target_type = 'user' AND r.target_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            "#,
        )
        .bind(target_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list user reports")?;

        Ok(rows)
    }

    async fn create_report(&self, report: &NewReport) -> Result<ReportRecord> {
        let record = sqlx::query_as::<_, ReportRecord>(
            r#"
            INSERT INTO reports (reporter_id, target_type, target_id, reason, status, created_at)
            VALUES ($1, $2, $3, $4, 'pending', NOW())
            RETURNING id, reporter_id, target_type, target_id, reason, status, created_at
            "#,
        )
        .bind(report.reporter_id)
        .bind(report.target_type.as_str())
        .bind(report.target_id)
        .bind(&report.reason)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create report")?;

        Ok(record)
    }

    async fn transact(&self, ops: &[ModerationOp]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin moderation transaction")?;

        // Dropping `tx` on an early return rolls everything back.
        for op in ops {
            match op {
                ModerationOp::SetUserStatus { user_id, status } => {
                    sqlx::query("UPDATE users SET status = $1 WHERE id = $2")
                        .bind(status.as_str())
                        .bind(user_id)
                        .execute(&mut *tx)
                        .await
                        .context("Failed to update user status")?;
                }
                ModerationOp::SettlePendingReports { target_id, status } => {
                    let result = sqlx::query(
                        r#"
                        UPDATE reports
                        SET status = $1
                        WHERE target_type = 'user' AND target_id = $2 AND status = 'pending'
                        "#,
                    )
                    .bind(status.as_str())
                    .bind(target_id)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to settle pending reports")?;

                    tracing::debug!(
                        target_id = %target_id,
                        status = status.as_str(),
                        settled = result.rows_affected(),
                        "Pending reports settled"
                    );
                }
                ModerationOp::AppendAudit(entry) => {
                    insert_audit_log(&mut tx, entry).await?;
                }
            }
        }

        tx.commit()
            .await
            .context("Failed to commit moderation transaction")?;

        Ok(())
    }
}
