use anyhow::{Context, Result};
use sqlx::{Postgres, Transaction};

use crate::models::NewAuditLog;

/// Append an audit entry inside the caller's transaction.
pub(super) async fn insert_audit_log(
    tx: &mut Transaction<'_, Postgres>,
    entry: &NewAuditLog,
) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO audit_logs (admin_id, action, target_type, target_id, details, created_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        RETURNING id
        "#,
    )
    .bind(entry.admin_id)
    .bind(entry.action.as_str())
    .bind(entry.target_type.as_str())
    .bind(entry.target_id)
    .bind(&entry.details)
    .fetch_one(&mut **tx)
    .await
    .context("Failed to insert audit log")?;

    Ok(id)
}
