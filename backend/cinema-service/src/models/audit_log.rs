use serde::Serialize;

/// Audit entry to append. Audit rows are written once and never updated.
#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub admin_id: i64,
    pub action: AuditAction,
    pub target_type: AuditTarget,
    pub target_id: i64,
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    BanUser,
    DismissReports,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::BanUser => "ban_user",
            AuditAction::DismissReports => "dismiss_reports",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditTarget {
    User,
}

impl AuditTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditTarget::User => "user",
        }
    }
}
