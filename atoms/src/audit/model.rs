use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::users::User;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    TaskCompleted,
    TaskResubmitted,
    TaskReverted,
    CcReviewed,
    HodReviewed,
    CcRemarksUpdated,
    HodRemarksUpdated,
    DeadlineUpdated,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::TaskCompleted => "TASK_COMPLETED",
            AuditAction::TaskResubmitted => "TASK_RESUBMITTED",
            AuditAction::TaskReverted => "TASK_REVERTED",
            AuditAction::CcReviewed => "CC_REVIEWED",
            AuditAction::HodReviewed => "HOD_REVIEWED",
            AuditAction::CcRemarksUpdated => "CC_REMARKS_UPDATED",
            AuditAction::HodRemarksUpdated => "HOD_REMARKS_UPDATED",
            AuditAction::DeadlineUpdated => "DEADLINE_UPDATED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        [
            AuditAction::TaskCompleted,
            AuditAction::TaskResubmitted,
            AuditAction::TaskReverted,
            AuditAction::CcReviewed,
            AuditAction::HodReviewed,
            AuditAction::CcRemarksUpdated,
            AuditAction::HodRemarksUpdated,
            AuditAction::DeadlineUpdated,
        ]
        .into_iter()
        .find(|a| a.as_str() == raw)
    }
}

/// Immutable record of one task mutation.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuditLogEntry {
    pub entry_id: String,
    pub assignment_id: String,
    pub task_id: Option<String>,
    pub action: AuditAction,
    /// Display name of the actor at the time of the action.
    pub created_by: String,
    pub created_by_id: String,
    pub created_at: DateTime<Utc>,
    pub remarks: String,
}

impl AuditLogEntry {
    pub fn new(
        assignment_id: &str,
        task_id: Option<&str>,
        action: AuditAction,
        actor: &User,
        remarks: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            entry_id: uuid::Uuid::new_v4().to_string(),
            assignment_id: assignment_id.to_string(),
            task_id: task_id.map(str::to_string),
            action,
            created_by: actor.user_name.clone(),
            created_by_id: actor.user_id.clone(),
            created_at: now,
            remarks: remarks.into(),
        }
    }
}
