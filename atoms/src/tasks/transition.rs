//! Pure transition rules for a course-file task.
//!
//! Every function takes the current record and the caller's capabilities and
//! returns either the complete next record or a typed refusal. Nothing is
//! mutated in place, so a refusal can never leave a half-applied change.

use chrono::{DateTime, NaiveDate, Utc};

use super::model::{CompletionStatus, CourseFileTask, ReviewStatus};
use crate::access::{Capabilities, ReviewerRole};
use crate::audit::AuditAction;
use crate::errors::ApprovalError;

/// Accepted next state plus what to write to the audit log.
#[derive(Debug, Clone)]
pub struct Transition {
    pub task: CourseFileTask,
    pub action: AuditAction,
    pub remarks: String,
}

/// Faculty marks the task done, or resubmits it after it was returned.
pub fn complete(
    task: &CourseFileTask,
    caps: &Capabilities,
    now: DateTime<Utc>,
) -> Result<Transition, ApprovalError> {
    if !caps.is_owner {
        return Err(ApprovalError::Forbidden(
            "Only the faculty member assigned to this subject can complete its tasks.".to_string(),
        ));
    }

    let returned = task.is_returned();
    if task.status == CompletionStatus::Completed && !returned {
        return Err(ApprovalError::InvalidState(
            "Task is already completed and awaiting review.".to_string(),
        ));
    }

    let mut next = task.clone();
    next.status = CompletionStatus::Completed;
    next.completed_at = Some(now);
    let action = if returned {
        next.reset_reviews();
        AuditAction::TaskResubmitted
    } else {
        AuditAction::TaskCompleted
    };

    Ok(Transition {
        task: next,
        action,
        remarks: String::new(),
    })
}

/// Undo a completion. Once the HOD has approved, only a reviewer may do this.
pub fn revert(task: &CourseFileTask, caps: &Capabilities) -> Result<Transition, ApprovalError> {
    if !caps.is_owner && !caps.is_reviewer() {
        return Err(ApprovalError::Forbidden(
            "Only the assigned faculty, CC or HOD can revert this task.".to_string(),
        ));
    }
    if task.status != CompletionStatus::Completed {
        return Err(ApprovalError::InvalidState(
            "Task is not completed.".to_string(),
        ));
    }
    if task.is_returned() {
        return Err(ApprovalError::InvalidState(
            "Task was returned for changes; resubmit it instead of reverting.".to_string(),
        ));
    }
    if task.hod_status != ReviewStatus::Pending && !caps.is_reviewer() {
        return Err(ApprovalError::Locked(
            "Task has been approved by the HOD and can no longer be reverted.".to_string(),
        ));
    }

    let mut next = task.clone();
    next.status = CompletionStatus::Pending;
    next.completed_at = None;
    // A pending task carries no review decisions.
    next.reset_reviews();

    Ok(Transition {
        task: next,
        action: AuditAction::TaskReverted,
        remarks: String::new(),
    })
}

/// Record a CC or HOD decision.
///
/// Sending the status the task already holds is a remarks-only save: the
/// remarks change but the review date is left alone.
pub fn review(
    task: &CourseFileTask,
    caps: &Capabilities,
    role: ReviewerRole,
    status: ReviewStatus,
    remarks: Option<String>,
    now: DateTime<Utc>,
) -> Result<Transition, ApprovalError> {
    require_role(caps, role)?;
    let current = match role {
        ReviewerRole::Cc => task.cc_status,
        ReviewerRole::Hod => task.hod_status,
    };
    if status == current {
        return match remarks {
            Some(r) => edit_remarks(task, caps, role, r),
            None => Err(ApprovalError::InvalidInput(
                "Review does not change the task.".to_string(),
            )),
        };
    }

    let mut next = task.clone();
    match role {
        ReviewerRole::Cc => {
            if task.status != CompletionStatus::Completed {
                return Err(ApprovalError::InvalidState(
                    "Task must be completed before the CC can review it.".to_string(),
                ));
            }
            // The CC may still decide after an HOD self-review, but not undo a
            // decision the HOD has already built on.
            if task.hod_status != ReviewStatus::Pending && task.cc_status != ReviewStatus::Pending {
                return Err(ApprovalError::InvalidState(
                    "HOD has already reviewed this task; the CC decision can no longer change."
                        .to_string(),
                ));
            }
            next.cc_status = status;
            if let Some(r) = remarks {
                next.cc_remarks = r;
            }
            next.cc_review_date = Some(now);
            Ok(Transition {
                remarks: decision_note(status, &next.cc_remarks),
                task: next,
                action: AuditAction::CcReviewed,
            })
        }
        ReviewerRole::Hod => {
            if task.status != CompletionStatus::Completed {
                return Err(ApprovalError::InvalidState(
                    "Task must be completed before the HOD can review it.".to_string(),
                ));
            }
            if status != ReviewStatus::Pending
                && task.cc_status != ReviewStatus::Yes
                && !caps.self_review_override()
            {
                return Err(ApprovalError::InvalidState(
                    "The CC must approve this task before the HOD can review it.".to_string(),
                ));
            }
            next.hod_status = status;
            if let Some(r) = remarks {
                next.hod_remarks = r;
            }
            next.hod_review_date = Some(now);
            Ok(Transition {
                remarks: decision_note(status, &next.hod_remarks),
                task: next,
                action: AuditAction::HodReviewed,
            })
        }
    }
}

/// Change reviewer commentary without touching any decision or review date.
pub fn edit_remarks(
    task: &CourseFileTask,
    caps: &Capabilities,
    role: ReviewerRole,
    remarks: String,
) -> Result<Transition, ApprovalError> {
    require_role(caps, role)?;
    let mut next = task.clone();
    let action = match role {
        ReviewerRole::Cc => {
            next.cc_remarks = remarks.clone();
            AuditAction::CcRemarksUpdated
        }
        ReviewerRole::Hod => {
            next.hod_remarks = remarks.clone();
            AuditAction::HodRemarksUpdated
        }
    };
    Ok(Transition {
        task: next,
        action,
        remarks,
    })
}

pub fn set_deadline(
    task: &CourseFileTask,
    caps: &Capabilities,
    deadline: Option<NaiveDate>,
) -> Result<Transition, ApprovalError> {
    if !caps.is_reviewer() {
        return Err(ApprovalError::Forbidden(
            "Only the CC or HOD can change deadlines.".to_string(),
        ));
    }
    let mut next = task.clone();
    next.deadline = deadline;
    Ok(Transition {
        task: next,
        action: AuditAction::DeadlineUpdated,
        remarks: deadline
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "cleared".to_string()),
    })
}

/// Parse a deadline given as `YYYY-MM-DD` or a full RFC 3339 timestamp.
/// Blank or missing input clears the deadline.
pub fn parse_deadline(raw: Option<&str>) -> Result<Option<NaiveDate>, ApprovalError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(r) => r,
    };
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.date_naive()));
    }
    Err(ApprovalError::InvalidInput(format!(
        "Deadline '{}' is not a calendar date (expected YYYY-MM-DD).",
        raw
    )))
}

fn require_role(caps: &Capabilities, role: ReviewerRole) -> Result<(), ApprovalError> {
    caps.reviewer_role(Some(role)).map(|_| ())
}

fn decision_note(status: ReviewStatus, remarks: &str) -> String {
    if remarks.is_empty() {
        status.as_str().to_string()
    } else {
        format!("{}: {}", status.as_str(), remarks)
    }
}
