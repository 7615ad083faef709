use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::access::ReviewerRole;

/// Faculty side of a task.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompletionStatus {
    Pending,
    Completed,
}

/// Decision slot held by a CC or an HOD.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewStatus {
    Pending,
    Yes,
    No,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectiveStatus {
    PendingCompletion,
    Returned,
    AwaitingCc,
    AwaitingHod,
    FullyApproved,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Pending => "PENDING",
            CompletionStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "PENDING" => Some(CompletionStatus::Pending),
            "COMPLETED" => Some(CompletionStatus::Completed),
            _ => None,
        }
    }
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "PENDING",
            ReviewStatus::Yes => "YES",
            ReviewStatus::No => "NO",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "PENDING" => Some(ReviewStatus::Pending),
            "YES" => Some(ReviewStatus::Yes),
            "NO" => Some(ReviewStatus::No),
            _ => None,
        }
    }
}

/// One checklist item for one assignment.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CourseFileTask {
    pub task_id: String,
    pub assignment_id: String,
    pub template_id: String,

    pub status: CompletionStatus,
    pub completed_at: Option<DateTime<Utc>>,

    pub cc_status: ReviewStatus,
    // FE expects plain strings (empty string = no remarks)
    pub cc_remarks: String,
    pub cc_review_date: Option<DateTime<Utc>>,

    pub hod_status: ReviewStatus,
    pub hod_remarks: String,
    pub hod_review_date: Option<DateTime<Utc>>,

    pub deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,

    /// Bumped on every committed mutation; writes are conditional on it.
    #[serde(default)]
    pub version: u64,
}

impl CourseFileTask {
    pub fn new(
        assignment_id: &str,
        template_id: &str,
        deadline: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id: uuid::Uuid::new_v4().to_string(),
            assignment_id: assignment_id.to_string(),
            template_id: template_id.to_string(),
            status: CompletionStatus::Pending,
            completed_at: None,
            cc_status: ReviewStatus::Pending,
            cc_remarks: String::new(),
            cc_review_date: None,
            hod_status: ReviewStatus::Pending,
            hod_remarks: String::new(),
            hod_review_date: None,
            deadline,
            created_at: now,
            version: 0,
        }
    }

    /// Rejected by either reviewer and waiting for the faculty to resubmit.
    pub fn is_returned(&self) -> bool {
        self.cc_status == ReviewStatus::No || self.hod_status == ReviewStatus::No
    }

    pub fn effective_status(&self) -> EffectiveStatus {
        if self.status != CompletionStatus::Completed {
            return EffectiveStatus::PendingCompletion;
        }
        if self.is_returned() {
            return EffectiveStatus::Returned;
        }
        match (self.cc_status, self.hod_status) {
            (ReviewStatus::Yes, ReviewStatus::Yes) => EffectiveStatus::FullyApproved,
            (ReviewStatus::Yes, _) => EffectiveStatus::AwaitingHod,
            _ => EffectiveStatus::AwaitingCc,
        }
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(self.deadline, Some(d) if d < today)
            && self.effective_status() != EffectiveStatus::FullyApproved
    }

    /// Drop both review decisions with their remarks and dates.
    pub(crate) fn reset_reviews(&mut self) {
        self.cc_status = ReviewStatus::Pending;
        self.cc_remarks.clear();
        self.cc_review_date = None;
        self.hod_status = ReviewStatus::Pending;
        self.hod_remarks.clear();
        self.hod_review_date = None;
    }
}

/// Wire shape of a task: the stored record plus its derived status.
#[derive(Debug, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: CourseFileTask,
    pub effective_status: EffectiveStatus,
}

impl From<CourseFileTask> for TaskView {
    fn from(task: CourseFileTask) -> Self {
        let effective_status = task.effective_status();
        Self {
            task,
            effective_status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReviewTaskPayload {
    pub status: ReviewStatus,
    /// `None` keeps the remarks already on the task.
    pub remarks: Option<String>,
    /// Which hat to review under; resolved from the caller when absent.
    pub reviewer: Option<ReviewerRole>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRemarksPayload {
    pub remarks: String,
    pub reviewer: Option<ReviewerRole>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDeadlinePayload {
    pub deadline: Option<String>,
}
