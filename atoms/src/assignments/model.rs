use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tasks::model::TaskView;

/// One faculty member teaching one subject to one class.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Assignment {
    pub assignment_id: String,
    pub faculty_id: String,
    pub subject_id: String,
    pub class_id: String,
    pub department_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAssignmentPayload {
    pub faculty_id: String,
    pub subject_id: String,
    pub class_id: String,
    /// Checklist item definitions to instantiate, one task each.
    pub template_ids: Vec<String>,
    /// Optional `YYYY-MM-DD` deadline applied to every created task.
    pub deadline: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AssignmentDetail {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub tasks: Vec<TaskView>,
}
