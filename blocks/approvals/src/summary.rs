use coursefile_atoms::assignments;
use coursefile_atoms::responses;
use coursefile_atoms::tasks::EffectiveStatus;
use coursefile_atoms::{ApprovalError, ApprovalStore};
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Serialize;

/// Progress of an assignment for dashboards; derived on every read.
#[derive(Debug, Serialize, Default, PartialEq, Eq)]
pub struct AssignmentSummary {
    pub assignment_id: String,
    pub total: usize,
    pub pending_completion: usize,
    pub returned: usize,
    pub awaiting_cc: usize,
    pub awaiting_hod: usize,
    pub fully_approved: usize,
    /// Past deadline and not fully approved.
    pub overdue: usize,
}

pub async fn assignment_summary(
    store: &dyn ApprovalStore,
    actor_id: &str,
    assignment_id: &str,
) -> Result<AssignmentSummary, ApprovalError> {
    let scope = assignments::load_scope(store, actor_id, assignment_id).await?;
    scope.caps.require_view()?;

    let today = chrono::Utc::now().date_naive();
    let mut summary = AssignmentSummary {
        assignment_id: assignment_id.to_string(),
        ..Default::default()
    };
    for task in store.tasks_for_assignment(assignment_id).await? {
        summary.total += 1;
        match task.effective_status() {
            EffectiveStatus::PendingCompletion => summary.pending_completion += 1,
            EffectiveStatus::Returned => summary.returned += 1,
            EffectiveStatus::AwaitingCc => summary.awaiting_cc += 1,
            EffectiveStatus::AwaitingHod => summary.awaiting_hod += 1,
            EffectiveStatus::FullyApproved => summary.fully_approved += 1,
        }
        if task.is_overdue(today) {
            summary.overdue += 1;
        }
    }
    Ok(summary)
}

/// GET /assignments/{id}/summary
pub async fn assignment_summary_handler(
    store: &dyn ApprovalStore,
    actor_id: &str,
    assignment_id: &str,
) -> Result<Response<Body>, Error> {
    responses::respond(
        StatusCode::OK,
        assignment_summary(store, actor_id, assignment_id).await,
    )
}
