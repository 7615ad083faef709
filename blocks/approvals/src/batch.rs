use coursefile_atoms::access::ReviewerRole;
use coursefile_atoms::assignments;
use coursefile_atoms::responses;
use coursefile_atoms::tasks::{self, transition, CompletionStatus, CourseFileTask, ReviewStatus};
use coursefile_atoms::{ApprovalError, ApprovalStore};
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct BatchReviewPayload {
    pub status: ReviewStatus,
    pub remarks: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchFailure {
    pub task_id: String,
    pub message: String,
}

/// `count` is the number of tasks actually changed; anything that went wrong
/// on the way is listed in `failures` rather than aborting the rest.
#[derive(Debug, Serialize, Default)]
pub struct BatchOutcome {
    pub count: usize,
    pub failures: Vec<BatchFailure>,
}

fn eligible(task: &CourseFileTask) -> bool {
    task.status == CompletionStatus::Completed
        && task.cc_status == ReviewStatus::Yes
        && task.hod_status == ReviewStatus::Pending
}

/// HOD decision applied to every CC-verified task still awaiting the HOD.
///
/// Tasks are committed one by one, each with its own audit entry. Nothing
/// eligible is a successful no-op.
pub async fn batch_review(
    store: &dyn ApprovalStore,
    actor_id: &str,
    assignment_id: &str,
    payload: BatchReviewPayload,
) -> Result<BatchOutcome, ApprovalError> {
    if payload.status == ReviewStatus::Pending {
        return Err(ApprovalError::InvalidInput(
            "Batch review needs a YES or NO decision".to_string(),
        ));
    }

    let scope = assignments::load_scope(store, actor_id, assignment_id).await?;
    scope.caps.require_hod("batch review tasks")?;

    let mut outcome = BatchOutcome::default();
    for task in store.tasks_for_assignment(assignment_id).await? {
        if !eligible(&task) {
            continue;
        }
        let applied = match transition::review(
            &task,
            &scope.caps,
            ReviewerRole::Hod,
            payload.status,
            payload.remarks.clone(),
            chrono::Utc::now(),
        ) {
            Ok(t) => tasks::commit(store, &scope.actor, &task, t).await,
            Err(e) => Err(e),
        };

        match applied {
            Ok(_) => outcome.count += 1,
            Err(e) => {
                tracing::warn!("Batch review skipped task {}: {}", task.task_id, e);
                outcome.failures.push(BatchFailure {
                    task_id: task.task_id.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        "Batch review on assignment {} by {}: {} applied, {} failed",
        assignment_id,
        scope.actor.user_id,
        outcome.count,
        outcome.failures.len()
    );
    Ok(outcome)
}

/// POST /assignments/{id}/tasks/review
pub async fn batch_review_handler(
    store: &dyn ApprovalStore,
    actor_id: &str,
    assignment_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: BatchReviewPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => return responses::error(&e.into()),
    };
    match batch_review(store, actor_id, assignment_id, payload).await {
        Ok(outcome) if outcome.failures.is_empty() => responses::json(StatusCode::OK, &outcome),
        Ok(outcome) => responses::json(StatusCode::MULTI_STATUS, &outcome),
        Err(e) => responses::error(&e),
    }
}
