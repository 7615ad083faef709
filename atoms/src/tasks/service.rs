use chrono::Utc;

use super::model::{CourseFileTask, ReviewTaskPayload, UpdateDeadlinePayload, UpdateRemarksPayload};
use super::transition::{self, Transition};
use crate::access::Capabilities;
use crate::assignments::{self, Scope};
use crate::audit::AuditLogEntry;
use crate::errors::ApprovalError;
use crate::store::ApprovalStore;
use crate::users::User;

/// A task together with the scope it is acted on in.
struct TaskContext {
    scope: Scope,
    task: CourseFileTask,
}

async fn load_context(
    store: &dyn ApprovalStore,
    actor_id: &str,
    task_id: &str,
) -> Result<TaskContext, ApprovalError> {
    let task = store
        .get_task(task_id)
        .await?
        .ok_or_else(|| ApprovalError::NotFound(format!("Task {} not found", task_id)))?;
    let scope = assignments::load_scope(store, actor_id, &task.assignment_id).await?;
    Ok(TaskContext { scope, task })
}

/// Persist an accepted transition with its audit entry, conditional on the
/// task not having changed since it was read.
pub async fn commit(
    store: &dyn ApprovalStore,
    actor: &User,
    before: &CourseFileTask,
    transition: Transition,
) -> Result<CourseFileTask, ApprovalError> {
    let entry = AuditLogEntry::new(
        &before.assignment_id,
        Some(&before.task_id),
        transition.action,
        actor,
        transition.remarks,
        Utc::now(),
    );
    let stored = store
        .commit_task(&transition.task, before.version, &entry)
        .await?;
    tracing::info!(
        "Task {} {} by {} -> {:?}",
        stored.task_id,
        entry.action.as_str(),
        actor.user_id,
        stored.effective_status()
    );
    Ok(stored)
}

async fn run<F>(
    store: &dyn ApprovalStore,
    actor_id: &str,
    task_id: &str,
    apply: F,
) -> Result<CourseFileTask, ApprovalError>
where
    F: FnOnce(&CourseFileTask, &Capabilities) -> Result<Transition, ApprovalError>,
{
    let ctx = load_context(store, actor_id, task_id).await?;
    let transition = apply(&ctx.task, &ctx.scope.caps)?;
    commit(store, &ctx.scope.actor, &ctx.task, transition).await
}

pub async fn get_tasks_for_assignment(
    store: &dyn ApprovalStore,
    actor_id: &str,
    assignment_id: &str,
) -> Result<Vec<CourseFileTask>, ApprovalError> {
    let scope = assignments::load_scope(store, actor_id, assignment_id).await?;
    scope.caps.require_view()?;
    Ok(store.tasks_for_assignment(assignment_id).await?)
}

pub async fn get_task(
    store: &dyn ApprovalStore,
    actor_id: &str,
    task_id: &str,
) -> Result<CourseFileTask, ApprovalError> {
    let ctx = load_context(store, actor_id, task_id).await?;
    ctx.scope.caps.require_view()?;
    Ok(ctx.task)
}

/// Faculty marks a task complete (or resubmits a returned one).
pub async fn complete_task(
    store: &dyn ApprovalStore,
    actor_id: &str,
    task_id: &str,
) -> Result<CourseFileTask, ApprovalError> {
    let now = Utc::now();
    run(store, actor_id, task_id, |task, caps| {
        transition::complete(task, caps, now)
    })
    .await
}

pub async fn revert_task(
    store: &dyn ApprovalStore,
    actor_id: &str,
    task_id: &str,
) -> Result<CourseFileTask, ApprovalError> {
    run(store, actor_id, task_id, transition::revert).await
}

/// CC or HOD decision; the hat is taken from the payload or the caller.
pub async fn review_task(
    store: &dyn ApprovalStore,
    actor_id: &str,
    task_id: &str,
    payload: ReviewTaskPayload,
) -> Result<CourseFileTask, ApprovalError> {
    let now = Utc::now();
    run(store, actor_id, task_id, |task, caps| {
        let role = caps.reviewer_role(payload.reviewer)?;
        transition::review(task, caps, role, payload.status, payload.remarks, now)
    })
    .await
}

pub async fn update_task_remarks(
    store: &dyn ApprovalStore,
    actor_id: &str,
    task_id: &str,
    payload: UpdateRemarksPayload,
) -> Result<CourseFileTask, ApprovalError> {
    run(store, actor_id, task_id, |task, caps| {
        let role = caps.reviewer_role(payload.reviewer)?;
        transition::edit_remarks(task, caps, role, payload.remarks)
    })
    .await
}

pub async fn update_task_deadline(
    store: &dyn ApprovalStore,
    actor_id: &str,
    task_id: &str,
    payload: UpdateDeadlinePayload,
) -> Result<CourseFileTask, ApprovalError> {
    // Reject malformed dates before touching the store.
    let deadline = transition::parse_deadline(payload.deadline.as_deref())?;
    run(store, actor_id, task_id, |task, caps| {
        transition::set_deadline(task, caps, deadline)
    })
    .await
}
