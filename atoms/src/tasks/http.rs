use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::de::DeserializeOwned;

use super::model::{CourseFileTask, TaskView};
use super::service;
use crate::errors::ApprovalError;
use crate::responses;
use crate::store::ApprovalStore;

fn view(result: Result<CourseFileTask, ApprovalError>) -> Result<Response<Body>, Error> {
    responses::respond(StatusCode::OK, result.map(TaskView::from))
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApprovalError> {
    Ok(serde_json::from_slice(body)?)
}

/// GET /assignments/{id}/tasks - tasks with their effective status
pub async fn list_assignment_tasks_handler(
    store: &dyn ApprovalStore,
    actor_id: &str,
    assignment_id: &str,
) -> Result<Response<Body>, Error> {
    let result = service::get_tasks_for_assignment(store, actor_id, assignment_id)
        .await
        .map(|tasks| tasks.into_iter().map(TaskView::from).collect::<Vec<_>>());
    responses::respond(StatusCode::OK, result)
}

/// GET /tasks/{id}
pub async fn get_task_handler(
    store: &dyn ApprovalStore,
    actor_id: &str,
    task_id: &str,
) -> Result<Response<Body>, Error> {
    view(service::get_task(store, actor_id, task_id).await)
}

/// POST /tasks/{id}/complete
pub async fn complete_task_handler(
    store: &dyn ApprovalStore,
    actor_id: &str,
    task_id: &str,
) -> Result<Response<Body>, Error> {
    view(service::complete_task(store, actor_id, task_id).await)
}

/// POST /tasks/{id}/revert
pub async fn revert_task_handler(
    store: &dyn ApprovalStore,
    actor_id: &str,
    task_id: &str,
) -> Result<Response<Body>, Error> {
    view(service::revert_task(store, actor_id, task_id).await)
}

/// POST /tasks/{id}/review - body `{"status": "YES|NO|PENDING", "remarks": "..."}`
pub async fn review_task_handler(
    store: &dyn ApprovalStore,
    actor_id: &str,
    task_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    match parse(body) {
        Ok(payload) => view(service::review_task(store, actor_id, task_id, payload).await),
        Err(e) => responses::error(&e),
    }
}

/// PATCH /tasks/{id}/remarks
pub async fn update_task_remarks_handler(
    store: &dyn ApprovalStore,
    actor_id: &str,
    task_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    match parse(body) {
        Ok(payload) => view(service::update_task_remarks(store, actor_id, task_id, payload).await),
        Err(e) => responses::error(&e),
    }
}

/// PATCH /tasks/{id}/deadline - body `{"deadline": "YYYY-MM-DD" | null}`
pub async fn update_task_deadline_handler(
    store: &dyn ApprovalStore,
    actor_id: &str,
    task_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    match parse(body) {
        Ok(payload) => view(service::update_task_deadline(store, actor_id, task_id, payload).await),
        Err(e) => responses::error(&e),
    }
}
