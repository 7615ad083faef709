use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::{AssignmentDetail, CreateAssignmentPayload};
use super::service;
use crate::responses;
use crate::store::ApprovalStore;

/// POST /assignments - create assignment and its checklist tasks
pub async fn create_assignment_handler(
    store: &dyn ApprovalStore,
    actor_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: CreateAssignmentPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => return responses::error(&e.into()),
    };
    let result = service::create_assignment(store, actor_id, payload)
        .await
        .map(|(assignment, tasks)| AssignmentDetail {
            assignment,
            tasks: tasks.into_iter().map(Into::into).collect(),
        });
    responses::respond(StatusCode::CREATED, result)
}

/// GET /assignments/{id}
pub async fn get_assignment_handler(
    store: &dyn ApprovalStore,
    actor_id: &str,
    assignment_id: &str,
) -> Result<Response<Body>, Error> {
    responses::respond(
        StatusCode::OK,
        service::get_assignment(store, actor_id, assignment_id).await,
    )
}
