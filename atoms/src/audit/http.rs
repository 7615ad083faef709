use lambda_http::{http::StatusCode, Body, Error, Response};

use super::service;
use crate::responses;
use crate::store::ApprovalStore;

/// GET /assignments/{id}/audit - entries ordered newest first
pub async fn list_audit_log_handler(
    store: &dyn ApprovalStore,
    actor_id: &str,
    assignment_id: &str,
) -> Result<Response<Body>, Error> {
    responses::respond(
        StatusCode::OK,
        service::list_audit_log(store, actor_id, assignment_id).await,
    )
}

/// DELETE /assignments/{id}/audit
pub async fn clear_audit_log_handler(
    store: &dyn ApprovalStore,
    actor_id: &str,
    assignment_id: &str,
) -> Result<Response<Body>, Error> {
    match service::clear_audit_log(store, actor_id, assignment_id).await {
        Ok(_) => responses::no_content(),
        Err(e) => responses::error(&e),
    }
}
