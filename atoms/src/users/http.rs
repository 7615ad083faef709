use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::{CreateUserPayload, UpdateUserPayload};
use super::service;
use crate::responses;
use crate::store::ApprovalStore;

/// POST /users - register the caller's profile
pub async fn create_user_handler(
    store: &dyn ApprovalStore,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: CreateUserPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => return responses::error(&e.into()),
    };
    responses::respond(
        StatusCode::CREATED,
        service::register_user(store, user_id, payload).await,
    )
}

/// GET /users/me
pub async fn get_user_handler(
    store: &dyn ApprovalStore,
    user_id: &str,
) -> Result<Response<Body>, Error> {
    responses::respond(StatusCode::OK, service::load_actor(store, user_id).await)
}

/// PATCH /users/{id}
pub async fn update_user_handler(
    store: &dyn ApprovalStore,
    actor_id: &str,
    target_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: UpdateUserPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => return responses::error(&e.into()),
    };
    responses::respond(
        StatusCode::OK,
        service::update_user(store, actor_id, target_id, payload).await,
    )
}
