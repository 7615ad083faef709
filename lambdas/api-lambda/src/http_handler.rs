use approvals_block::{batch, summary};
use coursefile_atoms as atoms;
use coursefile_shared::{auth, AppState};
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, Response,
};
use std::sync::Arc;

use lambda_http::http::header::{HeaderValue, VARY};

fn with_cors_headers(
    mut resp: Response<Body>,
    state: &AppState,
    request_origin: Option<&str>,
) -> Response<Body> {
    let cors_origin = state.config.cors_origin(request_origin);

    let headers = resp.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_str(&cors_origin).unwrap_or_else(|_| HeaderValue::from_static("*")),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PATCH,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,Authorization,X-User-Id,Cookie"),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));

    resp
}

fn finalize_response(
    resp: Result<Response<Body>, Error>,
    state: &AppState,
    request_origin: Option<&str>,
) -> Result<Response<Body>, Error> {
    resp.map(|r| with_cors_headers(r, state, request_origin))
}

/// Main Lambda handler - authenticates the caller, then routes
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let request_origin = event.headers().get("Origin").and_then(|v| v.to_str().ok());
    tracing::info!("API Lambda invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if method == Method::OPTIONS {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp, &state, request_origin));
    }

    let user_id = match auth::authenticate(&state, event.headers()).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Unauthenticated request to {}: {}", path, e);
            let resp = atoms::responses::json(
                StatusCode::UNAUTHORIZED,
                &serde_json::json!({"error": "Unauthorized", "message": e.to_string()}),
            );
            return finalize_response(resp, &state, request_origin);
        }
    };

    finalize_response(route(&state, &event, &user_id).await, &state, request_origin)
}

/// Dispatch an authenticated request.
pub(crate) async fn route(
    state: &AppState,
    event: &Request,
    user_id: &str,
) -> Result<Response<Body>, Error> {
    let store = state.store.as_ref();
    let method = event.method();
    let path = event.uri().path();
    let body: &[u8] = event.body();
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (method, parts.as_slice()) {
        // --- USERS ---
        // POST /users - register own profile
        (&Method::POST, ["users"]) => atoms::users::create_user_handler(store, user_id, body).await,
        // GET /users/me
        (&Method::GET, ["users", "me"]) => atoms::users::get_user_handler(store, user_id).await,
        // PATCH /users/{id} - HOD changes role or coordinated classes
        (&Method::PATCH, ["users", target_id]) => {
            atoms::users::update_user_handler(store, user_id, target_id, body).await
        }

        // --- ASSIGNMENTS ---
        // POST /assignments - create assignment from checklist templates
        (&Method::POST, ["assignments"]) => {
            atoms::assignments::create_assignment_handler(store, user_id, body).await
        }
        // GET /assignments/{id}
        (&Method::GET, ["assignments", assignment_id]) => {
            atoms::assignments::get_assignment_handler(store, user_id, assignment_id).await
        }
        // GET /assignments/{id}/tasks
        (&Method::GET, ["assignments", assignment_id, "tasks"]) => {
            atoms::tasks::list_assignment_tasks_handler(store, user_id, assignment_id).await
        }
        // GET /assignments/{id}/summary - progress counts
        (&Method::GET, ["assignments", assignment_id, "summary"]) => {
            summary::assignment_summary_handler(store, user_id, assignment_id).await
        }
        // POST /assignments/{id}/tasks/review - HOD batch decision
        (&Method::POST, ["assignments", assignment_id, "tasks", "review"]) => {
            batch::batch_review_handler(store, user_id, assignment_id, body).await
        }
        // GET /assignments/{id}/audit - newest first
        (&Method::GET, ["assignments", assignment_id, "audit"]) => {
            atoms::audit::list_audit_log_handler(store, user_id, assignment_id).await
        }
        // DELETE /assignments/{id}/audit
        (&Method::DELETE, ["assignments", assignment_id, "audit"]) => {
            atoms::audit::clear_audit_log_handler(store, user_id, assignment_id).await
        }

        // --- TASKS ---
        // GET /tasks/{id}
        (&Method::GET, ["tasks", task_id]) => {
            atoms::tasks::get_task_handler(store, user_id, task_id).await
        }
        // POST /tasks/{id}/complete
        (&Method::POST, ["tasks", task_id, "complete"]) => {
            atoms::tasks::complete_task_handler(store, user_id, task_id).await
        }
        // POST /tasks/{id}/revert
        (&Method::POST, ["tasks", task_id, "revert"]) => {
            atoms::tasks::revert_task_handler(store, user_id, task_id).await
        }
        // POST /tasks/{id}/review
        (&Method::POST, ["tasks", task_id, "review"]) => {
            atoms::tasks::review_task_handler(store, user_id, task_id, body).await
        }
        // PATCH /tasks/{id}/remarks
        (&Method::PATCH, ["tasks", task_id, "remarks"]) => {
            atoms::tasks::update_task_remarks_handler(store, user_id, task_id, body).await
        }
        // PATCH /tasks/{id}/deadline
        (&Method::PATCH, ["tasks", task_id, "deadline"]) => {
            atoms::tasks::update_task_deadline_handler(store, user_id, task_id, body).await
        }

        _ => {
            tracing::warn!("No route matched - Method: {} Path: {}", method, path);
            not_found()
        }
    }
}

fn not_found() -> Result<Response<Body>, Error> {
    atoms::responses::json(
        StatusCode::NOT_FOUND,
        &serde_json::json!({"error": "NotFound", "message": "Not found"}),
    )
}
