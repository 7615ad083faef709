use std::collections::BTreeSet;

use super::model::{Assignment, CreateAssignmentPayload};
use crate::access::Capabilities;
use crate::errors::ApprovalError;
use crate::store::ApprovalStore;
use crate::tasks::{transition, CourseFileTask};
use crate::users::{self, User};

/// One transaction holds the assignment plus its tasks.
const MAX_TEMPLATES: usize = 99;

/// Caller, assignment and what the caller may do with it.
pub struct Scope {
    pub actor: User,
    pub assignment: Assignment,
    pub caps: Capabilities,
}

pub async fn load_scope(
    store: &dyn ApprovalStore,
    actor_id: &str,
    assignment_id: &str,
) -> Result<Scope, ApprovalError> {
    let actor = users::load_actor(store, actor_id).await?;
    let assignment = store.get_assignment(assignment_id).await?.ok_or_else(|| {
        ApprovalError::NotFound(format!("Assignment {} not found", assignment_id))
    })?;
    let caps = Capabilities::resolve(&actor, &assignment);
    Ok(Scope {
        actor,
        assignment,
        caps,
    })
}

/// HOD creates an assignment with one pending task per checklist template.
pub async fn create_assignment(
    store: &dyn ApprovalStore,
    actor_id: &str,
    payload: CreateAssignmentPayload,
) -> Result<(Assignment, Vec<CourseFileTask>), ApprovalError> {
    let actor = users::load_actor(store, actor_id).await?;
    if actor.role != users::Role::Hod {
        return Err(ApprovalError::Forbidden(
            "Only the HOD can create assignments.".to_string(),
        ));
    }

    for (field, value) in [
        ("faculty_id", &payload.faculty_id),
        ("subject_id", &payload.subject_id),
        ("class_id", &payload.class_id),
    ] {
        if value.trim().is_empty() {
            return Err(ApprovalError::InvalidInput(format!("{} is required", field)));
        }
    }

    let templates: BTreeSet<&str> = payload
        .template_ids
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if templates.is_empty() {
        return Err(ApprovalError::InvalidInput(
            "At least one checklist template is required".to_string(),
        ));
    }
    if templates.len() > MAX_TEMPLATES {
        return Err(ApprovalError::InvalidInput(format!(
            "An assignment can have at most {} checklist items",
            MAX_TEMPLATES
        )));
    }
    let deadline = transition::parse_deadline(payload.deadline.as_deref())?;

    let faculty = store.get_user(&payload.faculty_id).await?.ok_or_else(|| {
        ApprovalError::NotFound(format!("Faculty {} not found", payload.faculty_id))
    })?;
    if faculty.department_id != actor.department_id {
        return Err(ApprovalError::Forbidden(
            "Faculty belongs to another department.".to_string(),
        ));
    }

    let now = chrono::Utc::now();
    let assignment = Assignment {
        assignment_id: uuid::Uuid::new_v4().to_string(),
        faculty_id: faculty.user_id,
        subject_id: payload.subject_id.trim().to_string(),
        class_id: payload.class_id.trim().to_string(),
        department_id: actor.department_id,
        created_at: now,
    };
    let tasks: Vec<CourseFileTask> = templates
        .into_iter()
        .map(|t| CourseFileTask::new(&assignment.assignment_id, t, deadline, now))
        .collect();

    store.create_assignment(&assignment, &tasks).await?;
    tracing::info!(
        "Assignment {} created with {} tasks for faculty {}",
        assignment.assignment_id,
        tasks.len(),
        assignment.faculty_id
    );
    Ok((assignment, tasks))
}

pub async fn get_assignment(
    store: &dyn ApprovalStore,
    actor_id: &str,
    assignment_id: &str,
) -> Result<Assignment, ApprovalError> {
    let scope = load_scope(store, actor_id, assignment_id).await?;
    scope.caps.require_view()?;
    Ok(scope.assignment)
}
