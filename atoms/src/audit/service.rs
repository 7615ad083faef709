use super::model::AuditLogEntry;
use crate::assignments;
use crate::errors::ApprovalError;
use crate::store::ApprovalStore;

/// Audit trail of an assignment, newest entry first.
pub async fn list_audit_log(
    store: &dyn ApprovalStore,
    actor_id: &str,
    assignment_id: &str,
) -> Result<Vec<AuditLogEntry>, ApprovalError> {
    let scope = assignments::load_scope(store, actor_id, assignment_id).await?;
    scope.caps.require_view()?;
    Ok(store.audit_entries(assignment_id).await?)
}

/// Irreversibly delete the trail. HOD of the department only.
pub async fn clear_audit_log(
    store: &dyn ApprovalStore,
    actor_id: &str,
    assignment_id: &str,
) -> Result<usize, ApprovalError> {
    let scope = assignments::load_scope(store, actor_id, assignment_id).await?;
    scope.caps.require_hod("clear the audit log")?;
    let removed = store.clear_audit(assignment_id).await?;
    tracing::warn!(
        "Audit log of assignment {} cleared by {} ({} entries)",
        assignment_id,
        scope.actor.user_id,
        removed
    );
    Ok(removed)
}
