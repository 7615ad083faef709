use super::model::{CreateUserPayload, Role, UpdateUserPayload, User};
use crate::errors::ApprovalError;
use crate::store::ApprovalStore;

/// Profile of the authenticated caller; every operation starts here.
pub async fn load_actor(store: &dyn ApprovalStore, user_id: &str) -> Result<User, ApprovalError> {
    store.get_user(user_id).await?.ok_or_else(|| {
        ApprovalError::NotFound(format!(
            "No profile found for user {}. Complete registration first.",
            user_id
        ))
    })
}

/// Create the caller's profile after signup. Everyone starts as faculty;
/// CC duties are granted later by the HOD.
pub async fn register_user(
    store: &dyn ApprovalStore,
    user_id: &str,
    payload: CreateUserPayload,
) -> Result<User, ApprovalError> {
    if payload.user_name.trim().is_empty() {
        return Err(ApprovalError::InvalidInput("Please provide your name".to_string()));
    }
    if !payload.user_email.contains('@') {
        return Err(ApprovalError::InvalidInput(
            "Please provide a valid email address".to_string(),
        ));
    }
    if payload.department_id.trim().is_empty() {
        return Err(ApprovalError::InvalidInput("Please provide a department".to_string()));
    }
    if store.get_user(user_id).await?.is_some() {
        return Err(ApprovalError::InvalidState(
            "This account is already registered.".to_string(),
        ));
    }

    let user = User {
        user_id: user_id.to_string(),
        user_name: payload.user_name.trim().to_string(),
        user_email: payload.user_email.trim().to_string(),
        department_id: payload.department_id.trim().to_string(),
        role: Role::Faculty,
        coordinated_class_ids: vec![],
        user_created_at: chrono::Utc::now(),
    };
    store.put_user(&user).await?;
    tracing::info!("Registered user {} in department {}", user.user_id, user.department_id);
    Ok(user)
}

/// HOD-only edit of a colleague's role or coordinated classes.
pub async fn update_user(
    store: &dyn ApprovalStore,
    actor_id: &str,
    target_id: &str,
    payload: UpdateUserPayload,
) -> Result<User, ApprovalError> {
    let actor = load_actor(store, actor_id).await?;
    let mut target = store
        .get_user(target_id)
        .await?
        .ok_or_else(|| ApprovalError::NotFound(format!("User {} not found", target_id)))?;

    if actor.role != Role::Hod || actor.department_id != target.department_id {
        return Err(ApprovalError::Forbidden(
            "Only the HOD of this department can change user roles.".to_string(),
        ));
    }

    if let Some(role) = payload.role {
        if role == Role::Hod {
            return Err(ApprovalError::InvalidInput(
                "The HOD role cannot be granted through this endpoint.".to_string(),
            ));
        }
        if target.role == Role::Hod {
            return Err(ApprovalError::InvalidInput(
                "An HOD's role cannot be changed through this endpoint.".to_string(),
            ));
        }
        target.role = role;
    }
    let sets_classes = payload
        .coordinated_class_ids
        .as_ref()
        .is_some_and(|c| c.iter().any(|id| !id.trim().is_empty()));
    if let Some(classes) = payload.coordinated_class_ids {
        let mut classes: Vec<String> = classes
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        classes.sort();
        classes.dedup();
        target.coordinated_class_ids = classes;
    }
    // Faculty coordinate nothing; demotion drops their classes.
    if target.role == Role::Faculty && !target.coordinated_class_ids.is_empty() {
        if sets_classes {
            return Err(ApprovalError::InvalidInput(
                "Only a CC can coordinate classes; grant the CC role as well.".to_string(),
            ));
        }
        target.coordinated_class_ids.clear();
    }
    if let Some(name) = payload.user_name {
        if name.trim().is_empty() {
            return Err(ApprovalError::InvalidInput("Name cannot be empty".to_string()));
        }
        target.user_name = name.trim().to_string();
    }

    store.put_user(&target).await?;
    tracing::info!("User {} updated by HOD {}", target.user_id, actor.user_id);
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Utc;

    fn user(id: &str, role: Role, dept: &str, classes: &[&str]) -> User {
        User {
            user_id: id.to_string(),
            user_name: id.to_string(),
            user_email: format!("{}@college.edu", id),
            department_id: dept.to_string(),
            role,
            coordinated_class_ids: classes.iter().map(|c| c.to_string()).collect(),
            user_created_at: Utc::now(),
        }
    }

    fn classes(role: Option<Role>, ids: Option<&[&str]>) -> UpdateUserPayload {
        UpdateUserPayload {
            user_name: None,
            role,
            coordinated_class_ids: ids.map(|ids| ids.iter().map(|c| c.to_string()).collect()),
        }
    }

    async fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.put_user(&user("hod", Role::Hod, "cse", &[])).await.unwrap();
        store.put_user(&user("hod-ece", Role::Hod, "ece", &[])).await.unwrap();
        store.put_user(&user("fac", Role::Faculty, "cse", &[])).await.unwrap();
        store.put_user(&user("cc", Role::Cc, "cse", &["cse-3a"])).await.unwrap();
        store
    }

    #[tokio::test]
    async fn classes_need_the_cc_role() {
        let store = store().await;
        let err = update_user(&store, "hod", "fac", classes(None, Some(&["cse-3a"])))
            .await
            .unwrap_err();
        assert!(matches!(err, ApprovalError::InvalidInput(_)));
        assert!(store.get_user("fac").await.unwrap().unwrap().coordinated_class_ids.is_empty());

        let granted = update_user(&store, "hod", "fac", classes(Some(Role::Cc), Some(&["cse-3a"])))
            .await
            .unwrap();
        assert_eq!(granted.role, Role::Cc);
        assert_eq!(granted.coordinated_class_ids, vec!["cse-3a".to_string()]);
    }

    #[tokio::test]
    async fn demotion_to_faculty_drops_classes() {
        let store = store().await;
        let demoted = update_user(&store, "hod", "cc", classes(Some(Role::Faculty), None))
            .await
            .unwrap();
        assert_eq!(demoted.role, Role::Faculty);
        assert!(demoted.coordinated_class_ids.is_empty());
    }

    #[tokio::test]
    async fn other_department_hod_cannot_edit() {
        let store = store().await;
        let err = update_user(&store, "hod-ece", "cc", classes(None, Some(&["ece-2b"])))
            .await
            .unwrap_err();
        assert!(matches!(err, ApprovalError::Forbidden(_)));
    }
}
