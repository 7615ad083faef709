use std::sync::Arc;

use chrono::Utc;
use coursefile_atoms::access::ReviewerRole;
use coursefile_atoms::assignments::{self, CreateAssignmentPayload};
use coursefile_atoms::audit::{self, AuditAction};
use coursefile_atoms::tasks::{
    self, CompletionStatus, EffectiveStatus, ReviewStatus, ReviewTaskPayload,
    UpdateDeadlinePayload, UpdateRemarksPayload,
};
use coursefile_atoms::users::{Role, User};
use coursefile_atoms::{ApprovalError, ApprovalStore, MemoryStore};

const FACULTY: &str = "fac-1";
const CC: &str = "cc-1";
const HOD: &str = "hod-1";

fn user(id: &str, name: &str, role: Role, classes: &[&str]) -> User {
    User {
        user_id: id.to_string(),
        user_name: name.to_string(),
        user_email: format!("{}@college.edu", id),
        department_id: "cse".to_string(),
        role,
        coordinated_class_ids: classes.iter().map(|c| c.to_string()).collect(),
        user_created_at: Utc::now(),
    }
}

async fn seeded(templates: &[&str]) -> (MemoryStore, String, Vec<String>) {
    let store = MemoryStore::new();
    store.put_user(&user(FACULTY, "Ravi", Role::Faculty, &[])).await.unwrap();
    store.put_user(&user(CC, "Meena", Role::Cc, &["cse-3a"])).await.unwrap();
    store.put_user(&user(HOD, "Dr. Rao", Role::Hod, &[])).await.unwrap();

    let (assignment, tasks) = assignments::create_assignment(
        &store,
        HOD,
        CreateAssignmentPayload {
            faculty_id: FACULTY.to_string(),
            subject_id: "dbms".to_string(),
            class_id: "cse-3a".to_string(),
            template_ids: templates.iter().map(|t| t.to_string()).collect(),
            deadline: None,
        },
    )
    .await
    .unwrap();
    let ids = tasks.into_iter().map(|t| t.task_id).collect();
    (store, assignment.assignment_id, ids)
}

fn review(status: ReviewStatus, remarks: Option<&str>) -> ReviewTaskPayload {
    ReviewTaskPayload {
        status,
        remarks: remarks.map(str::to_string),
        reviewer: None,
    }
}

#[tokio::test]
async fn reject_resubmit_approve_scenario() {
    let (store, assignment_id, ids) = seeded(&["syllabus"]).await;
    let task_id = &ids[0];

    let t = tasks::complete_task(&store, FACULTY, task_id).await.unwrap();
    assert_eq!(
        (t.status, t.cc_status, t.hod_status),
        (CompletionStatus::Completed, ReviewStatus::Pending, ReviewStatus::Pending)
    );

    let t = tasks::review_task(&store, CC, task_id, review(ReviewStatus::No, Some("missing signature")))
        .await
        .unwrap();
    assert_eq!(t.cc_status, ReviewStatus::No);
    assert_eq!(t.cc_remarks, "missing signature");
    assert_eq!(t.effective_status(), EffectiveStatus::Returned);

    let t = tasks::complete_task(&store, FACULTY, task_id).await.unwrap();
    assert_eq!(
        (t.status, t.cc_status, t.hod_status),
        (CompletionStatus::Completed, ReviewStatus::Pending, ReviewStatus::Pending)
    );
    assert!(t.cc_remarks.is_empty());
    assert!(t.cc_review_date.is_none());

    let t = tasks::review_task(&store, CC, task_id, review(ReviewStatus::Yes, None))
        .await
        .unwrap();
    assert_eq!(t.effective_status(), EffectiveStatus::AwaitingHod);

    let t = tasks::review_task(&store, HOD, task_id, review(ReviewStatus::Yes, Some("ok")))
        .await
        .unwrap();
    assert_eq!(t.effective_status(), EffectiveStatus::FullyApproved);

    let log = audit::list_audit_log(&store, HOD, &assignment_id).await.unwrap();
    let actions: Vec<AuditAction> = log.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::HodReviewed,
            AuditAction::CcReviewed,
            AuditAction::TaskResubmitted,
            AuditAction::CcReviewed,
            AuditAction::TaskCompleted,
        ]
    );
    assert_eq!(log[0].created_by, "Dr. Rao");
    assert_eq!(log[4].created_by_id, FACULTY);
}

#[tokio::test]
async fn denied_transition_changes_nothing() {
    let (store, assignment_id, ids) = seeded(&["syllabus"]).await;
    let task_id = &ids[0];
    let before = tasks::get_task(&store, FACULTY, task_id).await.unwrap();

    let err = tasks::review_task(&store, HOD, task_id, review(ReviewStatus::Yes, None))
        .await
        .unwrap_err();
    assert!(matches!(err, ApprovalError::InvalidState(_)));
    let err = tasks::complete_task(&store, CC, task_id).await.unwrap_err();
    assert!(matches!(err, ApprovalError::Forbidden(_)));

    assert_eq!(tasks::get_task(&store, FACULTY, task_id).await.unwrap(), before);
    assert!(audit::list_audit_log(&store, HOD, &assignment_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn faculty_revert_locked_after_final_approval() {
    let (store, _, ids) = seeded(&["syllabus"]).await;
    let task_id = &ids[0];
    tasks::complete_task(&store, FACULTY, task_id).await.unwrap();
    tasks::review_task(&store, CC, task_id, review(ReviewStatus::Yes, None)).await.unwrap();
    tasks::review_task(&store, HOD, task_id, review(ReviewStatus::Yes, None)).await.unwrap();

    let err = tasks::revert_task(&store, FACULTY, task_id).await.unwrap_err();
    assert!(matches!(err, ApprovalError::Locked(_)));

    let t = tasks::revert_task(&store, HOD, task_id).await.unwrap();
    assert_eq!(t.status, CompletionStatus::Pending);
    assert_eq!(t.effective_status(), EffectiveStatus::PendingCompletion);
}

#[tokio::test]
async fn remarks_only_save_keeps_review_date() {
    let (store, _, ids) = seeded(&["syllabus"]).await;
    let task_id = &ids[0];
    tasks::complete_task(&store, FACULTY, task_id).await.unwrap();
    let approved = tasks::review_task(&store, CC, task_id, review(ReviewStatus::Yes, None))
        .await
        .unwrap();

    let t = tasks::update_task_remarks(
        &store,
        CC,
        task_id,
        UpdateRemarksPayload {
            remarks: "attach the signed copy too".to_string(),
            reviewer: Some(ReviewerRole::Cc),
        },
    )
    .await
    .unwrap();
    assert_eq!(t.cc_remarks, "attach the signed copy too");
    assert_eq!(t.cc_review_date, approved.cc_review_date);
    assert_eq!(t.cc_status, ReviewStatus::Yes);

    let err = tasks::update_task_remarks(
        &store,
        FACULTY,
        task_id,
        UpdateRemarksPayload {
            remarks: "self praise".to_string(),
            reviewer: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApprovalError::Forbidden(_)));
}

#[tokio::test]
async fn deadline_edits_validate_input() {
    let (store, _, ids) = seeded(&["syllabus"]).await;
    let task_id = &ids[0];

    let err = tasks::update_task_deadline(
        &store,
        CC,
        task_id,
        UpdateDeadlinePayload {
            deadline: Some("next friday".to_string()),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApprovalError::InvalidInput(_)));

    let t = tasks::update_task_deadline(
        &store,
        HOD,
        task_id,
        UpdateDeadlinePayload {
            deadline: Some("2026-11-30".to_string()),
        },
    )
    .await
    .unwrap();
    assert_eq!(t.deadline.map(|d| d.to_string()), Some("2026-11-30".to_string()));
    // Metadata edits never touch approval state.
    assert_eq!(t.status, CompletionStatus::Pending);

    let err = tasks::update_task_deadline(&store, FACULTY, task_id, UpdateDeadlinePayload { deadline: None })
        .await
        .unwrap_err();
    assert!(matches!(err, ApprovalError::Forbidden(_)));
}

#[tokio::test]
async fn audit_clear_is_hod_only() {
    let (store, assignment_id, ids) = seeded(&["syllabus"]).await;
    tasks::complete_task(&store, FACULTY, &ids[0]).await.unwrap();

    let err = audit::clear_audit_log(&store, CC, &assignment_id).await.unwrap_err();
    assert!(matches!(err, ApprovalError::Forbidden(_)));
    assert_eq!(audit::clear_audit_log(&store, HOD, &assignment_id).await.unwrap(), 1);
    assert!(audit::list_audit_log(&store, FACULTY, &assignment_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn outsiders_cannot_read_tasks() {
    let (store, assignment_id, _) = seeded(&["syllabus"]).await;
    store.put_user(&user("fac-2", "Other", Role::Faculty, &[])).await.unwrap();

    let err = tasks::get_tasks_for_assignment(&store, "fac-2", &assignment_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ApprovalError::Forbidden(_)));

    let err = tasks::get_task(&store, FACULTY, "missing").await.unwrap_err();
    assert!(matches!(err, ApprovalError::NotFound(_)));
}

#[tokio::test]
async fn concurrent_transitions_keep_invariants() {
    let (store, assignment_id, ids) = seeded(&["syllabus"]).await;
    let store = Arc::new(store);
    let task_id = ids[0].clone();
    tasks::complete_task(store.as_ref(), FACULTY, &task_id).await.unwrap();

    // CC approving while the faculty reverts: at most one may win per version.
    let approve = {
        let store = store.clone();
        let task_id = task_id.clone();
        tokio::spawn(async move {
            tasks::review_task(store.as_ref(), CC, &task_id, review(ReviewStatus::Yes, None)).await
        })
    };
    let revert = {
        let store = store.clone();
        let task_id = task_id.clone();
        tokio::spawn(async move { tasks::revert_task(store.as_ref(), FACULTY, &task_id).await })
    };
    let results = [approve.await.unwrap(), revert.await.unwrap()];
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert!(succeeded >= 1);

    let t = tasks::get_task(store.as_ref(), FACULTY, &task_id).await.unwrap();
    if t.status != CompletionStatus::Completed {
        assert_eq!(t.cc_status, ReviewStatus::Pending);
    }
    let log = audit::list_audit_log(store.as_ref(), HOD, &assignment_id).await.unwrap();
    // One entry per successful commit, plus the initial completion.
    assert_eq!(log.len(), 1 + succeeded);
}

#[tokio::test]
async fn resubmit_after_hod_return_resets_both_reviews() {
    let (store, assignment_id, ids) = seeded(&["syllabus"]).await;
    let task_id = &ids[0];
    tasks::complete_task(&store, FACULTY, task_id).await.unwrap();
    tasks::review_task(&store, CC, task_id, review(ReviewStatus::Yes, Some("verified")))
        .await
        .unwrap();
    let t = tasks::review_task(&store, HOD, task_id, review(ReviewStatus::No, Some("wrong term")))
        .await
        .unwrap();
    assert_eq!((t.cc_status, t.hod_status), (ReviewStatus::Yes, ReviewStatus::No));
    assert_eq!(t.effective_status(), EffectiveStatus::Returned);

    let t = tasks::complete_task(&store, FACULTY, task_id).await.unwrap();
    assert_eq!(t.status, CompletionStatus::Completed);
    assert_eq!((t.cc_status, t.hod_status), (ReviewStatus::Pending, ReviewStatus::Pending));
    assert!(t.cc_remarks.is_empty());
    assert!(t.hod_remarks.is_empty());
    assert!(t.cc_review_date.is_none());
    assert!(t.hod_review_date.is_none());
    assert_eq!(t.effective_status(), EffectiveStatus::AwaitingCc);

    let log = audit::list_audit_log(&store, HOD, &assignment_id).await.unwrap();
    assert_eq!(log[0].action, AuditAction::TaskResubmitted);
}

#[tokio::test]
async fn coordinator_from_other_department_cannot_review() {
    let (store, _, ids) = seeded(&["syllabus"]).await;
    let task_id = &ids[0];
    store
        .put_user(&User {
            department_id: "ece".to_string(),
            ..user("hod-ece", "Dr. Iyer", Role::Hod, &[])
        })
        .await
        .unwrap();
    store
        .put_user(&User {
            department_id: "ece".to_string(),
            ..user("cc-ece", "Kumar", Role::Cc, &[])
        })
        .await
        .unwrap();
    // A class id is free text, so a foreign HOD can hand out another
    // department's class.
    coursefile_atoms::users::update_user(
        &store,
        "hod-ece",
        "cc-ece",
        coursefile_atoms::users::UpdateUserPayload {
            user_name: None,
            role: None,
            coordinated_class_ids: Some(vec!["cse-3a".to_string()]),
        },
    )
    .await
    .unwrap();
    tasks::complete_task(&store, FACULTY, task_id).await.unwrap();

    let err = tasks::review_task(&store, "cc-ece", task_id, review(ReviewStatus::Yes, None))
        .await
        .unwrap_err();
    assert!(matches!(err, ApprovalError::Forbidden(_)));
    let t = tasks::get_task(&store, FACULTY, task_id).await.unwrap();
    assert_eq!(t.cc_status, ReviewStatus::Pending);
}
