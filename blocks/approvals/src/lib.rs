//! Operations spanning every task of an assignment.

pub mod batch;
pub mod summary;

pub use batch::{batch_review, batch_review_handler, BatchFailure, BatchOutcome, BatchReviewPayload};
pub use summary::{assignment_summary, assignment_summary_handler, AssignmentSummary};

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use coursefile_atoms::assignments::{self, CreateAssignmentPayload};
    use coursefile_atoms::users::{Role, User};
    use coursefile_atoms::{ApprovalStore, MemoryStore};

    pub const FACULTY: &str = "fac-1";
    pub const CC: &str = "cc-1";
    pub const HOD: &str = "hod-1";

    fn user(id: &str, role: Role, classes: &[&str]) -> User {
        User {
            user_id: id.to_string(),
            user_name: id.to_string(),
            user_email: format!("{}@college.edu", id),
            department_id: "cse".to_string(),
            role,
            coordinated_class_ids: classes.iter().map(|c| c.to_string()).collect(),
            user_created_at: Utc::now(),
        }
    }

    /// Store with one faculty, CC and HOD plus an assignment of `n` tasks.
    /// Task ids are returned in template order.
    pub async fn seeded(n: usize) -> (MemoryStore, String, Vec<String>) {
        let store = MemoryStore::new();
        store.put_user(&user(FACULTY, Role::Faculty, &[])).await.unwrap();
        store.put_user(&user(CC, Role::Cc, &["cse-3a"])).await.unwrap();
        store.put_user(&user(HOD, Role::Hod, &[])).await.unwrap();

        let (assignment, tasks) = assignments::create_assignment(
            &store,
            HOD,
            CreateAssignmentPayload {
                faculty_id: FACULTY.to_string(),
                subject_id: "dbms".to_string(),
                class_id: "cse-3a".to_string(),
                template_ids: (0..n).map(|i| format!("item-{:02}", i)).collect(),
                deadline: None,
            },
        )
        .await
        .unwrap();
        let ids = tasks.into_iter().map(|t| t.task_id).collect();
        (store, assignment.assignment_id, ids)
    }
}
