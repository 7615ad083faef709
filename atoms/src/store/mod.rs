//! Persistence for users, assignments, tasks and their audit trail.
//!
//! The store holds no business rules. Its one guarantee beyond plain storage
//! is [`ApprovalStore::commit_task`]: a task write and its audit entry land
//! together or not at all, and only if nobody else wrote the task first.

use async_trait::async_trait;
use thiserror::Error;

use crate::assignments::Assignment;
use crate::audit::AuditLogEntry;
use crate::tasks::CourseFileTask;
use crate::users::User;

pub mod dynamo;
pub mod memory;

pub use dynamo::DynamoStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The task's stored version differs from the one the caller read.
    #[error("task {0} was modified concurrently")]
    Conflict(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("{0}")]
    Backend(String),
}

#[async_trait]
pub trait ApprovalStore: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError>;
    async fn put_user(&self, user: &User) -> Result<(), StoreError>;

    async fn get_assignment(&self, assignment_id: &str) -> Result<Option<Assignment>, StoreError>;

    /// Persist a new assignment with its initial tasks.
    async fn create_assignment(
        &self,
        assignment: &Assignment,
        tasks: &[CourseFileTask],
    ) -> Result<(), StoreError>;

    async fn get_task(&self, task_id: &str) -> Result<Option<CourseFileTask>, StoreError>;

    /// Tasks of an assignment ordered by creation time, then template id.
    async fn tasks_for_assignment(
        &self,
        assignment_id: &str,
    ) -> Result<Vec<CourseFileTask>, StoreError>;

    /// Replace the task if its stored version is still `expected_version`
    /// and append `entry` in the same unit. Returns the task as stored,
    /// with its version bumped.
    async fn commit_task(
        &self,
        task: &CourseFileTask,
        expected_version: u64,
        entry: &AuditLogEntry,
    ) -> Result<CourseFileTask, StoreError>;

    /// Audit entries of an assignment, newest first.
    async fn audit_entries(&self, assignment_id: &str) -> Result<Vec<AuditLogEntry>, StoreError>;

    /// Remove every audit entry of an assignment, returning how many went.
    async fn clear_audit(&self, assignment_id: &str) -> Result<usize, StoreError>;
}
