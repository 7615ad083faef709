use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ApprovalStore, StoreError};
use crate::assignments::Assignment;
use crate::audit::AuditLogEntry;
use crate::tasks::CourseFileTask;
use crate::users::User;

/// In-memory store for tests and local runs. Not durable.
///
/// A single lock guards all maps, so every commit is serialized and the task
/// write and its audit append are observed together.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    assignments: HashMap<String, Assignment>,
    tasks: HashMap<String, CourseFileTask>,
    // Oldest first; reversed on read.
    audit: HashMap<String, Vec<AuditLogEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApprovalStore for MemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.inner.lock().await.users.get(user_id).cloned())
    }

    async fn put_user(&self, user: &User) -> Result<(), StoreError> {
        self.inner
            .lock()
            .await
            .users
            .insert(user.user_id.clone(), user.clone());
        Ok(())
    }

    async fn get_assignment(&self, assignment_id: &str) -> Result<Option<Assignment>, StoreError> {
        Ok(self.inner.lock().await.assignments.get(assignment_id).cloned())
    }

    async fn create_assignment(
        &self,
        assignment: &Assignment,
        tasks: &[CourseFileTask],
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.assignments.contains_key(&assignment.assignment_id) {
            return Err(StoreError::AlreadyExists(format!(
                "assignment {}",
                assignment.assignment_id
            )));
        }
        inner
            .assignments
            .insert(assignment.assignment_id.clone(), assignment.clone());
        for task in tasks {
            inner.tasks.insert(task.task_id.clone(), task.clone());
        }
        Ok(())
    }

    async fn get_task(&self, task_id: &str) -> Result<Option<CourseFileTask>, StoreError> {
        Ok(self.inner.lock().await.tasks.get(task_id).cloned())
    }

    async fn tasks_for_assignment(
        &self,
        assignment_id: &str,
    ) -> Result<Vec<CourseFileTask>, StoreError> {
        let inner = self.inner.lock().await;
        let mut tasks: Vec<CourseFileTask> = inner
            .tasks
            .values()
            .filter(|t| t.assignment_id == assignment_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.template_id.cmp(&b.template_id))
        });
        Ok(tasks)
    }

    async fn commit_task(
        &self,
        task: &CourseFileTask,
        expected_version: u64,
        entry: &AuditLogEntry,
    ) -> Result<CourseFileTask, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.tasks.get(&task.task_id) {
            Some(stored) if stored.version == expected_version => {}
            Some(_) => return Err(StoreError::Conflict(task.task_id.clone())),
            None => {
                return Err(StoreError::Backend(format!(
                    "task {} does not exist",
                    task.task_id
                )))
            }
        }

        let mut stored = task.clone();
        stored.version = expected_version + 1;
        inner.tasks.insert(stored.task_id.clone(), stored.clone());
        inner
            .audit
            .entry(entry.assignment_id.clone())
            .or_default()
            .push(entry.clone());
        Ok(stored)
    }

    async fn audit_entries(&self, assignment_id: &str) -> Result<Vec<AuditLogEntry>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .audit
            .get(assignment_id)
            .map(|entries| entries.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    async fn clear_audit(&self, assignment_id: &str) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().await;
        Ok(inner.audit.remove(assignment_id).map(|e| e.len()).unwrap_or(0))
    }
}
