use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::types::error::TransactionCanceledException;
use aws_sdk_dynamodb::types::{AttributeValue, DeleteRequest, Put, TransactWriteItem, WriteRequest};
use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use super::{ApprovalStore, StoreError};
use crate::assignments::Assignment;
use crate::audit::{AuditAction, AuditLogEntry};
use crate::tasks::{CompletionStatus, CourseFileTask, ReviewStatus};
use crate::users::{Role, User};

type Item = HashMap<String, AttributeValue>;

/// Secondary index keyed by `TASK#{id}` so a task can be found without its
/// assignment id.
const TASK_INDEX: &str = "GSI1";

/// Most requests a single `BatchWriteItem` call accepts.
const BATCH_WRITE_LIMIT: usize = 25;
/// Rounds spent resending unprocessed deletes before giving up.
const MAX_BATCH_ATTEMPTS: usize = 5;

/// Single-table DynamoDB layout:
///
/// | PK                | SK                          | record     |
/// |-------------------|-----------------------------|------------|
/// | `USER#{id}`       | `USER#{id}`                 | user       |
/// | `ASSIGNMENT#{id}` | `ASSIGNMENT#{id}`           | assignment |
/// | `ASSIGNMENT#{id}` | `TASK#{task_id}`            | task       |
/// | `ASSIGNMENT#{id}` | `AUDIT#{created_at}#{id}`   | audit      |
pub struct DynamoStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    async fn get_item(&self, pk: &str, sk: &str) -> Result<Option<Item>, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(pk.to_string()))
            .key("SK", AttributeValue::S(sk.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB get_item error: {}", e)))?;
        Ok(result.item().cloned())
    }

    /// All items under `pk` whose sort key starts with `prefix`, following
    /// pagination to the end.
    async fn query_prefix(
        &self,
        pk: &str,
        prefix: &str,
        newest_first: bool,
    ) -> Result<Vec<Item>, StoreError> {
        let mut items = Vec::new();
        let mut start_key: Option<Item> = None;
        loop {
            let result = self
                .client
                .query()
                .table_name(&self.table_name)
                .consistent_read(true)
                .scan_index_forward(!newest_first)
                .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
                .expression_attribute_values(":pk", AttributeValue::S(pk.to_string()))
                .expression_attribute_values(":sk_prefix", AttributeValue::S(prefix.to_string()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| StoreError::Backend(format!("DynamoDB query error: {}", e)))?;

            items.extend(result.items().iter().cloned());
            match result.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }
        Ok(items)
    }

    fn put(&self, item: Item, condition: Option<&str>) -> Result<TransactWriteItem, StoreError> {
        let put = Put::builder()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .set_condition_expression(condition.map(str::to_string))
            .build()
            .map_err(|e| StoreError::Backend(format!("DynamoDB put build error: {}", e)))?;
        Ok(TransactWriteItem::builder().put(put).build())
    }
}

#[async_trait]
impl ApprovalStore for DynamoStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let key = format!("USER#{}", user_id);
        self.get_item(&key, &key)
            .await?
            .map(|item| user_from_item(&item))
            .transpose()
    }

    async fn put_user(&self, user: &User) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(user_item(user)))
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB put_item error: {}", e)))?;
        Ok(())
    }

    async fn get_assignment(&self, assignment_id: &str) -> Result<Option<Assignment>, StoreError> {
        let key = format!("ASSIGNMENT#{}", assignment_id);
        self.get_item(&key, &key)
            .await?
            .map(|item| assignment_from_item(&item))
            .transpose()
    }

    async fn create_assignment(
        &self,
        assignment: &Assignment,
        tasks: &[CourseFileTask],
    ) -> Result<(), StoreError> {
        let mut request = self.client.transact_write_items().transact_items(self.put(
            assignment_item(assignment),
            Some("attribute_not_exists(PK)"),
        )?);
        for task in tasks {
            request = request.transact_items(self.put(task_item(task), None)?);
        }

        // The assignment item is first, so only its condition means a duplicate.
        request.send().await.map_err(|e| match e.into_service_error() {
            TransactWriteItemsError::TransactionCanceledException(c)
                if first_reason(&c) == Some("ConditionalCheckFailed") =>
            {
                StoreError::AlreadyExists(format!("assignment {}", assignment.assignment_id))
            }
            other => StoreError::Backend(format!("DynamoDB transact_write_items error: {}", other)),
        })?;
        Ok(())
    }

    async fn get_task(&self, task_id: &str) -> Result<Option<CourseFileTask>, StoreError> {
        let result = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(TASK_INDEX)
            .key_condition_expression("GSI1PK = :pk")
            .expression_attribute_values(":pk", AttributeValue::S(format!("TASK#{}", task_id)))
            .limit(1)
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB query error: {}", e)))?;

        let Some(located) = result.items().first() else {
            return Ok(None);
        };
        // The index is eventually consistent; re-read the base item.
        let pk = attr_s(located, "PK")?;
        let sk = attr_s(located, "SK")?;
        self.get_item(&pk, &sk)
            .await?
            .map(|item| task_from_item(&item))
            .transpose()
    }

    async fn tasks_for_assignment(
        &self,
        assignment_id: &str,
    ) -> Result<Vec<CourseFileTask>, StoreError> {
        let pk = format!("ASSIGNMENT#{}", assignment_id);
        let mut tasks = self
            .query_prefix(&pk, "TASK#", false)
            .await?
            .iter()
            .map(task_from_item)
            .collect::<Result<Vec<_>, _>>()?;
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
        let mut stored = task.clone();
        stored.version = expected_version + 1;

        let guarded = Put::builder()
            .table_name(&self.table_name)
            .set_item(Some(task_item(&stored)))
            .condition_expression("#version = :expected")
            .expression_attribute_names("#version", "version")
            .expression_attribute_values(":expected", AttributeValue::N(expected_version.to_string()))
            .build()
            .map_err(|e| StoreError::Backend(format!("DynamoDB put build error: {}", e)))?;

        self.client
            .transact_write_items()
            .transact_items(TransactWriteItem::builder().put(guarded).build())
            .transact_items(self.put(audit_item(entry), Some("attribute_not_exists(SK)"))?)
            .send()
            .await
            .map_err(|e| match e.into_service_error() {
                TransactWriteItemsError::TransactionCanceledException(c)
                    if matches!(
                        first_reason(&c),
                        Some("ConditionalCheckFailed" | "TransactionConflict")
                    ) =>
                {
                    StoreError::Conflict(task.task_id.clone())
                }
                other => {
                    StoreError::Backend(format!("DynamoDB transact_write_items error: {}", other))
                }
            })?;

        Ok(stored)
    }

    async fn audit_entries(&self, assignment_id: &str) -> Result<Vec<AuditLogEntry>, StoreError> {
        let pk = format!("ASSIGNMENT#{}", assignment_id);
        self.query_prefix(&pk, "AUDIT#", true)
            .await?
            .iter()
            .map(audit_from_item)
            .collect()
    }

    async fn clear_audit(&self, assignment_id: &str) -> Result<usize, StoreError> {
        let pk = format!("ASSIGNMENT#{}", assignment_id);
        let items = self.query_prefix(&pk, "AUDIT#", false).await?;
        let total = items.len();

        let mut removed = 0;
        for chunk in items.chunks(BATCH_WRITE_LIMIT) {
            let mut pending = chunk
                .iter()
                .map(|item| delete_request(&pk, &attr_s(item, "SK")?))
                .collect::<Result<Vec<_>, _>>()?;

            let mut attempts = 0;
            while !pending.is_empty() {
                attempts += 1;
                if attempts > MAX_BATCH_ATTEMPTS {
                    return Err(StoreError::Backend(format!(
                        "audit clear stopped with {} of {} entries removed; DynamoDB kept returning unprocessed deletes",
                        removed, total
                    )));
                }
                let sent = pending.len();
                let result = self
                    .client
                    .batch_write_item()
                    .request_items(&self.table_name, pending)
                    .send()
                    .await
                    .map_err(|e| {
                        StoreError::Backend(format!(
                            "DynamoDB batch_write_item error after {} of {} audit entries removed: {}",
                            removed, total, e
                        ))
                    })?;
                pending = result
                    .unprocessed_items()
                    .and_then(|u| u.get(&self.table_name))
                    .cloned()
                    .unwrap_or_default();
                removed += sent - pending.len();
            }
        }

        Ok(removed)
    }
}

/// Code of the first item's cancellation reason, e.g. `ConditionalCheckFailed`.
fn first_reason(err: &TransactionCanceledException) -> Option<&str> {
    err.cancellation_reasons().first().and_then(|r| r.code())
}

fn delete_request(pk: &str, sk: &str) -> Result<WriteRequest, StoreError> {
    let delete = DeleteRequest::builder()
        .key("PK", s(pk))
        .key("SK", s(sk))
        .build()
        .map_err(|e| StoreError::Backend(format!("DynamoDB delete build error: {}", e)))?;
    Ok(WriteRequest::builder().delete_request(delete).build())
}

// ---- item conversion ----

fn s(value: &str) -> AttributeValue {
    AttributeValue::S(value.to_string())
}

fn time(value: &DateTime<Utc>) -> AttributeValue {
    // Fixed precision keeps sort keys in chronological order.
    AttributeValue::S(value.to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn attr_s(item: &Item, key: &str) -> Result<String, StoreError> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
        .ok_or_else(|| StoreError::Corrupt(format!("missing attribute {}", key)))
}

fn attr_opt_s(item: &Item, key: &str) -> Option<String> {
    item.get(key).and_then(|v| v.as_s().ok()).map(|s| s.to_string())
}

fn parse_time(key: &str, raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("{} is not a timestamp: {}", key, e)))
}

fn attr_time(item: &Item, key: &str) -> Result<DateTime<Utc>, StoreError> {
    parse_time(key, &attr_s(item, key)?)
}

fn attr_opt_time(item: &Item, key: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
    attr_opt_s(item, key).map(|raw| parse_time(key, &raw)).transpose()
}

fn attr_list(item: &Item, key: &str) -> Vec<String> {
    item.get(key)
        .and_then(|v| v.as_l().ok())
        .map(|values| {
            values
                .iter()
                .filter_map(|v| v.as_s().ok())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn attr_review(item: &Item, key: &str) -> Result<ReviewStatus, StoreError> {
    let raw = attr_s(item, key)?;
    ReviewStatus::parse(&raw)
        .ok_or_else(|| StoreError::Corrupt(format!("{} has unknown value {}", key, raw)))
}

fn user_item(user: &User) -> Item {
    let key = format!("USER#{}", user.user_id);
    HashMap::from([
        ("PK".to_string(), s(&key)),
        ("SK".to_string(), s(&key)),
        ("user_name".to_string(), s(&user.user_name)),
        ("user_email".to_string(), s(&user.user_email)),
        ("department_id".to_string(), s(&user.department_id)),
        ("user_role".to_string(), s(user.role.as_str())),
        (
            "coordinated_class_ids".to_string(),
            AttributeValue::L(user.coordinated_class_ids.iter().map(|c| s(c)).collect()),
        ),
        ("user_created_at".to_string(), time(&user.user_created_at)),
    ])
}

fn user_from_item(item: &Item) -> Result<User, StoreError> {
    let pk = attr_s(item, "PK")?;
    let raw_role = attr_s(item, "user_role")?;
    let mut user_name = attr_opt_s(item, "user_name").unwrap_or_default();
    let user_email = attr_opt_s(item, "user_email").unwrap_or_default();
    if user_name.trim().is_empty() {
        user_name = user_email.split('@').next().unwrap_or("User").to_string();
    }
    Ok(User {
        user_id: pk.strip_prefix("USER#").unwrap_or(&pk).to_string(),
        user_name,
        user_email,
        department_id: attr_s(item, "department_id")?,
        role: Role::parse(&raw_role)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown role {}", raw_role)))?,
        coordinated_class_ids: attr_list(item, "coordinated_class_ids"),
        user_created_at: attr_time(item, "user_created_at")?,
    })
}

fn assignment_item(a: &Assignment) -> Item {
    let key = format!("ASSIGNMENT#{}", a.assignment_id);
    HashMap::from([
        ("PK".to_string(), s(&key)),
        ("SK".to_string(), s(&key)),
        ("assignment_id".to_string(), s(&a.assignment_id)),
        ("faculty_id".to_string(), s(&a.faculty_id)),
        ("subject_id".to_string(), s(&a.subject_id)),
        ("class_id".to_string(), s(&a.class_id)),
        ("department_id".to_string(), s(&a.department_id)),
        ("created_at".to_string(), time(&a.created_at)),
    ])
}

fn assignment_from_item(item: &Item) -> Result<Assignment, StoreError> {
    Ok(Assignment {
        assignment_id: attr_s(item, "assignment_id")?,
        faculty_id: attr_s(item, "faculty_id")?,
        subject_id: attr_s(item, "subject_id")?,
        class_id: attr_s(item, "class_id")?,
        department_id: attr_s(item, "department_id")?,
        created_at: attr_time(item, "created_at")?,
    })
}

fn task_item(t: &CourseFileTask) -> Item {
    let task_key = format!("TASK#{}", t.task_id);
    let mut item = HashMap::from([
        ("PK".to_string(), s(&format!("ASSIGNMENT#{}", t.assignment_id))),
        ("SK".to_string(), s(&task_key)),
        ("GSI1PK".to_string(), s(&task_key)),
        ("GSI1SK".to_string(), s(&task_key)),
        ("task_id".to_string(), s(&t.task_id)),
        ("assignment_id".to_string(), s(&t.assignment_id)),
        ("template_id".to_string(), s(&t.template_id)),
        ("status".to_string(), s(t.status.as_str())),
        ("cc_status".to_string(), s(t.cc_status.as_str())),
        ("cc_remarks".to_string(), s(&t.cc_remarks)),
        ("hod_status".to_string(), s(t.hod_status.as_str())),
        ("hod_remarks".to_string(), s(&t.hod_remarks)),
        ("created_at".to_string(), time(&t.created_at)),
        ("version".to_string(), AttributeValue::N(t.version.to_string())),
    ]);
    if let Some(at) = &t.completed_at {
        item.insert("completed_at".to_string(), time(at));
    }
    if let Some(at) = &t.cc_review_date {
        item.insert("cc_review_date".to_string(), time(at));
    }
    if let Some(at) = &t.hod_review_date {
        item.insert("hod_review_date".to_string(), time(at));
    }
    if let Some(d) = &t.deadline {
        item.insert("deadline".to_string(), s(&d.format("%Y-%m-%d").to_string()));
    }
    item
}

fn task_from_item(item: &Item) -> Result<CourseFileTask, StoreError> {
    let raw_status = attr_s(item, "status")?;
    let deadline = attr_opt_s(item, "deadline")
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map_err(|e| StoreError::Corrupt(format!("deadline {}: {}", raw, e)))
        })
        .transpose()?;

    Ok(CourseFileTask {
        task_id: attr_s(item, "task_id")?,
        assignment_id: attr_s(item, "assignment_id")?,
        template_id: attr_s(item, "template_id")?,
        status: CompletionStatus::parse(&raw_status)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown task status {}", raw_status)))?,
        completed_at: attr_opt_time(item, "completed_at")?,
        cc_status: attr_review(item, "cc_status")?,
        cc_remarks: attr_opt_s(item, "cc_remarks").unwrap_or_default(),
        cc_review_date: attr_opt_time(item, "cc_review_date")?,
        hod_status: attr_review(item, "hod_status")?,
        hod_remarks: attr_opt_s(item, "hod_remarks").unwrap_or_default(),
        hod_review_date: attr_opt_time(item, "hod_review_date")?,
        deadline,
        created_at: attr_time(item, "created_at")?,
        version: item
            .get("version")
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse().ok())
            .unwrap_or(0),
    })
}

fn audit_item(e: &AuditLogEntry) -> Item {
    let created_at = time(&e.created_at);
    let sort_ts = created_at.as_s().map(|s| s.to_string()).unwrap_or_default();
    let mut item = HashMap::from([
        ("PK".to_string(), s(&format!("ASSIGNMENT#{}", e.assignment_id))),
        ("SK".to_string(), s(&format!("AUDIT#{}#{}", sort_ts, e.entry_id))),
        ("entry_id".to_string(), s(&e.entry_id)),
        ("assignment_id".to_string(), s(&e.assignment_id)),
        ("action".to_string(), s(e.action.as_str())),
        ("created_by".to_string(), s(&e.created_by)),
        ("created_by_id".to_string(), s(&e.created_by_id)),
        ("created_at".to_string(), created_at),
        ("remarks".to_string(), s(&e.remarks)),
    ]);
    if let Some(task_id) = &e.task_id {
        item.insert("task_id".to_string(), s(task_id));
    }
    item
}

fn audit_from_item(item: &Item) -> Result<AuditLogEntry, StoreError> {
    let raw_action = attr_s(item, "action")?;
    Ok(AuditLogEntry {
        entry_id: attr_s(item, "entry_id")?,
        assignment_id: attr_s(item, "assignment_id")?,
        task_id: attr_opt_s(item, "task_id"),
        action: AuditAction::parse(&raw_action)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown audit action {}", raw_action)))?,
        created_by: attr_opt_s(item, "created_by").unwrap_or_default(),
        created_by_id: attr_opt_s(item, "created_by_id").unwrap_or_default(),
        created_at: attr_time(item, "created_at")?,
        remarks: attr_opt_s(item, "remarks").unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_item_round_trips_optional_fields() {
        let mut task = CourseFileTask::new("a1", "lesson-plan", NaiveDate::from_ymd_opt(2026, 1, 31), Utc::now());
        task.status = CompletionStatus::Completed;
        task.completed_at = Some(Utc::now());
        task.cc_status = ReviewStatus::No;
        task.cc_remarks = "missing signature".to_string();
        task.version = 4;

        let item = task_item(&task);
        assert_eq!(attr_s(&item, "PK").unwrap(), "ASSIGNMENT#a1");
        assert!(!item.contains_key("hod_review_date"));

        let back = task_from_item(&item).unwrap();
        assert_eq!(back.cc_status, ReviewStatus::No);
        assert_eq!(back.deadline, task.deadline);
        assert_eq!(back.version, 4);
        assert!(back.hod_review_date.is_none());
    }

    #[test]
    fn audit_sort_keys_follow_time() {
        let user = User {
            user_id: "u1".to_string(),
            user_name: "Asha".to_string(),
            user_email: "asha@college.edu".to_string(),
            department_id: "cse".to_string(),
            role: Role::Faculty,
            coordinated_class_ids: vec![],
            user_created_at: Utc::now(),
        };
        let early = AuditLogEntry::new("a1", None, AuditAction::TaskCompleted, &user, "", Utc::now());
        let late = AuditLogEntry::new(
            "a1",
            None,
            AuditAction::TaskReverted,
            &user,
            "",
            early.created_at + chrono::Duration::milliseconds(5),
        );
        let early_sk = attr_s(&audit_item(&early), "SK").unwrap();
        let late_sk = attr_s(&audit_item(&late), "SK").unwrap();
        assert!(early_sk < late_sk);
    }

    fn cancelled(codes: &[&str]) -> TransactionCanceledException {
        let mut builder = TransactionCanceledException::builder().message("cancelled");
        for code in codes {
            builder = builder.cancellation_reasons(
                aws_sdk_dynamodb::types::CancellationReason::builder()
                    .code(*code)
                    .build(),
            );
        }
        builder.build()
    }

    #[test]
    fn only_the_first_item_condition_counts() {
        assert_eq!(
            first_reason(&cancelled(&["ConditionalCheckFailed", "None"])),
            Some("ConditionalCheckFailed")
        );
        assert_eq!(
            first_reason(&cancelled(&["None", "ConditionalCheckFailed"])),
            Some("None")
        );
        assert_eq!(first_reason(&cancelled(&[])), None);
    }

    #[test]
    fn delete_request_targets_the_audit_item() {
        let request = delete_request("ASSIGNMENT#a1", "AUDIT#2026-01-01T00:00:00.000000Z#e1").unwrap();
        let key = request.delete_request().unwrap().key();
        assert_eq!(attr_s(key, "PK").unwrap(), "ASSIGNMENT#a1");
        assert!(attr_s(key, "SK").unwrap().starts_with("AUDIT#"));
    }

    #[test]
    fn corrupt_role_is_reported() {
        let mut item = user_item(&User {
            user_id: "u1".to_string(),
            user_name: String::new(),
            user_email: "asha@college.edu".to_string(),
            department_id: "cse".to_string(),
            role: Role::Cc,
            coordinated_class_ids: vec!["cse-3a".to_string()],
            user_created_at: Utc::now(),
        });
        let user = user_from_item(&item).unwrap();
        assert_eq!(user.user_name, "asha");
        assert_eq!(user.coordinated_class_ids, vec!["cse-3a".to_string()]);

        item.insert("user_role".to_string(), s("DEAN"));
        assert!(matches!(user_from_item(&item), Err(StoreError::Corrupt(_))));
    }
}
