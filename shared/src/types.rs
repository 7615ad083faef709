// ========== USER ==========
pub use coursefile_atoms::users::model::{CreateUserPayload, Role, UpdateUserPayload, User};

// ========== ASSIGNMENT ==========
pub use coursefile_atoms::assignments::model::{Assignment, AssignmentDetail, CreateAssignmentPayload};

// ========== TASK ==========
pub use coursefile_atoms::tasks::model::{
    CompletionStatus, CourseFileTask, EffectiveStatus, ReviewStatus, ReviewTaskPayload, TaskView,
    UpdateDeadlinePayload, UpdateRemarksPayload,
};

// ========== AUDIT ==========
pub use coursefile_atoms::audit::model::{AuditAction, AuditLogEntry};
