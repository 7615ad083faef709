pub mod http;
pub mod model;
pub mod service;
pub mod transition;

pub use http::*;
pub use model::{
    CompletionStatus, CourseFileTask, EffectiveStatus, ReviewStatus, ReviewTaskPayload, TaskView,
    UpdateDeadlinePayload, UpdateRemarksPayload,
};
pub use service::*;
