pub mod http;
pub mod model;
pub mod service;

pub use http::*;
pub use model::{CreateUserPayload, Role, UpdateUserPayload, User};
pub use service::*;
