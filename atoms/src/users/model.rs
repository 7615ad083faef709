use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Faculty,
    Cc,
    Hod,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Faculty => "FACULTY",
            Role::Cc => "CC",
            Role::Hod => "HOD",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "FACULTY" => Some(Role::Faculty),
            "CC" => Some(Role::Cc),
            "HOD" => Some(Role::Hod),
            _ => None,
        }
    }
}

/// Profile of anyone who can act on course-file tasks.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub department_id: String,
    pub role: Role,
    /// Classes this user coordinates; empty unless they act as a CC.
    #[serde(default)]
    pub coordinated_class_ids: Vec<String>,
    pub user_created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserPayload {
    pub user_name: String,
    pub user_email: String,
    pub department_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserPayload {
    pub user_name: Option<String>,
    pub role: Option<Role>,
    pub coordinated_class_ids: Option<Vec<String>>,
}
