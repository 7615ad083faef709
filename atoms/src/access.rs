//! Capability checks resolved once per request from the caller's profile and
//! the assignment the task belongs to.

use serde::{Deserialize, Serialize};

use crate::assignments::Assignment;
use crate::errors::ApprovalError;
use crate::users::{Role, User};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewerRole {
    Cc,
    Hod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// The faculty member the assignment belongs to.
    pub is_owner: bool,
    pub can_review_as_cc: bool,
    pub can_review_as_hod: bool,
}

impl Capabilities {
    pub fn resolve(user: &User, assignment: &Assignment) -> Self {
        Self {
            is_owner: user.user_id == assignment.faculty_id,
            // Coordinator duties count only inside the user's own department.
            can_review_as_cc: matches!(user.role, Role::Cc | Role::Hod)
                && user.department_id == assignment.department_id
                && user
                    .coordinated_class_ids
                    .iter()
                    .any(|c| c == &assignment.class_id),
            can_review_as_hod: user.role == Role::Hod
                && user.department_id == assignment.department_id,
        }
    }

    /// An HOD reviewing a subject they teach or a class they coordinate
    /// skips the wait for CC verification.
    pub fn self_review_override(&self) -> bool {
        self.can_review_as_hod && (self.is_owner || self.can_review_as_cc)
    }

    pub fn is_reviewer(&self) -> bool {
        self.can_review_as_cc || self.can_review_as_hod
    }

    pub fn can_view(&self) -> bool {
        self.is_owner || self.is_reviewer()
    }

    pub fn require_view(&self) -> Result<(), ApprovalError> {
        if self.can_view() {
            Ok(())
        } else {
            Err(ApprovalError::Forbidden(
                "You are not assigned to this subject, class or department.".to_string(),
            ))
        }
    }

    pub fn require_hod(&self, what: &str) -> Result<(), ApprovalError> {
        if self.can_review_as_hod {
            Ok(())
        } else {
            Err(ApprovalError::Forbidden(format!(
                "Only the HOD of this department can {}.",
                what
            )))
        }
    }

    /// Pick the reviewer hat for a request. An explicit choice must be one the
    /// caller holds; otherwise HOD wins over CC.
    pub fn reviewer_role(
        &self,
        requested: Option<ReviewerRole>,
    ) -> Result<ReviewerRole, ApprovalError> {
        match requested {
            Some(ReviewerRole::Cc) if self.can_review_as_cc => Ok(ReviewerRole::Cc),
            Some(ReviewerRole::Cc) => Err(ApprovalError::Forbidden(
                "Only the class coordinator for this class can review as CC.".to_string(),
            )),
            Some(ReviewerRole::Hod) if self.can_review_as_hod => Ok(ReviewerRole::Hod),
            Some(ReviewerRole::Hod) => Err(ApprovalError::Forbidden(
                "Only the HOD of this department can review as HOD.".to_string(),
            )),
            None if self.can_review_as_hod => Ok(ReviewerRole::Hod),
            None if self.can_review_as_cc => Ok(ReviewerRole::Cc),
            None => Err(ApprovalError::Forbidden(
                "Only the class coordinator or HOD can review tasks.".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn assignment() -> Assignment {
        Assignment {
            assignment_id: "a1".to_string(),
            faculty_id: "fac".to_string(),
            subject_id: "maths".to_string(),
            class_id: "cse-3a".to_string(),
            department_id: "cse".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn hod_of_other_department_has_no_capability() {
        let caps = Capabilities::resolve(&user("h2", Role::Hod, "ece", &[]), &assignment());
        assert!(!caps.can_view());
        assert!(caps.reviewer_role(None).is_err());
    }

    #[test]
    fn hod_teaching_own_subject_gets_override() {
        let mut a = assignment();
        a.faculty_id = "hod".to_string();
        let caps = Capabilities::resolve(&user("hod", Role::Hod, "cse", &[]), &a);
        assert!(caps.is_owner);
        assert!(caps.self_review_override());
    }

    #[test]
    fn hod_without_teaching_role_has_no_override() {
        let caps = Capabilities::resolve(&user("hod", Role::Hod, "cse", &[]), &assignment());
        assert!(caps.can_review_as_hod);
        assert!(!caps.self_review_override());
    }

    #[test]
    fn reviewer_role_defaults_to_hod_and_honours_explicit_cc() {
        let caps =
            Capabilities::resolve(&user("hod", Role::Hod, "cse", &["cse-3a"]), &assignment());
        assert_eq!(caps.reviewer_role(None).unwrap(), ReviewerRole::Hod);
        assert_eq!(
            caps.reviewer_role(Some(ReviewerRole::Cc)).unwrap(),
            ReviewerRole::Cc
        );
    }

    #[test]
    fn coordinator_from_other_department_is_not_cc() {
        let caps = Capabilities::resolve(&user("cc2", Role::Cc, "ece", &["cse-3a"]), &assignment());
        assert!(!caps.can_review_as_cc);
        assert!(!caps.can_view());
        assert!(matches!(
            caps.reviewer_role(Some(ReviewerRole::Cc)),
            Err(ApprovalError::Forbidden(_))
        ));
    }

    #[test]
    fn faculty_role_ignores_coordinated_classes() {
        let caps =
            Capabilities::resolve(&user("fac2", Role::Faculty, "cse", &["cse-3a"]), &assignment());
        assert!(!caps.can_review_as_cc);

        let caps = Capabilities::resolve(&user("cc", Role::Cc, "cse", &[]), &assignment());
        assert!(!caps.can_review_as_cc);
    }

    #[test]
    fn cc_cannot_claim_hod() {
        let caps = Capabilities::resolve(&user("cc", Role::Cc, "cse", &["cse-3a"]), &assignment());
        assert!(matches!(
            caps.reviewer_role(Some(ReviewerRole::Hod)),
            Err(ApprovalError::Forbidden(_))
        ));
    }
}
