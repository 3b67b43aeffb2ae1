use chrono::{DateTime, Utc};

use serde::Serialize;

use super::new_id;

/// New enrollment request, before the store assigns `updated_at`
#[derive(Debug, Clone)]
pub struct NewEnrollment {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
}

impl NewEnrollment {
    pub fn new(user_id: &str, course_id: &str) -> Self {
        Self {
            id: new_id(),
            user_id: user_id.into(),
            course_id: course_id.into(),
        }
    }
}

/// Stored enrollment record.
/// Rows are never deleted, an unenroll only clears `active`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Enrollment {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub active: bool,
    /// NOTE: Set by the store when the row is inserted
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl PartialEq for Enrollment {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Enrollment {}
