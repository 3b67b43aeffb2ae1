use chrono::{DateTime, Utc};

use serde::Serialize;

use super::new_id;

/// New subscription request, before the store assigns `updated_at`
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub id: String,
    pub user_id: String,
    pub sub_id: i32,
}

impl NewSubscription {
    pub fn new(user_id: &str, sub_id: i32) -> Self {
        Self {
            id: new_id(),
            user_id: user_id.into(),
            sub_id,
        }
    }
}

/// Stored subscription record, one active row per user at most
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    /// Tier index into the static catalog
    pub sub_id: i32,
    pub active: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl PartialEq for Subscription {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Subscription {}
