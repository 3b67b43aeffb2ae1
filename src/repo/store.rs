use chrono::{DateTime, Utc};

use serde::Serialize;

use crate::domain::{Enrollment, NewEnrollment, NewSubscription, Subscription};
use crate::error::Result;

/// Source of units of work, one per workflow operation.
/// NOTE: Implemented for each backing store so workflows can be tested without a database
/// TODO: Swap async-trait for std async traits once `Send` bounds on them are expressible
#[async_trait::async_trait]
pub trait Transactional: Send + Sync {
    type Work: UnitOfWork;

    /// Open a new transaction
    async fn begin(&self) -> Result<Self::Work>;
}

/// Transactional boundary around store calls.
/// Dropping a unit of work without committing discards its writes.
#[async_trait::async_trait]
pub trait UnitOfWork: Send + Sized {
    async fn commit(self) -> Result<()>;

    async fn rollback(self) -> Result<()>;
}

/// Commit `work` if `outcome` succeeded, otherwise roll it back and return the original error
pub async fn finish<W, T>(work: W, outcome: Result<T>) -> Result<T>
where
    W: UnitOfWork,
{
    match outcome {
        Ok(value) => {
            work.commit().await?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = work.rollback().await {
                tracing::error!(
                    error.cause_chain = ?rollback_error,
                    "Failed to roll back after: {}", error
                );
            }
            Err(error)
        }
    }
}

/// Enrollment table operations inside a unit of work
#[async_trait::async_trait]
pub trait EnrollmentStore: Send {
    /// Whether `user_id` has an active enrollment in `course_id`
    async fn has_active_enrollment(&mut self, user_id: &str, course_id: &str) -> Result<bool>;

    /// Insert a new active enrollment.
    /// Callers check `has_active_enrollment` first, the store only rejects outright duplicates.
    async fn insert_enrollment(&mut self, enrollment: &NewEnrollment) -> Result<()>;

    async fn find_enrollment(&mut self, id: &str) -> Result<Option<Enrollment>>;

    /// Deactivate the active enrollment of `user_id` in `course_id`
    async fn deactivate_enrollment(&mut self, user_id: &str, course_id: &str)
        -> Result<Enrollment>;

    /// Deactivate every active enrollment in `course_id`, returning how many were changed
    async fn deactivate_course_enrollments(&mut self, course_id: &str) -> Result<u64>;
}

/// Subscription table operations inside a unit of work
#[async_trait::async_trait]
pub trait SubscriptionStore: Send {
    /// Whether `user_id` is actively subscribed to tier `sub_id`
    async fn has_active_subscription(&mut self, user_id: &str, sub_id: i32) -> Result<bool>;

    async fn find_active_subscription(&mut self, user_id: &str) -> Result<Option<Subscription>>;

    async fn insert_subscription(&mut self, subscription: &NewSubscription) -> Result<()>;

    async fn find_subscription(&mut self, id: &str) -> Result<Option<Subscription>>;

    /// Deactivate the active subscription of `user_id`, whatever its tier
    async fn deactivate_subscription(&mut self, user_id: &str) -> Result<Subscription>;
}

/// Number of enrollment rows recorded for one course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CourseEnrollmentCount {
    pub course_id: String,
    pub count: i64,
}

/// Read-only projections over the enrollment table, outside of any unit of work
#[async_trait::async_trait]
pub trait EnrollmentQueries: Send + Sync {
    async fn enrollments_for_course(&self, course_id: &str) -> Result<Vec<Enrollment>>;

    async fn enrollments_for_user(&self, user_id: &str) -> Result<Vec<Enrollment>>;

    /// Row counts per course for rows updated within `[min, max]`, largest first
    async fn enrollment_counts(
        &self,
        min: DateTime<Utc>,
        max: DateTime<Utc>,
    ) -> Result<Vec<CourseEnrollmentCount>>;
}

/// A backing store the HTTP app can run on
pub trait Store: Transactional + EnrollmentQueries + Clone + 'static {}

impl<T> Store for T where T: Transactional + EnrollmentQueries + Clone + 'static {}
