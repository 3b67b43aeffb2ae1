use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::{Enrollment, NewEnrollment, NewSubscription, Subscription};
use crate::error::{Error, Result};

use super::{
    CourseEnrollmentCount, EnrollmentQueries, EnrollmentStore, SubscriptionStore, Transactional,
    UnitOfWork,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    enrollments: Vec<Enrollment>,
    subscriptions: Vec<Subscription>,
}

/// In-process store.
/// Units of work hold the table lock until they finish, so they never interleave.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Transactional for MemoryStore {
    type Work = MemoryUnitOfWork;

    async fn begin(&self) -> Result<MemoryUnitOfWork> {
        let tables = self.tables.clone().lock_owned().await;
        let snapshot = Some(tables.clone());
        Ok(MemoryUnitOfWork { tables, snapshot })
    }
}

/// Unit of work writing straight into the locked tables.
/// The snapshot taken at `begin` is restored unless the work commits.
#[derive(Debug)]
pub struct MemoryUnitOfWork {
    tables: OwnedMutexGuard<Tables>,
    snapshot: Option<Tables>,
}

impl MemoryUnitOfWork {
    fn restore(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.tables = snapshot;
        }
    }
}

impl Drop for MemoryUnitOfWork {
    fn drop(&mut self) {
        self.restore();
    }
}

#[async_trait::async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(mut self) -> Result<()> {
        self.snapshot = None;
        Ok(())
    }

    async fn rollback(mut self) -> Result<()> {
        self.restore();
        Ok(())
    }
}

#[async_trait::async_trait]
impl EnrollmentStore for MemoryUnitOfWork {
    async fn has_active_enrollment(&mut self, user_id: &str, course_id: &str) -> Result<bool> {
        Ok(self
            .tables
            .enrollments
            .iter()
            .any(|e| e.active && e.user_id == user_id && e.course_id == course_id))
    }

    async fn insert_enrollment(&mut self, enrollment: &NewEnrollment) -> Result<()> {
        if self
            .has_active_enrollment(&enrollment.user_id, &enrollment.course_id)
            .await?
        {
            return Err(Error::UserAlreadyEnrolled);
        }

        self.tables.enrollments.push(Enrollment {
            id: enrollment.id.clone(),
            user_id: enrollment.user_id.clone(),
            course_id: enrollment.course_id.clone(),
            active: true,
            updated_at: Utc::now(),
        });
        Ok(())
    }

    async fn find_enrollment(&mut self, id: &str) -> Result<Option<Enrollment>> {
        Ok(self
            .tables
            .enrollments
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn deactivate_enrollment(
        &mut self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Enrollment> {
        let enrollment = self
            .tables
            .enrollments
            .iter_mut()
            .find(|e| e.active && e.user_id == user_id && e.course_id == course_id)
            .ok_or(Error::UserNotEnrolled)?;

        enrollment.active = false;
        Ok(enrollment.clone())
    }

    async fn deactivate_course_enrollments(&mut self, course_id: &str) -> Result<u64> {
        let mut changed = 0;
        for enrollment in self
            .tables
            .enrollments
            .iter_mut()
            .filter(|e| e.active && e.course_id == course_id)
        {
            enrollment.active = false;
            changed += 1;
        }
        Ok(changed)
    }
}

#[async_trait::async_trait]
impl SubscriptionStore for MemoryUnitOfWork {
    async fn has_active_subscription(&mut self, user_id: &str, sub_id: i32) -> Result<bool> {
        Ok(self
            .tables
            .subscriptions
            .iter()
            .any(|s| s.active && s.user_id == user_id && s.sub_id == sub_id))
    }

    async fn find_active_subscription(&mut self, user_id: &str) -> Result<Option<Subscription>> {
        Ok(self
            .tables
            .subscriptions
            .iter()
            .find(|s| s.active && s.user_id == user_id)
            .cloned())
    }

    async fn insert_subscription(&mut self, subscription: &NewSubscription) -> Result<()> {
        if self
            .find_active_subscription(&subscription.user_id)
            .await?
            .is_some()
        {
            return Err(Error::UserAlreadySubscribed);
        }

        self.tables.subscriptions.push(Subscription {
            id: subscription.id.clone(),
            user_id: subscription.user_id.clone(),
            sub_id: subscription.sub_id,
            active: true,
            updated_at: Utc::now(),
        });
        Ok(())
    }

    async fn find_subscription(&mut self, id: &str) -> Result<Option<Subscription>> {
        Ok(self
            .tables
            .subscriptions
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn deactivate_subscription(&mut self, user_id: &str) -> Result<Subscription> {
        let subscription = self
            .tables
            .subscriptions
            .iter_mut()
            .find(|s| s.active && s.user_id == user_id)
            .ok_or(Error::UserNotSubscribed)?;

        subscription.active = false;
        Ok(subscription.clone())
    }
}

/// NOTE: Locks the tables, so must not be called while a unit of work is open on the same task
#[async_trait::async_trait]
impl EnrollmentQueries for MemoryStore {
    async fn enrollments_for_course(&self, course_id: &str) -> Result<Vec<Enrollment>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .enrollments
            .iter()
            .filter(|e| e.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn enrollments_for_user(&self, user_id: &str) -> Result<Vec<Enrollment>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .enrollments
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn enrollment_counts(
        &self,
        min: DateTime<Utc>,
        max: DateTime<Utc>,
    ) -> Result<Vec<CourseEnrollmentCount>> {
        let tables = self.tables.lock().await;

        let mut per_course: BTreeMap<&str, i64> = BTreeMap::new();
        for enrollment in tables
            .enrollments
            .iter()
            .filter(|e| (min..=max).contains(&e.updated_at))
        {
            *per_course.entry(enrollment.course_id.as_str()).or_default() += 1;
        }

        let mut counts: Vec<CourseEnrollmentCount> = per_course
            .into_iter()
            .map(|(course_id, count)| CourseEnrollmentCount {
                course_id: course_id.to_string(),
                count,
            })
            .collect();
        // Stable sort keeps the course id order among equal counts
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(counts)
    }
}
