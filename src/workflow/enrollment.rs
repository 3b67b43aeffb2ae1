use crate::domain::{Enrollment, NewEnrollment};
use crate::error::{Error, Result};
use crate::repo::{finish, EnrollmentStore, Transactional};

/// Enrollment commands, each run inside its own unit of work
#[derive(Debug, Clone)]
pub struct EnrollmentWorkflow<D> {
    store: D,
}

impl<D> EnrollmentWorkflow<D>
where
    D: Transactional,
    D::Work: EnrollmentStore,
{
    pub fn new(store: D) -> Self {
        Self { store }
    }

    #[tracing::instrument(name = "Enroll a user in a course", skip(self))]
    pub async fn enroll(&self, user_id: &str, course_id: &str) -> Result<Enrollment> {
        let mut work = self.store.begin().await?;
        let outcome = enroll_in(&mut work, user_id, course_id).await;
        finish(work, outcome).await
    }

    #[tracing::instrument(name = "Unenroll a user from a course", skip(self))]
    pub async fn unenroll(&self, user_id: &str, course_id: &str) -> Result<Enrollment> {
        let mut work = self.store.begin().await?;
        let outcome = unenroll_from(&mut work, user_id, course_id).await;
        finish(work, outcome).await
    }

    /// Deactivate every active enrollment of a cancelled course
    #[tracing::instrument(name = "Unenroll all users from a course", skip(self))]
    pub async fn unenroll_all(&self, course_id: &str) -> Result<u64> {
        let mut work = self.store.begin().await?;
        let outcome = work.deactivate_course_enrollments(course_id).await;
        finish(work, outcome).await
    }
}

async fn enroll_in<S>(store: &mut S, user_id: &str, course_id: &str) -> Result<Enrollment>
where
    S: EnrollmentStore,
{
    if store.has_active_enrollment(user_id, course_id).await? {
        return Err(Error::UserAlreadyEnrolled);
    }

    let new_enrollment = NewEnrollment::new(user_id, course_id);
    store.insert_enrollment(&new_enrollment).await?;

    store
        .find_enrollment(&new_enrollment.id)
        .await?
        .ok_or(Error::RecordNotFound(new_enrollment.id))
}

async fn unenroll_from<S>(store: &mut S, user_id: &str, course_id: &str) -> Result<Enrollment>
where
    S: EnrollmentStore,
{
    if !store.has_active_enrollment(user_id, course_id).await? {
        return Err(Error::UserNotEnrolled);
    }

    store.deactivate_enrollment(user_id, course_id).await
}
