use chrono::{DateTime, Utc};

use serde::Serialize;

use crate::domain::{Tier, TIERS};
use crate::error::{Error, Result};
use crate::repo::{CourseEnrollmentCount, EnrollmentQueries};

/// Courses a user is enrolled in, and courses they left and never rejoined
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct UserCourses {
    pub enrolled: Vec<String>,
    pub unenrolled: Vec<String>,
}

/// Most enrolled courses plus the number of distinct courses seen
#[derive(Debug, PartialEq, Serialize)]
pub struct EnrollmentMetrics {
    pub courses: Vec<CourseEnrollmentCount>,
    pub count: usize,
}

/// The static tier catalog
pub fn tiers() -> &'static [Tier] {
    &TIERS
}

/// Read-only enrollment projections
#[derive(Debug, Clone)]
pub struct EnrollmentQueryWorkflow<Q> {
    queries: Q,
}

impl<Q> EnrollmentQueryWorkflow<Q>
where
    Q: EnrollmentQueries,
{
    pub fn new(queries: Q) -> Self {
        Self { queries }
    }

    #[tracing::instrument(name = "List users of a course", skip(self))]
    pub async fn list_active_users_for_course(
        &self,
        course_id: &str,
        only_active: bool,
    ) -> Result<Vec<String>> {
        let mut users: Vec<String> = Vec::new();
        for enrollment in self.queries.enrollments_for_course(course_id).await? {
            if (enrollment.active || !only_active) && !users.contains(&enrollment.user_id) {
                users.push(enrollment.user_id);
            }
        }

        if users.is_empty() {
            return Err(Error::NoStudentsInCourse);
        }
        Ok(users)
    }

    #[tracing::instrument(name = "List courses of a user", skip(self))]
    pub async fn list_courses_for_user(&self, user_id: &str) -> Result<UserCourses> {
        let enrollments = self.queries.enrollments_for_user(user_id).await?;
        if enrollments.is_empty() {
            return Err(Error::StudentNotEnrolled);
        }

        let mut courses = UserCourses::default();
        for enrollment in enrollments.iter().filter(|e| e.active) {
            if !courses.enrolled.contains(&enrollment.course_id) {
                courses.enrolled.push(enrollment.course_id.clone());
            }
        }
        for enrollment in enrollments.iter().filter(|e| !e.active) {
            if !courses.enrolled.contains(&enrollment.course_id)
                && !courses.unenrolled.contains(&enrollment.course_id)
            {
                courses.unenrolled.push(enrollment.course_id.clone());
            }
        }
        Ok(courses)
    }

    #[tracing::instrument(name = "Compute enrollment metrics", skip(self))]
    pub async fn enrollment_metrics(
        &self,
        limit: usize,
        min: DateTime<Utc>,
        max: DateTime<Utc>,
    ) -> Result<EnrollmentMetrics> {
        let mut courses = self.queries.enrollment_counts(min, max).await?;
        let count = courses.len();
        courses.truncate(limit);

        Ok(EnrollmentMetrics { courses, count })
    }
}
