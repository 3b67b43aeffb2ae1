use chrono::{DateTime, Utc};

use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::{Enrollment, NewEnrollment, NewSubscription, Subscription};
use crate::error::{Error, Result};

use super::{
    CourseEnrollmentCount, EnrollmentQueries, EnrollmentStore, SubscriptionStore, Transactional,
    UnitOfWork,
};

/// Postgres store, opens one transaction per unit of work
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Transactional for PgStore {
    type Work = PgUnitOfWork;

    #[tracing::instrument(name = "Begin transaction", skip(self))]
    async fn begin(&self) -> Result<PgUnitOfWork> {
        let tx = self.pool.begin().await?;
        Ok(PgUnitOfWork { tx })
    }
}

/// Unit of work over a single Postgres transaction
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait::async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// Map a violation of the partial unique indexes on active rows to `conflict`
fn unique_violation_as(conflict: Error) -> impl FnOnce(sqlx::Error) -> Error {
    move |error| match error {
        sqlx::Error::Database(ref db_error) if db_error.is_unique_violation() => conflict,
        other => other.into(),
    }
}

#[async_trait::async_trait]
impl EnrollmentStore for PgUnitOfWork {
    #[tracing::instrument(name = "Check for an active enrollment", skip(self))]
    async fn has_active_enrollment(&mut self, user_id: &str, course_id: &str) -> Result<bool> {
        let row: Option<(String,)> = sqlx::query_as(
            "select id from enrollments where user_id=$1 and course_id=$2 and active",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.is_some())
    }

    #[tracing::instrument(name = "Insert enrollment", skip(self))]
    async fn insert_enrollment(&mut self, enrollment: &NewEnrollment) -> Result<()> {
        let updated_at = Utc::now();
        sqlx::query(
            "insert into enrollments(id, user_id, course_id, active, updated_at) \
             values ($1, $2, $3, true, $4)",
        )
        .bind(&enrollment.id)
        .bind(&enrollment.user_id)
        .bind(&enrollment.course_id)
        .bind(updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(unique_violation_as(Error::UserAlreadyEnrolled))?;

        Ok(())
    }

    #[tracing::instrument(name = "Fetch enrollment by id", skip(self))]
    async fn find_enrollment(&mut self, id: &str) -> Result<Option<Enrollment>> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            "select id, user_id, course_id, active, updated_at from enrollments where id=$1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(enrollment)
    }

    #[tracing::instrument(name = "Deactivate enrollment", skip(self))]
    async fn deactivate_enrollment(
        &mut self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Enrollment> {
        sqlx::query_as::<_, Enrollment>(
            "update enrollments set active=false \
             where user_id=$1 and course_id=$2 and active \
             returning id, user_id, course_id, active, updated_at",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(Error::UserNotEnrolled)
    }

    #[tracing::instrument(name = "Deactivate all enrollments of a course", skip(self))]
    async fn deactivate_course_enrollments(&mut self, course_id: &str) -> Result<u64> {
        let result =
            sqlx::query("update enrollments set active=false where course_id=$1 and active")
                .bind(course_id)
                .execute(&mut *self.tx)
                .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl SubscriptionStore for PgUnitOfWork {
    #[tracing::instrument(name = "Check for an active subscription", skip(self))]
    async fn has_active_subscription(&mut self, user_id: &str, sub_id: i32) -> Result<bool> {
        let row: Option<(String,)> = sqlx::query_as(
            "select id from subscriptions where user_id=$1 and sub_id=$2 and active",
        )
        .bind(user_id)
        .bind(sub_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.is_some())
    }

    #[tracing::instrument(name = "Fetch active subscription", skip(self))]
    async fn find_active_subscription(&mut self, user_id: &str) -> Result<Option<Subscription>> {
        let subscription = sqlx::query_as::<_, Subscription>(
            "select id, user_id, sub_id, active, updated_at from subscriptions \
             where user_id=$1 and active",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(subscription)
    }

    #[tracing::instrument(name = "Insert subscription", skip(self))]
    async fn insert_subscription(&mut self, subscription: &NewSubscription) -> Result<()> {
        let updated_at = Utc::now();
        sqlx::query(
            "insert into subscriptions(id, user_id, sub_id, active, updated_at) \
             values ($1, $2, $3, true, $4)",
        )
        .bind(&subscription.id)
        .bind(&subscription.user_id)
        .bind(subscription.sub_id)
        .bind(updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(unique_violation_as(Error::UserAlreadySubscribed))?;

        Ok(())
    }

    #[tracing::instrument(name = "Fetch subscription by id", skip(self))]
    async fn find_subscription(&mut self, id: &str) -> Result<Option<Subscription>> {
        let subscription = sqlx::query_as::<_, Subscription>(
            "select id, user_id, sub_id, active, updated_at from subscriptions where id=$1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(subscription)
    }

    #[tracing::instrument(name = "Deactivate subscription", skip(self))]
    async fn deactivate_subscription(&mut self, user_id: &str) -> Result<Subscription> {
        sqlx::query_as::<_, Subscription>(
            "update subscriptions set active=false \
             where user_id=$1 and active \
             returning id, user_id, sub_id, active, updated_at",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(Error::UserNotSubscribed)
    }
}

#[async_trait::async_trait]
impl EnrollmentQueries for PgStore {
    #[tracing::instrument(name = "Fetch enrollments of a course", skip(self))]
    async fn enrollments_for_course(&self, course_id: &str) -> Result<Vec<Enrollment>> {
        let enrollments = sqlx::query_as::<_, Enrollment>(
            "select id, user_id, course_id, active, updated_at from enrollments \
             where course_id=$1 order by updated_at",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(enrollments)
    }

    #[tracing::instrument(name = "Fetch enrollments of a user", skip(self))]
    async fn enrollments_for_user(&self, user_id: &str) -> Result<Vec<Enrollment>> {
        let enrollments = sqlx::query_as::<_, Enrollment>(
            "select id, user_id, course_id, active, updated_at from enrollments \
             where user_id=$1 order by updated_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(enrollments)
    }

    #[tracing::instrument(name = "Count enrollments per course", skip(self))]
    async fn enrollment_counts(
        &self,
        min: DateTime<Utc>,
        max: DateTime<Utc>,
    ) -> Result<Vec<CourseEnrollmentCount>> {
        let counts = sqlx::query_as::<_, CourseEnrollmentCount>(
            "select course_id, count(*) as count from enrollments \
             where updated_at between $1 and $2 \
             group by course_id \
             order by count(*) desc, course_id",
        )
        .bind(min)
        .bind(max)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }
}
