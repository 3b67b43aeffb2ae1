use actix_web::http::header::AUTHORIZATION;
use actix_web::{guard, web, HttpRequest, HttpResponse};

use secrecy::Secret;

use serde::{Deserialize, Serialize};

use crate::client::{
    CatalogClient, CoursePage, NotificationClient, PaymentClient, UserDirectoryClient,
};
use crate::error::{ErrorKind, Result};
use crate::repo::{EnrollmentStore, Store, SubscriptionStore};
use crate::workflow::{
    Checkout, EnrollmentQueryWorkflow, EnrollmentWorkflow, SubscriptionWorkflow,
};

use super::error::RestResult;

#[derive(Debug, Deserialize)]
pub struct EnrollParams {
    user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelCourseParams {
    course_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelFeeParams {
    price: f64,
    /// Tier the course is classified under
    sub_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct CourseUsersParams {
    #[serde(default = "default_only_active")]
    only_active: bool,
}

fn default_only_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page_limit")]
    limit: u32,
    #[serde(default)]
    offset: u32,
}

fn default_page_limit() -> u32 {
    50
}

/// Catalog pages for the courses a user is in, and the ones they left
#[derive(Debug, Default, Serialize)]
pub struct UserCoursePages {
    enrolled: CoursePage,
    unenrolled: CoursePage,
}

/// Treat "nothing to list" as an empty listing
fn or_empty<T: Default>(result: Result<T>) -> Result<T> {
    match result {
        Err(e) if e.kind() == ErrorKind::EmptyResult => {
            tracing::info!("{}", e);
            Ok(T::default())
        }
        other => other,
    }
}

/// Enroll a user in a course from the catalog, charging them for it
#[tracing::instrument(
    name = "Enroll a user in a course",
    skip(enrollments, subscriptions, catalog, payments)
)]
async fn enroll<D>(
    enrollments: web::Data<EnrollmentWorkflow<D>>,
    subscriptions: web::Data<SubscriptionWorkflow<D>>,
    catalog: web::Data<CatalogClient>,
    payments: web::Data<PaymentClient>,
    path: web::Path<(String,)>,
    params: web::Query<EnrollParams>,
) -> RestResult<HttpResponse>
where
    D: Store,
    D::Work: EnrollmentStore + SubscriptionStore,
{
    // Look up the course, the catalog decides its price and tier
    let (course_id,) = path.into_inner();
    let course = catalog.fetch_course(&course_id).await?;

    // Enroll and charge the user, reverting the enrollment if the payment fails
    let checkout = Checkout::new(
        enrollments.get_ref(),
        subscriptions.get_ref(),
        payments.get_ref(),
    );
    let enrollment = checkout.enroll(&params.user_id, &course).await?;

    Ok(HttpResponse::Created().json(enrollment))
}

#[tracing::instrument(name = "Unenroll a user from a course", skip(enrollments))]
async fn unenroll<D>(
    enrollments: web::Data<EnrollmentWorkflow<D>>,
    path: web::Path<(String, String)>,
) -> RestResult<HttpResponse>
where
    D: Store,
    D::Work: EnrollmentStore,
{
    let (course_id, user_id) = path.into_inner();
    let enrollment = enrollments.unenroll(&user_id, &course_id).await?;

    Ok(HttpResponse::Ok().json(enrollment))
}

/// Cancel a course: unenroll all of its students, then tell them about it
#[tracing::instrument(name = "Cancel a course", skip(enrollments, queries, notifications))]
async fn cancel_course<D>(
    enrollments: web::Data<EnrollmentWorkflow<D>>,
    queries: web::Data<EnrollmentQueryWorkflow<D>>,
    notifications: web::Data<NotificationClient>,
    path: web::Path<(String,)>,
    params: web::Query<CancelCourseParams>,
) -> RestResult<HttpResponse>
where
    D: Store,
    D::Work: EnrollmentStore,
{
    let (course_id,) = path.into_inner();

    // Collect the students before their enrollments are deactivated
    let users = queries
        .list_active_users_for_course(&course_id, true)
        .await?;
    let changed = enrollments.unenroll_all(&course_id).await?;
    tracing::info!(changed, "Unenrolled all students");

    // NOTE: The course is already cancelled, a failed notification is only logged
    if let Err(e) = notifications
        .notify_cancellation(&users, &params.course_name)
        .await
    {
        tracing::warn!(error.cause_chain = ?e, "Failed to notify students of cancellation");
    }

    Ok(HttpResponse::NoContent().finish())
}

/// What refunding every active student of a course would cost
#[tracing::instrument(name = "Compute course cancellation fee", skip(subscriptions, queries))]
async fn cancel_fee<D>(
    subscriptions: web::Data<SubscriptionWorkflow<D>>,
    queries: web::Data<EnrollmentQueryWorkflow<D>>,
    path: web::Path<(String,)>,
    params: web::Query<CancelFeeParams>,
) -> RestResult<HttpResponse>
where
    D: Store,
    D::Work: SubscriptionStore,
{
    let (course_id,) = path.into_inner();

    // A course without students costs nothing to cancel
    let users = or_empty(queries.list_active_users_for_course(&course_id, true).await)?;
    let fee = subscriptions
        .cancellation_fee(&users, params.price, params.sub_id)
        .await?;

    Ok(HttpResponse::Ok().json(fee))
}

#[tracing::instrument(name = "List user ids of a course", skip(queries))]
async fn course_user_ids<D>(
    queries: web::Data<EnrollmentQueryWorkflow<D>>,
    path: web::Path<(String,)>,
    params: web::Query<CourseUsersParams>,
) -> RestResult<HttpResponse>
where
    D: Store,
{
    let (course_id,) = path.into_inner();
    let users = or_empty(
        queries
            .list_active_users_for_course(&course_id, params.only_active)
            .await,
    )?;

    Ok(HttpResponse::Ok().json(users))
}

/// Full user records of a course's students, fetched with the caller's credentials
#[tracing::instrument(name = "List users of a course", skip(req, queries, directory))]
async fn course_users<D>(
    req: HttpRequest,
    queries: web::Data<EnrollmentQueryWorkflow<D>>,
    directory: web::Data<UserDirectoryClient>,
    path: web::Path<(String,)>,
    params: web::Query<CourseUsersParams>,
) -> RestResult<HttpResponse>
where
    D: Store,
{
    let (course_id,) = path.into_inner();

    let ids = or_empty(
        queries
            .list_active_users_for_course(&course_id, params.only_active)
            .await,
    )?;
    if ids.is_empty() {
        return Ok(HttpResponse::Ok().json(ids));
    }

    // Forward the caller's credentials to the user directory
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| Secret::new(value.to_string()));
    let users = directory.fetch_users(&ids, authorization.as_ref()).await?;

    Ok(HttpResponse::Ok().json(users))
}

/// Catalog pages of the courses a user is enrolled in and the ones they left
#[tracing::instrument(name = "List courses of a user", skip(queries, catalog))]
async fn user_courses<D>(
    queries: web::Data<EnrollmentQueryWorkflow<D>>,
    catalog: web::Data<CatalogClient>,
    path: web::Path<(String,)>,
    params: web::Query<PageParams>,
) -> RestResult<HttpResponse>
where
    D: Store,
{
    let (user_id,) = path.into_inner();

    // Split the user's course ids into enrolled and unenrolled
    let courses = match queries.list_courses_for_user(&user_id).await {
        Ok(courses) => courses,
        Err(e) if e.kind() == ErrorKind::EmptyResult => {
            return Ok(HttpResponse::Ok().json(UserCoursePages::default()));
        }
        Err(e) => return Err(e.into()),
    };

    // Resolve both id lists against the catalog
    let pages = UserCoursePages {
        enrolled: catalog
            .fetch_courses(&courses.enrolled, params.limit, params.offset)
            .await?,
        unenrolled: catalog
            .fetch_courses(&courses.unenrolled, params.limit, params.offset)
            .await?,
    };

    Ok(HttpResponse::Ok().json(pages))
}

/// Enrollment endpoints. Literal segments are registered before `/{user_id}`, and only answer
/// `GET` so a `PATCH` for a user id spelled like a segment still reaches `unenroll`.
pub fn configure<D>(cfg: &mut web::ServiceConfig)
where
    D: Store,
    D::Work: EnrollmentStore + SubscriptionStore,
{
    cfg.service(
        web::resource("/{course_id}/enrollments")
            .route(web::post().to(enroll::<D>))
            .route(web::patch().to(cancel_course::<D>)),
    )
    .service(
        web::resource("/{course_id}/enrollments/cancel-fee")
            .guard(guard::Get())
            .route(web::get().to(cancel_fee::<D>)),
    )
    .service(
        web::resource("/{course_id}/enrollments/course/id-only")
            .guard(guard::Get())
            .route(web::get().to(course_user_ids::<D>)),
    )
    .service(
        web::resource("/{course_id}/enrollments/course")
            .guard(guard::Get())
            .route(web::get().to(course_users::<D>)),
    )
    .service(
        web::resource("/{user_id}/enrollments/user")
            .guard(guard::Get())
            .route(web::get().to(user_courses::<D>)),
    )
    .service(
        web::resource("/{course_id}/enrollments/{user_id}")
            .route(web::patch().to(unenroll::<D>)),
    );
}
