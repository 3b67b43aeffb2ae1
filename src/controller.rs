use actix_web::{web, Scope};

use crate::repo::{EnrollmentStore, Store, SubscriptionStore};

pub mod enrollments;
pub mod error;
pub mod metrics;
pub mod subscriptions;

/// All `/subscriptions` endpoints.
/// Resources match in registration order, so literal segments come before bare ids.
pub fn scope<D>() -> Scope
where
    D: Store,
    D::Work: EnrollmentStore + SubscriptionStore,
{
    web::scope("/subscriptions")
        .configure(metrics::configure::<D>)
        .configure(enrollments::configure::<D>)
        .configure(subscriptions::configure::<D>)
}
