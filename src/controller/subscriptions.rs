use actix_web::{web, HttpResponse};

use serde::Deserialize;

use crate::client::PaymentClient;
use crate::repo::{EnrollmentStore, Store, SubscriptionStore};
use crate::workflow::{self, Checkout, EnrollmentWorkflow, SubscriptionWorkflow};

use super::error::RestResult;

/// Query parameters for subscribing a user to a tier
#[derive(Debug, Deserialize)]
pub struct SubscribeParams {
    user_id: String,
    sub_id: i32,
}

/// List the tier catalog
#[tracing::instrument(name = "List subscription tiers")]
async fn list_tiers() -> HttpResponse {
    HttpResponse::Ok().json(workflow::tiers())
}

/// Subscribe a user to a tier and charge for it
#[tracing::instrument(
    name = "Create a new subscription",
    skip(enrollments, subscriptions, payments)
)]
async fn create<D>(
    enrollments: web::Data<EnrollmentWorkflow<D>>,
    subscriptions: web::Data<SubscriptionWorkflow<D>>,
    payments: web::Data<PaymentClient>,
    params: web::Query<SubscribeParams>,
) -> RestResult<HttpResponse>
where
    D: Store,
    D::Work: EnrollmentStore + SubscriptionStore,
{
    // Subscribe and charge the user, falling back to the default tier if the payment fails
    let checkout = Checkout::new(
        enrollments.get_ref(),
        subscriptions.get_ref(),
        payments.get_ref(),
    );
    let subscription = checkout.subscribe(&params.user_id, params.sub_id).await?;

    Ok(HttpResponse::Created().json(subscription))
}

/// Tier the user is currently on
#[tracing::instrument(name = "Fetch the tier of a user", skip(subscriptions))]
async fn current_tier<D>(
    subscriptions: web::Data<SubscriptionWorkflow<D>>,
    path: web::Path<(String,)>,
) -> RestResult<HttpResponse>
where
    D: Store,
    D::Work: SubscriptionStore,
{
    let (user_id,) = path.into_inner();
    let tier = subscriptions.current_tier(&user_id).await?;

    Ok(HttpResponse::Ok().json(tier))
}

/// Drop the user back to the default tier
#[tracing::instrument(name = "Unsubscribe a user", skip(subscriptions))]
async fn unsubscribe<D>(
    subscriptions: web::Data<SubscriptionWorkflow<D>>,
    path: web::Path<(String,)>,
) -> RestResult<HttpResponse>
where
    D: Store,
    D::Work: SubscriptionStore,
{
    let (user_id,) = path.into_inner();
    // Unsubscribing moves the user onto the default tier
    let subscription = subscriptions.unsubscribe(&user_id).await?;

    Ok(HttpResponse::Ok().json(subscription))
}

/// Tier endpoints. `/{user_id}` matches any single segment, so this goes last in the scope.
pub fn configure<D>(cfg: &mut web::ServiceConfig)
where
    D: Store,
    D::Work: EnrollmentStore + SubscriptionStore,
{
    cfg.service(
        web::resource("")
            .route(web::get().to(list_tiers))
            .route(web::post().to(create::<D>)),
    )
    .service(
        web::resource("/{user_id}")
            .route(web::get().to(current_tier::<D>))
            .route(web::patch().to(unsubscribe::<D>)),
    );
}
