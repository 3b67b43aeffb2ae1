use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::{get, HttpResponse, Responder};
use actix_web::{web, App, HttpServer};

use tracing_actix_web::TracingLogger;

use crate::client::Collaborators;
use crate::controller;
use crate::repo::{EnrollmentStore, Store, SubscriptionStore};
use crate::workflow::{EnrollmentQueryWorkflow, EnrollmentWorkflow, SubscriptionWorkflow};

/// Simple health-check endpoint
#[tracing::instrument(name = "Health check")]
#[get("/health_check")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().finish()
}

/// Run the application on a specified TCP listener
pub fn run<D>(
    listener: TcpListener,
    store: D,
    collaborators: Collaborators,
) -> anyhow::Result<Server>
where
    D: Store,
    D::Work: EnrollmentStore + SubscriptionStore,
{
    // Wrap application data
    // NOTE: Every workflow shares the same store, clones only copy the handle
    let enrollments = web::Data::new(EnrollmentWorkflow::new(store.clone()));
    let subscriptions = web::Data::new(SubscriptionWorkflow::new(store.clone()));
    let queries = web::Data::new(EnrollmentQueryWorkflow::new(store));

    let Collaborators {
        catalog,
        payments,
        notifications,
        users,
    } = collaborators;
    // Share the collaborator clients (and their connection pools) between workers
    let catalog = web::Data::new(catalog);
    let payments = web::Data::new(payments);
    let notifications = web::Data::new(notifications);
    let users = web::Data::new(users);

    // Start the server
    let server = HttpServer::new(move || {
        App::new()
            // Request logging
            .wrap(TracingLogger::default())
            // Application data
            .app_data(enrollments.clone())
            .app_data(subscriptions.clone())
            .app_data(queries.clone())
            .app_data(catalog.clone())
            .app_data(payments.clone())
            .app_data(notifications.clone())
            .app_data(users.clone())
            // Routes
            .service(health_check)
            .service(controller::scope::<D>())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
