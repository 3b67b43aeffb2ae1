use std::env;
use std::net::TcpListener;

use anyhow::Context;

use sqlx::PgPool;

use subscriptions::app;
use subscriptions::client::Collaborators;
use subscriptions::repo::postgres::PgStore;
use subscriptions::settings::Settings;
use subscriptions::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter =
        env::var("RUST_LOG").unwrap_or_else(|_| telemetry::DEFAULT_ENV_FILTER.into());
    telemetry::set_subscriber(telemetry::create_subscriber(env_filter, std::io::stdout))?;

    let settings = Settings::load().context("Failed to load settings")?;

    let pool = PgPool::connect_with(settings.database.with_db())
        .await
        .context("Failed to connect to the database")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate the database")?;

    let collaborators = Collaborators::from_settings(&settings.services)?;

    let listener = TcpListener::bind(settings.app.addr())?;
    tracing::info!(addr = ?listener.local_addr()?, "Listening");

    app::run(listener, PgStore::new(pool), collaborators)?
        .await
        .context("Failed to run app")
}
