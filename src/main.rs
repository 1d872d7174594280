use std::time::Duration;

use actix_web::{web, App, HttpServer};
use course_platform::{config::Config, errors::AppError, gateway::Gateway, handlers, payments::Stripe, storage::ObjectStore, GlobalState};
use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> Result<(), AppError> {

    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "course_platform=info,actix_web=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
    .max_connections(5)
    .connect(&config.database_url)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "database connection failed");
        AppError::DbConnect
    })?;

    sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "migrations failed");
        AppError::Migrate
    })?;

    let storage = ObjectStore::from_env(config.s3_bucket.clone(), config.s3_endpoint.as_deref()).await;
    let stripe = Stripe::new(config.stripe_api_base.clone(), config.stripe_secret_key.clone(), config.stripe_price_id.clone(), config.app_url.clone());
    let gateway = Gateway::new(config.rate_limit_max, config.rate_limit_window);
    let address = config.bind_address.clone();

    let global_state = GlobalState{pool, config, gateway, stripe, storage};

    let app_data = web::Data::new(global_state);

    let sweeper = app_data.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            sweeper.gateway.cleanup();
        }
    });

    tracing::info!(%address, "server running");

    HttpServer::new(
        move||{
            App::new()
            .app_data(app_data.clone())
            .configure(handlers::routes)
        }
    ).bind(&address)
    .map_err(|_e|AppError::SocketBind)?
    .run()
    .await
    .map_err(|_e|AppError::ServerStart)?;

    Ok(())

}
