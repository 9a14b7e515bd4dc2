#[macro_use]
extern crate rocket;

mod api;
mod auth;
mod config;
mod db;
mod env;
mod error;
mod models;
mod telemetry;
#[cfg(test)]
mod test;
mod validation;

use std::str::FromStr;
use std::time::Duration;

use auth::{forbidden_api, unauthorized_api, TokenKeys};
use config::{database_url, AppConfig};
use db::clean_expired_tokens;
use error::AppError;
use rocket::fairing::AdHoc;
use rocket::figment::Figment;
use rocket::{tokio, Build, Rocket};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use telemetry::{init_tracing, shutdown_telemetry, TelemetryFairing};
use thiserror::Error;
use tracing::{error, info};

const TOKEN_CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
    #[error("{0}")]
    Figment(#[from] rocket::figment::Error),
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("{0}")]
    Rocket(#[from] Box<rocket::Error>),
    #[error("Environment error: {0}")]
    Env(#[from] dotenvy::Error),
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

async fn connect(url: &str) -> Result<SqlitePool, Error> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

    Ok(SqlitePoolOptions::new().connect_with(options).await?)
}

fn spawn_token_cleanup(pool: SqlitePool) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;

        loop {
            match clean_expired_tokens(&pool).await {
                Ok(count) if count > 0 => info!("Cleaned up {} expired refresh tokens", count),
                Ok(_) => {}
                Err(e) => error!("Failed to clean expired refresh tokens: {}", e),
            }

            tokio::time::sleep(TOKEN_CLEANUP_INTERVAL).await;
        }
    });
}

#[rocket::main]
async fn main() -> Result<(), Error> {
    env::load_environment()?;
    init_tracing();

    let pool = connect(&database_url()).await?;

    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations completed successfully");

    spawn_token_cleanup(pool.clone());

    let rocket = init_rocket(pool, rocket::Config::figment())?;
    rocket.launch().await.map_err(Box::new)?;

    Ok(())
}

pub fn init_rocket(pool: SqlitePool, figment: Figment) -> Result<Rocket<Build>, Error> {
    info!("Starting course marketplace");

    let config = AppConfig::from_figment(&figment)?;
    let keys = TokenKeys::new(&config);

    Ok(rocket::custom(figment)
        .manage(pool)
        .manage(keys)
        .manage(config)
        .mount("/api", api::routes())
        .register(
            "/api",
            catchers![
                api::bad_request,
                unauthorized_api,
                forbidden_api,
                api::not_found,
                api::unprocessable,
                api::internal_error
            ],
        )
        .attach(TelemetryFairing)
        .attach(AdHoc::on_shutdown("Telemetry shutdown", |_| {
            Box::pin(async move { shutdown_telemetry() })
        })))
}
