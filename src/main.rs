#[macro_use]
extern crate rocket;

mod api;
mod auth;
mod collection;
mod config;
mod db;
mod env;
mod error;
mod models;
mod roster;
mod telemetry;
mod timetable;
mod validation;
#[cfg(test)]
mod test;

use std::str::FromStr;

use auth::{forbidden_api, unauthorized_api};
use config::{AppConfig, AuthSettings};
use db::{clean_expired_sessions, ensure_admin};
use env::load_environment;
use error::AppError;
use rocket::figment::Figment;
use rocket::{Build, Rocket, tokio};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use telemetry::{TelemetryFairing, init_tracing};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(anyhow::Error),
    #[error("{0}")]
    Figment(rocket::figment::Error),
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("{0}")]
    Rocket(Box<rocket::Error>),
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Anyhow(value)
    }
}

impl From<rocket::figment::Error> for Error {
    fn from(value: rocket::figment::Error) -> Self {
        Error::Figment(value)
    }
}

impl From<rocket::Error> for Error {
    fn from(value: rocket::Error) -> Self {
        Error::Rocket(Box::new(value))
    }
}

#[rocket::main]
async fn main() -> Result<(), Error> {
    let env_files = load_environment()?;
    let _telemetry = init_tracing()?;
    info!(files = ?env_files, "Loaded environment");

    let figment = rocket::Config::figment();
    let config: AppConfig = figment.extract()?;

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable not set"))?;
    let pool = SqlitePoolOptions::new()
        .connect_with(SqliteConnectOptions::from_str(&database_url)?.create_if_missing(true))
        .await?;

    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations completed successfully");

    let auth = AuthSettings::from_config(&config)?;
    bootstrap_admin(&pool, &config, &auth).await?;

    spawn_session_cleanup(pool.clone(), config.session_cleanup_interval_secs);

    init_rocket(figment, pool, config, auth).launch().await?;

    Ok(())
}

async fn bootstrap_admin(
    pool: &Pool<Sqlite>,
    config: &AppConfig,
    auth: &AuthSettings,
) -> Result<(), AppError> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(());
    };

    let password_hash = auth.hash_password(password)?;
    if ensure_admin(pool, email, &password_hash).await? {
        info!(email = %email, "Created admin account");
    }

    Ok(())
}

fn spawn_session_cleanup(pool: Pool<Sqlite>, interval_secs: u64) {
    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

        loop {
            match clean_expired_sessions(&pool).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} expired sessions", count);
                    }
                }
                Err(e) => {
                    error!("Failed to clean expired sessions: {}", e);
                }
            }

            tokio::time::sleep(tokio::time::Duration::from_secs(interval_secs)).await;
        }
    });
}

pub fn init_rocket(
    figment: Figment,
    pool: Pool<Sqlite>,
    config: AppConfig,
    auth: AuthSettings,
) -> Rocket<Build> {
    info!("Starting camp portal");

    rocket::custom(figment)
        .manage(pool)
        .manage(config)
        .manage(auth)
        .mount("/api", api::routes())
        .register("/api", catchers![unauthorized_api, forbidden_api])
        .attach(TelemetryFairing)
}
