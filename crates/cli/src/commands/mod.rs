//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;

/// Database URL from `STEPUP_DATABASE_URL`, falling back to `DATABASE_URL`.
///
/// Loads `.env` first if present.
fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();
    std::env::var("STEPUP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}

/// Connect using the environment's database URL.
async fn connect() -> Result<PgPool, ConnectError> {
    let url = database_url().ok_or(ConnectError::MissingEnvVar("STEPUP_DATABASE_URL"))?;
    tracing::info!("Connecting to database...");
    Ok(stepup_api::db::create_pool(&url).await?)
}

/// Errors opening the database connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}
