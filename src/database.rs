use mongodb::{Client, Database};
use std::sync::OnceLock;

use crate::error::{AppError, AppResult};

static DB: OnceLock<Database> = OnceLock::new();

pub async fn connect(uri: &str, name: &str) -> AppResult<()> {
    let client = Client::with_uri_str(uri).await?;
    if DB.set(client.database(name)).is_err() {
        tracing::warn!("database handle was already initialised");
    }
    tracing::info!(database = name, "document store client ready");
    Ok(())
}

pub fn get_db() -> AppResult<Database> {
    DB.get().cloned().ok_or(AppError::DatabaseUnavailable)
}
