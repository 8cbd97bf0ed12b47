use actix_web::{get, web, HttpResponse};
use mime_guess::from_path;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::{config::AppConfig, error::AppError};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Photo,
    Receipt,
}

#[derive(Deserialize)]
pub struct FileQueryParams {
    pub kind: FileKind,
    pub name: String,
}

pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(&['/', '\\'][..]) && !name.contains("..")
}

#[get("/files")]
pub async fn get_file(
    query: web::Query<FileQueryParams>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    if !is_safe_name(&query.name) {
        return Err(AppError::Validation("INVALID_FILE_NAME"));
    }
    let dir = match query.kind {
        FileKind::Photo => config.photos_dir(),
        FileKind::Receipt => config.receipts_dir(),
    };
    let path = dir.join(&query.name);
    let file = fs::read(&path).map_err(|_| AppError::NotFound("CONTENT"))?;
    let mime = from_path(&path).first_or_octet_stream();
    Ok(HttpResponse::Ok().content_type(mime).body(file))
}
