use std::fs::{copy, create_dir_all};

use actix_multipart::form::MultipartForm;
use actix_web::{get, post, put, web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::{
    config::AppConfig,
    error::AppError,
    models::{
        petty_cash::{balance, Movement, MovementRequest, ReceiptMultipartRequest},
        report::image_extension,
        session::issuer,
        site::Site,
    },
};

#[derive(Debug, Deserialize)]
pub struct MovementQuery {
    /// Only the caller's own movements.
    #[serde(default)]
    pub mine: bool,
}

#[get("/sites/{code}/petty-cash")]
pub async fn get_movements(
    code: web::Path<String>,
    query: web::Query<MovementQuery>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let session = issuer(&req)?;
    let user = query.mine.then_some(session.user.as_str());
    Ok(HttpResponse::Ok().json(Movement::find_by_site(&code, user).await?))
}
#[get("/sites/{code}/petty-cash/balance")]
pub async fn get_balance(
    code: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    issuer(&req)?;
    let movements = Movement::find_by_site(&code, None).await?;
    Ok(HttpResponse::Ok().json(balance(&movements)))
}
#[post("/sites/{code}/petty-cash")]
pub async fn create_movement(
    code: web::Path<String>,
    payload: web::Json<MovementRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let session = issuer(&req)?;

    let payload: MovementRequest = payload.into_inner();
    payload.validate()?;

    let site = Site::get(&code).await?;
    let movement = Movement::new(&site.code, payload, &session)?;
    let id = movement.save().await?;
    tracing::info!(
        site = %site.code,
        movement = %id,
        kind = ?movement.kind,
        state = ?movement.state,
        amount = movement.amount,
        "petty cash movement registered"
    );

    Ok(HttpResponse::Created().json(movement))
}
async fn review(movement_id: &str, req: &HttpRequest, approve: bool) -> Result<Movement, AppError> {
    let session = issuer(req)?;
    let mut movement = Movement::find_by_id(movement_id)
        .await?
        .ok_or(AppError::NotFound("MOVEMENT"))?;
    if approve {
        movement.approve(&session)?;
    } else {
        movement.reject(&session)?;
    }
    movement.update().await?;
    tracing::info!(movement = %movement.id, state = ?movement.state, by = %session.user, "petty cash movement reviewed");
    Ok(movement)
}
#[put("/petty-cash/{movement_id}/approve")]
pub async fn approve_movement(
    movement_id: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let movement = review(&movement_id, &req, true).await?;
    Ok(HttpResponse::Ok().json(movement))
}
#[put("/petty-cash/{movement_id}/reject")]
pub async fn reject_movement(
    movement_id: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let movement = review(&movement_id, &req, false).await?;
    Ok(HttpResponse::Ok().json(movement))
}
#[put("/petty-cash/{movement_id}/receipt")]
pub async fn attach_receipt(
    movement_id: web::Path<String>,
    form: MultipartForm<ReceiptMultipartRequest>,
    config: web::Data<AppConfig>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let session = issuer(&req)?;
    let mut movement = Movement::find_by_id(&movement_id)
        .await?
        .ok_or(AppError::NotFound("MOVEMENT"))?;
    if !movement.can_attach(&session) {
        return Err(AppError::Forbidden);
    }

    let original = form.file.file_name.as_deref().unwrap_or_default();
    let extension =
        image_extension(original).ok_or(AppError::Validation("INVALID_RECEIPT_EXTENSION"))?;
    let save_dir = config.receipts_dir();
    create_dir_all(&save_dir)?;

    let name = format!("{}.{}", movement.id, extension);
    copy(form.file.file.path(), save_dir.join(&name))?;
    movement.receipt = Some(name.clone());
    movement.update().await?;

    Ok(HttpResponse::Ok().body(name))
}
