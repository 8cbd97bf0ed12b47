use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::{
    error::AppError,
    models::{
        extra_work::{summarize, ExtraWork, ExtraWorkRequest, ExtraWorkState},
        session::{issuer, manager},
        site::Site,
    },
};

#[derive(Debug, Deserialize)]
pub struct StateRequest {
    pub state: ExtraWorkState,
}

#[get("/sites/{code}/extra-work")]
pub async fn get_extra_works(
    code: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    issuer(&req)?;
    Ok(HttpResponse::Ok().json(ExtraWork::find_by_site(&code).await?))
}
#[get("/sites/{code}/extra-work/summary")]
pub async fn get_extra_work_summary(
    code: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    issuer(&req)?;
    let works = ExtraWork::find_by_site(&code).await?;
    Ok(HttpResponse::Ok().json(summarize(&works)))
}
#[post("/sites/{code}/extra-work")]
pub async fn create_extra_work(
    code: web::Path<String>,
    payload: web::Json<ExtraWorkRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    issuer(&req)?;

    let payload: ExtraWorkRequest = payload.into_inner();
    payload.validate()?;

    let site = Site::get(&code).await?;
    let id = ExtraWork::new(&site.code, payload).save().await?;
    tracing::info!(site = %site.code, extra_work = %id, "extra work registered");

    Ok(HttpResponse::Created().body(id))
}
#[put("/extra-work/{work_id}")]
pub async fn update_extra_work(
    work_id: web::Path<String>,
    payload: web::Json<ExtraWorkRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    manager(&req)?;

    let payload: ExtraWorkRequest = payload.into_inner();
    payload.validate()?;

    let mut work = ExtraWork::find_by_id(&work_id)
        .await?
        .ok_or(AppError::NotFound("EXTRA_WORK"))?;
    work.apply(payload);
    let id = work.update().await?;

    Ok(HttpResponse::Ok().body(id))
}
#[put("/extra-work/{work_id}/state")]
pub async fn advance_extra_work(
    work_id: web::Path<String>,
    payload: web::Json<StateRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    manager(&req)?;

    let mut work = ExtraWork::find_by_id(&work_id)
        .await?
        .ok_or(AppError::NotFound("EXTRA_WORK"))?;
    work.advance(payload.state)?;
    work.update().await?;
    tracing::info!(extra_work = %work.id, state = ?work.state, "extra work state changed");

    Ok(HttpResponse::Ok().json(work))
}
#[delete("/extra-work/{work_id}")]
pub async fn delete_extra_work(
    work_id: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    manager(&req)?;
    let deleted = ExtraWork::delete_by_id(&work_id).await?;
    Ok(HttpResponse::Ok().body(format!("Deleted {} extra work", deleted)))
}
