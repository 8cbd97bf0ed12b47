use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};

use crate::{
    error::AppError,
    models::{
        schedule::{ScheduleItem, ScheduleItemRequest},
        session::{issuer, manager},
        site::Site,
    },
};

#[get("/sites/{code}/schedule")]
pub async fn get_schedule(
    code: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    issuer(&req)?;
    let site = Site::get(&code).await?;
    Ok(HttpResponse::Ok().json(site.schedule))
}
#[post("/sites/{code}/schedule")]
pub async fn create_schedule_item(
    code: web::Path<String>,
    payload: web::Json<ScheduleItemRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let session = issuer(&req)?;

    let payload: ScheduleItemRequest = payload.into_inner();
    payload.validate()?;

    let mut site = Site::get(&code).await?;
    let item = ScheduleItem::new(payload, &session);
    let id = item.id.clone();
    tracing::info!(site = %site.code, item = %id, state = ?item.state, "schedule item added");
    site.schedule.push(item);
    site.update().await?;

    Ok(HttpResponse::Created().body(id))
}
#[put("/sites/{code}/schedule/{item_id}")]
pub async fn update_schedule_item(
    path: web::Path<(String, String)>,
    payload: web::Json<ScheduleItemRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let session = issuer(&req)?;
    let (code, item_id) = path.into_inner();

    let payload: ScheduleItemRequest = payload.into_inner();
    payload.validate()?;

    let mut site = Site::get(&code).await?;
    let item = site.schedule_item_mut(&item_id)?;
    if !item.can_edit(&session) {
        return Err(AppError::Forbidden);
    }
    item.apply(payload);
    site.update().await?;

    Ok(HttpResponse::Ok().body(item_id))
}
#[put("/sites/{code}/schedule/{item_id}/approve")]
pub async fn approve_schedule_item(
    path: web::Path<(String, String)>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let session = manager(&req)?;
    let (code, item_id) = path.into_inner();

    let mut site = Site::get(&code).await?;
    site.schedule_item_mut(&item_id)?.approve()?;
    site.update().await?;
    tracing::info!(site = %code, item = %item_id, by = %session.user, "schedule item approved");

    Ok(HttpResponse::Ok().body(item_id))
}
#[delete("/sites/{code}/schedule/{item_id}")]
pub async fn delete_schedule_item(
    path: web::Path<(String, String)>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    manager(&req)?;
    let (code, item_id) = path.into_inner();

    let mut site = Site::get(&code).await?;
    let item = site.remove_schedule_item(&item_id)?;
    site.update().await?;

    Ok(HttpResponse::Ok().body(format!("Deleted schedule item {}", item.name)))
}
