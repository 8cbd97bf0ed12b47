use actix_web::{get, post, put, web, HttpRequest, HttpResponse};

use crate::{
    error::AppError,
    models::{
        session::{issuer, manager},
        site::{Site, SiteRequest, SiteTargetsRequest},
    },
};

#[get("/sites")]
pub async fn get_sites(req: HttpRequest) -> Result<HttpResponse, AppError> {
    issuer(&req)?;
    Ok(HttpResponse::Ok().json(Site::find_many().await?))
}
#[get("/sites/{code}")]
pub async fn get_site(code: web::Path<String>, req: HttpRequest) -> Result<HttpResponse, AppError> {
    issuer(&req)?;
    let site = Site::get(&code).await?;
    Ok(HttpResponse::Ok().json(site.to_response()))
}
#[post("/sites")]
pub async fn create_site(
    payload: web::Json<SiteRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    manager(&req)?;

    let payload: SiteRequest = payload.into_inner();
    payload.validate()?;

    let code = Site::new(payload).save().await?;
    Ok(HttpResponse::Created().body(code))
}
#[put("/sites/{code}/targets")]
pub async fn update_site_targets(
    code: web::Path<String>,
    payload: web::Json<SiteTargetsRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    manager(&req)?;
    payload.validate()?;

    let mut site = Site::get(&code).await?;
    site.apply_targets(&payload);
    site.update().await?;
    tracing::info!(
        site = %site.code,
        budget = site.total_budget,
        programmed = site.programmed_progress,
        "site targets updated"
    );
    Ok(HttpResponse::Ok().json(site.to_response()))
}
