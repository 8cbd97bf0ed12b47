use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use serde::Serialize;

use crate::{
    error::AppError,
    kpi::{budget_impact, donation_summary, BudgetImpact, DonationSummary},
    models::{
        donation::{Donation, DonationRequest},
        session::{issuer, manager},
        site::Site,
    },
};

#[derive(Debug, Serialize)]
struct DonationOverview {
    summary: DonationSummary,
    budget_impact: BudgetImpact,
}

#[get("/sites/{code}/donations")]
pub async fn get_donations(
    code: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    issuer(&req)?;
    Ok(HttpResponse::Ok().json(Donation::find_by_site(&code).await?))
}
#[get("/sites/{code}/donations/summary")]
pub async fn get_donation_summary(
    code: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    issuer(&req)?;
    let site = Site::get(&code).await?;
    let donations = Donation::find_by_site(&site.code).await?;
    Ok(HttpResponse::Ok().json(DonationOverview {
        summary: donation_summary(&donations),
        budget_impact: budget_impact(site.total_budget, &donations),
    }))
}
#[post("/sites/{code}/donations")]
pub async fn create_donation(
    code: web::Path<String>,
    payload: web::Json<DonationRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let session = issuer(&req)?;

    let payload: DonationRequest = payload.into_inner();
    payload.validate()?;

    let site = Site::get(&code).await?;
    let id = Donation::new(&site.code, payload).save().await?;
    tracing::info!(site = %site.code, donation = %id, by = %session.user, "donation registered");

    Ok(HttpResponse::Created().body(id))
}
#[put("/donations/{donation_id}")]
pub async fn update_donation(
    donation_id: web::Path<String>,
    payload: web::Json<DonationRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    manager(&req)?;

    let payload: DonationRequest = payload.into_inner();
    payload.validate()?;

    let mut donation = Donation::find_by_id(&donation_id)
        .await?
        .ok_or(AppError::NotFound("DONATION"))?;
    donation.apply(payload);
    let id = donation.update().await?;

    Ok(HttpResponse::Ok().body(id))
}
#[delete("/donations/{donation_id}")]
pub async fn delete_donation(
    donation_id: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    manager(&req)?;
    let deleted = Donation::delete_by_id(&donation_id).await?;
    Ok(HttpResponse::Ok().body(format!("Deleted {} donation", deleted)))
}
