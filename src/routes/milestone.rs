use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use serde::Serialize;

use crate::{
    error::AppError,
    kpi::{milestone_summary, MilestoneSummary},
    models::{
        milestone::{Milestone, MilestoneRequest},
        session::{issuer, manager},
        site::Site,
    },
};

#[derive(Debug, Serialize)]
struct MilestonesResponse {
    milestones: Vec<Milestone>,
    summary: MilestoneSummary,
}

#[get("/sites/{code}/milestones")]
pub async fn get_milestones(
    code: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    issuer(&req)?;
    let site = Site::get(&code).await?;
    let summary = milestone_summary(&site.milestones);
    Ok(HttpResponse::Ok().json(MilestonesResponse {
        milestones: site.milestones,
        summary,
    }))
}
#[post("/sites/{code}/milestones")]
pub async fn create_milestone(
    code: web::Path<String>,
    payload: web::Json<MilestoneRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let session = issuer(&req)?;

    let payload: MilestoneRequest = payload.into_inner();
    payload.validate()?;

    let mut site = Site::get(&code).await?;
    let milestone = Milestone::new(payload, &session);
    let id = milestone.id.clone();
    site.milestones.push(milestone);
    site.update().await?;
    tracing::info!(site = %site.code, milestone = %id, "payment milestone added");

    Ok(HttpResponse::Created().body(id))
}
#[put("/sites/{code}/milestones/{milestone_id}")]
pub async fn update_milestone(
    path: web::Path<(String, String)>,
    payload: web::Json<MilestoneRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    manager(&req)?;
    let (code, milestone_id) = path.into_inner();

    let payload: MilestoneRequest = payload.into_inner();
    payload.validate()?;

    let mut site = Site::get(&code).await?;
    site.milestone_mut(&milestone_id)?.apply(payload);
    site.update().await?;

    Ok(HttpResponse::Ok().body(milestone_id))
}
#[put("/sites/{code}/milestones/{milestone_id}/paid")]
pub async fn mark_milestone_paid(
    path: web::Path<(String, String)>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    manager(&req)?;
    let (code, milestone_id) = path.into_inner();

    let mut site = Site::get(&code).await?;
    site.milestone_mut(&milestone_id)?.mark_paid()?;
    site.update().await?;
    tracing::info!(site = %code, milestone = %milestone_id, "payment milestone paid");

    Ok(HttpResponse::Ok().body(milestone_id))
}
#[delete("/sites/{code}/milestones/{milestone_id}")]
pub async fn delete_milestone(
    path: web::Path<(String, String)>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    manager(&req)?;
    let (code, milestone_id) = path.into_inner();

    let mut site = Site::get(&code).await?;
    let milestone = site.remove_milestone(&milestone_id)?;
    site.update().await?;

    Ok(HttpResponse::Ok().body(format!("Deleted milestone {}", milestone.description)))
}
