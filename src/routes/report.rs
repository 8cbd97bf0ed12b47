use std::fs::{copy, create_dir_all};

use actix_multipart::form::MultipartForm;
use actix_web::{delete, get, post, web, HttpRequest, HttpResponse};
use chrono::Local;

use crate::{
    config::AppConfig,
    error::AppError,
    models::{
        report::{
            photo_file_names, review_by_author, sort_newest_first, DailyReport,
            PhotoMultipartRequest, ReportRequest,
        },
        session::{issuer, manager},
        site::Site,
        supply::Supply,
    },
    share::{report_message, share_link, ShareRequest},
};

#[get("/sites/{code}/reports")]
pub async fn get_reports(
    code: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    issuer(&req)?;
    let site = Site::get(&code).await?;
    let mut reports = site.daily_reports();
    sort_newest_first(&mut reports);
    Ok(HttpResponse::Ok().json(reports))
}
#[get("/sites/{code}/reports/authors")]
pub async fn get_report_authors(
    code: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    manager(&req)?;
    let site = Site::get(&code).await?;
    Ok(HttpResponse::Ok().json(review_by_author(&site.daily_reports())))
}
#[post("/sites/{code}/reports")]
pub async fn create_report(
    code: web::Path<String>,
    payload: web::Json<ReportRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let session = issuer(&req)?;

    let payload: ReportRequest = payload.into_inner();
    payload.validate()?;

    let catalog = Supply::find_many().await?;
    let report = DailyReport::new(payload, &session, &catalog);
    let id = Site::push_report(&code, &report).await?;
    tracing::info!(
        site = %code,
        report = %id,
        author = %report.author,
        executed = report.executed_total,
        "daily report submitted"
    );

    Ok(HttpResponse::Created().json(report))
}
#[delete("/sites/{code}/reports")]
pub async fn clear_reports(
    code: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    manager(&req)?;
    Site::clear_reports(&code).await?;
    Ok(HttpResponse::Ok().body("REPORTS_CLEARED"))
}
#[post("/sites/{code}/photos")]
pub async fn upload_photos(
    code: web::Path<String>,
    form: MultipartForm<PhotoMultipartRequest>,
    config: web::Data<AppConfig>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    issuer(&req)?;
    let site = Site::get(&code).await?;

    let now = Local::now();
    let timestamp = now.format("%H%M%S%3f").to_string();
    let originals: Vec<&str> = form
        .files
        .iter()
        .map(|file| file.file_name.as_deref().unwrap_or_default())
        .collect();
    let names = photo_file_names(&site.code, now.date_naive(), &timestamp, &originals)?;

    let save_dir = config.photos_dir();
    create_dir_all(&save_dir)?;
    for (file, name) in form.files.iter().zip(&names) {
        copy(file.file.path(), save_dir.join(name))?;
    }
    tracing::debug!(site = %site.code, count = names.len(), "photos stored");

    Ok(HttpResponse::Created().json(names))
}
#[post("/sites/{code}/reports/{report_id}/share")]
pub async fn share_report(
    path: web::Path<(String, String)>,
    payload: web::Json<ShareRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    issuer(&req)?;
    let (code, report_id) = path.into_inner();

    let site = Site::get(&code).await?;
    let report = site
        .daily_reports()
        .into_iter()
        .find(|report| report.id == report_id)
        .ok_or(AppError::NotFound("REPORT"))?;

    let payload: ShareRequest = payload.into_inner();
    let message = report_message(&site.name, &report, payload.notes.as_deref());
    let link = share_link(payload.country, &payload.number, message)?;

    Ok(HttpResponse::Ok().json(link))
}
