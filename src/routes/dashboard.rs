use actix_web::{get, web, HttpRequest, HttpResponse};
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::{
    curve::{build_curve, frequency::Frequency, CurveOptions},
    error::AppError,
    kpi::site_kpis,
    models::{
        donation::Donation,
        session::{issuer, Role},
        site::Site,
    },
};

#[derive(Debug, Default, Deserialize)]
pub struct CurveQuery {
    /// `auto` or missing picks the bucket size from the schedule span.
    pub frequency: Option<String>,
    pub cutoff: Option<NaiveDate>,
    /// Restricts the plan to items whose name contains this text.
    pub item: Option<String>,
}

impl CurveQuery {
    pub fn frequency(&self) -> Option<Frequency> {
        self.frequency
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty() && !raw.eq_ignore_ascii_case("auto"))
            .and_then(|raw| raw.parse().ok())
    }
}

#[derive(Debug, Deserialize)]
pub struct CutoffQuery {
    pub cutoff: Option<NaiveDate>,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[get("/sites/{code}/curve")]
pub async fn get_curve(
    code: web::Path<String>,
    query: web::Query<CurveQuery>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let session = issuer(&req)?;
    let site = Site::get(&code).await?;

    let options = CurveOptions {
        frequency: query.frequency(),
        include_pending: session.role == Role::Pasante,
        cutoff: query.cutoff.unwrap_or_else(today),
        name_filter: query.item.clone().filter(|item| !item.trim().is_empty()),
    };
    let curve = build_curve(&site.schedule, &site.daily_reports(), &options);
    tracing::debug!(
        site = %site.code,
        frequency = curve.frequency_label,
        points = curve.points.len(),
        "curve built"
    );

    Ok(HttpResponse::Ok().json(curve))
}
#[get("/sites/{code}/kpis")]
pub async fn get_kpis(
    code: web::Path<String>,
    query: web::Query<CutoffQuery>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    issuer(&req)?;
    let site = Site::get(&code).await?;
    let donations = Donation::find_by_site(&site.code).await?;
    let cutoff = query.cutoff.unwrap_or_else(today);
    Ok(HttpResponse::Ok().json(site_kpis(&site, &donations, cutoff)))
}
