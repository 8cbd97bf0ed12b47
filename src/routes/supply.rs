use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};

use crate::{
    error::AppError,
    models::{
        session::{issuer, manager},
        supply::{Supply, SupplyRequest},
    },
};

#[get("/supplies")]
pub async fn get_supplies(req: HttpRequest) -> Result<HttpResponse, AppError> {
    issuer(&req)?;
    Ok(HttpResponse::Ok().json(Supply::find_many().await?))
}
#[post("/supplies")]
pub async fn create_supply(
    payload: web::Json<SupplyRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    manager(&req)?;

    let payload: SupplyRequest = payload.into_inner();
    payload.validate()?;

    let id = Supply::new(payload).save().await?;
    Ok(HttpResponse::Created().body(id))
}
#[put("/supplies/{supply_id}")]
pub async fn update_supply(
    supply_id: web::Path<String>,
    payload: web::Json<SupplyRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    manager(&req)?;

    let payload: SupplyRequest = payload.into_inner();
    payload.validate()?;

    let mut supply = Supply::new(payload);
    supply.id = supply_id.into_inner();
    let id = supply.update().await?;
    tracing::info!(supply = %id, price = supply.unit_price, "supply price updated");

    Ok(HttpResponse::Ok().body(id))
}
#[delete("/supplies/{supply_id}")]
pub async fn delete_supply(
    supply_id: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    manager(&req)?;
    let deleted = Supply::delete_by_id(&supply_id).await?;
    Ok(HttpResponse::Ok().body(format!("Deleted {} supply", deleted)))
}
