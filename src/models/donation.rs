use crate::{
    database::get_db,
    error::{AppError, AppResult},
};
use chrono::{Local, NaiveDate};
use futures::stream::StreamExt;
use mongodb::{bson::doc, Collection, Database};
use serde::{Deserialize, Serialize};

use super::lenient::{self, new_id};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DonationKind {
    #[serde(rename = "Efectivo", alias = "efectivo", alias = "cash")]
    Cash,
    #[serde(rename = "Insumo", alias = "insumo", alias = "in_kind")]
    InKind,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Donation {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "obra_codigo")]
    pub site_code: String,
    #[serde(rename = "nombre_donante", default, deserialize_with = "lenient::text")]
    pub donor: String,
    #[serde(rename = "tipo_donacion")]
    pub kind: DonationKind,
    #[serde(rename = "cantidad", default, deserialize_with = "lenient::amount")]
    pub quantity: f64,
    #[serde(rename = "unidad", default)]
    pub unit: Option<String>,
    #[serde(rename = "valor_unitario", default, deserialize_with = "lenient::optional_amount")]
    pub unit_value: Option<f64>,
    #[serde(rename = "valor_total", default, deserialize_with = "lenient::amount")]
    pub total_value: f64,
    #[serde(rename = "descripcion", default, deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(rename = "fecha", default, deserialize_with = "lenient::date")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "fecha_registro", default)]
    pub registered_at: Option<String>,
}
#[derive(Debug, Deserialize, Serialize)]
pub struct DonationRequest {
    pub donor: String,
    pub kind: DonationKind,
    pub quantity: f64,
    pub unit: Option<String>,
    pub unit_value: Option<f64>,
    #[serde(default)]
    pub description: String,
    pub date: Option<NaiveDate>,
}

/// Cash donations are worth their quantity; in-kind donations are valued at
/// quantity times unit value.
pub fn donation_value(kind: DonationKind, quantity: f64, unit_value: Option<f64>) -> f64 {
    match kind {
        DonationKind::Cash => quantity,
        DonationKind::InKind => quantity * unit_value.unwrap_or(0.0),
    }
}

impl DonationRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.donor.trim().is_empty() {
            return Err(AppError::Validation("DONATION_MUST_HAVE_DONOR"));
        }
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(AppError::Validation("DONATION_MUST_HAVE_VALID_QUANTITY"));
        }
        if self.kind == DonationKind::InKind {
            match self.unit_value {
                Some(value) if value.is_finite() && value > 0.0 => (),
                _ => return Err(AppError::Validation("DONATION_MUST_HAVE_VALID_UNIT_VALUE")),
            }
            if self.unit.as_deref().map_or(true, |unit| unit.trim().is_empty()) {
                return Err(AppError::Validation("DONATION_MUST_HAVE_UNIT"));
            }
        }
        Ok(())
    }
}

impl Donation {
    pub fn new(site_code: &str, request: DonationRequest) -> Self {
        let mut donation = Donation {
            id: new_id(),
            site_code: site_code.to_string(),
            donor: String::new(),
            kind: request.kind,
            quantity: 0.0,
            unit: None,
            unit_value: None,
            total_value: 0.0,
            description: String::new(),
            date: None,
            registered_at: Some(Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()),
        };
        donation.apply(request);
        donation
    }
    pub fn apply(&mut self, request: DonationRequest) {
        let (unit, unit_value) = match request.kind {
            DonationKind::Cash => (None, None),
            DonationKind::InKind => (
                request.unit.map(|unit| unit.trim().to_string()),
                request.unit_value,
            ),
        };
        self.donor = request.donor.trim().to_string();
        self.kind = request.kind;
        self.quantity = request.quantity;
        self.total_value = donation_value(request.kind, request.quantity, unit_value);
        self.unit = unit;
        self.unit_value = unit_value;
        self.description = request.description.trim().to_string();
        self.date = Some(request.date.unwrap_or_else(|| Local::now().date_naive()));
    }
    pub async fn save(&self) -> AppResult<String> {
        let db: Database = get_db()?;
        let collection: Collection<Donation> = db.collection::<Donation>("donaciones");

        collection.insert_one(self, None).await?;
        Ok(self.id.clone())
    }
    pub async fn update(&self) -> AppResult<String> {
        let db: Database = get_db()?;
        let collection: Collection<Donation> = db.collection::<Donation>("donaciones");

        let result = collection
            .replace_one(doc! { "_id": &self.id }, self, None)
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound("DONATION"));
        }
        Ok(self.id.clone())
    }
    pub async fn find_by_id(id: &str) -> AppResult<Option<Donation>> {
        let db: Database = get_db()?;
        let collection: Collection<Donation> = db.collection::<Donation>("donaciones");

        Ok(collection.find_one(doc! { "_id": id }, None).await?)
    }
    pub async fn find_by_site(site_code: &str) -> AppResult<Vec<Donation>> {
        let db: Database = get_db()?;
        let collection: Collection<Donation> = db.collection::<Donation>("donaciones");

        let mut donations: Vec<Donation> = Vec::new();
        let mut cursor = collection
            .find(doc! { "obra_codigo": site_code }, None)
            .await?;
        while let Some(donation) = cursor.next().await {
            donations.push(donation?);
        }
        donations.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(donations)
    }
    pub async fn delete_by_id(id: &str) -> AppResult<u64> {
        let db: Database = get_db()?;
        let collection: Collection<Donation> = db.collection::<Donation>("donaciones");

        let result = collection.delete_one(doc! { "_id": id }, None).await?;
        if result.deleted_count == 0 {
            return Err(AppError::NotFound("DONATION"));
        }
        Ok(result.deleted_count)
    }
}
