use crate::{
    database::get_db,
    error::{AppError, AppResult},
};
use chrono::{Local, NaiveDate};
use futures::stream::StreamExt;
use mongodb::{bson::doc, Collection, Database};
use serde::{Deserialize, Serialize};

use super::lenient::{self, new_id};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExtraWorkState {
    #[default]
    #[serde(rename = "Por cobrar", alias = "por cobrar")]
    Receivable,
    #[serde(rename = "Aprobado", alias = "aprobado")]
    Approved,
    #[serde(rename = "Cobrado", alias = "cobrado")]
    Collected,
}

/// Work done on site that was not in the original budget.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ExtraWork {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "codigo_obra")]
    pub site_code: String,
    #[serde(rename = "descripcion", default, deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(rename = "fecha", default, deserialize_with = "lenient::date")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "metrado", default, deserialize_with = "lenient::amount")]
    pub quantity: f64,
    #[serde(rename = "unidad", default, deserialize_with = "lenient::text")]
    pub unit: String,
    #[serde(rename = "costo_incurrido", default, deserialize_with = "lenient::amount")]
    pub cost: f64,
    #[serde(rename = "precio_cobro", default, deserialize_with = "lenient::amount")]
    pub price: f64,
    #[serde(rename = "ganancia", default, deserialize_with = "lenient::amount")]
    pub profit: f64,
    #[serde(rename = "estado", default)]
    pub state: ExtraWorkState,
    #[serde(rename = "observaciones", default, deserialize_with = "lenient::text")]
    pub notes: String,
    #[serde(rename = "fecha_creacion", default)]
    pub created_at: Option<String>,
}
#[derive(Debug, Deserialize, Serialize)]
pub struct ExtraWorkRequest {
    pub description: String,
    pub date: Option<NaiveDate>,
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    pub cost: f64,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct ExtraWorkSummary {
    pub total_cost: f64,
    pub total_price: f64,
    pub total_profit: f64,
    pub margin_pct: Option<f64>,
    pub collected_count: usize,
    pub collected_amount: f64,
    pub outstanding_count: usize,
    pub outstanding_amount: f64,
}

impl ExtraWorkRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.description.trim().is_empty() {
            return Err(AppError::Validation("EXTRA_WORK_MUST_HAVE_DESCRIPTION"));
        }
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(AppError::Validation("EXTRA_WORK_MUST_HAVE_VALID_QUANTITY"));
        }
        if !self.cost.is_finite() || self.cost <= 0.0 {
            return Err(AppError::Validation("EXTRA_WORK_MUST_HAVE_VALID_COST"));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(AppError::Validation("EXTRA_WORK_MUST_HAVE_VALID_PRICE"));
        }
        Ok(())
    }
}

impl ExtraWork {
    pub fn new(site_code: &str, request: ExtraWorkRequest) -> Self {
        let mut work = ExtraWork {
            id: new_id(),
            site_code: site_code.to_string(),
            description: String::new(),
            date: None,
            quantity: 0.0,
            unit: String::new(),
            cost: 0.0,
            price: 0.0,
            profit: 0.0,
            state: ExtraWorkState::Receivable,
            notes: String::new(),
            created_at: Some(Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()),
        };
        work.apply(request);
        work
    }
    /// A zero charge price means "charge what it cost".
    pub fn apply(&mut self, request: ExtraWorkRequest) {
        let price = if request.price > 0.0 {
            request.price
        } else {
            request.cost
        };
        self.description = request.description.trim().to_string();
        self.date = Some(request.date.unwrap_or_else(|| Local::now().date_naive()));
        self.quantity = request.quantity;
        self.unit = request.unit.trim().to_uppercase();
        self.cost = request.cost;
        self.price = price;
        self.profit = price - request.cost;
        self.notes = request.notes.trim().to_string();
    }
    /// Moves the record forward in `Por cobrar` → `Aprobado` → `Cobrado`.
    pub fn advance(&mut self, next: ExtraWorkState) -> AppResult<()> {
        if next <= self.state {
            return Err(AppError::Validation("INVALID_STATE_TRANSITION"));
        }
        self.state = next;
        Ok(())
    }
    pub async fn save(&self) -> AppResult<String> {
        let db: Database = get_db()?;
        let collection: Collection<ExtraWork> =
            db.collection::<ExtraWork>("trabajos_adicionales");

        collection.insert_one(self, None).await?;
        Ok(self.id.clone())
    }
    pub async fn update(&self) -> AppResult<String> {
        let db: Database = get_db()?;
        let collection: Collection<ExtraWork> =
            db.collection::<ExtraWork>("trabajos_adicionales");

        let result = collection
            .replace_one(doc! { "_id": &self.id }, self, None)
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound("EXTRA_WORK"));
        }
        Ok(self.id.clone())
    }
    pub async fn find_by_id(id: &str) -> AppResult<Option<ExtraWork>> {
        let db: Database = get_db()?;
        let collection: Collection<ExtraWork> =
            db.collection::<ExtraWork>("trabajos_adicionales");

        Ok(collection.find_one(doc! { "_id": id }, None).await?)
    }
    pub async fn find_by_site(site_code: &str) -> AppResult<Vec<ExtraWork>> {
        let db: Database = get_db()?;
        let collection: Collection<ExtraWork> =
            db.collection::<ExtraWork>("trabajos_adicionales");

        let mut works: Vec<ExtraWork> = Vec::new();
        let mut cursor = collection
            .find(doc! { "codigo_obra": site_code }, None)
            .await?;
        while let Some(work) = cursor.next().await {
            works.push(work?);
        }
        works.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(works)
    }
    pub async fn delete_by_id(id: &str) -> AppResult<u64> {
        let db: Database = get_db()?;
        let collection: Collection<ExtraWork> =
            db.collection::<ExtraWork>("trabajos_adicionales");

        let result = collection.delete_one(doc! { "_id": id }, None).await?;
        if result.deleted_count == 0 {
            return Err(AppError::NotFound("EXTRA_WORK"));
        }
        Ok(result.deleted_count)
    }
}

pub fn summarize(works: &[ExtraWork]) -> ExtraWorkSummary {
    let mut summary = ExtraWorkSummary::default();
    for work in works {
        summary.total_cost += work.cost;
        summary.total_price += work.price;
        if work.state == ExtraWorkState::Collected {
            summary.collected_count += 1;
            summary.collected_amount += work.price;
        } else {
            summary.outstanding_count += 1;
            summary.outstanding_amount += work.price;
        }
    }
    summary.total_profit = summary.total_price - summary.total_cost;
    if summary.total_price > 0.0 {
        summary.margin_pct = Some(summary.total_profit / summary.total_price * 100.0);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request(cost: f64, price: f64) -> ExtraWorkRequest {
        ExtraWorkRequest {
            description: "Cambio de muros vecino".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 4, 2),
            quantity: 12.5,
            unit: " m2 ".to_string(),
            cost,
            price,
            notes: String::new(),
        }
    }

    #[test]
    fn price_defaults_to_cost() {
        let work = ExtraWork::new("rinconada", request(800.0, 0.0));
        assert_eq!(work.price, 800.0);
        assert_eq!(work.profit, 0.0);
        assert_eq!(work.unit, "M2");

        let work = ExtraWork::new("rinconada", request(800.0, 1000.0));
        assert_eq!(work.profit, 200.0);
        assert_eq!(work.state, ExtraWorkState::Receivable);
    }

    #[test]
    fn states_only_move_forward() {
        let mut work = ExtraWork::new("rinconada", request(100.0, 150.0));
        work.advance(ExtraWorkState::Approved).unwrap();
        assert_matches!(
            work.advance(ExtraWorkState::Receivable),
            Err(AppError::Validation("INVALID_STATE_TRANSITION"))
        );
        work.advance(ExtraWorkState::Collected).unwrap();
        assert_matches!(
            work.advance(ExtraWorkState::Collected),
            Err(AppError::Validation("INVALID_STATE_TRANSITION"))
        );
    }

    #[test]
    fn summary_splits_collected_and_outstanding() {
        let mut collected = ExtraWork::new("rinconada", request(100.0, 150.0));
        collected.advance(ExtraWorkState::Collected).unwrap();
        let outstanding = ExtraWork::new("rinconada", request(300.0, 350.0));

        let summary = summarize(&[collected, outstanding]);
        assert_eq!(summary.total_cost, 400.0);
        assert_eq!(summary.total_price, 500.0);
        assert_eq!(summary.total_profit, 100.0);
        assert_eq!(summary.margin_pct, Some(20.0));
        assert_eq!(summary.collected_amount, 150.0);
        assert_eq!(summary.outstanding_count, 1);
        assert!(summarize(&[]).margin_pct.is_none());
    }
}
