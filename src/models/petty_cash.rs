use crate::{
    database::get_db,
    error::{AppError, AppResult},
};
use actix_multipart::form::{tempfile::TempFile, MultipartForm};
use chrono::Local;
use futures::stream::StreamExt;
use mongodb::{bson::doc, Collection, Database};
use serde::{Deserialize, Serialize};

use super::{
    lenient::{self, new_id},
    session::SessionContext,
};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    #[serde(alias = "Ingreso", alias = "income")]
    Ingreso,
    #[serde(alias = "Egreso", alias = "expense")]
    Egreso,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementState {
    #[serde(rename = "Pendiente", alias = "pendiente")]
    Pending,
    #[serde(rename = "Aprobado", alias = "aprobado")]
    Approved,
    #[serde(rename = "Rechazado", alias = "rechazado")]
    Rejected,
}

/// Petty cash movement ("movimiento de caja chica").
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Movement {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "obra_codigo")]
    pub site_code: String,
    #[serde(rename = "fecha", default, deserialize_with = "lenient::text")]
    pub timestamp: String,
    #[serde(rename = "usuario", default, deserialize_with = "lenient::text")]
    pub user: String,
    #[serde(rename = "tipo")]
    pub kind: MovementKind,
    #[serde(rename = "monto", default, deserialize_with = "lenient::amount")]
    pub amount: f64,
    #[serde(rename = "descripcion", default, deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(rename = "categoria", default, deserialize_with = "lenient::text")]
    pub category: String,
    #[serde(rename = "estado")]
    pub state: MovementState,
    #[serde(rename = "aprobado_por", default)]
    pub approved_by: Option<String>,
    #[serde(rename = "comprobante", default)]
    pub receipt: Option<String>,
}
#[derive(Debug, Deserialize, Serialize)]
pub struct MovementRequest {
    pub kind: MovementKind,
    pub amount: f64,
    pub description: String,
    pub category: String,
}

#[derive(Debug, MultipartForm)]
pub struct ReceiptMultipartRequest {
    #[multipart(rename = "file")]
    pub file: TempFile,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct Balance {
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
    pub pending_expenses: f64,
    pub pending_count: usize,
}

impl MovementRequest {
    pub fn validate(&self) -> AppResult<()> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(AppError::Validation("MOVEMENT_MUST_HAVE_VALID_AMOUNT"));
        }
        if self.description.trim().is_empty() {
            return Err(AppError::Validation("MOVEMENT_MUST_HAVE_DESCRIPTION"));
        }
        if self.category.trim().is_empty() {
            return Err(AppError::Validation("MOVEMENT_MUST_HAVE_CATEGORY"));
        }
        Ok(())
    }
}

impl Movement {
    /// Income is manager-only. Expenses entered by a manager are approved on
    /// entry, those entered by an intern wait for review.
    pub fn new(
        site_code: &str,
        request: MovementRequest,
        session: &SessionContext,
    ) -> AppResult<Self> {
        let (state, approved_by) = match (request.kind, session.is_manager()) {
            (MovementKind::Ingreso, false) => return Err(AppError::Forbidden),
            (_, true) => (MovementState::Approved, Some(session.user.clone())),
            (MovementKind::Egreso, false) => (MovementState::Pending, None),
        };
        Ok(Movement {
            id: new_id(),
            site_code: site_code.to_string(),
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            user: session.user.clone(),
            kind: request.kind,
            amount: request.amount,
            description: request.description.trim().to_string(),
            category: request.category.trim().to_string(),
            state,
            approved_by,
            receipt: None,
        })
    }
    fn review(&mut self, state: MovementState, session: &SessionContext) -> AppResult<()> {
        if !session.is_manager() {
            return Err(AppError::Forbidden);
        }
        if self.state != MovementState::Pending {
            return Err(AppError::Validation("MOVEMENT_ALREADY_REVIEWED"));
        }
        self.state = state;
        self.approved_by = Some(session.user.clone());
        Ok(())
    }
    pub fn approve(&mut self, session: &SessionContext) -> AppResult<()> {
        self.review(MovementState::Approved, session)
    }
    pub fn reject(&mut self, session: &SessionContext) -> AppResult<()> {
        self.review(MovementState::Rejected, session)
    }
    /// Receipts may be attached by the movement's author or a manager.
    pub fn can_attach(&self, session: &SessionContext) -> bool {
        session.is_manager() || self.user == session.user
    }
    pub async fn save(&self) -> AppResult<String> {
        let db: Database = get_db()?;
        let collection: Collection<Movement> = db.collection::<Movement>("movimientos");

        collection.insert_one(self, None).await?;
        Ok(self.id.clone())
    }
    pub async fn update(&self) -> AppResult<String> {
        let db: Database = get_db()?;
        let collection: Collection<Movement> = db.collection::<Movement>("movimientos");

        let result = collection
            .replace_one(doc! { "_id": &self.id }, self, None)
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound("MOVEMENT"));
        }
        Ok(self.id.clone())
    }
    pub async fn find_by_id(id: &str) -> AppResult<Option<Movement>> {
        let db: Database = get_db()?;
        let collection: Collection<Movement> = db.collection::<Movement>("movimientos");

        Ok(collection.find_one(doc! { "_id": id }, None).await?)
    }
    /// Newest first. With `user` set only that user's movements are returned.
    pub async fn find_by_site(site_code: &str, user: Option<&str>) -> AppResult<Vec<Movement>> {
        let db: Database = get_db()?;
        let collection: Collection<Movement> = db.collection::<Movement>("movimientos");

        let mut query = doc! { "obra_codigo": site_code };
        if let Some(user) = user {
            query.insert("usuario", user);
        }

        let mut movements: Vec<Movement> = Vec::new();
        let mut cursor = collection.find(query, None).await?;
        while let Some(movement) = cursor.next().await {
            movements.push(movement?);
        }
        movements.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(movements)
    }
}

pub fn balance(movements: &[Movement]) -> Balance {
    let mut balance = Balance::default();
    for movement in movements {
        match (movement.kind, movement.state) {
            (MovementKind::Ingreso, MovementState::Approved) => balance.income += movement.amount,
            (MovementKind::Egreso, MovementState::Approved) => balance.expenses += movement.amount,
            (MovementKind::Egreso, MovementState::Pending) => {
                balance.pending_expenses += movement.amount;
                balance.pending_count += 1;
            }
            _ => (),
        }
    }
    balance.balance = balance.income - balance.expenses;
    balance
}
