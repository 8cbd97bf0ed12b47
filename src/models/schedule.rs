use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{
    lenient::{self, new_id},
    session::SessionContext,
};
use crate::error::{AppError, AppResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalState {
    #[serde(rename = "Pendiente", alias = "pendiente", alias = "Pending")]
    Pending,
    #[default]
    #[serde(rename = "Aprobado", alias = "aprobado", alias = "Approved")]
    Approved,
}

impl ApprovalState {
    pub fn for_creator(session: &SessionContext) -> Self {
        if session.is_manager() {
            ApprovalState::Approved
        } else {
            ApprovalState::Pending
        }
    }
}

fn default_creator() -> String {
    lenient::LEGACY_CREATOR.to_string()
}

/// One line of the valorized schedule ("partida").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(rename = "nombre", default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "fecha_inicio", default, deserialize_with = "lenient::date")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "fecha_fin", default, deserialize_with = "lenient::date")]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "monto_planificado", default, deserialize_with = "lenient::amount")]
    pub planned_amount: f64,
    #[serde(rename = "descripcion", default, deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(rename = "estado", default, deserialize_with = "lenient::approval_state")]
    pub state: ApprovalState,
    #[serde(
        rename = "creado_por",
        default = "default_creator",
        deserialize_with = "lenient::creator"
    )]
    pub created_by: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ScheduleItemRequest {
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub planned_amount: f64,
    #[serde(default)]
    pub description: String,
}

impl ScheduleItemRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("SCHEDULE_ITEM_MUST_HAVE_NAME"));
        }
        let (start, end) = match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(AppError::Validation("SCHEDULE_ITEM_MUST_HAVE_DATES")),
        };
        if end < start {
            return Err(AppError::Validation("INVALID_DATE_RANGE"));
        }
        if !self.planned_amount.is_finite() || self.planned_amount <= 0.0 {
            return Err(AppError::Validation("SCHEDULE_ITEM_MUST_HAVE_VALID_AMOUNT"));
        }
        Ok(())
    }
}

impl ScheduleItem {
    pub fn new(request: ScheduleItemRequest, session: &SessionContext) -> Self {
        ScheduleItem {
            id: new_id(),
            name: request.name.trim().to_string(),
            start_date: request.start_date,
            end_date: request.end_date,
            planned_amount: request.planned_amount,
            description: request.description.trim().to_string(),
            state: ApprovalState::for_creator(session),
            created_by: session.user.clone(),
        }
    }
    /// Interns may only touch their own requests while they are still pending.
    pub fn can_edit(&self, session: &SessionContext) -> bool {
        session.is_manager()
            || (self.state == ApprovalState::Pending && self.created_by == session.user)
    }
    pub fn apply(&mut self, request: ScheduleItemRequest) {
        self.name = request.name.trim().to_string();
        self.start_date = request.start_date;
        self.end_date = request.end_date;
        self.planned_amount = request.planned_amount;
        self.description = request.description.trim().to_string();
    }
    pub fn approve(&mut self) -> AppResult<()> {
        if self.state == ApprovalState::Approved {
            return Err(AppError::Validation("SCHEDULE_ITEM_ALREADY_APPROVED"));
        }
        self.state = ApprovalState::Approved;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::Role;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn request(start: &str, end: &str, amount: f64) -> ScheduleItemRequest {
        ScheduleItemRequest {
            name: " Cimentación ".to_string(),
            start_date: NaiveDate::parse_from_str(start, "%Y-%m-%d").ok(),
            end_date: NaiveDate::parse_from_str(end, "%Y-%m-%d").ok(),
            planned_amount: amount,
            description: String::new(),
        }
    }

    #[test]
    fn validation_codes() {
        assert!(request("2024-01-01", "2024-01-10", 1000.0).validate().is_ok());
        assert!(request("2024-01-10", "2024-01-10", 1.0).validate().is_ok());
        assert_matches!(
            request("2024-01-10", "2024-01-01", 1000.0).validate(),
            Err(AppError::Validation("INVALID_DATE_RANGE"))
        );
        assert_matches!(
            request("2024-01-01", "2024-01-10", 0.0).validate(),
            Err(AppError::Validation("SCHEDULE_ITEM_MUST_HAVE_VALID_AMOUNT"))
        );
        assert_matches!(
            request("", "2024-01-10", 10.0).validate(),
            Err(AppError::Validation("SCHEDULE_ITEM_MUST_HAVE_DATES"))
        );
    }

    #[test]
    fn intern_items_start_pending() {
        let intern = SessionContext::new("pasante-pachacutec", Role::Pasante);
        let boss = SessionContext::new("ing. rojas", Role::Jefe);

        let mut item = ScheduleItem::new(request("2024-01-01", "2024-01-10", 500.0), &intern);
        assert_eq!(item.name, "Cimentación");
        assert_eq!(item.state, ApprovalState::Pending);
        assert_eq!(item.created_by, "pasante-pachacutec");
        assert!(item.can_edit(&intern));
        assert!(!item.can_edit(&SessionContext::new("otro", Role::Pasante)));

        item.approve().unwrap();
        assert!(!item.can_edit(&intern));
        assert!(item.can_edit(&boss));
        assert_matches!(item.approve(), Err(AppError::Validation(_)));

        let item = ScheduleItem::new(request("2024-01-01", "2024-01-10", 500.0), &boss);
        assert_eq!(item.state, ApprovalState::Approved);
    }

    #[test]
    fn legacy_items_default_to_approved_by_manager() {
        let item: ScheduleItem = serde_json::from_value(json!({
            "id": "crono_20240101",
            "nombre": "Tarrajeo",
            "fecha_inicio": "2024-03-01",
            "fecha_fin": "2024-03-15",
            "monto_planificado": "2500"
        }))
        .unwrap();
        assert_eq!(item.state, ApprovalState::Approved);
        assert_eq!(item.created_by, "jefe");
        assert_eq!(item.planned_amount, 2500.0);

        let stored = serde_json::to_value(&item).unwrap();
        assert_eq!(stored["estado"], "Aprobado");
        assert_eq!(stored["fecha_fin"], "2024-03-15");
    }
}
