use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{
    lenient::{self, new_id},
    session::SessionContext,
};
use crate::error::{AppError, AppResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentState {
    #[default]
    #[serde(rename = "Pendiente", alias = "pendiente", alias = "Pending")]
    Pending,
    #[serde(
        rename = "Pagado",
        alias = "pagado",
        alias = "Pagada",
        alias = "pagada",
        alias = "paid",
        alias = "Paid"
    )]
    Paid,
}

fn default_creator() -> String {
    lenient::LEGACY_CREATOR.to_string()
}

/// Payment milestone ("hito de pago").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(rename = "descripcion", default, deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(rename = "fecha", default, deserialize_with = "lenient::date")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "monto", default, deserialize_with = "lenient::amount")]
    pub amount: f64,
    #[serde(rename = "estado", default, deserialize_with = "lenient::payment_state")]
    pub state: PaymentState,
    #[serde(rename = "observacion", default, deserialize_with = "lenient::text")]
    pub observation: String,
    #[serde(
        rename = "creado_por",
        default = "default_creator",
        deserialize_with = "lenient::creator"
    )]
    pub created_by: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MilestoneRequest {
    pub description: String,
    pub date: Option<NaiveDate>,
    pub amount: f64,
    #[serde(default)]
    pub state: PaymentState,
    #[serde(default)]
    pub observation: String,
}

impl MilestoneRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.description.trim().is_empty() {
            return Err(AppError::Validation("MILESTONE_MUST_HAVE_DESCRIPTION"));
        }
        if self.date.is_none() {
            return Err(AppError::Validation("MILESTONE_MUST_HAVE_DATE"));
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(AppError::Validation("MILESTONE_MUST_HAVE_VALID_AMOUNT"));
        }
        Ok(())
    }
}

impl Milestone {
    /// Interns can only register pending milestones; the requested state is
    /// honoured for managers.
    pub fn new(request: MilestoneRequest, session: &SessionContext) -> Self {
        let state = if session.is_manager() {
            request.state
        } else {
            PaymentState::Pending
        };
        Milestone {
            id: new_id(),
            description: request.description.trim().to_string(),
            date: request.date,
            amount: request.amount,
            state,
            observation: request.observation.trim().to_string(),
            created_by: session.user.clone(),
        }
    }
    pub fn apply(&mut self, request: MilestoneRequest) {
        self.description = request.description.trim().to_string();
        self.date = request.date;
        self.amount = request.amount;
        self.state = request.state;
        self.observation = request.observation.trim().to_string();
    }
    pub fn mark_paid(&mut self) -> AppResult<()> {
        if self.state == PaymentState::Paid {
            return Err(AppError::Validation("MILESTONE_ALREADY_PAID"));
        }
        self.state = PaymentState::Paid;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::Role;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn request(state: PaymentState) -> MilestoneRequest {
        MilestoneRequest {
            description: "Valorización N°01".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 2, 1),
            amount: 15000.0,
            state,
            observation: " OC pendiente ".to_string(),
        }
    }

    #[test]
    fn interns_cannot_register_paid_milestones() {
        let intern = SessionContext::new("pasante-rinconada", Role::Pasante);
        let milestone = Milestone::new(request(PaymentState::Paid), &intern);
        assert_eq!(milestone.state, PaymentState::Pending);
        assert_eq!(milestone.observation, "OC pendiente");

        let boss = SessionContext::new("jefe", Role::Jefe);
        let mut milestone = Milestone::new(request(PaymentState::Pending), &boss);
        milestone.mark_paid().unwrap();
        assert_matches!(
            milestone.mark_paid(),
            Err(AppError::Validation("MILESTONE_ALREADY_PAID"))
        );
    }

    #[test]
    fn validation_and_legacy_states() {
        let mut invalid = request(PaymentState::Pending);
        invalid.amount = -5.0;
        assert_matches!(
            invalid.validate(),
            Err(AppError::Validation("MILESTONE_MUST_HAVE_VALID_AMOUNT"))
        );

        let legacy: Milestone = serde_json::from_value(json!({
            "descripcion": "Adelanto",
            "fecha": "2024-01-15",
            "monto": 3000,
            "estado": "pagada"
        }))
        .unwrap();
        assert_eq!(legacy.state, PaymentState::Paid);
        assert_eq!(legacy.created_by, "jefe");

        let legacy: Milestone =
            serde_json::from_value(json!({ "descripcion": "Saldo", "monto": 100 })).unwrap();
        assert_eq!(legacy.state, PaymentState::Pending);
    }
}
