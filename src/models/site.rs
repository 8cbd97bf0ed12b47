use crate::{
    database::get_db,
    error::{AppError, AppResult},
};
use futures::stream::StreamExt;
use mongodb::{
    bson::{doc, Document},
    Collection, Database,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{
    lenient::{self, new_id},
    milestone::Milestone,
    report::DailyReport,
    schedule::{ApprovalState, ScheduleItem},
};

/// Site aggregate ("obra"): one document holding the schedule, milestones
/// and the raw daily reports.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Site {
    #[serde(rename = "_id")]
    pub code: String,
    #[serde(rename = "nombre", default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "presupuesto_total", default, deserialize_with = "lenient::amount")]
    pub total_budget: f64,
    #[serde(rename = "avance_programado", default, deserialize_with = "lenient::amount")]
    pub programmed_progress: f64,
    #[serde(rename = "avance", default)]
    pub reports: Vec<Document>,
    #[serde(rename = "cronograma", default)]
    pub schedule: Vec<ScheduleItem>,
    #[serde(rename = "hitos_pago", default)]
    pub milestones: Vec<Milestone>,
}
#[derive(Debug, Deserialize, Serialize)]
pub struct SiteRequest {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub total_budget: f64,
}
#[derive(Debug, Deserialize, Serialize)]
pub struct SiteTargetsRequest {
    pub total_budget: Option<f64>,
    pub programmed_progress: Option<f64>,
}
#[derive(Debug, PartialEq, Serialize)]
pub struct SiteResponse {
    pub code: String,
    pub name: String,
    pub total_budget: f64,
    pub programmed_progress: f64,
    pub reports: usize,
    pub schedule_items: usize,
    pub pending_schedule_items: usize,
    pub milestones: usize,
}

impl SiteRequest {
    pub fn validate(&self) -> AppResult<()> {
        let code_regex: Regex = Regex::new(r"^[A-Za-z0-9_-]{3,}$").unwrap();
        let code = self.code.trim();

        if code.is_empty() {
            return Err(AppError::Validation("SITE_MUST_HAVE_CODE"));
        }
        if !code_regex.is_match(code) {
            return Err(AppError::Validation("SITE_MUST_HAVE_VALID_CODE"));
        }
        if self.name.trim().chars().count() < 5 {
            return Err(AppError::Validation("SITE_MUST_HAVE_VALID_NAME"));
        }
        if !self.total_budget.is_finite() || self.total_budget < 0.0 {
            return Err(AppError::Validation("SITE_MUST_HAVE_VALID_BUDGET"));
        }
        Ok(())
    }
}

impl SiteTargetsRequest {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(budget) = self.total_budget {
            if !budget.is_finite() || budget < 0.0 {
                return Err(AppError::Validation("SITE_MUST_HAVE_VALID_BUDGET"));
            }
        }
        if let Some(progress) = self.programmed_progress {
            if !progress.is_finite() || !(0.0..=100.0).contains(&progress) {
                return Err(AppError::Validation("SITE_MUST_HAVE_VALID_PROGRAMMED_PROGRESS"));
            }
        }
        Ok(())
    }
}

impl Site {
    pub fn new(request: SiteRequest) -> Self {
        Site {
            code: request.code.trim().to_string(),
            name: request.name.trim().to_string(),
            total_budget: request.total_budget,
            programmed_progress: 0.0,
            reports: Vec::new(),
            schedule: Vec::new(),
            milestones: Vec::new(),
        }
    }
    /// Assigns ids to legacy records that were stored without one. Returns
    /// whether anything changed.
    pub fn migrate(&mut self) -> bool {
        let mut changed = false;
        for item in self.schedule.iter_mut().filter(|item| item.id.is_empty()) {
            item.id = new_id();
            changed = true;
        }
        for milestone in self.milestones.iter_mut().filter(|m| m.id.is_empty()) {
            milestone.id = new_id();
            changed = true;
        }
        for report in self.reports.iter_mut() {
            let has_id = matches!(report.get_str("id"), Ok(id) if !id.is_empty());
            if !has_id {
                report.insert("id", new_id());
                changed = true;
            }
        }
        changed
    }
    pub fn daily_reports(&self) -> Vec<DailyReport> {
        self.reports.iter().map(DailyReport::from_document).collect()
    }
    pub fn schedule_item_mut(&mut self, id: &str) -> AppResult<&mut ScheduleItem> {
        self.schedule
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(AppError::NotFound("SCHEDULE_ITEM"))
    }
    pub fn remove_schedule_item(&mut self, id: &str) -> AppResult<ScheduleItem> {
        let index = self
            .schedule
            .iter()
            .position(|item| item.id == id)
            .ok_or(AppError::NotFound("SCHEDULE_ITEM"))?;
        Ok(self.schedule.remove(index))
    }
    pub fn milestone_mut(&mut self, id: &str) -> AppResult<&mut Milestone> {
        self.milestones
            .iter_mut()
            .find(|milestone| milestone.id == id)
            .ok_or(AppError::NotFound("MILESTONE"))
    }
    pub fn remove_milestone(&mut self, id: &str) -> AppResult<Milestone> {
        let index = self
            .milestones
            .iter()
            .position(|milestone| milestone.id == id)
            .ok_or(AppError::NotFound("MILESTONE"))?;
        Ok(self.milestones.remove(index))
    }
    pub fn apply_targets(&mut self, request: &SiteTargetsRequest) {
        if let Some(budget) = request.total_budget {
            self.total_budget = budget;
        }
        if let Some(progress) = request.programmed_progress {
            self.programmed_progress = progress;
        }
    }
    pub fn to_response(&self) -> SiteResponse {
        SiteResponse {
            code: self.code.clone(),
            name: self.name.clone(),
            total_budget: self.total_budget,
            programmed_progress: self.programmed_progress,
            reports: self.reports.len(),
            schedule_items: self.schedule.len(),
            pending_schedule_items: self
                .schedule
                .iter()
                .filter(|item| item.state == ApprovalState::Pending)
                .count(),
            milestones: self.milestones.len(),
        }
    }

    pub async fn save(&self) -> AppResult<String> {
        let db: Database = get_db()?;
        let collection: Collection<Site> = db.collection::<Site>("obras");

        if collection
            .find_one(doc! { "_id": &self.code }, None)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("SITE"));
        }
        collection.insert_one(self, None).await?;
        tracing::info!(site = %self.code, "site created");
        Ok(self.code.clone())
    }
    /// Overwrites the whole site document; concurrent writers race and the
    /// last one wins.
    pub async fn update(&self) -> AppResult<String> {
        let db: Database = get_db()?;
        let collection: Collection<Site> = db.collection::<Site>("obras");

        let result = collection
            .replace_one(doc! { "_id": &self.code }, self, None)
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound("SITE"));
        }
        Ok(self.code.clone())
    }
    pub async fn find_by_code(code: &str) -> AppResult<Option<Site>> {
        let db: Database = get_db()?;
        let collection: Collection<Site> = db.collection::<Site>("obras");

        let site = collection.find_one(doc! { "_id": code }, None).await?;
        match site {
            Some(mut site) => {
                if site.migrate() {
                    tracing::warn!(site = %site.code, "assigned ids to legacy records");
                    site.update().await?;
                }
                Ok(Some(site))
            }
            None => Ok(None),
        }
    }
    pub async fn get(code: &str) -> AppResult<Site> {
        Self::find_by_code(code)
            .await?
            .ok_or(AppError::NotFound("SITE"))
    }
    pub async fn find_many() -> AppResult<Vec<SiteResponse>> {
        let db: Database = get_db()?;
        let collection: Collection<Site> = db.collection::<Site>("obras");

        let mut sites: Vec<SiteResponse> = Vec::new();
        let mut cursor = collection.find(None, None).await?;
        while let Some(site) = cursor.next().await {
            sites.push(site?.to_response());
        }
        sites.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(sites)
    }
    /// Appends a report without rewriting the rest of the document.
    pub async fn push_report(code: &str, report: &DailyReport) -> AppResult<String> {
        let db: Database = get_db()?;
        let collection: Collection<Site> = db.collection::<Site>("obras");

        let result = collection
            .update_one(
                doc! { "_id": code },
                doc! { "$push": { "avance": report.to_document()? } },
                None,
            )
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound("SITE"));
        }
        Ok(report.id.clone())
    }
    pub async fn clear_reports(code: &str) -> AppResult<()> {
        let db: Database = get_db()?;
        let collection: Collection<Site> = db.collection::<Site>("obras");

        let result = collection
            .update_one(doc! { "_id": code }, doc! { "$set": { "avance": [] } }, None)
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound("SITE"));
        }
        tracing::info!(site = code, "daily reports cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::milestone::PaymentState;
    use assert_matches::assert_matches;
    use mongodb::bson;

    fn request(code: &str, name: &str) -> SiteRequest {
        SiteRequest {
            code: code.to_string(),
            name: name.to_string(),
            total_budget: 120000.0,
        }
    }

    #[test]
    fn site_codes_and_names() {
        assert!(request("pachacutec-01", "Ciudad Pachacútec").validate().is_ok());
        assert_matches!(
            request("ab", "La Rinconada").validate(),
            Err(AppError::Validation("SITE_MUST_HAVE_VALID_CODE"))
        );
        assert_matches!(
            request("obra 1", "La Rinconada").validate(),
            Err(AppError::Validation("SITE_MUST_HAVE_VALID_CODE"))
        );
        assert_matches!(
            request("OBRA_1", "Lima").validate(),
            Err(AppError::Validation("SITE_MUST_HAVE_VALID_NAME"))
        );
    }

    #[test]
    fn targets_are_bounded() {
        let targets = SiteTargetsRequest {
            total_budget: None,
            programmed_progress: Some(101.0),
        };
        assert_matches!(targets.validate(), Err(AppError::Validation(_)));

        let mut site = Site::new(request("OBRA_1", "La Rinconada - La Molina"));
        site.apply_targets(&SiteTargetsRequest {
            total_budget: None,
            programmed_progress: Some(40.0),
        });
        assert_eq!(site.total_budget, 120000.0);
        assert_eq!(site.programmed_progress, 40.0);
    }

    #[test]
    fn legacy_documents_get_ids() {
        let stored = doc! {
            "_id": "rinconada",
            "nombre": "La Rinconada - La Molina",
            "presupuesto_total": "85000",
            "avance": [
                { "fecha": "2024-01-05", "totales": { "total_general": 50 } },
                { "id": "r-1", "fecha": "2024-01-06" }
            ],
            "cronograma": [
                { "nombre": "Muros", "fecha_inicio": "2024-01-01", "fecha_fin": "2024-01-10", "monto_planificado": 1000 }
            ]
        };
        let mut site: Site = bson::from_document(stored).unwrap();
        assert_eq!(site.total_budget, 85000.0);
        assert!(site.milestones.is_empty());

        assert!(site.migrate());
        assert!(!site.schedule[0].id.is_empty());
        assert!(site.reports[0].get_str("id").is_ok());
        assert_eq!(site.reports[1].get_str("id").unwrap(), "r-1");
        assert!(!site.migrate());

        let reports = site.daily_reports();
        assert_eq!(reports[0].executed_total, 50.0);

        let response = site.to_response();
        assert_eq!(response.reports, 2);
        assert_eq!(response.pending_schedule_items, 0);
    }

    #[test]
    fn unexpected_states_do_not_break_loading() {
        let stored = doc! {
            "_id": "rinconada",
            "nombre": "La Rinconada - La Molina",
            "cronograma": [
                { "id": "c-1", "nombre": "Muros", "estado": "Rechazado", "creado_por": null,
                  "fecha_inicio": "2024-01-01", "fecha_fin": "2024-01-10", "monto_planificado": 1000 },
                { "id": "c-2", "nombre": "Techo", "estado": "APROBADO", "creado_por": "jefe" },
                { "id": null, "nombre": "Pintura", "estado": null }
            ],
            "hitos_pago": [
                { "id": "h-1", "descripcion": "Adelanto", "monto": 3000, "estado": "PAGADO" },
                { "id": "h-2", "descripcion": "Saldo", "monto": 500, "estado": "observado", "creado_por": 7 }
            ]
        };
        let mut site: Site = bson::from_document(stored).unwrap();

        assert_eq!(site.schedule[0].state, ApprovalState::Pending);
        assert_eq!(site.schedule[0].created_by, "jefe");
        assert_eq!(site.schedule[1].state, ApprovalState::Approved);
        assert_eq!(site.schedule[2].state, ApprovalState::Pending);
        assert!(site.schedule[2].id.is_empty());

        assert_eq!(site.milestones[0].state, PaymentState::Paid);
        assert_eq!(site.milestones[1].state, PaymentState::Pending);
        assert_eq!(site.milestones[1].created_by, "7");

        assert!(site.migrate());
        assert!(!site.schedule[2].id.is_empty());
        assert_eq!(site.to_response().pending_schedule_items, 2);
    }

    #[test]
    fn removing_unknown_items_is_not_found() {
        let mut site = Site::new(request("OBRA_1", "La Rinconada - La Molina"));
        assert_matches!(
            site.remove_schedule_item("nope"),
            Err(AppError::NotFound("SCHEDULE_ITEM"))
        );
        assert_matches!(
            site.milestone_mut("nope"),
            Err(AppError::NotFound("MILESTONE"))
        );
    }
}
