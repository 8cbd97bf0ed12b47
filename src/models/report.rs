use actix_multipart::form::{tempfile::TempFile, MultipartForm};
use chrono::{Local, NaiveDate};
use mongodb::bson::{self, Bson, Document};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{
    lenient::{self, new_id},
    session::SessionContext,
    supply::Supply,
};
use crate::{
    curve::extraction::{extract_actual_cost, report_date},
    error::{AppError, AppResult},
};

pub const MAX_DAILY_PROGRESS: f64 = 30.0;
pub const PHOTO_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CostLine {
    #[serde(rename = "descripcion", alias = "Insumo", default, deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(rename = "cantidad", alias = "Cantidad", default, deserialize_with = "lenient::amount")]
    pub quantity: f64,
    #[serde(
        rename = "precio_unitario",
        alias = "Precio Unitario",
        default,
        deserialize_with = "lenient::amount"
    )]
    pub unit_price: f64,
    #[serde(
        rename = "parcial",
        alias = "Parcial (S/)",
        alias = "Parcial (S/.)",
        alias = "Parcial",
        default,
        deserialize_with = "lenient::amount"
    )]
    pub subtotal: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    #[serde(rename = "mano_de_obra", default, deserialize_with = "lenient::or_default")]
    pub labor: Vec<CostLine>,
    #[serde(rename = "materiales", default, deserialize_with = "lenient::or_default")]
    pub materials: Vec<CostLine>,
    #[serde(rename = "equipos", default, deserialize_with = "lenient::or_default")]
    pub equipment: Vec<CostLine>,
    #[serde(rename = "otros", default, deserialize_with = "lenient::or_default")]
    pub other: Vec<CostLine>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CostTotals {
    #[serde(rename = "mano_de_obra", default, deserialize_with = "lenient::amount")]
    pub labor: f64,
    #[serde(rename = "materiales", default, deserialize_with = "lenient::amount")]
    pub materials: f64,
    #[serde(rename = "equipos", default, deserialize_with = "lenient::amount")]
    pub equipment: f64,
    #[serde(rename = "otros", default, deserialize_with = "lenient::amount")]
    pub other: f64,
    #[serde(rename = "total_general", default, deserialize_with = "lenient::amount")]
    pub grand_total: f64,
    #[serde(rename = "total_ejecutado", default, deserialize_with = "lenient::amount")]
    pub executed: f64,
}

/// The work item ("partida") a daily report refers to.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    #[serde(rename = "nombre", default, deserialize_with = "lenient::text")]
    pub name: String,
    /// Expected units per standard eight-hour day.
    #[serde(rename = "rendimiento", default, deserialize_with = "lenient::amount")]
    pub expected_yield: f64,
    #[serde(rename = "unidad", default, deserialize_with = "lenient::text")]
    pub unit: String,
    #[serde(rename = "jornal_horas", default, deserialize_with = "lenient::amount")]
    pub labor_hours: f64,
    #[serde(rename = "cantidad_ejecutada", default, deserialize_with = "lenient::amount")]
    pub executed_quantity: f64,
}

/// Daily report ("parte diario"). Append-only once stored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(
        rename = "fecha",
        alias = "Fecha",
        alias = "date",
        default,
        deserialize_with = "lenient::date"
    )]
    pub date: Option<NaiveDate>,
    #[serde(rename = "responsable", default, deserialize_with = "lenient::text")]
    pub author: String,
    #[serde(
        rename = "avance",
        alias = "avance_pct",
        default,
        deserialize_with = "lenient::amount"
    )]
    pub progress: f64,
    #[serde(
        rename = "obs",
        alias = "observaciones",
        default,
        deserialize_with = "lenient::text"
    )]
    pub notes: String,
    #[serde(rename = "fotos", default, deserialize_with = "lenient::text_list")]
    pub photos: Vec<String>,
    #[serde(rename = "partida", default, deserialize_with = "lenient::or_default")]
    pub work_item: WorkItem,
    #[serde(rename = "costos", default, deserialize_with = "lenient::or_default")]
    pub costs: CostBreakdown,
    #[serde(rename = "totales", default, deserialize_with = "lenient::or_default")]
    pub totals: CostTotals,
    /// Executed cost as resolved when the document was loaded.
    #[serde(skip)]
    pub executed_total: f64,
}

impl DailyReport {
    /// Reads a stored report of any vintage. The date and executed cost are
    /// always resolved from the raw document, even when the rest of the
    /// record does not match the current layout.
    pub fn from_document(document: &Document) -> Self {
        let value = Bson::Document(document.clone()).into_relaxed_extjson();
        let mut report = match serde_json::from_value::<DailyReport>(value.clone()) {
            Ok(report) => report,
            Err(error) => {
                tracing::warn!(%error, "stored report does not match the current layout");
                DailyReport {
                    id: value
                        .get("id")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    ..DailyReport::default()
                }
            }
        };
        report.date = report_date(&value);
        report.executed_total = extract_actual_cost(&value);
        report
    }
    pub fn to_document(&self) -> AppResult<Document> {
        Ok(bson::to_document(self)?)
    }
}

#[derive(Debug, MultipartForm)]
pub struct PhotoMultipartRequest {
    #[multipart(rename = "file")]
    pub files: Vec<TempFile>,
}

/// Lower-cased extension of an uploaded image, `None` for anything but
/// `jpg`, `jpeg` or `png`.
pub fn image_extension(original: &str) -> Option<String> {
    let (_, extension) = original.rsplit_once('.')?;
    let extension = extension.to_lowercase();
    PHOTO_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

/// Stored name of an uploaded photo: `<site>_<date>_<timestamp>_<name>`,
/// keeping only the file name part of `original` and replacing anything
/// outside `[A-Za-z0-9._-]`.
pub fn photo_file_name(
    site_code: &str,
    date: NaiveDate,
    timestamp: &str,
    original: &str,
) -> AppResult<String> {
    image_extension(original).ok_or(AppError::Validation("INVALID_PHOTO_EXTENSION"))?;
    let base = original
        .rsplit(&['/', '\\'][..])
        .next()
        .unwrap_or(original)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>();
    Ok(format!(
        "{}_{}_{}_{}",
        site_code,
        date.format("%Y%m%d"),
        timestamp,
        base
    ))
}

/// Names for one upload request, all checked before anything is stored.
/// Each file gets its position appended to the timestamp so repeated
/// original names stay distinct.
pub fn photo_file_names(
    site_code: &str,
    date: NaiveDate,
    timestamp: &str,
    originals: &[&str],
) -> AppResult<Vec<String>> {
    if originals.is_empty() {
        return Err(AppError::Validation("PHOTOS_REQUIRED"));
    }
    originals
        .iter()
        .enumerate()
        .map(|(index, original)| {
            let timestamp = format!("{}-{}", timestamp, index + 1);
            photo_file_name(site_code, date, &timestamp, original)
        })
        .collect()
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CostLineRequest {
    pub description: String,
    pub quantity: f64,
    pub unit_price: Option<f64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CostBreakdownRequest {
    #[serde(default)]
    pub labor: Vec<CostLineRequest>,
    #[serde(default)]
    pub materials: Vec<CostLineRequest>,
    #[serde(default)]
    pub equipment: Vec<CostLineRequest>,
    #[serde(default)]
    pub other: Vec<CostLineRequest>,
}

impl CostBreakdownRequest {
    fn lines(&self) -> impl Iterator<Item = &CostLineRequest> {
        self.labor
            .iter()
            .chain(self.materials.iter())
            .chain(self.equipment.iter())
            .chain(self.other.iter())
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ReportRequest {
    pub date: Option<NaiveDate>,
    pub progress: f64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub work_item: WorkItem,
    #[serde(default)]
    pub costs: CostBreakdownRequest,
}

impl ReportRequest {
    pub fn validate(&self) -> AppResult<()> {
        if !self.progress.is_finite() || self.progress <= 0.0 || self.progress > MAX_DAILY_PROGRESS
        {
            return Err(AppError::Validation("REPORT_MUST_HAVE_VALID_PROGRESS"));
        }
        if self.costs.lines().next().is_none() {
            return Err(AppError::Validation("REPORT_MUST_HAVE_COST_LINES"));
        }
        for line in self.costs.lines() {
            if line.description.trim().is_empty() {
                return Err(AppError::Validation("COST_LINE_MUST_HAVE_DESCRIPTION"));
            }
            if !line.quantity.is_finite() || line.quantity <= 0.0 {
                return Err(AppError::Validation("COST_LINE_MUST_HAVE_VALID_QUANTITY"));
            }
            if let Some(price) = line.unit_price {
                if !price.is_finite() || price < 0.0 {
                    return Err(AppError::Validation("COST_LINE_MUST_HAVE_VALID_PRICE"));
                }
            }
        }
        Ok(())
    }
}

fn price_lines(lines: Vec<CostLineRequest>, catalog: &[Supply]) -> Vec<CostLine> {
    lines
        .into_iter()
        .map(|line| {
            let unit_price = line
                .unit_price
                .unwrap_or_else(|| Supply::price_of(catalog, &line.description));
            CostLine {
                description: line.description.trim().to_string(),
                quantity: line.quantity,
                unit_price,
                subtotal: line.quantity * unit_price,
            }
        })
        .collect()
}

fn sum_lines(lines: &[CostLine]) -> f64 {
    lines.iter().map(|line| line.subtotal).sum()
}

impl CostTotals {
    pub fn from_breakdown(costs: &CostBreakdown) -> Self {
        let labor = sum_lines(&costs.labor);
        let materials = sum_lines(&costs.materials);
        let equipment = sum_lines(&costs.equipment);
        let other = sum_lines(&costs.other);
        let grand_total = labor + materials + equipment + other;
        CostTotals {
            labor,
            materials,
            equipment,
            other,
            grand_total,
            executed: grand_total,
        }
    }
}

impl DailyReport {
    /// Builds a new report authored by the caller. Cost lines without a unit
    /// price are priced from the supply catalog.
    pub fn new(request: ReportRequest, session: &SessionContext, catalog: &[Supply]) -> Self {
        let costs = CostBreakdown {
            labor: price_lines(request.costs.labor, catalog),
            materials: price_lines(request.costs.materials, catalog),
            equipment: price_lines(request.costs.equipment, catalog),
            other: price_lines(request.costs.other, catalog),
        };
        let totals = CostTotals::from_breakdown(&costs);
        DailyReport {
            id: new_id(),
            date: Some(request.date.unwrap_or_else(|| Local::now().date_naive())),
            author: session.user.clone(),
            progress: request.progress,
            notes: request.notes.trim().to_string(),
            photos: request.photos,
            work_item: request.work_item,
            executed_total: totals.executed,
            costs,
            totals,
        }
    }
}

/// Newest first; undated reports go last.
pub fn sort_newest_first(reports: &mut [DailyReport]) {
    reports.sort_by(|a, b| match (a.date, b.date) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

#[derive(Debug, PartialEq, Serialize)]
pub struct AuthorSummary {
    pub author: String,
    pub reports: usize,
    pub progress_total: f64,
    pub executed_total: f64,
    /// Labour hours reported in the work-item block.
    pub hours_total: f64,
    pub latest_date: Option<NaiveDate>,
}

/// Per-author rollup plus the totals across every author.
#[derive(Debug, PartialEq, Serialize)]
pub struct AuthorReview {
    pub authors: Vec<AuthorSummary>,
    pub reports: usize,
    pub hours_total: f64,
}

pub fn summarize_by_author(reports: &[DailyReport]) -> Vec<AuthorSummary> {
    let mut by_author: BTreeMap<&str, AuthorSummary> = BTreeMap::new();
    for report in reports {
        let author = if report.author.trim().is_empty() {
            "Desconocido"
        } else {
            report.author.as_str()
        };
        let entry = by_author.entry(author).or_insert_with(|| AuthorSummary {
            author: author.to_string(),
            reports: 0,
            progress_total: 0.0,
            executed_total: 0.0,
            hours_total: 0.0,
            latest_date: None,
        });
        entry.reports += 1;
        entry.progress_total += report.progress;
        entry.executed_total += report.executed_total;
        if report.work_item.labor_hours > 0.0 {
            entry.hours_total += report.work_item.labor_hours;
        }
        entry.latest_date = entry.latest_date.max(report.date);
    }
    by_author.into_values().collect()
}

pub fn review_by_author(reports: &[DailyReport]) -> AuthorReview {
    let authors = summarize_by_author(reports);
    AuthorReview {
        reports: reports.len(),
        hours_total: authors.iter().map(|author| author.hours_total).sum(),
        authors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::Role;
    use assert_matches::assert_matches;
    use mongodb::bson::doc;

    fn line(description: &str, quantity: f64, unit_price: Option<f64>) -> CostLineRequest {
        CostLineRequest {
            description: description.to_string(),
            quantity,
            unit_price,
        }
    }

    fn catalog() -> Vec<Supply> {
        vec![Supply {
            id: "s1".to_string(),
            name: "Cemento Sol".to_string(),
            unit: "bolsa".to_string(),
            unit_price: 28.5,
            category: None,
        }]
    }

    #[test]
    fn new_report_prices_lines_and_rolls_up_totals() {
        let session = SessionContext::new("pasante-rinconada", Role::Pasante);
        let request = ReportRequest {
            date: NaiveDate::from_ymd_opt(2024, 1, 5),
            progress: 4.5,
            costs: CostBreakdownRequest {
                labor: vec![line("Operario", 2.0, Some(80.0))],
                materials: vec![line("cemento sol", 10.0, None)],
                other: vec![line("Flete", 1.0, Some(35.0))],
                ..CostBreakdownRequest::default()
            },
            ..ReportRequest::default()
        };
        request.validate().unwrap();

        let report = DailyReport::new(request, &session, &catalog());
        assert_eq!(report.author, "pasante-rinconada");
        assert_eq!(report.costs.materials[0].unit_price, 28.5);
        assert_eq!(report.totals.labor, 160.0);
        assert_eq!(report.totals.materials, 285.0);
        assert_eq!(report.totals.equipment, 0.0);
        assert_eq!(report.totals.grand_total, 480.0);
        assert_eq!(report.executed_total, 480.0);
    }

    #[test]
    fn rejects_incomplete_reports() {
        let empty = ReportRequest {
            progress: 5.0,
            ..ReportRequest::default()
        };
        assert_matches!(
            empty.validate(),
            Err(AppError::Validation("REPORT_MUST_HAVE_COST_LINES"))
        );

        let too_much = ReportRequest {
            progress: 31.0,
            costs: CostBreakdownRequest {
                labor: vec![line("Peón", 1.0, Some(60.0))],
                ..CostBreakdownRequest::default()
            },
            ..ReportRequest::default()
        };
        assert_matches!(
            too_much.validate(),
            Err(AppError::Validation("REPORT_MUST_HAVE_VALID_PROGRESS"))
        );

        let negative = ReportRequest {
            progress: 2.0,
            costs: CostBreakdownRequest {
                equipment: vec![line("Mezcladora", 1.0, Some(-1.0))],
                ..CostBreakdownRequest::default()
            },
            ..ReportRequest::default()
        };
        assert_matches!(
            negative.validate(),
            Err(AppError::Validation("COST_LINE_MUST_HAVE_VALID_PRICE"))
        );
    }

    #[test]
    fn stored_round_trip_keeps_executed_total() {
        let session = SessionContext::new("jefe", Role::Jefe);
        let request = ReportRequest {
            date: NaiveDate::from_ymd_opt(2024, 1, 5),
            progress: 3.0,
            costs: CostBreakdownRequest {
                labor: vec![line("Operario", 1.0, Some(50.0))],
                ..CostBreakdownRequest::default()
            },
            ..ReportRequest::default()
        };
        let report = DailyReport::new(request, &session, &[]);
        let document = report.to_document().unwrap();
        assert_eq!(document.get_str("fecha").unwrap(), "2024-01-05");

        let loaded = DailyReport::from_document(&document);
        assert_eq!(loaded.executed_total, 50.0);
        assert_eq!(loaded, report);
    }

    #[test]
    fn legacy_documents_are_migrated_on_load() {
        let legacy = doc! {
            "Fecha": "2023-11-20 08:15",
            "responsable": "pasante-pachacutec",
            "avance": 5,
            "observaciones": "Vaciado de losa",
            "totales": { "mano_de_obra": 120, "materiales": 300.5 },
            "costos": {
                "materiales": [
                    { "Insumo": "Arena gruesa", "Cantidad": "2", "Precio Unitario": 50, "Parcial (S/)": 100 }
                ]
            }
        };
        let report = DailyReport::from_document(&legacy);
        assert_eq!(report.date, NaiveDate::from_ymd_opt(2023, 11, 20));
        assert_eq!(report.notes, "Vaciado de losa");
        assert_eq!(report.progress, 5.0);
        assert_eq!(report.costs.materials[0].description, "Arena gruesa");
        assert_eq!(report.costs.materials[0].subtotal, 100.0);
        // no recognised total key: categories are summed
        assert_eq!(report.executed_total, 420.5);

        let broken = doc! {
            "fecha": "2023-11-21",
            "responsable": "ana",
            "avance": 5,
            "fotos": "foto1.jpg",
            "partida": "Tarrajeo",
            "costos": { "mano_de_obra": "n/a", "equipos": [{ "Insumo": "Mezcladora", "Cantidad": 1, "Parcial": 40 }] },
            "totales": [50],
            "total": 75.0
        };
        let report = DailyReport::from_document(&broken);
        assert_eq!(report.date, NaiveDate::from_ymd_opt(2023, 11, 21));
        assert_eq!(report.author, "ana");
        assert_eq!(report.progress, 5.0);
        assert_eq!(report.photos, vec!["foto1.jpg"]);
        assert_eq!(report.work_item, WorkItem::default());
        assert!(report.costs.labor.is_empty());
        assert_eq!(report.costs.equipment[0].subtotal, 40.0);
        assert_eq!(report.totals, CostTotals::default());
        assert_eq!(report.executed_total, 75.0);
    }

    #[test]
    fn photo_names() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(
            photo_file_name("rinconada", date, "143005", "C:\\fotos\\losa 1.JPG").unwrap(),
            "rinconada_20240105_143005_losa_1.JPG"
        );
        assert_eq!(
            photo_file_name("rinconada", date, "143005", "../../etc/x.png").unwrap(),
            "rinconada_20240105_143005_x.png"
        );
        assert_matches!(
            photo_file_name("rinconada", date, "143005", "plano.pdf"),
            Err(AppError::Validation("INVALID_PHOTO_EXTENSION"))
        );
        assert_eq!(image_extension("foto.Jpeg").as_deref(), Some("jpeg"));
        assert_eq!(image_extension("sin_extension"), None);
    }

    #[test]
    fn upload_names_are_checked_together_and_unique() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let names = photo_file_names("rinconada", date, "143005", &["losa.jpg", "losa.jpg"]).unwrap();
        assert_eq!(
            names,
            vec![
                "rinconada_20240105_143005-1_losa.jpg",
                "rinconada_20240105_143005-2_losa.jpg"
            ]
        );
        assert_matches!(
            photo_file_names("rinconada", date, "143005", &["losa.jpg", "plano.pdf"]),
            Err(AppError::Validation("INVALID_PHOTO_EXTENSION"))
        );
        assert_matches!(
            photo_file_names("rinconada", date, "143005", &[]),
            Err(AppError::Validation("PHOTOS_REQUIRED"))
        );
    }

    #[test]
    fn sorting_and_author_rollup() {
        let make = |author: &str, date: Option<(i32, u32, u32)>, executed: f64| DailyReport {
            author: author.to_string(),
            date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            progress: 2.0,
            work_item: WorkItem {
                labor_hours: executed / 2.0,
                ..WorkItem::default()
            },
            executed_total: executed,
            ..DailyReport::default()
        };
        let mut reports = vec![
            make("luis", Some((2024, 1, 2)), 10.0),
            make("ana", None, 5.0),
            make("luis", Some((2024, 1, 9)), 20.0),
            make("", Some((2024, 1, 3)), 1.0),
        ];
        sort_newest_first(&mut reports);
        assert_eq!(reports[0].date, NaiveDate::from_ymd_opt(2024, 1, 9));
        assert_eq!(reports[3].author, "ana");

        let summary = summarize_by_author(&reports);
        assert_eq!(summary.len(), 3);
        assert_eq!(summary[0].author, "Desconocido");
        assert_eq!(summary[1].author, "ana");
        assert_eq!(summary[1].latest_date, None);
        assert_eq!(summary[2].reports, 2);
        assert_eq!(summary[2].executed_total, 30.0);
        assert_eq!(summary[2].latest_date, NaiveDate::from_ymd_opt(2024, 1, 9));
        assert_eq!(summary[2].hours_total, 15.0);

        let review = review_by_author(&reports);
        assert_eq!(review.reports, 4);
        assert_eq!(review.hours_total, 18.0);
        assert_eq!(review.authors, summary);
    }
}
