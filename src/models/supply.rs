use crate::{
    database::get_db,
    error::{AppError, AppResult},
};
use futures::stream::StreamExt;
use mongodb::{bson::doc, Collection, Database};
use serde::{Deserialize, Serialize};

use super::lenient::{self, new_id};

/// Catalog entry ("insumo") used to price report cost lines.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Supply {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "Insumo", default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "Unidad", default, deserialize_with = "lenient::text")]
    pub unit: String,
    #[serde(rename = "Precio Unitario", default, deserialize_with = "lenient::amount")]
    pub unit_price: f64,
    #[serde(rename = "Categoria", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}
#[derive(Debug, Deserialize, Serialize)]
pub struct SupplyRequest {
    pub name: String,
    pub unit: String,
    pub unit_price: f64,
    pub category: Option<String>,
}

impl SupplyRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("SUPPLY_MUST_HAVE_NAME"));
        }
        if self.unit.trim().is_empty() {
            return Err(AppError::Validation("SUPPLY_MUST_HAVE_UNIT"));
        }
        if !self.unit_price.is_finite() || self.unit_price < 0.0 {
            return Err(AppError::Validation("SUPPLY_MUST_HAVE_VALID_PRICE"));
        }
        Ok(())
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

impl Supply {
    pub fn new(request: SupplyRequest) -> Self {
        Supply {
            id: new_id(),
            name: request.name.trim().to_string(),
            unit: request.unit.trim().to_string(),
            unit_price: request.unit_price,
            category: request.category.filter(|category| !category.trim().is_empty()),
        }
    }
    /// Catalog price for a supply name, `0` when the name is unknown.
    pub fn price_of(catalog: &[Supply], name: &str) -> f64 {
        catalog
            .iter()
            .find(|supply| same_name(&supply.name, name))
            .map(|supply| supply.unit_price)
            .unwrap_or(0.0)
    }
    pub fn is_duplicate(catalog: &[Supply], name: &str, except_id: Option<&str>) -> bool {
        catalog
            .iter()
            .any(|supply| same_name(&supply.name, name) && Some(supply.id.as_str()) != except_id)
    }
    pub async fn save(&self) -> AppResult<String> {
        let db: Database = get_db()?;
        let collection: Collection<Supply> = db.collection::<Supply>("insumos");

        if Self::is_duplicate(&Self::find_many().await?, &self.name, None) {
            return Err(AppError::Conflict("SUPPLY"));
        }
        collection.insert_one(self, None).await?;
        Ok(self.id.clone())
    }
    pub async fn update(&self) -> AppResult<String> {
        let db: Database = get_db()?;
        let collection: Collection<Supply> = db.collection::<Supply>("insumos");

        if Self::is_duplicate(&Self::find_many().await?, &self.name, Some(&self.id)) {
            return Err(AppError::Conflict("SUPPLY"));
        }
        let result = collection
            .replace_one(doc! { "_id": &self.id }, self, None)
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound("SUPPLY"));
        }
        Ok(self.id.clone())
    }
    pub async fn find_many() -> AppResult<Vec<Supply>> {
        let db: Database = get_db()?;
        let collection: Collection<Supply> = db.collection::<Supply>("insumos");

        let mut supplies: Vec<Supply> = Vec::new();
        let mut cursor = collection.find(None, None).await?;
        while let Some(supply) = cursor.next().await {
            supplies.push(supply?);
        }
        supplies.sort_by_key(|supply| supply.name.to_lowercase());
        Ok(supplies)
    }
    pub async fn delete_by_id(id: &str) -> AppResult<u64> {
        let db: Database = get_db()?;
        let collection: Collection<Supply> = db.collection::<Supply>("insumos");

        let result = collection.delete_one(doc! { "_id": id }, None).await?;
        if result.deleted_count == 0 {
            return Err(AppError::NotFound("SUPPLY"));
        }
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn supply(id: &str, name: &str, price: f64) -> Supply {
        Supply {
            id: id.to_string(),
            name: name.to_string(),
            unit: "und".to_string(),
            unit_price: price,
            category: None,
        }
    }

    #[test]
    fn lookups_ignore_case_and_padding() {
        let catalog = vec![supply("a", "Fierro 1/2\"", 42.0), supply("b", "Arena fina", 55.0)];
        assert_eq!(Supply::price_of(&catalog, " ARENA FINA "), 55.0);
        assert_eq!(Supply::price_of(&catalog, "Ladrillo"), 0.0);
        assert!(Supply::is_duplicate(&catalog, "arena fina", None));
        assert!(!Supply::is_duplicate(&catalog, "arena fina", Some("b")));
    }

    #[test]
    fn request_validation() {
        let mut request = SupplyRequest {
            name: "Clavos".to_string(),
            unit: "kg".to_string(),
            unit_price: 0.0,
            category: Some("  ".to_string()),
        };
        assert!(request.validate().is_ok());
        assert_eq!(Supply::new(request).category, None);

        request = SupplyRequest {
            name: "Clavos".to_string(),
            unit: " ".to_string(),
            unit_price: 5.0,
            category: None,
        };
        assert_matches!(
            request.validate(),
            Err(AppError::Validation("SUPPLY_MUST_HAVE_UNIT"))
        );
    }
}
