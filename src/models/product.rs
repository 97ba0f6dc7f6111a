use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{default_true, timestamp, EntityKind, SyncRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_unit")]
    pub unit: Option<String>,
    pub default_price: Option<f64>,
    pub category: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "timestamp::unset", deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_deleted: bool,
}

fn default_unit() -> Option<String> {
    Some("kg".to_string())
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        name: impl Into<String>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: name.into(),
            description: None,
            unit: default_unit(),
            default_price: None,
            category: None,
            is_active: true,
            created_at: updated_at,
            updated_at,
            is_deleted: false,
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.default_price = Some(price);
        self
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.name, self.code)?;
        writeln!(f, "ID: {}", self.id)?;
        if let Some(price) = self.default_price {
            writeln!(f, "Price: {} / {}", price, self.unit.as_deref().unwrap_or("unit"))?;
        }
        if let Some(category) = &self.category {
            writeln!(f, "Category: {}", category)?;
        }
        write!(f, "Updated: {}", self.updated_at)
    }
}

impl SyncRecord for Product {
    const KIND: EntityKind = EntityKind::Product;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn set_created_at(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_defaults_to_kg() {
        let json = r#"{ "id": "P1", "code": "CAT", "name": "Cat vang", "updatedAt": "2025-03-01T08:00:00Z" }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.unit.as_deref(), Some("kg"));
    }

    #[test]
    fn test_explicit_null_unit_is_kept() {
        let json = r#"{ "id": "P1", "unit": null, "updatedAt": "2025-03-01T08:00:00Z" }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert!(product.unit.is_none());
    }
}
