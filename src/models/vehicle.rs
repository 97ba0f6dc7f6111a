use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{default_true, timestamp, EntityKind, SyncRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    #[serde(default)]
    pub plate_number: String,
    pub vehicle_type: Option<String>,
    /// Empty weight in kilograms.
    pub tare_weight: Option<f64>,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
    pub notes: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "timestamp::unset", deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Vehicle {
    pub fn new(
        id: impl Into<String>,
        plate_number: impl Into<String>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            plate_number: plate_number.into(),
            vehicle_type: None,
            tare_weight: None,
            customer_id: None,
            customer_name: None,
            driver_name: None,
            driver_phone: None,
            notes: None,
            is_active: true,
            created_at: updated_at,
            updated_at,
            is_deleted: false,
        }
    }

    pub fn with_driver(mut self, name: impl Into<String>) -> Self {
        self.driver_name = Some(name.into());
        self
    }
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.plate_number)?;
        writeln!(f, "{}", "=".repeat(self.plate_number.len()))?;
        writeln!(f, "ID: {}", self.id)?;
        if let Some(vehicle_type) = &self.vehicle_type {
            writeln!(f, "Type: {}", vehicle_type)?;
        }
        if let Some(tare) = self.tare_weight {
            writeln!(f, "Tare: {} kg", tare)?;
        }
        if let Some(customer) = &self.customer_name {
            writeln!(f, "Customer: {}", customer)?;
        }
        if let Some(driver) = &self.driver_name {
            writeln!(f, "Driver: {}", driver)?;
        }
        write!(f, "Updated: {}", self.updated_at)
    }
}

impl SyncRecord for Vehicle {
    const KIND: EntityKind = EntityKind::Vehicle;

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
