use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{default_true, timestamp, EntityKind, SyncRecord};

pub const DEFAULT_STATION_ID: &str = "scale-station-01";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Pending => "pending",
            TicketStatus::Completed => "completed",
            TicketStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TicketStatus::Pending),
            "completed" => Ok(TicketStatus::Completed),
            "cancelled" => Ok(TicketStatus::Cancelled),
            _ => Err(format!(
                "Invalid ticket status '{}'. Valid options: pending, completed, cancelled",
                s
            )),
        }
    }
}

/// A weighing ticket recorded at a scale station.
///
/// Image URLs are written by the upload service and carried through sync
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    #[serde(default)]
    pub ticket_number: String,
    #[serde(default)]
    pub vehicle_plate: String,
    pub vehicle_id: Option<String>,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    #[serde(default)]
    pub first_weight: f64,
    #[serde(default)]
    pub second_weight: f64,
    #[serde(default)]
    pub net_weight: f64,
    pub unit_price: Option<f64>,
    pub total_amount: Option<f64>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub first_weigh_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub second_weigh_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: TicketStatus,
    pub notes: Option<String>,
    pub first_weigh_image_url: Option<String>,
    pub second_weigh_image_url: Option<String>,
    pub operator_id: Option<String>,
    pub operator_name: Option<String>,
    #[serde(default = "default_station_id")]
    pub station_id: String,
    #[serde(default = "timestamp::unset", deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default = "default_true")]
    pub is_synced: bool,
}

fn default_station_id() -> String {
    DEFAULT_STATION_ID.to_string()
}

impl Ticket {
    pub fn new(
        id: impl Into<String>,
        ticket_number: impl Into<String>,
        vehicle_plate: impl Into<String>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            ticket_number: ticket_number.into(),
            vehicle_plate: vehicle_plate.into(),
            vehicle_id: None,
            customer_id: None,
            customer_name: None,
            product_id: None,
            product_name: None,
            first_weight: 0.0,
            second_weight: 0.0,
            net_weight: 0.0,
            unit_price: None,
            total_amount: None,
            first_weigh_time: updated_at,
            second_weigh_time: None,
            status: TicketStatus::Pending,
            notes: None,
            first_weigh_image_url: None,
            second_weigh_image_url: None,
            operator_id: None,
            operator_name: None,
            station_id: default_station_id(),
            created_at: updated_at,
            updated_at,
            is_deleted: false,
            is_synced: true,
        }
    }

    pub fn with_station(mut self, station_id: impl Into<String>) -> Self {
        self.station_id = station_id.into();
        self
    }

    /// Records both weighings and derives the net weight.
    pub fn with_weights(mut self, first: f64, second: f64) -> Self {
        self.first_weight = first;
        self.second_weight = second;
        self.net_weight = (first - second).abs();
        self
    }

    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = status;
        self
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ticket {}", self.ticket_number)?;
        writeln!(f, "{}", "=".repeat(7 + self.ticket_number.len()))?;
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Plate: {}", self.vehicle_plate)?;
        if let Some(customer) = &self.customer_name {
            writeln!(f, "Customer: {}", customer)?;
        }
        if let Some(product) = &self.product_name {
            writeln!(f, "Product: {}", product)?;
        }
        writeln!(
            f,
            "Weights: {} / {} (net {}) kg",
            self.first_weight, self.second_weight, self.net_weight
        )?;
        writeln!(f, "Status: {}", self.status)?;
        writeln!(f, "Station: {}", self.station_id)?;
        write!(f, "Updated: {}", self.updated_at)
    }
}

impl SyncRecord for Ticket {
    const KIND: EntityKind = EntityKind::Ticket;

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
