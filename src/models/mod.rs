//! Entity records exchanged between stations and the shared store.

mod customer;
mod product;
mod ticket;
pub mod timestamp;
mod vehicle;

pub use customer::{Customer, CustomerType};
pub use product::Product;
pub use ticket::{Ticket, TicketStatus};
pub use vehicle::Vehicle;

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// The four independent aggregates that take part in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Ticket,
    Customer,
    Vehicle,
    Product,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Ticket,
        EntityKind::Customer,
        EntityKind::Vehicle,
        EntityKind::Product,
    ];

    /// Returns the table holding this kind of record.
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Ticket => "weighing_tickets",
            EntityKind::Customer => "customers",
            EntityKind::Vehicle => "vehicles",
            EntityKind::Product => "products",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Ticket => "ticket",
            EntityKind::Customer => "customer",
            EntityKind::Vehicle => "vehicle",
            EntityKind::Product => "product",
        };
        f.pad(name)
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ticket" | "tickets" | "weighingtickets" => Ok(EntityKind::Ticket),
            "customer" | "customers" => Ok(EntityKind::Customer),
            "vehicle" | "vehicles" => Ok(EntityKind::Vehicle),
            "product" | "products" => Ok(EntityKind::Product),
            _ => Err(format!(
                "Invalid entity kind '{}'. Valid options: ticket, customer, vehicle, product",
                s
            )),
        }
    }
}

/// Fields every synced record carries.
pub trait SyncRecord {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// Logical version used for last-write-wins.
    fn updated_at(&self) -> DateTime<Utc>;

    fn created_at(&self) -> DateTime<Utc>;

    fn set_created_at(&mut self, at: DateTime<Utc>);

    fn is_deleted(&self) -> bool;

    /// A record decoded without `createdAt` was created when it was last written.
    fn fill_created_at(&mut self) {
        if self.created_at() == timestamp::unset() {
            let at = self.updated_at();
            self.set_created_at(at);
        }
    }
}

pub(crate) fn default_true() -> bool {
    true
}
