use chrono::Utc;
use clap::Args;
use serde::Serialize;
use std::fmt::Display;

use super::OutputFormat;
use tramcan_sync::db::{EntityStore, StoreSession, StoredRecord};
use tramcan_sync::models::{Customer, EntityKind, Product, Ticket, Vehicle};

#[derive(Args)]
pub struct ShowCommand {
    /// Record kind (ticket, customer, vehicle, product)
    kind: EntityKind,

    /// Record ID
    id: String,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl ShowCommand {
    pub async fn run(&self, store: &EntityStore) -> Result<(), Box<dyn std::error::Error>> {
        let mut session = store.session().await?;

        match self.kind {
            EntityKind::Ticket => show::<Ticket>(&mut session, &self.id, &self.format).await,
            EntityKind::Customer => show::<Customer>(&mut session, &self.id, &self.format).await,
            EntityKind::Vehicle => show::<Vehicle>(&mut session, &self.id, &self.format).await,
            EntityKind::Product => show::<Product>(&mut session, &self.id, &self.format).await,
        }
    }
}

async fn show<R>(
    session: &mut StoreSession,
    id: &str,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>>
where
    R: StoredRecord + Serialize + Display,
{
    match session.get::<R>(id).await? {
        Some(record) => {
            print_record(&record, format)?;
            Ok(())
        }
        None => Err(format!("{} not found: {}", R::KIND, id).into()),
    }
}

fn print_record<R: Serialize + Display>(
    record: &R,
    format: &OutputFormat,
) -> Result<(), serde_json::Error> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(record)?),
        OutputFormat::Text => println!("{}", record),
    }
    Ok(())
}

#[derive(Args)]
pub struct ShowPlateCommand {
    /// Plate number, e.g. 51A-12345
    plate: String,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl ShowPlateCommand {
    pub async fn run(&self, store: &EntityStore) -> Result<(), Box<dyn std::error::Error>> {
        let mut session = store.session().await?;

        match session.vehicle_by_plate(self.plate.trim()).await? {
            Some(vehicle) => {
                print_record(&vehicle, &self.format)?;
                Ok(())
            }
            None => Err(format!("No vehicle with plate {}", self.plate).into()),
        }
    }
}

#[derive(Args)]
pub struct DeleteCommand {
    /// Record kind (ticket, customer, vehicle, product)
    kind: EntityKind,

    /// Record ID
    id: String,
}

impl DeleteCommand {
    pub async fn run(&self, store: &EntityStore) -> Result<(), Box<dyn std::error::Error>> {
        let mut session = store.session().await?;

        if session.soft_delete(self.kind, &self.id, Utc::now()).await? {
            println!("Deleted {} {}", self.kind, self.id);
            Ok(())
        } else {
            Err(format!(
                "{} {} not found, already deleted, or edited after now",
                self.kind, self.id
            )
            .into())
        }
    }
}
