use chrono::{DateTime, Utc};
use clap::Args;

use super::OutputFormat;
use tramcan_sync::db::EntityStore;
use tramcan_sync::models::{timestamp, SyncRecord};
use tramcan_sync::sync::{ChangeSet, SyncService};

#[derive(Args)]
pub struct ChangesCommand {
    /// Only records changed strictly after this time (RFC 3339, or UTC without offset)
    #[arg(long, value_parser = timestamp::parse)]
    since: Option<DateTime<Utc>>,

    /// Station asking for changes (logged only)
    #[arg(long)]
    station: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl ChangesCommand {
    pub async fn run(&self, store: &EntityStore) -> Result<(), Box<dyn std::error::Error>> {
        let service = SyncService::new(store.clone());
        let changes = service.pull(self.since, self.station.as_deref()).await?;

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&changes)?);
            }
            OutputFormat::Text => print_table(&changes),
        }

        Ok(())
    }
}

fn print_table(changes: &ChangeSet) {
    if changes.is_empty() {
        println!("No changes");
        println!("Sync time: {}", changes.sync_time.to_rfc3339());
        return;
    }

    println!("{:<10}  {:<36}  {:<32}  DELETED", "KIND", "ID", "UPDATED");
    println!("{}", "-".repeat(92));

    print_rows(&changes.weighing_tickets);
    print_rows(&changes.customers);
    print_rows(&changes.vehicles);
    print_rows(&changes.products);

    println!("\nTotal: {} change(s)", changes.total_changes);
    println!("Sync time: {}", changes.sync_time.to_rfc3339());
}

fn print_rows<R: SyncRecord>(records: &[R]) {
    for record in records {
        println!(
            "{:<10}  {:<36}  {:<32}  {}",
            R::KIND,
            record.id(),
            record.updated_at().to_rfc3339(),
            if record.is_deleted() { "yes" } else { "" }
        );
    }
}
