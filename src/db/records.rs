//! Row mappings for the four entity tables.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use super::store::{SqliteQuery, StoredRecord};
use super::{encode_timestamp, optional_timestamp_column, timestamp_column};
use crate::models::{Customer, CustomerType, Product, Ticket, TicketStatus, Vehicle};

fn parse_column<T>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e: String| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: e.into(),
    })
}

impl<'r> FromRow<'r, SqliteRow> for Ticket {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            ticket_number: row.try_get("ticket_number")?,
            vehicle_plate: row.try_get("vehicle_plate")?,
            vehicle_id: row.try_get("vehicle_id")?,
            customer_id: row.try_get("customer_id")?,
            customer_name: row.try_get("customer_name")?,
            product_id: row.try_get("product_id")?,
            product_name: row.try_get("product_name")?,
            first_weight: row.try_get("first_weight")?,
            second_weight: row.try_get("second_weight")?,
            net_weight: row.try_get("net_weight")?,
            unit_price: row.try_get("unit_price")?,
            total_amount: row.try_get("total_amount")?,
            first_weigh_time: timestamp_column(row, "first_weigh_time")?,
            second_weigh_time: optional_timestamp_column(row, "second_weigh_time")?,
            status: parse_column::<TicketStatus>(row, "status")?,
            notes: row.try_get("notes")?,
            first_weigh_image_url: row.try_get("first_weigh_image_url")?,
            second_weigh_image_url: row.try_get("second_weigh_image_url")?,
            operator_id: row.try_get("operator_id")?,
            operator_name: row.try_get("operator_name")?,
            station_id: row.try_get("station_id")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
            is_deleted: row.try_get("is_deleted")?,
            is_synced: row.try_get("is_synced")?,
        })
    }
}

impl StoredRecord for Ticket {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "ticket_number",
        "vehicle_plate",
        "vehicle_id",
        "customer_id",
        "customer_name",
        "product_id",
        "product_name",
        "first_weight",
        "second_weight",
        "net_weight",
        "unit_price",
        "total_amount",
        "first_weigh_time",
        "second_weigh_time",
        "status",
        "notes",
        "first_weigh_image_url",
        "second_weigh_image_url",
        "operator_id",
        "operator_name",
        "station_id",
        "created_at",
        "updated_at",
        "is_deleted",
        "is_synced",
    ];

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(&self.id)
            .bind(&self.ticket_number)
            .bind(&self.vehicle_plate)
            .bind(&self.vehicle_id)
            .bind(&self.customer_id)
            .bind(&self.customer_name)
            .bind(&self.product_id)
            .bind(&self.product_name)
            .bind(self.first_weight)
            .bind(self.second_weight)
            .bind(self.net_weight)
            .bind(self.unit_price)
            .bind(self.total_amount)
            .bind(encode_timestamp(&self.first_weigh_time))
            .bind(self.second_weigh_time.as_ref().map(encode_timestamp))
            .bind(self.status.as_str())
            .bind(&self.notes)
            .bind(&self.first_weigh_image_url)
            .bind(&self.second_weigh_image_url)
            .bind(&self.operator_id)
            .bind(&self.operator_name)
            .bind(&self.station_id)
            .bind(encode_timestamp(&self.created_at))
            .bind(encode_timestamp(&self.updated_at))
            .bind(self.is_deleted)
            .bind(self.is_synced)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Customer {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            phone: row.try_get("phone")?,
            email: row.try_get("email")?,
            address: row.try_get("address")?,
            tax_code: row.try_get("tax_code")?,
            contact_person: row.try_get("contact_person")?,
            notes: row.try_get("notes")?,
            customer_type: parse_column::<CustomerType>(row, "customer_type")?,
            is_active: row.try_get("is_active")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
            is_deleted: row.try_get("is_deleted")?,
        })
    }
}

impl StoredRecord for Customer {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "code",
        "name",
        "phone",
        "email",
        "address",
        "tax_code",
        "contact_person",
        "notes",
        "customer_type",
        "is_active",
        "created_at",
        "updated_at",
        "is_deleted",
    ];

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(&self.id)
            .bind(&self.code)
            .bind(&self.name)
            .bind(&self.phone)
            .bind(&self.email)
            .bind(&self.address)
            .bind(&self.tax_code)
            .bind(&self.contact_person)
            .bind(&self.notes)
            .bind(self.customer_type.as_str())
            .bind(self.is_active)
            .bind(encode_timestamp(&self.created_at))
            .bind(encode_timestamp(&self.updated_at))
            .bind(self.is_deleted)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Vehicle {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            plate_number: row.try_get("plate_number")?,
            vehicle_type: row.try_get("vehicle_type")?,
            tare_weight: row.try_get("tare_weight")?,
            customer_id: row.try_get("customer_id")?,
            customer_name: row.try_get("customer_name")?,
            driver_name: row.try_get("driver_name")?,
            driver_phone: row.try_get("driver_phone")?,
            notes: row.try_get("notes")?,
            is_active: row.try_get("is_active")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
            is_deleted: row.try_get("is_deleted")?,
        })
    }
}

impl StoredRecord for Vehicle {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "plate_number",
        "vehicle_type",
        "tare_weight",
        "customer_id",
        "customer_name",
        "driver_name",
        "driver_phone",
        "notes",
        "is_active",
        "created_at",
        "updated_at",
        "is_deleted",
    ];

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(&self.id)
            .bind(&self.plate_number)
            .bind(&self.vehicle_type)
            .bind(self.tare_weight)
            .bind(&self.customer_id)
            .bind(&self.customer_name)
            .bind(&self.driver_name)
            .bind(&self.driver_phone)
            .bind(&self.notes)
            .bind(self.is_active)
            .bind(encode_timestamp(&self.created_at))
            .bind(encode_timestamp(&self.updated_at))
            .bind(self.is_deleted)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Product {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            unit: row.try_get("unit")?,
            default_price: row.try_get("default_price")?,
            category: row.try_get("category")?,
            is_active: row.try_get("is_active")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
            is_deleted: row.try_get("is_deleted")?,
        })
    }
}

impl StoredRecord for Product {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "code",
        "name",
        "description",
        "unit",
        "default_price",
        "category",
        "is_active",
        "created_at",
        "updated_at",
        "is_deleted",
    ];

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(&self.id)
            .bind(&self.code)
            .bind(&self.name)
            .bind(&self.description)
            .bind(&self.unit)
            .bind(self.default_price)
            .bind(&self.category)
            .bind(self.is_active)
            .bind(encode_timestamp(&self.created_at))
            .bind(encode_timestamp(&self.updated_at))
            .bind(self.is_deleted)
    }
}
