use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{default_true, timestamp, EntityKind, SyncRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerType {
    #[default]
    Individual,
    Company,
}

impl CustomerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerType::Individual => "individual",
            CustomerType::Company => "company",
        }
    }
}

impl fmt::Display for CustomerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "individual" => Ok(CustomerType::Individual),
            "company" => Ok(CustomerType::Company),
            _ => Err(format!(
                "Invalid customer type '{}'. Valid options: individual, company",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub tax_code: Option<String>,
    pub contact_person: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub customer_type: CustomerType,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "timestamp::unset", deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Customer {
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
            phone: None,
            email: None,
            address: None,
            tax_code: None,
            contact_person: None,
            notes: None,
            customer_type: CustomerType::Individual,
            is_active: true,
            created_at: updated_at,
            updated_at,
            is_deleted: false,
        }
    }

    pub fn with_type(mut self, customer_type: CustomerType) -> Self {
        self.customer_type = customer_type;
        self
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.name, self.code)?;
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Type: {}", self.customer_type)?;
        if let Some(phone) = &self.phone {
            writeln!(f, "Phone: {}", phone)?;
        }
        if let Some(tax_code) = &self.tax_code {
            writeln!(f, "Tax code: {}", tax_code)?;
        }
        write!(f, "Updated: {}", self.updated_at)
    }
}

impl SyncRecord for Customer {
    const KIND: EntityKind = EntityKind::Customer;

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
