use postgres_from_row::FromRow;
use serde::Deserialize;
use serde::Serialize;

use crate::core::types::Address;
use crate::error::Error;
use crate::error::Result;

/// A stored address label.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct AddressLabel {
    pub address: Address,
    pub label: String,
    pub category: Option<String>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: time::OffsetDateTime,
}

/// A label to be created or updated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewLabel {
    pub address: Address,
    pub label: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewLabel {
    pub fn new(address: &str, label: &str) -> Self {
        Self {
            address: address.to_owned(),
            label: label.to_owned(),
            category: None,
            notes: None,
        }
    }

    /// Trimmed copy, rejecting blank addresses or labels.
    ///
    /// Blank categories and notes become null.
    pub fn validated(&self) -> Result<Self> {
        let address = self.address.trim();
        let label = self.label.trim();
        if address.is_empty() {
            return Err(Error::InvalidInput("label address is empty".to_owned()));
        }
        if label.is_empty() {
            return Err(Error::InvalidInput(format!("empty label for {address}")));
        }
        let optional = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };
        Ok(Self {
            address: address.to_owned(),
            label: label.to_owned(),
            category: optional(&self.category),
            notes: optional(&self.notes),
        })
    }
}
