/// Reconciled payment record
use crate::document::Document;
use crate::error::{BloodBridgeError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A successful external transaction, recorded exactly once per
/// `transaction_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Amount in major currency units
    pub amount: f64,
    /// Lowercase ISO currency code
    pub currency: String,
    /// Payer email
    pub donor_email: String,
    /// Payer name, when given at checkout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donor_name: Option<String>,
    /// Processor transaction identifier
    pub transaction_id: String,
    /// Processor payment status at reconciliation time
    pub payment_status: String,
    /// When the payment was recorded
    pub paid_at: DateTime<Utc>,
}

impl Payment {
    /// Build a record from a processor amount expressed in minor units
    /// (cents): the stored amount is `amount_minor / 100`.
    pub fn from_minor_units(
        amount_minor: i64,
        currency: impl Into<String>,
        donor_email: impl Into<String>,
        transaction_id: impl Into<String>,
        payment_status: impl Into<String>,
    ) -> Self {
        Self {
            amount: minor_to_major(amount_minor),
            currency: currency.into().to_ascii_lowercase(),
            donor_email: donor_email.into(),
            donor_name: None,
            transaction_id: transaction_id.into(),
            payment_status: payment_status.into(),
            paid_at: Utc::now(),
        }
    }

    /// Attach the payer's name
    #[must_use]
    pub fn with_donor_name(mut self, name: Option<String>) -> Self {
        self.donor_name = name;
        self
    }

    /// Serialize into a store document
    pub fn to_document(&self) -> Result<Document> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(BloodBridgeError::storage("payment did not serialize to an object")),
        }
    }

    /// Read back from a store document (the `_id` key is ignored)
    pub fn from_document(doc: &Document) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(doc.clone()))?)
    }
}

/// Minor currency units (cents) to major units
pub fn minor_to_major(amount_minor: i64) -> f64 {
    amount_minor as f64 / 100.0
}

/// Major currency units to minor units, rounded to the nearest unit
pub fn major_to_minor(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}
