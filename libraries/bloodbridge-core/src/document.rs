//! Documents, collections and the field vocabulary shared by every layer

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// A loosely-typed record: a JSON object whose schema is enforced by
/// convention only
pub type Document = Map<String, Value>;

/// Key under which the store-assigned identifier is exposed on read
pub const ID_FIELD: &str = "_id";

/// Store-assigned document identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three named record collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Donor / volunteer / admin accounts
    Users,
    /// Donation requests
    Requests,
    /// Reconciled payments
    Payments,
}

impl Collection {
    /// Name used by the store
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Requests => "requests",
            Collection::Payments => "payments",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document field names.
///
/// Users and requests are free-form; only the fields the server reads or
/// overwrites are named here.
pub mod fields {
    /// Store identifier
    pub const ID: &str = super::ID_FIELD;
    /// Creation timestamp (RFC 3339), set by the server
    pub const CREATED_AT: &str = "createdAt";

    // Users
    /// Account email (the verified principal)
    pub const EMAIL: &str = "email";
    /// Display name
    pub const NAME: &str = "name";
    /// `donor | volunteer | admin`
    pub const ROLE: &str = "role";
    /// `active | blocked`
    pub const STATUS: &str = "status";

    // Shared profile / request location fields
    /// Blood group, e.g. `AB+`
    pub const BLOOD_GROUP: &str = "bloodGroup";
    /// District
    pub const DISTRICT: &str = "district";
    /// Upazila (sub-district)
    pub const UPAZILA: &str = "upazila";

    // Requests
    /// Email of the user who created the request
    pub const REQUESTER_EMAIL: &str = "requester_email";
    /// `pending | inprogress | done | canceled`
    pub const DONATION_STATUS: &str = "donation_status";
    /// Name of the donor who claimed the request
    pub const DONOR_NAME: &str = "donor_name";
    /// Email of the donor who claimed the request
    pub const DONOR_EMAIL: &str = "donor_email";

    // Payments
    /// Amount in major currency units
    pub const AMOUNT: &str = "amount";
    /// ISO currency code
    pub const CURRENCY: &str = "currency";
    /// Payer email
    pub const PAYMENT_DONOR_EMAIL: &str = "donorEmail";
    /// Payer name, when supplied at checkout
    pub const PAYMENT_DONOR_NAME: &str = "donorName";
    /// Processor transaction identifier (idempotency key)
    pub const TRANSACTION_ID: &str = "transactionId";
    /// Processor payment status
    pub const PAYMENT_STATUS: &str = "paymentStatus";
    /// Time the payment was recorded
    pub const PAID_AT: &str = "paidAt";
}

/// Remove server-owned keys from client-supplied input.
///
/// Returns the number of keys removed.
pub fn strip_fields(doc: &mut Document, names: &[&str]) -> usize {
    names
        .iter()
        .filter(|name| doc.remove(**name).is_some())
        .count()
}

/// Read a string field from a document
pub fn str_field<'a>(doc: &'a Document, name: &str) -> Option<&'a str> {
    doc.get(name).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_strip_fields_counts_removed_keys() {
        let mut d = doc(json!({"_id": "x", "role": "admin", "name": "Rahim"}));
        let removed = strip_fields(&mut d, &[fields::ID, fields::ROLE, fields::STATUS]);

        assert_eq!(removed, 2);
        assert_eq!(d.len(), 1);
        assert_eq!(str_field(&d, fields::NAME), Some("Rahim"));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(DocumentId::generate(), DocumentId::generate());
    }

    #[test]
    fn test_collection_names() {
        assert_eq!(Collection::Users.as_str(), "users");
        assert_eq!(Collection::Requests.to_string(), "requests");
        assert_eq!(Collection::Payments.as_str(), "payments");
    }
}
