/// Payment reconciliation
///
/// After a payer returns from the hosted checkout, the session is looked up
/// again and, if it was paid, recorded exactly once per processor transaction.
use bloodbridge_checkout::{CheckoutError, CheckoutGateway};
use bloodbridge_core::{fields, BloodBridgeError, Collection, DocumentStore, Filter, Payment};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// What a reconciliation call did. Both non-recording outcomes are benign.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// A new payment record was written
    #[serde(rename_all = "camelCase")]
    Recorded {
        transaction_id: String,
        inserted_id: String,
        amount: f64,
    },
    /// A payment for this transaction already exists; nothing was written
    #[serde(rename_all = "camelCase")]
    AlreadyReconciled { transaction_id: String },
    /// The processor does not report the session as paid; nothing was written
    #[serde(rename_all = "camelCase")]
    NotPaid { payment_status: String },
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Processor unreachable; the caller may retry
    #[error("Payment processor unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The processor does not know the session
    #[error("Checkout session not found: {0}")]
    NotFound(String),

    /// The processor refused or garbled the lookup
    #[error("Payment processor rejected the lookup: {0}")]
    ProcessorRejected(String),

    /// The store could not check for or record the payment
    #[error("Failed to record payment: {0}")]
    StoreWriteFailed(String),
}

impl From<CheckoutError> for ReconcileError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::SessionNotFound(id) => Self::NotFound(id),
            e if e.is_transient() => Self::UpstreamUnavailable(e.to_string()),
            e => Self::ProcessorRejected(e.to_string()),
        }
    }
}

pub struct PaymentReconciler {
    store: Arc<dyn DocumentStore>,
    checkout: Arc<dyn CheckoutGateway>,
    fallback_currency: String,
}

impl PaymentReconciler {
    pub fn new(store: Arc<dyn DocumentStore>, checkout: Arc<dyn CheckoutGateway>) -> Self {
        Self {
            store,
            checkout,
            fallback_currency: "usd".to_string(),
        }
    }

    /// Currency recorded when the processor omits one
    #[must_use]
    pub fn with_fallback_currency(mut self, currency: impl Into<String>) -> Self {
        self.fallback_currency = currency.into();
        self
    }

    /// Reconcile the checkout session `session_id`.
    ///
    /// The existence check and the insert are not atomic; the unique index on
    /// `transactionId` turns a lost race into `AlreadyReconciled`.
    pub async fn reconcile(&self, session_id: &str) -> Result<ReconcileOutcome, ReconcileError> {
        let session = self.checkout.retrieve_session(session_id).await?;

        let transaction_id = session
            .payment_intent
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| session.id.clone());

        let existing = self
            .store
            .find_one(
                Collection::Payments,
                &Filter::new().eq(fields::TRANSACTION_ID, transaction_id.as_str()),
            )
            .await
            .map_err(|e| ReconcileError::StoreWriteFailed(e.to_string()))?;

        if existing.is_some() {
            tracing::info!(
                session_id = %session.id,
                transaction_id = %transaction_id,
                "Payment already reconciled"
            );
            return Ok(ReconcileOutcome::AlreadyReconciled { transaction_id });
        }

        if !session.is_paid() {
            tracing::info!(
                session_id = %session.id,
                payment_status = %session.payment_status,
                "Checkout session not paid"
            );
            return Ok(ReconcileOutcome::NotPaid {
                payment_status: session.payment_status,
            });
        }

        let donor_email = session.payer_email().ok_or_else(|| {
            ReconcileError::StoreWriteFailed(format!("session {} has no payer email", session.id))
        })?;
        let amount_minor = session.amount_total.ok_or_else(|| {
            ReconcileError::StoreWriteFailed(format!("session {} has no amount", session.id))
        })?;
        let currency = session
            .currency
            .clone()
            .unwrap_or_else(|| self.fallback_currency.clone());

        let payment = Payment::from_minor_units(
            amount_minor,
            currency,
            donor_email,
            transaction_id.as_str(),
            session.payment_status.as_str(),
        )
        .with_donor_name(session.donor_name().map(str::to_string));

        let document = payment
            .to_document()
            .map_err(|e| ReconcileError::StoreWriteFailed(e.to_string()))?;

        match self.store.insert_one(Collection::Payments, document).await {
            Ok(result) => {
                tracing::info!(
                    transaction_id = %transaction_id,
                    amount = payment.amount,
                    currency = %payment.currency,
                    "Payment recorded"
                );
                Ok(ReconcileOutcome::Recorded {
                    transaction_id,
                    inserted_id: result.inserted_id,
                    amount: payment.amount,
                })
            }
            Err(BloodBridgeError::Duplicate(_)) => {
                tracing::info!(
                    transaction_id = %transaction_id,
                    "Concurrent reconciliation recorded the payment first"
                );
                Ok(ReconcileOutcome::AlreadyReconciled { transaction_id })
            }
            Err(e) => {
                tracing::error!(transaction_id = %transaction_id, error = %e, "Failed to record payment");
                Err(ReconcileError::StoreWriteFailed(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_serialization() {
        let recorded = ReconcileOutcome::Recorded {
            transaction_id: "pi_1".into(),
            inserted_id: "abc".into(),
            amount: 50.0,
        };
        assert_eq!(
            serde_json::to_value(&recorded).unwrap(),
            json!({"status": "recorded", "transactionId": "pi_1", "insertedId": "abc", "amount": 50.0})
        );

        let again = ReconcileOutcome::AlreadyReconciled {
            transaction_id: "pi_1".into(),
        };
        assert_eq!(
            serde_json::to_value(&again).unwrap(),
            json!({"status": "already_reconciled", "transactionId": "pi_1"})
        );

        let unpaid = ReconcileOutcome::NotPaid {
            payment_status: "unpaid".into(),
        };
        assert_eq!(
            serde_json::to_value(&unpaid).unwrap(),
            json!({"status": "not_paid", "paymentStatus": "unpaid"})
        );
    }

    #[test]
    fn test_checkout_error_classification() {
        assert!(matches!(
            ReconcileError::from(CheckoutError::SessionNotFound("cs_x".into())),
            ReconcileError::NotFound(_)
        ));
        assert!(matches!(
            ReconcileError::from(CheckoutError::Unreachable("timeout".into())),
            ReconcileError::UpstreamUnavailable(_)
        ));
        assert!(matches!(
            ReconcileError::from(CheckoutError::Api {
                status: 401,
                message: "bad key".into()
            }),
            ReconcileError::ProcessorRejected(_)
        ));
    }
}
