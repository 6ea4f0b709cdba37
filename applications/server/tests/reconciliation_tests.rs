/// Payment reconciliation tests
/// Runs the reconciler against a real store and a scripted processor
mod common;

use bloodbridge_core::{fields, Collection, DocumentStore, Filter, FindOptions, Payment};
use bloodbridge_server::services::{PaymentReconciler, ReconcileError, ReconcileOutcome};
use common::{create_test_store, paid_session, FakeCheckout};
use std::sync::Arc;
use tempfile::TempDir;

struct Harness {
    reconciler: Arc<PaymentReconciler>,
    store: Arc<dyn DocumentStore>,
    checkout: Arc<FakeCheckout>,
    _temp_dir: TempDir,
}

async fn harness() -> Harness {
    let (store, temp_dir) = create_test_store().await;
    let store: Arc<dyn DocumentStore> = store;
    let checkout = FakeCheckout::new();
    let reconciler = PaymentReconciler::new(store.clone(), checkout.clone());

    Harness {
        reconciler: Arc::new(reconciler),
        store,
        checkout,
        _temp_dir: temp_dir,
    }
}

async fn payments(store: &Arc<dyn DocumentStore>) -> Vec<Payment> {
    store
        .find_many(Collection::Payments, &Filter::new(), FindOptions::all())
        .await
        .unwrap()
        .iter()
        .map(|doc| Payment::from_document(doc).unwrap())
        .collect()
}

#[tokio::test]
async fn test_paid_session_is_recorded_once() {
    let h = harness().await;
    h.checkout
        .put_session(paid_session("cs_1", "pi_1", 5000, "a@b.com"));

    let first = h.reconciler.reconcile("cs_1").await.unwrap();
    match first {
        ReconcileOutcome::Recorded {
            ref transaction_id,
            amount,
            ..
        } => {
            assert_eq!(transaction_id, "pi_1");
            assert!((amount - 50.0).abs() < f64::EPSILON);
        }
        other => panic!("expected Recorded, got {:?}", other),
    }

    let second = h.reconciler.reconcile("cs_1").await.unwrap();
    assert_eq!(
        second,
        ReconcileOutcome::AlreadyReconciled {
            transaction_id: "pi_1".to_string()
        }
    );

    let recorded = payments(&h.store).await;
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].transaction_id, "pi_1");
    assert_eq!(recorded[0].donor_email, "a@b.com");
    assert_eq!(recorded[0].currency, "usd");
    assert_eq!(recorded[0].payment_status, "paid");
    assert!((recorded[0].amount - 50.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_unpaid_session_writes_nothing() {
    let h = harness().await;
    let mut session = paid_session("cs_open", "pi_open", 1000, "a@b.com");
    session.payment_status = "unpaid".to_string();
    h.checkout.put_session(session);

    let outcome = h.reconciler.reconcile("cs_open").await.unwrap();
    assert_eq!(
        outcome,
        ReconcileOutcome::NotPaid {
            payment_status: "unpaid".to_string()
        }
    );
    assert!(payments(&h.store).await.is_empty());
}

#[tokio::test]
async fn test_session_id_stands_in_for_missing_payment_intent() {
    let h = harness().await;
    let mut session = paid_session("cs_no_intent", "", 700, "a@b.com");
    session.payment_intent = None;
    h.checkout.put_session(session);

    let outcome = h.reconciler.reconcile("cs_no_intent").await.unwrap();
    assert!(matches!(
        outcome,
        ReconcileOutcome::Recorded { ref transaction_id, .. } if transaction_id == "cs_no_intent"
    ));

    let found = h
        .store
        .find_one(
            Collection::Payments,
            &Filter::new().eq(fields::TRANSACTION_ID, "cs_no_intent"),
        )
        .await
        .unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn test_payer_details_fall_back_to_metadata() {
    let h = harness().await;
    let mut session = paid_session("cs_meta", "pi_meta", 2500, "");
    session.customer_email = None;
    session
        .metadata
        .insert("donorEmail".to_string(), "meta@b.com".to_string());
    session
        .metadata
        .insert("donorName".to_string(), "Rahim".to_string());
    h.checkout.put_session(session);

    h.reconciler.reconcile("cs_meta").await.unwrap();

    let recorded = payments(&h.store).await;
    assert_eq!(recorded[0].donor_email, "meta@b.com");
    assert_eq!(recorded[0].donor_name.as_deref(), Some("Rahim"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_reconciliation_records_once() {
    let h = harness().await;
    h.checkout
        .put_session(paid_session("cs_race", "pi_race", 5000, "a@b.com"));

    let a = Arc::clone(&h.reconciler);
    let b = Arc::clone(&h.reconciler);
    let (first, second) = tokio::join!(
        tokio::spawn(async move { a.reconcile("cs_race").await }),
        tokio::spawn(async move { b.reconcile("cs_race").await }),
    );
    let outcomes = [first.unwrap().unwrap(), second.unwrap().unwrap()];

    let recorded = outcomes
        .iter()
        .filter(|o| matches!(o, ReconcileOutcome::Recorded { .. }))
        .count();
    let already = outcomes
        .iter()
        .filter(|o| matches!(o, ReconcileOutcome::AlreadyReconciled { .. }))
        .count();
    assert_eq!(recorded, 1);
    assert_eq!(already, 1);
    assert_eq!(payments(&h.store).await.len(), 1);
}

#[tokio::test]
async fn test_paid_session_without_payer_email_fails() {
    let h = harness().await;
    let mut session = paid_session("cs_anon", "pi_anon", 5000, "");
    session.customer_email = None;
    h.checkout.put_session(session);

    let err = h.reconciler.reconcile("cs_anon").await.unwrap_err();
    assert!(matches!(err, ReconcileError::StoreWriteFailed(_)));
    assert!(payments(&h.store).await.is_empty());
}

#[tokio::test]
async fn test_unknown_session() {
    let h = harness().await;

    let err = h.reconciler.reconcile("cs_missing").await.unwrap_err();
    assert!(matches!(err, ReconcileError::NotFound(ref id) if id == "cs_missing"));
}

#[tokio::test]
async fn test_processor_unreachable() {
    let h = harness().await;
    h.checkout
        .put_session(paid_session("cs_1", "pi_1", 5000, "a@b.com"));
    h.checkout.set_unreachable(true);

    let err = h.reconciler.reconcile("cs_1").await.unwrap_err();
    assert!(matches!(err, ReconcileError::UpstreamUnavailable(_)));
    assert!(payments(&h.store).await.is_empty());

    // Retrying after recovery records the payment
    h.checkout.set_unreachable(false);
    let outcome = h.reconciler.reconcile("cs_1").await.unwrap();
    assert!(matches!(outcome, ReconcileOutcome::Recorded { .. }));
}

#[tokio::test]
async fn test_fallback_currency_when_processor_omits_one() {
    let (store, _temp_dir) = create_test_store().await;
    let store: Arc<dyn DocumentStore> = store;
    let checkout = FakeCheckout::new();
    let reconciler =
        PaymentReconciler::new(store.clone(), checkout.clone()).with_fallback_currency("bdt");

    let mut session = paid_session("cs_bdt", "pi_bdt", 10000, "a@b.com");
    session.currency = None;
    checkout.put_session(session);

    reconciler.reconcile("cs_bdt").await.unwrap();
    assert_eq!(payments(&store).await[0].currency, "bdt");
}
