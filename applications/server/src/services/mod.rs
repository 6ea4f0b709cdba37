/// Services layer
pub mod identity;
pub mod reconciliation;

pub use identity::{
    verifier_from_settings, IdentityError, IdentityVerifier, ManagedIdentityVerifier,
    SharedSecretVerifier, VerifiedIdentity,
};
pub use reconciliation::{PaymentReconciler, ReconcileError, ReconcileOutcome};
