//! Admission-time verification of container image attestations.
//!
//! `portcullis-warden` decides whether every container image in a
//! submitted workload carries a cryptographically valid attestation
//! recorded in the occurrence store.
//!
//! The decision pipeline has four phases:
//! 1. **Match** — select the occurrences whose resource locator refers
//!    to the image under review
//! 2. **Resolve** — look the signing key up in the trusted key directory
//! 3. **Verify** — check the clearsigned attestation against the key
//! 4. **Decide** — fold per-container outcomes into one verdict

pub mod decide;
pub mod error;
pub mod keystore;
pub mod matcher;
pub mod subject;
pub mod verify;

// Re-export primary types for convenience.
pub use decide::{
    decide, decide_with_store, AdmissionVerdict, DecisionPolicy, MatchRequirement,
    StoreFailurePolicy,
};
pub use error::{KeyStoreError, SubjectError};
pub use keystore::TrustedKeyStore;
pub use subject::{parse_subject, AdmissionSubject, ImageRef};
pub use verify::{HashAllowlist, VerificationOutcome, VerificationState};

#[cfg(test)]
pub(crate) mod testdata;
