//! Decision aggregation.
//!
//! For each container image the aggregator selects matching
//! occurrences, verifies candidates until the match requirement is
//! settled, and folds the per-container outcomes into one workload
//! verdict. Containers are independent, so they verify concurrently
//! under a bounded worker pool; the shared occurrence list and key
//! cache are read-only during the fold.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use portcullis_ledger::{Occurrence, OccurrenceStore};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::keystore::TrustedKeyStore;
use crate::matcher::matching_occurrences;
use crate::subject::{AdmissionSubject, ImageRef};
use crate::verify::{verify_occurrence, HashAllowlist, VerificationOutcome, VerificationState};

/// How many matching occurrences must verify for a container to pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchRequirement {
    /// One verified occurrence admits the container.
    #[default]
    AnyVerified,
    /// Every matching occurrence must verify.
    AllVerified,
}

/// What to do when the occurrence store itself fails.
///
/// There is no implicit default behavior here: admitting workloads
/// because the attestation store was down is a policy decision the
/// operator must make by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreFailurePolicy {
    /// Reject the workload, naming the store failure.
    #[default]
    FailClosed,
    /// Admit the workload, logging and naming the store failure.
    FailOpen,
}

/// Policy knobs for one admission decision.
#[derive(Debug, Clone)]
pub struct DecisionPolicy {
    /// Per-container match requirement.
    pub match_requirement: MatchRequirement,
    /// Behavior when the occurrence fetch fails.
    pub on_store_failure: StoreFailurePolicy,
    /// Hash algorithms accepted in signature packets.
    pub allowed_hashes: HashAllowlist,
    /// Bound on concurrently verifying containers.
    pub max_workers: usize,
    /// Wall-clock budget for the whole decision. On expiry the verdict
    /// is fail-closed with unfinished containers reported `Unchecked`.
    pub deadline: Option<Duration>,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            match_requirement: MatchRequirement::default(),
            on_store_failure: StoreFailurePolicy::default(),
            allowed_hashes: HashAllowlist::default(),
            max_workers: 4,
            deadline: None,
        }
    }
}

/// The workload-level admission decision.
#[derive(Debug, Clone, Serialize)]
pub struct AdmissionVerdict {
    /// Whether the workload is admitted.
    pub allowed: bool,
    /// Human-readable reason, naming the first failing container and
    /// its terminal state when rejecting.
    pub reason: String,
}

impl AdmissionVerdict {
    fn admitted(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
        }
    }

    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

/// Settle one container against the occurrence set.
fn evaluate_container(
    image: &ImageRef,
    occurrences: &[Occurrence],
    keys: &TrustedKeyStore,
    requirement: MatchRequirement,
    allowed_hashes: &HashAllowlist,
) -> VerificationOutcome {
    let candidates = matching_occurrences(image, occurrences);
    if candidates.is_empty() {
        return VerificationOutcome::new(
            image,
            VerificationState::NoMatch,
            "no attestation occurrence matches this image reference",
        );
    }

    match requirement {
        MatchRequirement::AnyVerified => {
            let mut first_failure: Option<VerificationOutcome> = None;
            for occurrence in candidates {
                let outcome = verify_occurrence(image, occurrence, keys, allowed_hashes);
                if outcome.state.is_verified() {
                    return outcome;
                }
                first_failure.get_or_insert(outcome);
            }
            first_failure.unwrap_or_else(|| {
                VerificationOutcome::new(
                    image,
                    VerificationState::NoMatch,
                    "no attestation occurrence matches this image reference",
                )
            })
        }
        MatchRequirement::AllVerified => {
            let total = candidates.len();
            for occurrence in candidates {
                let outcome = verify_occurrence(image, occurrence, keys, allowed_hashes);
                if !outcome.state.is_verified() {
                    return outcome;
                }
            }
            VerificationOutcome::new(
                image,
                VerificationState::Verified,
                format!("all {total} matching occurrences verified"),
            )
        }
    }
}

/// Decide admission for a workload against an already-fetched
/// occurrence set.
///
/// The workload is admitted iff every container reaches `Verified`.
/// Workloads with no containers are vacuously admitted. The reason
/// names the first container (in declaration order) that failed.
pub async fn decide(
    subject: &dyn AdmissionSubject,
    occurrences: &[Occurrence],
    keys: &Arc<TrustedKeyStore>,
    policy: &DecisionPolicy,
) -> AdmissionVerdict {
    let kind = subject.kind();
    let name = subject.name().to_owned();
    let images = subject.container_images();
    info!(kind, name = %name, containers = images.len(), "reviewing workload");

    if images.is_empty() {
        return AdmissionVerdict::admitted(format!("{kind} {name} declares no container images"));
    }

    let occurrences: Arc<Vec<Occurrence>> = Arc::new(occurrences.to_vec());
    let allowed_hashes = Arc::new(policy.allowed_hashes.clone());
    let requirement = policy.match_requirement;

    // One slot per container, filled as workers finish; anything still
    // empty when the deadline fires is reported Unchecked.
    let slots: Arc<Mutex<Vec<Option<VerificationOutcome>>>> =
        Arc::new(Mutex::new(vec![None; images.len()]));
    let workers = policy.max_workers.clamp(1, images.len());
    let semaphore = Arc::new(Semaphore::new(workers));

    let mut handles = Vec::with_capacity(images.len());
    for (index, image) in images.iter().cloned().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let occurrences = Arc::clone(&occurrences);
        let keys = Arc::clone(keys);
        let allowed_hashes = Arc::clone(&allowed_hashes);
        let slots = Arc::clone(&slots);

        handles.push(tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire().await else {
                return;
            };
            let outcome =
                evaluate_container(&image, &occurrences, &keys, requirement, &allowed_hashes);
            if let Ok(mut slots) = slots.lock() {
                slots[index] = Some(outcome);
            }
        }));
    }

    let run_all = async {
        for handle in &mut handles {
            let _ = handle.await;
        }
    };

    match policy.deadline {
        Some(deadline) => {
            let timed_out = timeout(deadline, run_all).await.is_err();
            if timed_out {
                warn!(kind, name = %name, "verification deadline exceeded");
                for handle in &handles {
                    handle.abort();
                }
            }
        }
        None => run_all.await,
    }

    let outcomes: Vec<VerificationOutcome> = {
        let slots = slots.lock().unwrap_or_else(PoisonError::into_inner);
        images
            .iter()
            .zip(slots.iter())
            .map(|(image, slot)| {
                slot.clone().unwrap_or_else(|| {
                    VerificationOutcome::new(
                        image,
                        VerificationState::Unchecked,
                        "verification did not complete before the deadline",
                    )
                })
            })
            .collect()
    };

    match outcomes.iter().find(|o| !o.state.is_verified()) {
        None => {
            info!(kind, name = %name, "workload admitted");
            AdmissionVerdict::admitted(format!(
                "all {} container images verified",
                outcomes.len()
            ))
        }
        Some(failed) => {
            info!(
                kind,
                name = %name,
                image = %failed.image,
                state = %failed.state,
                "workload rejected"
            );
            AdmissionVerdict::rejected(format!(
                "container image {}: {} ({})",
                failed.image, failed.state, failed.detail
            ))
        }
    }
}

/// Fetch the occurrence set once and decide admission.
///
/// The single fetch is shared read-only across all containers. A store
/// failure is surfaced distinctly from per-image verification failure
/// and resolved per `DecisionPolicy::on_store_failure`.
pub async fn decide_with_store(
    subject: &dyn AdmissionSubject,
    store: &dyn OccurrenceStore,
    keys: &Arc<TrustedKeyStore>,
    policy: &DecisionPolicy,
) -> AdmissionVerdict {
    match store.list_occurrences().await {
        Ok(occurrences) => decide(subject, &occurrences, keys, policy).await,
        Err(e) => {
            warn!(
                kind = subject.kind(),
                name = subject.name(),
                error = %e,
                "attestation store unavailable"
            );
            match policy.on_store_failure {
                StoreFailurePolicy::FailClosed => AdmissionVerdict::rejected(format!(
                    "attestation store unavailable ({e}); failing closed"
                )),
                StoreFailurePolicy::FailOpen => AdmissionVerdict::admitted(format!(
                    "attestation store unavailable ({e}); admitted by fail-open policy"
                )),
            }
        }
    }
}
