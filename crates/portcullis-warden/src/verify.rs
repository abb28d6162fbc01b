//! Clearsign attestation verification.
//!
//! Each occurrence carries a base64-encoded clearsign envelope and the
//! id of the key that produced it. Verification decodes the envelope,
//! resolves the key from the trusted store, checks the declared hash
//! algorithm against an allowlist, and verifies the signature over the
//! recovered content.
//!
//! Every failure branch maps to a distinct `VerificationState`; nothing
//! in this module propagates an error to the caller.

use std::fmt;

use base64::Engine;
use pgp::crypto::hash::HashAlgorithm;
use pgp::composed::cleartext::CleartextSignedMessage;
use portcullis_ledger::Occurrence;
use serde::Serialize;
use tracing::debug;

use crate::error::KeyStoreError;
use crate::keystore::TrustedKeyStore;
use crate::subject::ImageRef;

/// Terminal (and initial) states of one container's verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VerificationState {
    /// Verification did not run to completion.
    Unchecked,
    /// No occurrence matches the image reference.
    NoMatch,
    /// The signing key is not in the trusted directory.
    KeyMissing,
    /// The trusted key file is unusable.
    KeyFormatError,
    /// The attestation envelope is undecodable or malformed.
    SignatureFormatError,
    /// The signature does not verify against the trusted key.
    SignatureMismatch,
    /// A matching occurrence verified against a trusted key.
    Verified,
}

impl VerificationState {
    /// Whether this state admits the container.
    #[must_use]
    pub const fn is_verified(self) -> bool {
        matches!(self, Self::Verified)
    }
}

impl fmt::Display for VerificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unchecked => "Unchecked",
            Self::NoMatch => "NoMatch",
            Self::KeyMissing => "KeyMissing",
            Self::KeyFormatError => "KeyFormatError",
            Self::SignatureFormatError => "SignatureFormatError",
            Self::SignatureMismatch => "SignatureMismatch",
            Self::Verified => "Verified",
        };
        f.write_str(s)
    }
}

/// The outcome of one (image, occurrence) verification attempt.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationOutcome {
    /// The image under review.
    pub image: ImageRef,
    /// Where the attempt terminated.
    pub state: VerificationState,
    /// Human-readable diagnostic.
    pub detail: String,
}

impl VerificationOutcome {
    pub(crate) fn new(image: &ImageRef, state: VerificationState, detail: impl Into<String>) -> Self {
        Self {
            image: image.clone(),
            state,
            detail: detail.into(),
        }
    }
}

/// Hash algorithms accepted in signature packets.
///
/// The declared algorithm is attacker-influenced metadata, so it is
/// checked against this list before any verification work. Every packet
/// in the envelope must be allowed; partial allowance would make the
/// verdict depend on packet order.
#[derive(Debug, Clone)]
pub struct HashAllowlist(Vec<HashAlgorithm>);

impl Default for HashAllowlist {
    fn default() -> Self {
        Self(vec![
            HashAlgorithm::SHA2_256,
            HashAlgorithm::SHA2_384,
            HashAlgorithm::SHA2_512,
        ])
    }
}

impl HashAllowlist {
    /// An allowlist accepting exactly the given algorithms.
    #[must_use]
    pub fn new(allowed: Vec<HashAlgorithm>) -> Self {
        Self(allowed)
    }

    /// Whether `alg` is acceptable.
    #[must_use]
    pub fn allows(&self, alg: HashAlgorithm) -> bool {
        self.0.contains(&alg)
    }
}

/// Verify one occurrence's attestation for `image`.
///
/// Decodes the base64 signature transport, resolves the signing key,
/// parses the clearsign envelope, enforces the hash allowlist, and
/// verifies. Always returns an outcome; never an error.
pub fn verify_occurrence(
    image: &ImageRef,
    occurrence: &Occurrence,
    keys: &TrustedKeyStore,
    allowed_hashes: &HashAllowlist,
) -> VerificationOutcome {
    debug!(
        image = %image,
        resource_url = %occurrence.resource_url,
        "verifying occurrence"
    );

    let Some(attestation) = occurrence.pgp_attestation() else {
        return VerificationOutcome::new(
            image,
            VerificationState::SignatureFormatError,
            "occurrence carries no PGP signed attestation",
        );
    };

    let raw = match base64::engine::general_purpose::STANDARD.decode(&attestation.signature) {
        Ok(raw) => raw,
        Err(e) => {
            return VerificationOutcome::new(
                image,
                VerificationState::SignatureFormatError,
                format!("invalid base64 signature: {e}"),
            );
        }
    };

    let key = match keys.load(&attestation.pgp_key_id) {
        Ok(key) => key,
        Err(e @ KeyStoreError::Missing(_)) => {
            return VerificationOutcome::new(image, VerificationState::KeyMissing, e.to_string());
        }
        Err(e @ KeyStoreError::Format { .. }) => {
            return VerificationOutcome::new(
                image,
                VerificationState::KeyFormatError,
                e.to_string(),
            );
        }
    };

    let envelope = match String::from_utf8(raw) {
        Ok(text) => text,
        Err(_) => {
            return VerificationOutcome::new(
                image,
                VerificationState::SignatureFormatError,
                "signature payload is not clearsign text",
            );
        }
    };

    let (message, _headers) = match CleartextSignedMessage::from_string(&envelope) {
        Ok(parsed) => parsed,
        Err(e) => {
            return VerificationOutcome::new(
                image,
                VerificationState::SignatureFormatError,
                format!("clearsign envelope unparsable: {e}"),
            );
        }
    };

    if message.signatures().is_empty() {
        return VerificationOutcome::new(
            image,
            VerificationState::SignatureFormatError,
            "clearsign envelope contains no signature packet",
        );
    }

    for standalone in message.signatures() {
        let alg = standalone.signature.config.hash_alg;
        if !allowed_hashes.allows(alg) {
            return VerificationOutcome::new(
                image,
                VerificationState::SignatureFormatError,
                format!("declared hash algorithm {alg:?} is not permitted"),
            );
        }
    }

    match message.verify(&*key) {
        Ok(_) => {
            debug!(image = %image, key_id = %attestation.pgp_key_id, "signature verified");
            VerificationOutcome::new(
                image,
                VerificationState::Verified,
                format!("attestation verified with key {}", attestation.pgp_key_id),
            )
        }
        Err(e) => VerificationOutcome::new(
            image,
            VerificationState::SignatureMismatch,
            format!("signature does not verify: {e}"),
        ),
    }
}
