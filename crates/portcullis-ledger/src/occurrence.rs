//! Occurrence wire model.
//!
//! An occurrence is a remote record asserting a signed claim about a
//! resource — here, that a container image was signed. The shapes below
//! follow the store's v1alpha1 JSON: camelCase field names, a top-level
//! occurrence list, and the PGP attestation nested under
//! `attestation.pgpSignedAttestation`.
//!
//! Decoding is lenient on purpose: the feed is shared with other
//! occurrence kinds, so unknown fields are ignored and records without
//! attestation details stay representable. Deciding what to do with
//! them is the verifier's job, not the decoder's.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response body of the occurrence list endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOccurrencesResponse {
    /// The occurrences recorded for the project.
    #[serde(default)]
    pub occurrences: Vec<Occurrence>,
    /// Continuation token for paged listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// A single recorded occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    /// Store-assigned resource name (`projects/{p}/occurrences/{id}`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The resource locator this occurrence attests to.
    pub resource_url: String,
    /// The note this occurrence was recorded against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_name: Option<String>,
    /// Occurrence kind (`ATTESTATION`, `VULNERABILITY`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Attestation details, present for attestation-kind occurrences.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attestation: Option<AttestationDetails>,
    /// When the occurrence was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    /// When the occurrence was last updated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

impl Occurrence {
    /// The PGP attestation carried by this occurrence, if any.
    #[must_use]
    pub fn pgp_attestation(&self) -> Option<&PgpSignedAttestation> {
        self.attestation
            .as_ref()
            .and_then(|a| a.pgp_signed_attestation.as_ref())
    }
}

/// Attestation payload wrapper inside an occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationDetails {
    /// The PGP-signed attestation, when the signer used PGP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pgp_signed_attestation: Option<PgpSignedAttestation>,
}

/// A PGP-signed attestation: a base64-encoded clearsign envelope plus
/// the identifier of the key that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PgpSignedAttestation {
    /// Base64-encoded clearsigned message.
    pub signature: String,
    /// Identifier of the signing key, resolved against the trusted key
    /// directory by naming convention.
    pub pgp_key_id: String,
    /// Declared content type of the signed payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}
