//! Shared test fixtures.
//!
//! The armored material under `tests/fixtures/` was produced with
//! GnuPG: two RSA-2048 signing keys and a clearsigned attestation
//! payload (plus a SHA-1-digest variant of the same payload). Pinning
//! real externally-produced material mirrors production, where keys and
//! envelopes arrive from outside the process.

use std::path::Path;

use base64::Engine;
use portcullis_ledger::occurrence::{AttestationDetails, Occurrence, PgpSignedAttestation};

pub(crate) const KEY1_PUB: &str = include_str!("../tests/fixtures/key1.pub");
pub(crate) const KEY2_PUB: &str = include_str!("../tests/fixtures/key2.pub");
pub(crate) const CLEARSIGNED: &str = include_str!("../tests/fixtures/attestation.asc");
pub(crate) const CLEARSIGNED_SHA1: &str = include_str!("../tests/fixtures/attestation_sha1.asc");

/// Long key id of the key that signed the fixtures.
pub(crate) const SIGNER_KEY_ID: &str = "2139BC01E37570B9";
/// Long key id of the second (non-signing) fixture key.
pub(crate) const OTHER_KEY_ID: &str = "A8622317B8B1CFEC";

/// Write both fixture keys into `dir` under the naming convention.
pub(crate) fn write_trusted_keys(dir: &Path) {
    std::fs::write(dir.join(format!("{SIGNER_KEY_ID}.pub")), KEY1_PUB).expect("write key1");
    std::fs::write(dir.join(format!("{OTHER_KEY_ID}.pub")), KEY2_PUB).expect("write key2");
}

/// Build an attestation occurrence whose signature field carries the
/// given clearsign envelope, base64-encoded as on the wire.
pub(crate) fn attestation_occurrence(
    resource_url: &str,
    key_id: &str,
    clearsigned: &str,
) -> Occurrence {
    Occurrence {
        name: None,
        resource_url: resource_url.to_owned(),
        note_name: None,
        kind: Some("ATTESTATION".to_owned()),
        attestation: Some(AttestationDetails {
            pgp_signed_attestation: Some(PgpSignedAttestation {
                signature: base64::engine::general_purpose::STANDARD.encode(clearsigned),
                pgp_key_id: key_id.to_owned(),
                content_type: None,
            }),
        }),
        create_time: None,
        update_time: None,
    }
}
