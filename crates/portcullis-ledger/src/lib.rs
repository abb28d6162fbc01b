//! Occurrence records and the attestation store client.
//!
//! `portcullis-ledger` models the remote store of signed attestation
//! records ("occurrences") and fetches them over HTTP/JSON. One fetch
//! returns the full occurrence set for a project; matching and
//! cryptographic verification live in `portcullis-warden`.

pub mod client;
pub mod error;
pub mod occurrence;

// Re-export primary types for convenience.
pub use client::{HttpOccurrenceStore, OccurrenceStore, StoreConfig};
pub use error::StoreError;
pub use occurrence::{ListOccurrencesResponse, Occurrence, PgpSignedAttestation};
