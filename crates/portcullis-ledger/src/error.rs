//! Error types for the attestation store client.

/// Errors from fetching occurrences out of the attestation store.
///
/// The two variants are deliberately distinct: a caller deciding between
/// fail-open and fail-closed admission needs to know whether the store
/// was unreachable or answered with garbage.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Network failure or a non-success HTTP status.
    #[error("transport error: {0}")]
    Transport(String),

    /// The store answered, but the occurrence payload did not decode.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}
