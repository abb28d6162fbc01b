//! Error types for the verification core.

/// Errors from the trusted key store.
///
/// Both variants surface as `VerificationOutcome` states; they never
/// escape the verifier as raw errors.
#[derive(Debug, thiserror::Error)]
pub enum KeyStoreError {
    /// No key file exists for the requested key id.
    #[error("trusted key `{0}` not found")]
    Missing(String),

    /// The key file exists but is not a usable armored public key.
    #[error("trusted key `{key_id}` unusable: {detail}")]
    Format {
        /// The key id whose file was rejected.
        key_id: String,
        /// What was wrong with it.
        detail: String,
    },
}

/// Errors from decoding a workload manifest into an admission subject.
#[derive(Debug, thiserror::Error)]
pub enum SubjectError {
    /// The manifest is not valid JSON for the declared kind.
    #[error("workload manifest undecodable: {0}")]
    Decode(#[from] serde_json::Error),

    /// The manifest declares no `kind` field.
    #[error("workload manifest declares no kind")]
    MissingKind,

    /// The declared kind is not one this gatekeeper reviews.
    #[error("unsupported workload kind `{0}`")]
    UnsupportedKind(String),
}
