//! Trusted public key lookup.
//!
//! Keys live in a single directory, one armored public-key file per key
//! id (`{dir}/{key_id}.pub`). The directory is the trust anchor: a key
//! is trusted because an operator put it there, nothing else. Keys are
//! immutable once trusted, so parsed keys are cached for the life of
//! the process.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use pgp::{Deserializable, SignedPublicKey};
use tracing::debug;

use crate::error::KeyStoreError;

/// Read-only lookup of trusted public keys by key id.
pub struct TrustedKeyStore {
    dir: PathBuf,
    cache: RwLock<HashMap<String, Arc<SignedPublicKey>>>,
}

impl TrustedKeyStore {
    /// Create a store rooted at the given key directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The directory this store resolves key ids against.
    #[must_use]
    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    /// Load the public key for `key_id`.
    ///
    /// Resolves `{dir}/{key_id}.pub` and parses the armored block.
    /// Parse results are cached; negative results are not, so a key
    /// dropped into the directory at runtime becomes visible.
    ///
    /// # Errors
    ///
    /// `KeyStoreError::Missing` if no file exists for the key id (or the
    /// id is not a plain file stem — key ids come from untrusted
    /// occurrence records and must not address outside the directory);
    /// `KeyStoreError::Format` if the file is not an armored public key.
    pub fn load(&self, key_id: &str) -> Result<Arc<SignedPublicKey>, KeyStoreError> {
        if !is_plain_key_id(key_id) {
            return Err(KeyStoreError::Missing(key_id.to_owned()));
        }

        if let Ok(cache) = self.cache.read() {
            if let Some(key) = cache.get(key_id) {
                return Ok(Arc::clone(key));
            }
        }

        let path = self.dir.join(format!("{key_id}.pub"));
        debug!(key_id, path = %path.display(), "loading trusted key");

        let armored = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(KeyStoreError::Missing(key_id.to_owned()));
            }
            Err(e) => {
                return Err(KeyStoreError::Format {
                    key_id: key_id.to_owned(),
                    detail: format!("reading key file failed: {e}"),
                });
            }
        };

        let (key, _headers) =
            SignedPublicKey::from_armor_single(armored.as_bytes()).map_err(|e| {
                KeyStoreError::Format {
                    key_id: key_id.to_owned(),
                    detail: format!("not an armored public key: {e}"),
                }
            })?;

        let key = Arc::new(key);
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key_id.to_owned(), Arc::clone(&key));
        }
        Ok(key)
    }
}

/// A key id may only name a file directly inside the trusted directory.
fn is_plain_key_id(key_id: &str) -> bool {
    !key_id.is_empty()
        && !key_id.contains('/')
        && !key_id.contains('\\')
        && !key_id.contains("..")
}
