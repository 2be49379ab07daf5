//! Credential encryption contract.
//!
//! Broker credentials are stored as an opaque string produced by a
//! [`CredentialCipher`]. The concrete cipher lives with the application that
//! owns the key material.

use serde_json::{Map, Value};

use crate::errors::Result;

/// Plaintext credential payload as submitted by the user.
pub type CredentialMap = Map<String, Value>;

/// Symmetric encryption of credential payloads.
pub trait CredentialCipher: Send + Sync {
    /// Encrypts a credential payload into an opaque, storable string.
    fn encrypt(&self, credentials: &CredentialMap) -> Result<String>;

    /// Reverses [`CredentialCipher::encrypt`].
    fn decrypt(&self, encrypted: &str) -> Result<CredentialMap>;
}
