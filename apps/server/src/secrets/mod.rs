use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};

use tradelens_core::{
    errors::Error,
    secrets::{CredentialCipher, CredentialMap},
    Result,
};

const NONCE_LEN: usize = 12;

/// ChaCha20-Poly1305 cipher for stored broker credentials.
///
/// Output is base64 of `nonce || ciphertext`, with a fresh random nonce per call.
pub struct ChaChaCredentialCipher {
    key: [u8; 32],
}

impl ChaChaCredentialCipher {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.key))
    }
}

impl CredentialCipher for ChaChaCredentialCipher {
    #[allow(deprecated)]
    fn encrypt(&self, credentials: &CredentialMap) -> Result<String> {
        let serialized = serde_json::to_vec(credentials)?;
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let ciphertext = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce_bytes), serialized.as_ref())
            .map_err(|_| Error::Secret("Failed to encrypt credentials".into()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(sealed))
    }

    #[allow(deprecated)]
    fn decrypt(&self, encrypted: &str) -> Result<CredentialMap> {
        let sealed = BASE64
            .decode(encrypted.trim())
            .map_err(|e| Error::Secret(format!("Failed to decode credentials: {e}")))?;
        if sealed.len() <= NONCE_LEN {
            return Err(Error::Secret("Encrypted credentials are truncated".into()));
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher()
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| Error::Secret("Failed to decrypt credentials".into()))?;
        Ok(serde_json::from_slice(&plaintext)?)
    }
}
