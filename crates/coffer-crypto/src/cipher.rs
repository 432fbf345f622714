use chacha20poly1305::aead::{Aead, AeadCore, KeyInit};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::instrument;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 24;
pub const TAG_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    InvalidKeyLength(usize),
    InvalidKeyEncoding,
    EmptyData,
    EncryptionFailed,
    DecryptionFailed,
}

impl std::fmt::Display for CryptoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKeyLength(len) => {
                write!(f, "invalid key length: {len} (expected {KEY_LEN})")
            }
            Self::InvalidKeyEncoding => write!(f, "invalid key encoding"),
            Self::EmptyData => write!(f, "data empty"),
            Self::EncryptionFailed => write!(f, "encryption failed"),
            Self::DecryptionFailed => write!(f, "decryption failed"),
        }
    }
}

impl std::error::Error for CryptoError {}

#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; KEY_LEN]);

impl SecretKey {
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength(bytes.len()))?;
        Ok(Self(array))
    }

    /// Parses a hex-encoded key, as stored in key files and env vars.
    pub fn from_hex(value: &str) -> Result<Self, CryptoError> {
        let mut bytes = hex::decode(value.trim()).map_err(|_| CryptoError::InvalidKeyEncoding)?;
        let key = Self::from_slice(&bytes);
        bytes.zeroize();
        key
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretKey(REDACTED)")
    }
}

/// Symmetric AEAD used for entry payloads at rest.
///
/// Output layout is `nonce || ciphertext || tag`; every call to [`Cipher::encrypt`]
/// draws a fresh 24-byte nonce from the OS RNG.
pub struct Cipher {
    aead: XChaCha20Poly1305,
}

impl Cipher {
    /// Builds a cipher from raw key bytes. Only 32-byte keys are accepted.
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        let aead = XChaCha20Poly1305::new_from_slice(key)
            .map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
        Ok(Self { aead })
    }

    #[must_use]
    pub fn from_key(key: &SecretKey) -> Self {
        Self {
            aead: XChaCha20Poly1305::new(key.as_bytes().into()),
        }
    }

    #[instrument(level = "debug", skip(self, plaintext), fields(plaintext_len = plaintext.len()))]
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if plaintext.is_empty() {
            return Err(CryptoError::EmptyData);
        }
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let sealed = self
            .aead
            .encrypt(&nonce, plaintext)
            .map_err(|_| CryptoError::EncryptionFailed)?;
        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    #[instrument(level = "debug", skip(self, ciphertext), fields(ciphertext_len = ciphertext.len()))]
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if ciphertext.is_empty() {
            return Err(CryptoError::EmptyData);
        }
        if ciphertext.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::DecryptionFailed);
        }
        let (nonce, sealed) = ciphertext.split_at(NONCE_LEN);
        self.aead
            .decrypt(XNonce::from_slice(nonce), sealed)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cipher(XChaCha20Poly1305)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> Cipher {
        Cipher::from_key(&SecretKey::generate())
    }

    #[test]
    fn roundtrip() {
        let cipher = cipher();
        let sealed = cipher.encrypt(b"hello").expect("encrypt");
        assert_eq!(sealed.len(), NONCE_LEN + 5 + TAG_LEN);
        let opened = cipher.decrypt(&sealed).expect("decrypt");
        assert_eq!(opened, b"hello");
    }

    #[test]
    fn rejects_bad_key_lengths() {
        for len in [0usize, 16, 24, 31, 33, 64] {
            let key = vec![7u8; len];
            assert_eq!(
                Cipher::new(&key).err(),
                Some(CryptoError::InvalidKeyLength(len))
            );
        }
        assert!(Cipher::new(&[7u8; KEY_LEN]).is_ok());
    }

    #[test]
    fn rejects_empty_input() {
        let cipher = cipher();
        assert_eq!(cipher.encrypt(b"").err(), Some(CryptoError::EmptyData));
        assert_eq!(cipher.decrypt(b"").err(), Some(CryptoError::EmptyData));
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let cipher = cipher();
        let sealed = cipher.encrypt(b"payload").expect("encrypt");
        assert_eq!(
            cipher.decrypt(&sealed[..NONCE_LEN + 3]).err(),
            Some(CryptoError::DecryptionFailed)
        );
    }

    #[test]
    fn wrong_key_fails() {
        let sealed = cipher().encrypt(b"payload").expect("encrypt");
        assert_eq!(
            cipher().decrypt(&sealed).err(),
            Some(CryptoError::DecryptionFailed)
        );
    }

    #[test]
    fn secret_key_hex_roundtrip() {
        let key = SecretKey::generate();
        let parsed = SecretKey::from_hex(&key.to_hex()).expect("hex");
        assert_eq!(parsed.as_bytes(), key.as_bytes());
        assert_eq!(
            SecretKey::from_hex("abcd").err(),
            Some(CryptoError::InvalidKeyLength(2))
        );
        assert_eq!(
            SecretKey::from_hex("zz").err(),
            Some(CryptoError::InvalidKeyEncoding)
        );
    }

    #[test]
    fn debug_is_redacted() {
        let key = SecretKey::generate();
        assert_eq!(format!("{key:?}"), "SecretKey(REDACTED)");
    }
}
