//! Key material: pre-shared key, encryption key, key identifier, Ed25519 identity

use std::fmt;

use ed25519_dalek::{SigningKey, VerifyingKey};
use piknik_core::{PiknikError, PiknikResult, KEY_ID_SIZE, KEY_SIZE};
use rand::RngCore;
use zeroize::Zeroize;

use crate::auth::derive_key_id;

/// The 256-bit pre-shared key. Only ever used to key the authentication
/// stages, never for encryption. Zeroized on drop.
#[derive(Clone)]
pub struct Psk {
    bytes: [u8; KEY_SIZE],
}

impl Psk {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for Psk {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl fmt::Debug for Psk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Psk").field("bytes", &"[REDACTED]").finish()
    }
}

/// The 256-bit symmetric key for clipboard content. Zeroized on drop.
#[derive(Clone)]
pub struct EncryptKey {
    bytes: [u8; KEY_SIZE],
}

impl EncryptKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// The public identifier derived from this key.
    pub fn key_id(&self) -> KeyId {
        KeyId(derive_key_id(&self.bytes))
    }
}

impl Drop for EncryptKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl fmt::Debug for EncryptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Non-secret 8-byte identifier of an encryption key, sent in the clear as
/// the first bytes of every payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyId([u8; KEY_ID_SIZE]);

impl KeyId {
    pub fn from_bytes(bytes: [u8; KEY_ID_SIZE]) -> Self {
        Self(bytes)
    }

    /// An explicitly assigned numeric id, stored little-endian.
    pub fn from_u64(id: u64) -> Self {
        Self(id.to_le_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; KEY_ID_SIZE] {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({self})")
    }
}

/// Build the Ed25519 signing key from its 32-byte seed.
pub fn signing_key_from_seed(seed: &[u8; 32]) -> SigningKey {
    SigningKey::from_bytes(seed)
}

/// Parse an Ed25519 public key, rejecting encodings that are not curve points.
pub fn verifying_key_from_bytes(bytes: &[u8; 32]) -> PiknikResult<VerifyingKey> {
    VerifyingKey::from_bytes(bytes)
        .map_err(|e| PiknikError::Config(format!("invalid Ed25519 public key: {e}")))
}

/// A complete fresh key set for a new clipboard group.
pub struct GeneratedKeys {
    pub psk: Psk,
    pub encrypt_key: EncryptKey,
    pub signing_key: SigningKey,
}

impl GeneratedKeys {
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }
}

/// Generate random PSK, encryption key and Ed25519 seed.
pub fn generate_keys() -> GeneratedKeys {
    let mut rng = rand::thread_rng();
    let mut psk = [0u8; KEY_SIZE];
    let mut encrypt = [0u8; KEY_SIZE];
    let mut seed = [0u8; 32];
    rng.fill_bytes(&mut psk);
    rng.fill_bytes(&mut encrypt);
    rng.fill_bytes(&mut seed);

    let keys = GeneratedKeys {
        psk: Psk::from_bytes(psk),
        encrypt_key: EncryptKey::from_bytes(encrypt),
        signing_key: signing_key_from_seed(&seed),
    };
    psk.zeroize();
    encrypt.zeroize();
    seed.zeroize();
    keys
}
