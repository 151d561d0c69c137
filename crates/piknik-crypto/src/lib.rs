//! piknik-crypto: authentication tags, payload encryption and signatures
//!
//! Every exchange is bound to the pre-shared key through a chain of keyed
//! BLAKE2b tags; the clipboard content itself is protected separately:
//! ```text
//! PSK (256-bit, shared by every client and the server)
//!   └── BLAKE2b(key=PSK, personal="PK", salt=stage) → h0, h1, h2, h3
//! EncryptSk (256-bit, shared by clients only)
//!   ├── KeyId = BLAKE2b(personal="PK", out=8)(EncryptSk), top bit cleared
//!   └── XChaCha20(key=EncryptSk, nonce=random_192bit)  (confidentiality only)
//! SignSk / SignPk (Ed25519)
//!   └── signature over KeyId || nonce || ciphertext  (integrity)
//! ```

pub mod auth;
pub mod compare;
pub mod keys;
pub mod payload;

pub use auth::{
    auth0, auth1, auth2_get, auth2_store, auth3_get, auth3_store, derive_key_id, AuthTag,
};
pub use compare::constant_time_eq;
pub use keys::{
    generate_keys, signing_key_from_seed, verifying_key_from_bytes, EncryptKey, GeneratedKeys,
    KeyId, Psk,
};
pub use payload::{encrypt_and_sign, verify_and_decrypt, SignedPayload};

pub use ed25519_dalek::{SigningKey, VerifyingKey};
