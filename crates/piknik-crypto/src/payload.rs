//! Clipboard payload framing, XChaCha20 encryption and Ed25519 signatures
//!
//! Payload format (binary):
//! ```text
//! [8 bytes: key id][24 bytes: random nonce][N bytes: XChaCha20 ciphertext]
//! signature = Ed25519(sign_sk, whole payload)
//! ```
//!
//! The cipher is an unauthenticated stream cipher; integrity comes entirely
//! from the detached signature, so it is checked before anything is decrypted.

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::{XChaCha20, XNonce};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use piknik_core::{
    PiknikError, PiknikResult, KEY_ID_SIZE, MIN_PAYLOAD_SIZE, NONCE_SIZE, SIGNATURE_SIZE,
};
use rand::RngCore;

use crate::keys::{EncryptKey, KeyId};

/// A framed, encrypted payload with its detached signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    pub payload: Vec<u8>,
    pub signature: [u8; SIGNATURE_SIZE],
}

fn apply_cipher(key: &EncryptKey, nonce: &[u8], data: &mut [u8]) {
    let mut cipher = XChaCha20::new(key.as_bytes().into(), XNonce::from_slice(nonce));
    cipher.apply_keystream(data);
}

/// Encrypt `plaintext` under a fresh random nonce, frame it and sign the frame.
pub fn encrypt_and_sign(
    encrypt_key: &EncryptKey,
    key_id: &KeyId,
    signing_key: &SigningKey,
    plaintext: &[u8],
) -> SignedPayload {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce);

    let mut payload = Vec::with_capacity(MIN_PAYLOAD_SIZE + plaintext.len());
    payload.extend_from_slice(key_id.as_bytes());
    payload.extend_from_slice(&nonce);
    payload.extend_from_slice(plaintext);
    apply_cipher(encrypt_key, &nonce, &mut payload[MIN_PAYLOAD_SIZE..]);

    let signature = signing_key.sign(&payload).to_bytes();
    tracing::trace!(len = payload.len(), %key_id, "payload encrypted and signed");
    SignedPayload { payload, signature }
}

/// Check key id and signature of a received payload, then decrypt it.
///
/// The key id is checked first so that content written with another key set
/// reports a mismatch instead of a signature failure.
pub fn verify_and_decrypt(
    encrypt_key: &EncryptKey,
    key_id: &KeyId,
    verifying_key: &VerifyingKey,
    payload: &[u8],
    signature: &[u8; SIGNATURE_SIZE],
) -> PiknikResult<Vec<u8>> {
    if payload.len() < MIN_PAYLOAD_SIZE {
        return Err(PiknikError::MalformedResponse {
            len: payload.len() as u64,
            min: MIN_PAYLOAD_SIZE as u64,
        });
    }

    // The key id is public; plain comparison is enough
    let received_id = &payload[..KEY_ID_SIZE];
    if received_id != &key_id.as_bytes()[..] {
        return Err(PiknikError::KeyIdMismatch {
            expected: key_id.to_string(),
            received: hex::encode(received_id),
        });
    }

    let signature = Signature::from_bytes(signature);
    verifying_key
        .verify(payload, &signature)
        .map_err(|_| PiknikError::Signature)?;

    let nonce = &payload[KEY_ID_SIZE..MIN_PAYLOAD_SIZE];
    let mut plaintext = payload[MIN_PAYLOAD_SIZE..].to_vec();
    apply_cipher(encrypt_key, nonce, &mut plaintext);
    Ok(plaintext)
}
