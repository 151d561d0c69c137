//! piknik-core: shared protocol constants, wire codec, config schema and errors
//!
//! Wire layout (all integers little-endian):
//! ```text
//! ClientHello        version(1) || r(32)  || h0(32)                          65
//! ServerHello        version(1) || r2(32) || h1(32)                          65
//! StoreRequest       opcode(1)  || h2(32) || len(8) || ts(8) || sig(64)     113 + payload
//! StoreConfirmation  h3(32)                                                  32
//! GetRequest         opcode(1)  || h2(32)                                    33
//! GetResponse        h3(32)     || len(8) || ts(8)  || sig(64)              112 + payload
//! Payload            key_id(8)  || nonce(24) || ciphertext(N)               32 + N
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod types;

pub use error::{PiknikError, PiknikResult};
pub use types::{FetchMode, Opcode};

/// Protocol version. Client and server must agree exactly; there is no negotiation.
pub const PROTOCOL_VERSION: u8 = 6;

/// BLAKE2b personalization shared by every keyed hash: "PK" zero-padded to 16 bytes
pub const PERSONALIZATION: [u8; 16] = [
    b'P', b'K', 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

/// Size of every authentication tag (h0..h3)
pub const HASH_SIZE: usize = 32;

/// Size of the random handshake challenges (r, r2)
pub const CHALLENGE_SIZE: usize = 32;

/// Size of a symmetric or pre-shared key
pub const KEY_SIZE: usize = 32;

/// Size of the public encryption key identifier
pub const KEY_ID_SIZE: usize = 8;

/// Size of an XChaCha20 nonce (192-bit)
pub const NONCE_SIZE: usize = 24;

/// Size of an Ed25519 signature
pub const SIGNATURE_SIZE: usize = 64;

/// Size of an encoded timestamp or length field
pub const U64_SIZE: usize = 8;

pub const HELLO_SIZE: usize = 1 + CHALLENGE_SIZE + HASH_SIZE;
pub const STORE_HEADER_SIZE: usize = 1 + HASH_SIZE + U64_SIZE + U64_SIZE + SIGNATURE_SIZE;
pub const STORE_CONFIRMATION_SIZE: usize = HASH_SIZE;
pub const GET_REQUEST_SIZE: usize = 1 + HASH_SIZE;
pub const GET_RESPONSE_HEADER_SIZE: usize = HASH_SIZE + U64_SIZE + U64_SIZE + SIGNATURE_SIZE;

/// Smallest valid framed payload: key id and nonce with an empty ciphertext
pub const MIN_PAYLOAD_SIZE: usize = KEY_ID_SIZE + NONCE_SIZE;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_sizes() {
        assert_eq!(HELLO_SIZE, 65);
        assert_eq!(STORE_HEADER_SIZE, 113);
        assert_eq!(STORE_CONFIRMATION_SIZE, 32);
        assert_eq!(GET_REQUEST_SIZE, 33);
        assert_eq!(GET_RESPONSE_HEADER_SIZE, 112);
        assert_eq!(MIN_PAYLOAD_SIZE, 32);
    }

    #[test]
    fn test_personalization_is_padded_domain() {
        assert_eq!(&PERSONALIZATION[..2], b"PK");
        assert!(PERSONALIZATION[2..].iter().all(|&b| b == 0));
    }
}
