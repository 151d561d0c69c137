//! Typed, validated client settings resolved from a `PiknikConfig`

use std::time::Duration;

use piknik_core::config::{decode_hex_key, decode_sign_seed, parse_connect, PiknikConfig};
use piknik_core::{PiknikResult, KEY_SIZE};
use piknik_crypto::{
    signing_key_from_seed, verifying_key_from_bytes, EncryptKey, KeyId, Psk, SigningKey,
    VerifyingKey,
};
use tracing::warn;
use zeroize::Zeroize;

/// Everything one clipboard operation needs. Shared read-only between
/// operations.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub psk: Psk,
    pub encrypt_key: EncryptKey,
    pub key_id: KeyId,
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
    /// Connect + handshake + request/response header timeout
    pub timeout: Duration,
    /// Payload transfer timeout, applied once the header exchange is done
    pub data_timeout: Duration,
    /// Maximum accepted age of fetched content
    pub ttl_secs: u64,
}

impl ClientConfig {
    /// Decode and validate every key in `config`.
    ///
    /// An explicit non-zero `encrypt_sk_id` is used as-is (little-endian);
    /// otherwise the id is derived from the encryption key.
    pub fn from_config(config: &PiknikConfig) -> PiknikResult<Self> {
        let (host, port) = parse_connect(&config.connect)?;

        let mut psk_bytes: [u8; KEY_SIZE] = decode_hex_key("psk", config.psk.as_deref())?;
        let psk = Psk::from_bytes(psk_bytes);
        psk_bytes.zeroize();

        let mut encrypt_bytes: [u8; KEY_SIZE] =
            decode_hex_key("encrypt_sk", config.encrypt_sk.as_deref())?;
        let encrypt_key = EncryptKey::from_bytes(encrypt_bytes);
        encrypt_bytes.zeroize();

        let pk_bytes: [u8; 32] = decode_hex_key("sign_pk", config.sign_pk.as_deref())?;
        let verifying_key = verifying_key_from_bytes(&pk_bytes)?;

        let mut seed = decode_sign_seed(config.sign_sk.as_deref())?;
        let signing_key = signing_key_from_seed(&seed);
        seed.zeroize();

        if signing_key.verifying_key() != verifying_key {
            warn!("sign_sk does not match sign_pk; content stored by this client will not verify");
        }

        let key_id = match config.encrypt_sk_id {
            0 => encrypt_key.key_id(),
            id => KeyId::from_u64(id),
        };

        Ok(Self {
            host,
            port,
            psk,
            encrypt_key,
            key_id,
            signing_key,
            verifying_key,
            timeout: Duration::from_secs(config.timeout),
            data_timeout: Duration::from_secs(config.data_timeout),
            ttl_secs: config.ttl,
        })
    }
}
