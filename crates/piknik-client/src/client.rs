//! Clipboard operations: store, get and move
//!
//! Store:
//! ```text
//! → opcode 'S' || h2 || len || ts || signature || payload
//! ← h3
//! ```
//! Get / move:
//! ```text
//! → opcode 'G'|'M' || h2
//! ← h3 || len || ts || signature || payload
//! ```

use std::io;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use piknik_core::codec::{decode_u64_le, encode_u64_le};
use piknik_core::{
    FetchMode, Opcode, PiknikError, PiknikResult, GET_RESPONSE_HEADER_SIZE, HASH_SIZE,
    MIN_PAYLOAD_SIZE, SIGNATURE_SIZE, STORE_CONFIRMATION_SIZE, U64_SIZE,
};
use piknik_crypto::{
    auth2_get, auth2_store, auth3_get, auth3_store, constant_time_eq, encrypt_and_sign,
    verify_and_decrypt, AuthTag,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use crate::connection::Connection;
use crate::handshake::handshake;
use crate::settings::ClientConfig;

const TS_OFFSET: usize = HASH_SIZE + U64_SIZE;
const SIGNATURE_OFFSET: usize = TS_OFFSET + U64_SIZE;

/// Client for one piknik server. Cheap to clone; clones share the settings.
#[derive(Debug, Clone)]
pub struct ClipboardClient {
    config: Arc<ClientConfig>,
}

impl ClipboardClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Encrypt, sign and upload `data`, replacing the stored clipboard.
    pub async fn store(&self, data: &[u8]) -> PiknikResult<()> {
        let (mut conn, h1) = self.open().await?;
        store_on(&mut conn, &self.config, &h1, data).await
    }

    /// Download, verify and decrypt the stored clipboard.
    pub async fn fetch(&self, mode: FetchMode) -> PiknikResult<Vec<u8>> {
        let (mut conn, h1) = self.open().await?;
        fetch_on(&mut conn, &self.config, &h1, mode).await
    }

    /// Fetch and leave the content on the server.
    pub async fn get(&self) -> PiknikResult<Vec<u8>> {
        self.fetch(FetchMode::Get).await
    }

    /// Fetch and delete the content on the server.
    pub async fn take(&self) -> PiknikResult<Vec<u8>> {
        self.fetch(FetchMode::Move).await
    }

    async fn open(&self) -> PiknikResult<(Connection, AuthTag)> {
        handshake(
            &self.config.host,
            self.config.port,
            &self.config.psk,
            self.config.timeout,
        )
        .await
    }
}

/// Seconds since the Unix epoch; 0 if the clock is before it.
pub fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

async fn store_on<R, W>(
    conn: &mut Connection<R, W>,
    config: &ClientConfig,
    h1: &AuthTag,
    data: &[u8],
) -> PiknikResult<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let ts = encode_u64_le(now_unix_secs());
    let sealed = encrypt_and_sign(
        &config.encrypt_key,
        &config.key_id,
        &config.signing_key,
        data,
    );

    conn.set_timeout(config.data_timeout);

    let opcode = Opcode::Store;
    let h2 = auth2_store(&config.psk, h1, opcode, &ts, &sealed.signature);
    let len = encode_u64_le(sealed.payload.len() as u64);
    conn.write_all(&[
        &[opcode.as_byte()][..],
        &h2[..],
        &len[..],
        &ts[..],
        &sealed.signature[..],
        &sealed.payload[..],
    ])
    .await?;
    debug!(%opcode, bytes = sealed.payload.len(), "request sent");

    let h3 = conn.read_exact(STORE_CONFIRMATION_SIZE).await?;
    if !constant_time_eq(&auth3_store(&config.psk, &h2), &h3) {
        warn!(%opcode, "server confirmation failed authentication");
        return Err(PiknikError::StageAuth {
            stage: opcode.name(),
        });
    }
    debug!(%opcode, "stored");
    Ok(())
}

async fn fetch_on<R, W>(
    conn: &mut Connection<R, W>,
    config: &ClientConfig,
    h1: &AuthTag,
    mode: FetchMode,
) -> PiknikResult<Vec<u8>>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let opcode = mode.opcode();
    let h2 = auth2_get(&config.psk, h1, opcode);
    conn.write_all(&[&[opcode.as_byte()][..], &h2[..]]).await?;
    debug!(%opcode, "request sent");

    let header = conn
        .read_exact(GET_RESPONSE_HEADER_SIZE)
        .await
        .map_err(|e| PiknikError::EmptyOrUnavailable {
            reason: e.to_string(),
        })?;

    let len = decode_u64_le(&header, HASH_SIZE)?;
    let mut ts = [0u8; U64_SIZE];
    ts.copy_from_slice(&header[TS_OFFSET..SIGNATURE_OFFSET]);
    let mut signature = [0u8; SIGNATURE_SIZE];
    signature.copy_from_slice(&header[SIGNATURE_OFFSET..GET_RESPONSE_HEADER_SIZE]);

    let h3 = auth3_get(&config.psk, &h2, &ts, &signature);
    if !constant_time_eq(&h3, &header[..HASH_SIZE]) {
        warn!(%opcode, "response header failed authentication");
        return Err(PiknikError::StageAuth {
            stage: opcode.name(),
        });
    }

    // A timestamp ahead of the local clock is never stale
    if let Some(age_secs) = now_unix_secs().checked_sub(u64::from_le_bytes(ts)) {
        if age_secs >= config.ttl_secs {
            warn!(age_secs, ttl_secs = config.ttl_secs, "clipboard content expired");
            return Err(PiknikError::ExpiredContent {
                age_secs,
                ttl_secs: config.ttl_secs,
            });
        }
    }

    if len < MIN_PAYLOAD_SIZE as u64 {
        return Err(PiknikError::MalformedResponse {
            len,
            min: MIN_PAYLOAD_SIZE as u64,
        });
    }
    let len = usize::try_from(len).map_err(|_| {
        PiknikError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("payload length {len} does not fit in memory"),
        ))
    })?;

    conn.set_timeout(config.data_timeout);
    let payload = conn.read_exact(len).await?;
    debug!(%opcode, bytes = len, "payload received");

    verify_and_decrypt(
        &config.encrypt_key,
        &config.key_id,
        &config.verifying_key,
        &payload,
        &signature,
    )
}
