//! Mutual PSK authentication performed at the start of every connection
//!
//! ```text
//! client → server   version(1) || r(32)  || h0(32)
//! server → client   version(1) || r2(32) || h1(32)
//! ```
//! The client proves knowledge of the PSK with h0; the server proves it with
//! h1, which also binds the client's challenge.

use std::time::Duration;

use piknik_core::{
    PiknikError, PiknikResult, CHALLENGE_SIZE, HASH_SIZE, HELLO_SIZE, PROTOCOL_VERSION,
};
use piknik_crypto::{auth0, auth1, constant_time_eq, AuthTag, Psk};
use rand::RngCore;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use crate::connection::Connection;

/// Connect to `host:port` and authenticate the server.
///
/// Returns the open connection (still using `connect_timeout`) and h1, which
/// keys every later stage of the exchange.
pub async fn handshake(
    host: &str,
    port: u16,
    psk: &Psk,
    connect_timeout: Duration,
) -> PiknikResult<(Connection, AuthTag)> {
    let mut conn = Connection::connect(host, port, connect_timeout).await?;
    match authenticate(&mut conn, psk).await {
        Ok(h1) => {
            debug!(host, port, "handshake complete");
            Ok((conn, h1))
        }
        // Only the hello write can fail with a transport error here
        Err(PiknikError::Io(e)) => Err(PiknikError::Connection {
            host: host.to_string(),
            port,
            reason: e.to_string(),
        }),
        Err(PiknikError::TransferTimeout { timeout }) => Err(PiknikError::Connection {
            host: host.to_string(),
            port,
            reason: format!("timed out after {}ms", timeout.as_millis()),
        }),
        Err(e) => Err(e),
    }
}

/// Run the hello exchange on an already connected stream.
pub async fn authenticate<R, W>(conn: &mut Connection<R, W>, psk: &Psk) -> PiknikResult<AuthTag>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut r = [0u8; CHALLENGE_SIZE];
    rand::thread_rng().fill_bytes(&mut r);
    let h0 = auth0(psk, PROTOCOL_VERSION, &r);

    conn.write_all(&[&[PROTOCOL_VERSION][..], &r[..], &h0[..]]).await?;

    let server_hello = conn.read_exact(HELLO_SIZE).await.map_err(|e| {
        debug!(error = %e, "no server hello");
        PiknikError::HandshakeRejected {
            reason: e.to_string(),
        }
    })?;

    let server_version = server_hello[0];
    if server_version != PROTOCOL_VERSION {
        return Err(PiknikError::VersionMismatch {
            client: PROTOCOL_VERSION,
            server: server_version,
        });
    }

    let mut r2 = [0u8; CHALLENGE_SIZE];
    r2.copy_from_slice(&server_hello[1..1 + CHALLENGE_SIZE]);
    let h1_received = &server_hello[1 + CHALLENGE_SIZE..1 + CHALLENGE_SIZE + HASH_SIZE];

    let h1 = auth1(psk, PROTOCOL_VERSION, &h0, &r2);
    if !constant_time_eq(&h1, h1_received) {
        warn!("server failed handshake authentication");
        return Err(PiknikError::HandshakeAuth);
    }
    Ok(h1)
}
