//! In-process piknik server for integration tests
//!
//! Implements the server side of the protocol over a real TCP listener on
//! 127.0.0.1 with a single in-memory clipboard slot. A `Behavior` makes it
//! misbehave in one specific way.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use piknik_client::ClientConfig;
use piknik_core::codec::{concat, decode_u64_le, encode_u64_le};
use piknik_core::config::PiknikConfig;
use piknik_core::{Opcode, PROTOCOL_VERSION};
use piknik_crypto::{
    auth0, auth1, auth2_get, auth2_store, auth3_get, auth3_store, constant_time_eq, Psk,
};
use rand::RngCore;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const PSK_HEX: &str = "627ea393638048bc0d5a7554ab58e41e5601e2f4975a214dfc53b500be462a9a";
pub const ENCRYPT_SK_HEX: &str =
    "f313e1fd4ad5fee8841d40ca3d54e14041eb05bf7f4888ad8c800ceb61942db6";
pub const SIGN_SK_HEX: &str = "7599dad4726247d301c00ce0dc0dbfb9144fa958b4e9db30209a8f9d840ac9ca";
pub const SIGN_PK_HEX: &str = "c2e46983e667a37d7d8d69679f40f3a05eb8086337693d91dcaf8546d39ddb5e";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Normal,
    /// Answer the hello with another protocol version
    WrongVersion(u8),
    /// Answer the hello with a corrupted h1
    BadHandshakeTag,
    /// Accept a store but send a corrupted h3
    BadConfirmation,
    /// Advertise a payload shorter than key id + nonce, then send nothing
    ShortPayloadLen,
    /// Send a valid response header, then never send the payload
    StallAfterHeader,
    /// Serve content with a zero timestamp
    StaleTimestamp,
    /// Accept the connection and never answer
    Silent,
}

#[derive(Clone)]
struct Stored {
    ts: [u8; 8],
    signature: [u8; 64],
    payload: Vec<u8>,
}

pub struct TestServer {
    pub port: u16,
    slot: Arc<Mutex<Option<Stored>>>,
    task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn start(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let slot = Arc::new(Mutex::new(None));
        let psk = test_psk();

        let shared = Arc::clone(&slot);
        let task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let slot = Arc::clone(&shared);
                let psk = psk.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, &psk, behavior, &slot).await;
                });
            }
        });

        Self { port, slot, task }
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().unwrap().is_none()
    }

    pub fn stored_payload_len(&self) -> Option<usize> {
        self.slot.lock().unwrap().as_ref().map(|s| s.payload.len())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn test_psk() -> Psk {
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(PSK_HEX, &mut bytes).unwrap();
    Psk::from_bytes(bytes)
}

pub fn piknik_config(port: u16) -> PiknikConfig {
    PiknikConfig {
        connect: format!("127.0.0.1:{port}"),
        psk: Some(PSK_HEX.into()),
        sign_pk: Some(SIGN_PK_HEX.into()),
        sign_sk: Some(SIGN_SK_HEX.into()),
        encrypt_sk: Some(ENCRYPT_SK_HEX.into()),
        timeout: 2,
        data_timeout: 5,
        ..PiknikConfig::default()
    }
}

pub fn client_config(port: u16) -> ClientConfig {
    ClientConfig::from_config(&piknik_config(port)).unwrap()
}

async fn serve(
    mut stream: TcpStream,
    psk: &Psk,
    behavior: Behavior,
    slot: &Mutex<Option<Stored>>,
) -> std::io::Result<()> {
    if behavior == Behavior::Silent {
        let mut sink = [0u8; 1024];
        while stream.read(&mut sink).await? > 0 {}
        return Ok(());
    }

    let mut hello = [0u8; 65];
    stream.read_exact(&mut hello).await?;
    let version = hello[0];
    let mut r = [0u8; 32];
    r.copy_from_slice(&hello[1..33]);
    let mut h0 = [0u8; 32];
    h0.copy_from_slice(&hello[33..]);
    if version != PROTOCOL_VERSION || !constant_time_eq(&auth0(psk, version, &r), &h0) {
        return Ok(());
    }

    let mut r2 = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut r2);
    let h1 = auth1(psk, version, &h0, &r2);
    let reply_version = match behavior {
        Behavior::WrongVersion(v) => v,
        _ => version,
    };
    let sent_h1 = if behavior == Behavior::BadHandshakeTag {
        let mut bad = h1;
        bad[0] ^= 0xFF;
        bad
    } else {
        h1
    };
    stream
        .write_all(&concat(&[&[reply_version][..], &r2[..], &sent_h1[..]]))
        .await?;

    let mut op = [0u8; 1];
    stream.read_exact(&mut op).await?;
    match Opcode::from_byte(op[0]) {
        Some(Opcode::Store) => {
            let mut rest = [0u8; 112];
            stream.read_exact(&mut rest).await?;
            let mut h2 = [0u8; 32];
            h2.copy_from_slice(&rest[..32]);
            let len = decode_u64_le(&rest, 32).unwrap() as usize;
            let mut ts = [0u8; 8];
            ts.copy_from_slice(&rest[40..48]);
            let mut signature = [0u8; 64];
            signature.copy_from_slice(&rest[48..112]);
            if !constant_time_eq(&auth2_store(psk, &h1, Opcode::Store, &ts, &signature), &h2) {
                return Ok(());
            }

            let mut payload = vec![0u8; len];
            stream.read_exact(&mut payload).await?;
            *slot.lock().unwrap() = Some(Stored {
                ts,
                signature,
                payload,
            });

            let mut h3 = auth3_store(psk, &h2);
            if behavior == Behavior::BadConfirmation {
                h3[31] ^= 0x01;
            }
            stream.write_all(&h3).await?;
        }
        Some(opcode @ (Opcode::Get | Opcode::Move)) => {
            let mut h2 = [0u8; 32];
            stream.read_exact(&mut h2).await?;
            if !constant_time_eq(&auth2_get(psk, &h1, opcode), &h2) {
                return Ok(());
            }

            let stored = {
                let mut guard = slot.lock().unwrap();
                if opcode == Opcode::Move {
                    guard.take()
                } else {
                    guard.clone()
                }
            };
            // Empty clipboard: close without answering
            let Some(stored) = stored else {
                return Ok(());
            };

            let ts = if behavior == Behavior::StaleTimestamp {
                encode_u64_le(0)
            } else {
                stored.ts
            };
            let len = if behavior == Behavior::ShortPayloadLen {
                16
            } else {
                stored.payload.len() as u64
            };
            let h3 = auth3_get(psk, &h2, &ts, &stored.signature);
            stream
                .write_all(&concat(&[
                    &h3[..],
                    &encode_u64_le(len)[..],
                    &ts[..],
                    &stored.signature[..],
                ]))
                .await?;
            if matches!(
                behavior,
                Behavior::ShortPayloadLen | Behavior::StallAfterHeader
            ) {
                // Hold the connection open so a payload read would stall
                let mut sink = [0u8; 1];
                let _ = stream.read(&mut sink).await;
                return Ok(());
            }
            stream.write_all(&stored.payload).await?;
        }
        None => {}
    }
    Ok(())
}
