//! One TCP connection with a switchable I/O timeout

use std::io;
use std::time::Duration;

use bytes::Bytes;
use piknik_core::{PiknikError, PiknikResult};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::reader::StreamReader;

/// A connected stream split into a buffered read side and a write side.
///
/// The current timeout is an idle limit: every socket read or write must
/// make progress within it, however long the whole transfer takes. The
/// socket is closed when the connection is dropped.
#[derive(Debug)]
pub struct Connection<R = OwnedReadHalf, W = OwnedWriteHalf> {
    reader: StreamReader<R>,
    writer: W,
    timeout: Duration,
}

impl Connection {
    /// Open a TCP connection within `connect_timeout`.
    pub async fn connect(host: &str, port: u16, connect_timeout: Duration) -> PiknikResult<Self> {
        let connection_error = |reason: String| PiknikError::Connection {
            host: host.to_string(),
            port,
            reason,
        };

        debug!(host, port, "connecting");
        let stream = timeout(connect_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| {
                connection_error(format!("timed out after {}ms", connect_timeout.as_millis()))
            })?
            .map_err(|e| connection_error(e.to_string()))?;
        stream.set_nodelay(true)?;

        let (read_half, write_half) = stream.into_split();
        Ok(Self::new(read_half, write_half, connect_timeout))
    }
}

impl<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> Connection<R, W> {
    pub fn new(reader: R, writer: W, io_timeout: Duration) -> Self {
        Self {
            reader: StreamReader::new(reader),
            writer,
            timeout: io_timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Replace the timeout used for subsequent reads and writes.
    pub fn set_timeout(&mut self, io_timeout: Duration) {
        self.timeout = io_timeout;
    }

    /// Read exactly `n` bytes.
    pub async fn read_exact(&mut self, n: usize) -> PiknikResult<Bytes> {
        self.reader.read_idle_timeout(n, self.timeout).await
    }

    /// Write every part in order and flush.
    pub async fn write_all(&mut self, parts: &[&[u8]]) -> PiknikResult<()> {
        let limit = self.timeout;
        let timed_out = |_| PiknikError::TransferTimeout { timeout: limit };

        for part in parts {
            let mut rest = *part;
            while !rest.is_empty() {
                let written = timeout(limit, self.writer.write(rest))
                    .await
                    .map_err(timed_out)??;
                if written == 0 {
                    return Err(io::Error::from(io::ErrorKind::WriteZero).into());
                }
                rest = &rest[written..];
            }
        }
        timeout(limit, self.writer.flush())
            .await
            .map_err(timed_out)??;
        Ok(())
    }
}
