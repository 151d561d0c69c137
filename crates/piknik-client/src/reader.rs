//! Exact-length reads over an async byte stream
//!
//! Bytes that arrive ahead of the current request stay buffered for the next
//! one, so a server reply split or merged across TCP segments reads the same.

use std::io;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use piknik_core::{PiknikError, PiknikResult};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;

const INITIAL_CAPACITY: usize = 256;

/// Upper bound on buffer growth per socket read. A length announced by the
/// peer never turns into one up-front allocation.
pub const READ_CHUNK: usize = 64 * 1024;

#[derive(Debug)]
enum ReaderState {
    Open,
    Closed,
    Failed { kind: io::ErrorKind, message: String },
}

/// Buffered reader handing out exactly `n` bytes per call.
///
/// Once the peer has closed the stream or it has failed, reads are still
/// served from the buffer; anything larger fails with the same error again.
#[derive(Debug)]
pub struct StreamReader<R> {
    inner: R,
    buf: BytesMut,
    state: ReaderState,
}

impl<R: AsyncRead + Unpin> StreamReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_CAPACITY),
            state: ReaderState::Open,
        }
    }

    /// Bytes received but not yet handed out.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Wait until `n` bytes are available and return exactly those.
    ///
    /// Cancel safe: bytes received before a cancellation stay buffered.
    pub async fn read(&mut self, n: usize) -> PiknikResult<Bytes> {
        self.read_inner(n, None).await
    }

    /// Like [`read`](Self::read), but fail with `TransferTimeout` when no
    /// bytes arrive for `idle`. A slow stream that keeps making progress is
    /// never cut off.
    pub async fn read_idle_timeout(&mut self, n: usize, idle: Duration) -> PiknikResult<Bytes> {
        self.read_inner(n, Some(idle)).await
    }

    async fn read_inner(&mut self, n: usize, idle: Option<Duration>) -> PiknikResult<Bytes> {
        loop {
            if self.buf.len() >= n {
                return Ok(self.buf.split_to(n).freeze());
            }
            match &self.state {
                ReaderState::Open => {}
                ReaderState::Closed => {
                    return Err(PiknikError::ShortRead {
                        received: self.buf.len(),
                        expected: n,
                    })
                }
                ReaderState::Failed { kind, message } => {
                    return Err(PiknikError::Io(io::Error::new(*kind, message.clone())))
                }
            }

            self.buf.reserve((n - self.buf.len()).min(READ_CHUNK));
            let filled = match idle {
                Some(limit) => timeout(limit, self.inner.read_buf(&mut self.buf))
                    .await
                    .map_err(|_| PiknikError::TransferTimeout { timeout: limit })?,
                None => self.inner.read_buf(&mut self.buf).await,
            };
            match filled {
                Ok(0) => self.state = ReaderState::Closed,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.state = ReaderState::Failed {
                        kind: e.kind(),
                        message: e.to_string(),
                    };
                    return Err(PiknikError::Io(e));
                }
            }
        }
    }
}
