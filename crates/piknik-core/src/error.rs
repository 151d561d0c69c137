use std::time::Duration;

use thiserror::Error;

pub type PiknikResult<T> = Result<T, PiknikError>;

#[derive(Debug, Error)]
pub enum PiknikError {
    #[error("unable to connect to {host}:{port} - is a piknik server running on that host? ({reason})")]
    Connection {
        host: String,
        port: u16,
        reason: String,
    },

    #[error(
        "the server rejected the connection - check that it is running the same piknik version or retry later ({reason})"
    )]
    HandshakeRejected { reason: String },

    #[error("incompatible server version (client: {client}, server: {server})")]
    VersionMismatch { client: u8, server: u8 },

    #[error("incorrect authentication code from server during handshake")]
    HandshakeAuth,

    #[error("timed out after {}ms while transferring data", .timeout.as_millis())]
    TransferTimeout { timeout: Duration },

    #[error("the clipboard might be empty ({reason})")]
    EmptyOrUnavailable { reason: String },

    #[error("clipboard content is too old ({age_secs}s, ttl is {ttl_secs}s)")]
    ExpiredContent { age_secs: u64, ttl_secs: u64 },

    #[error("clipboard content is too short: {len} bytes (minimum {min})")]
    MalformedResponse { len: u64, min: u64 },

    #[error("incorrect authentication code from server ({stage})")]
    StageAuth { stage: &'static str },

    #[error("encryption key id mismatch (expected {expected}, received {received})")]
    KeyIdMismatch { expected: String, received: String },

    #[error("signature doesn't verify")]
    Signature,

    #[error("connection closed after {received} bytes (expected {expected})")]
    ShortRead { received: usize, expected: usize },

    #[error("truncated field: need {needed} bytes at offset {offset}, have {available}")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PiknikError {
    /// True for failures that prove the peer does not hold the shared secrets
    /// or tampered with the exchange.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            PiknikError::HandshakeAuth
                | PiknikError::StageAuth { .. }
                | PiknikError::KeyIdMismatch { .. }
                | PiknikError::Signature
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_both_versions() {
        let err = PiknikError::VersionMismatch {
            client: 6,
            server: 5,
        };
        assert_eq!(
            err.to_string(),
            "incompatible server version (client: 6, server: 5)"
        );
    }

    #[test]
    fn test_display_transfer_timeout_in_ms() {
        let err = PiknikError::TransferTimeout {
            timeout: Duration::from_secs(2),
        };
        assert!(err.to_string().contains("2000ms"));
    }

    #[test]
    fn test_authentication_failure_classification() {
        assert!(PiknikError::Signature.is_authentication_failure());
        assert!(PiknikError::StageAuth { stage: "store" }.is_authentication_failure());
        assert!(!PiknikError::ExpiredContent {
            age_secs: 10,
            ttl_secs: 5
        }
        .is_authentication_failure());
    }
}
