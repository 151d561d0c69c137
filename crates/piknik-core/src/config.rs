use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PiknikError, PiknikResult};

pub const DEFAULT_CONNECT: &str = "127.0.0.1:8075";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DATA_TIMEOUT_SECS: u64 = 3600;
pub const DEFAULT_TTL_SECS: u64 = 7 * 24 * 3600;

const REDACTED: &str = "[REDACTED]";

/// Client configuration (loaded from ~/.piknik.toml)
///
/// Accepts both snake_case keys and the capitalised keys used by existing
/// piknik config files (`Connect`, `Psk`, `SignPk`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PiknikConfig {
    /// Server address as host:port (default: 127.0.0.1:8075)
    #[serde(alias = "Connect")]
    pub connect: String,
    /// Pre-shared key, 64 hex chars
    #[serde(alias = "Psk", skip_serializing_if = "Option::is_none")]
    pub psk: Option<String>,
    /// Ed25519 public key, 64 hex chars
    #[serde(alias = "SignPk", skip_serializing_if = "Option::is_none")]
    pub sign_pk: Option<String>,
    /// Ed25519 seed (64 hex chars) or seed || public key (128 hex chars)
    #[serde(alias = "SignSk", skip_serializing_if = "Option::is_none")]
    pub sign_sk: Option<String>,
    /// Symmetric encryption key, 64 hex chars
    #[serde(alias = "EncryptSk", skip_serializing_if = "Option::is_none")]
    pub encrypt_sk: Option<String>,
    /// Explicit encryption key id; 0 derives it from encrypt_sk
    #[serde(alias = "EncryptSkID")]
    pub encrypt_sk_id: u64,
    /// Connect + handshake timeout in seconds
    #[serde(alias = "Timeout")]
    pub timeout: u64,
    /// Payload transfer timeout in seconds
    #[serde(alias = "DataTimeout")]
    pub data_timeout: u64,
    /// Maximum age of fetched content in seconds
    #[serde(alias = "TTL")]
    pub ttl: u64,
    /// Warn if the config file is readable by other users (default: true)
    pub config_file_mode_check: bool,
}

impl Default for PiknikConfig {
    fn default() -> Self {
        Self {
            connect: DEFAULT_CONNECT.into(),
            psk: None,
            sign_pk: None,
            sign_sk: None,
            encrypt_sk: None,
            encrypt_sk_id: 0,
            timeout: DEFAULT_TIMEOUT_SECS,
            data_timeout: DEFAULT_DATA_TIMEOUT_SECS,
            ttl: DEFAULT_TTL_SECS,
            config_file_mode_check: true,
        }
    }
}

impl PiknikConfig {
    pub fn from_toml_str(content: &str) -> PiknikResult<Self> {
        toml::from_str(content).map_err(|e| PiknikError::Config(format!("parsing config: {e}")))
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> PiknikResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PiknikError::Config(format!("reading config {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&content)?;
        if config.config_file_mode_check {
            warn_if_shared(path);
        }
        Ok(config)
    }

    /// A copy with every secret key replaced by a placeholder, safe to print.
    pub fn redacted(&self) -> Self {
        let hide = |v: &Option<String>| v.as_ref().map(|_| REDACTED.to_string());
        Self {
            psk: hide(&self.psk),
            sign_sk: hide(&self.sign_sk),
            encrypt_sk: hide(&self.encrypt_sk),
            ..self.clone()
        }
    }
}

#[cfg(unix)]
fn warn_if_shared(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(meta) = std::fs::metadata(path) {
        let mode = meta.permissions().mode();
        if mode & 0o077 != 0 {
            tracing::warn!(
                path = %path.display(),
                mode = %format!("{:o}", mode & 0o777),
                "config file holds secret keys but is readable by other users; run chmod 600"
            );
        }
    }
}

#[cfg(not(unix))]
fn warn_if_shared(_path: &Path) {}

/// Split `host:port` (or `[v6addr]:port`) into its parts.
pub fn parse_connect(addr: &str) -> PiknikResult<(String, u16)> {
    let invalid = || PiknikError::Config(format!("invalid connect address: {addr}"));

    let (host, port) = addr.rsplit_once(':').ok_or_else(invalid)?;
    let host = match host.strip_prefix('[') {
        Some(bracketed) => bracketed.strip_suffix(']').ok_or_else(invalid)?,
        // A bare IPv6 address would be split at its last group
        None if host.contains(':') => return Err(invalid()),
        None => host,
    };
    if host.is_empty() {
        return Err(invalid());
    }
    let port: u16 = port.parse().map_err(|_| invalid())?;
    Ok((host.to_string(), port))
}

/// Decode a required hex-encoded key of exactly `N` bytes.
pub fn decode_hex_key<const N: usize>(name: &str, value: Option<&str>) -> PiknikResult<[u8; N]> {
    let wrong_size = || {
        PiknikError::Config(format!(
            "{name} must be a {}-character hex string ({N} bytes)",
            N * 2
        ))
    };
    let value = value.map(str::trim).filter(|v| !v.is_empty()).ok_or_else(wrong_size)?;
    if value.len() != N * 2 {
        return Err(wrong_size());
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(value, &mut out)
        .map_err(|e| PiknikError::Config(format!("{name} is not valid hex: {e}")))?;
    Ok(out)
}

/// Decode the Ed25519 signing seed.
///
/// Accepts a bare 32-byte seed or the 64-byte `seed || public key` form; only
/// the seed is kept.
pub fn decode_sign_seed(value: Option<&str>) -> PiknikResult<[u8; 32]> {
    match value.map(str::trim) {
        Some(long) if long.len() == 128 => {
            let full: [u8; 64] = decode_hex_key("sign_sk", Some(long))?;
            let mut seed = [0u8; 32];
            seed.copy_from_slice(&full[..32]);
            Ok(seed)
        }
        other => decode_hex_key("sign_sk", other),
    }
}
