use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{anyhow, bail, Context};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow!("TL_LOG_FORMAT must be 'text' or 'json', got '{other}'")),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    /// HS256 secret for caller tokens.
    pub jwt_secret: String,
    pub encryption_key: [u8; 32],
    pub public_base_url: String,
    pub sync_cooldown: Duration,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = env_or("TL_LISTEN_ADDR", "0.0.0.0:8088")
            .parse()
            .context("Invalid TL_LISTEN_ADDR")?;
        let db_path = env_or("TL_DB_PATH", "./db/tradelens.db");
        let cors_allow = parse_origins(&env_or("TL_CORS_ALLOW_ORIGINS", "*"));
        let timeout_ms: u64 = env_or("TL_REQUEST_TIMEOUT_MS", "30000")
            .parse()
            .context("Invalid TL_REQUEST_TIMEOUT_MS")?;

        let jwt_secret = std::env::var("TL_JWT_SECRET").unwrap_or_default();
        if jwt_secret.trim().is_empty() {
            bail!("TL_JWT_SECRET must be set");
        }
        let encryption_key = match std::env::var("TL_ENCRYPTION_KEY") {
            Ok(raw) if !raw.trim().is_empty() => decode_encryption_key(&raw)?,
            _ => derive_encryption_key(&jwt_secret),
        };

        let public_base_url = env_or("TL_PUBLIC_BASE_URL", "http://localhost:8088");
        let cooldown_secs: u64 = env_or("TL_SYNC_COOLDOWN_SECS", "120")
            .parse()
            .context("Invalid TL_SYNC_COOLDOWN_SECS")?;
        let log_format = env_or("TL_LOG_FORMAT", "text").parse()?;

        Ok(Self {
            listen_addr,
            db_path,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            jwt_secret,
            encryption_key,
            public_base_url,
            sync_cooldown: Duration::from_secs(cooldown_secs),
            log_format,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Decodes a base64 key that must be exactly 32 bytes long.
pub fn decode_encryption_key(raw: &str) -> anyhow::Result<[u8; 32]> {
    let decoded = BASE64
        .decode(raw.trim())
        .context("TL_ENCRYPTION_KEY must be base64 encoded")?;
    decoded
        .try_into()
        .map_err(|bytes: Vec<u8>| {
            anyhow!(
                "TL_ENCRYPTION_KEY must decode to exactly 32 bytes, got {}",
                bytes.len()
            )
        })
}

/// Key used when no dedicated encryption key is configured.
pub fn derive_encryption_key(service_secret: &str) -> [u8; 32] {
    Sha256::digest(service_secret.as_bytes()).into()
}
