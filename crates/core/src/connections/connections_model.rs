//! Broker connection domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::Error;
use crate::secrets::CredentialMap;

/// Brokers a connection can be linked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Ftmo,
    Fintokei,
    Topstep,
    Tradeify,
    LucidTrading,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::Ftmo,
        ProviderKind::Fintokei,
        ProviderKind::Topstep,
        ProviderKind::Tradeify,
        ProviderKind::LucidTrading,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Ftmo => "ftmo",
            ProviderKind::Fintokei => "fintokei",
            ProviderKind::Topstep => "topstep",
            ProviderKind::Tradeify => "tradeify",
            ProviderKind::LucidTrading => "lucidtrading",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| Error::ProviderUnsupported(s.to_string()))
    }
}

/// Administrative state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Active,
    Disabled,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Active => "active",
            ConnectionStatus::Disabled => "disabled",
            ConnectionStatus::Error => "error",
        }
    }
}

impl FromStr for ConnectionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ConnectionStatus::Active),
            "disabled" => Ok(ConnectionStatus::Disabled),
            "error" => Ok(ConnectionStatus::Error),
            other => Err(Error::Unexpected(format!(
                "Unknown connection status '{other}'"
            ))),
        }
    }
}

/// Outcome of the most recent ingestion event recorded on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastSyncStatus {
    Success,
    Failed,
    InProgress,
}

impl LastSyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LastSyncStatus::Success => "success",
            LastSyncStatus::Failed => "failed",
            LastSyncStatus::InProgress => "in_progress",
        }
    }
}

impl FromStr for LastSyncStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(LastSyncStatus::Success),
            "failed" => Ok(LastSyncStatus::Failed),
            "in_progress" => Ok(LastSyncStatus::InProgress),
            other => Err(Error::Unexpected(format!(
                "Unknown last sync status '{other}'"
            ))),
        }
    }
}

/// One user's link to one broker account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub owner_id: String,
    pub provider: ProviderKind,
    pub account_identifier: String,
    #[serde(skip_serializing)]
    pub credentials_encrypted: Option<String>,
    pub status: ConnectionStatus,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub last_sync_status: Option<LastSyncStatus>,
    pub last_sync_error: Option<String>,
    /// Opaque secret used by the trading-terminal bridge to push trades.
    #[serde(skip_serializing)]
    pub push_token: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Connection {
    pub fn has_credentials(&self) -> bool {
        self.credentials_encrypted.is_some()
    }

    pub fn has_push_token(&self) -> bool {
        self.push_token.is_some()
    }
}

/// Input for creating a connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewConnection {
    #[serde(default)]
    pub owner_id: String,
    pub provider: String,
    pub account_identifier: String,
    pub credentials: Option<CredentialMap>,
    pub metadata: Option<Map<String, Value>>,
}

/// Partial update of a connection. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionUpdate {
    pub account_identifier: Option<String>,
    pub credentials: Option<CredentialMap>,
    pub status: Option<ConnectionStatus>,
    pub metadata: Option<Map<String, Value>>,
}

/// Column changes for a connection's user-editable fields, credentials
/// already encrypted. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionChanges {
    pub account_identifier: Option<String>,
    pub credentials_encrypted: Option<String>,
    pub status: Option<ConnectionStatus>,
    pub metadata: Option<Map<String, Value>>,
}

/// Sync bookkeeping written onto a connection by the ingestion paths.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncStateUpdate {
    /// `None` keeps the stored timestamp.
    pub last_sync_at: Option<DateTime<Utc>>,
    pub last_sync_status: LastSyncStatus,
    /// Always overwrites the stored error; `None` clears it.
    pub last_sync_error: Option<String>,
}

impl SyncStateUpdate {
    pub fn in_progress() -> Self {
        Self {
            last_sync_at: None,
            last_sync_status: LastSyncStatus::InProgress,
            last_sync_error: None,
        }
    }

    pub fn succeeded_at(at: DateTime<Utc>) -> Self {
        Self {
            last_sync_at: Some(at),
            last_sync_status: LastSyncStatus::Success,
            last_sync_error: None,
        }
    }

    pub fn failed(error: Option<String>) -> Self {
        Self {
            last_sync_at: None,
            last_sync_status: LastSyncStatus::Failed,
            last_sync_error: error,
        }
    }
}

/// Who is calling. Resolved upstream from the caller's session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub owner_id: String,
    pub is_admin: bool,
}

impl CallerIdentity {
    pub fn user(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            is_admin: false,
        }
    }

    pub fn admin(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            is_admin: true,
        }
    }

    pub fn can_access(&self, connection: &Connection) -> bool {
        self.is_admin || connection.owner_id == self.owner_id
    }
}

/// Freshly issued push token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushTokenGrant {
    pub connection_id: String,
    pub push_token: String,
}

/// Per-owner rollup used by the admin views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerSummary {
    pub owner_id: String,
    pub connection_count: usize,
    pub providers: Vec<ProviderKind>,
}
