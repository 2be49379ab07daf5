//! Data types exchanged with broker providers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use tradelens_core::connections::ProviderKind;
use tradelens_core::errors::{Error, Result, ValidationError};
use tradelens_core::secrets::CredentialMap;
use tradelens_core::trades::{TradeSide, TradeStatus};

/// Trading platform a prop-firm account is reached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ctrader,
    Mt4,
    Mt5,
    Dxtrade,
    Topstepx,
    Tradovate,
    Ninjatrader,
    Rithmic,
    Quantower,
}

impl Platform {
    pub const ALL: [Platform; 9] = [
        Platform::Ctrader,
        Platform::Mt4,
        Platform::Mt5,
        Platform::Dxtrade,
        Platform::Topstepx,
        Platform::Tradovate,
        Platform::Ninjatrader,
        Platform::Rithmic,
        Platform::Quantower,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ctrader => "ctrader",
            Platform::Mt4 => "mt4",
            Platform::Mt5 => "mt5",
            Platform::Dxtrade => "dxtrade",
            Platform::Topstepx => "topstepx",
            Platform::Tradovate => "tradovate",
            Platform::Ninjatrader => "ninjatrader",
            Platform::Rithmic => "rithmic",
            Platform::Quantower => "quantower",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase();
        Platform::ALL
            .into_iter()
            .find(|platform| platform.as_str() == normalized)
            .ok_or_else(|| {
                ValidationError::InvalidInput(format!("Unknown trading platform '{s}'")).into()
            })
    }
}

/// Decrypted credentials of a connection.
///
/// Every field is optional; which ones a provider needs depends on the
/// selected platform. Keys outside the known set are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerCredentials {
    pub platform: Option<String>,
    pub ctrader_client_id: Option<String>,
    pub ctrader_client_secret: Option<String>,
    pub ctrader_access_token: Option<String>,
    pub metaapi_token: Option<String>,
    pub metaapi_account_id: Option<String>,
    pub server: Option<String>,
    pub account_number: Option<String>,
    pub topstepx_api_key: Option<String>,
    pub topstepx_api_secret: Option<String>,
    pub tradovate_username: Option<String>,
    pub tradovate_password: Option<String>,
    pub tradovate_device_id: Option<String>,
    pub rithmic_username: Option<String>,
    pub rithmic_password: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BrokerCredentials {
    pub fn from_map(map: CredentialMap) -> Result<Self> {
        serde_json::from_value(Value::Object(map)).map_err(|e| {
            ValidationError::InvalidInput(format!("Malformed broker credentials: {e}")).into()
        })
    }

    /// Selected platform, or `None` when missing or not recognized.
    pub fn platform(&self) -> Option<Platform> {
        self.platform
            .as_deref()
            .and_then(|value| value.parse().ok())
    }

    /// Raw platform value, for logging.
    pub fn platform_name(&self) -> &str {
        self.platform.as_deref().unwrap_or("")
    }

    pub fn server_name(&self) -> String {
        self.server.clone().unwrap_or_default()
    }
}

/// True when a credential field holds a non-blank value.
pub fn is_present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// A trade as returned by a provider, before it is bound to a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTrade {
    pub external_trade_id: Option<String>,
    pub symbol: String,
    pub side: TradeSide,
    pub open_time: DateTime<Utc>,
    pub close_time: Option<DateTime<Utc>>,
    pub open_price: Decimal,
    pub close_price: Option<Decimal>,
    pub volume: Decimal,
    pub pnl: Option<Decimal>,
    #[serde(default)]
    pub commission: Decimal,
    #[serde(default)]
    pub swap: Decimal,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl NormalizedTrade {
    pub fn status(&self) -> TradeStatus {
        TradeStatus::for_close_time(self.close_time.as_ref())
    }
}

/// Account summary reported by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_id: String,
    pub account_name: String,
    pub balance: Decimal,
    pub equity: Decimal,
    pub currency: String,
    pub server: String,
    pub platform: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Default for AccountInfo {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            account_name: String::new(),
            balance: Decimal::ZERO,
            equity: Decimal::ZERO,
            currency: "USD".to_string(),
            server: String::new(),
            platform: String::new(),
            metadata: Map::new(),
        }
    }
}

/// Input widget a credential field is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Select,
    String,
    Password,
}

/// One credential a provider accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialField {
    pub name: String,
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub required: bool,
    pub description: String,
}

impl CredentialField {
    pub fn select(name: &str, platforms: &[Platform], description: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::Select,
            options: platforms.iter().map(|p| p.as_str().to_string()).collect(),
            required: true,
            description: description.to_string(),
        }
    }

    pub fn text(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::String,
            options: Vec::new(),
            required: false,
            description: description.to_string(),
        }
    }

    pub fn secret(name: &str, description: &str) -> Self {
        Self {
            field_type: FieldType::Password,
            ..Self::text(name, description)
        }
    }
}

/// What a provider needs from the user to connect an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub provider: ProviderKind,
    pub display_name: String,
    pub platforms: Vec<Platform>,
    pub credential_fields: Vec<CredentialField>,
}
