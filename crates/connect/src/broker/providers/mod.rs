//! One flat [`BrokerProvider`](super::BrokerProvider) implementation per prop firm.
//!
//! Each provider dispatches on the `platform` credential to a sub-integration.
//! The sub-integrations have no network client yet and report no trades.

mod fintokei;
mod ftmo;
mod lucidtrading;
mod topstep;
mod tradeify;

pub use fintokei::FintokeiProvider;
pub use ftmo::FtmoProvider;
pub use lucidtrading::LucidTradingProvider;
pub use topstep::TopstepProvider;
pub use tradeify::TradeifyProvider;

use chrono::{DateTime, Utc};
use log::info;

use super::models::{AccountInfo, BrokerCredentials, CredentialField, NormalizedTrade};
use tradelens_core::errors::Result;

/// Sub-integration without a client: logs the request and reports nothing.
fn unwired_fetch(
    provider: &str,
    integration: &str,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<Vec<NormalizedTrade>> {
    info!("{provider}: {integration} client not available (from={from:?}, to={to:?}), no trades fetched");
    Ok(Vec::new())
}

/// Account info built from stored credentials only.
fn stored_account_info(credentials: &BrokerCredentials) -> AccountInfo {
    AccountInfo {
        account_id: credentials.account_number.clone().unwrap_or_default(),
        platform: credentials.platform_name().to_string(),
        server: credentials.server_name(),
        ..Default::default()
    }
}

fn ctrader_fields() -> Vec<CredentialField> {
    vec![
        CredentialField::text("ctrader_client_id", "cTrader Open API client ID"),
        CredentialField::secret("ctrader_client_secret", "cTrader Open API client secret"),
        CredentialField::secret("ctrader_access_token", "cTrader OAuth2 access token"),
    ]
}

fn metaapi_fields() -> Vec<CredentialField> {
    vec![
        CredentialField::secret("metaapi_token", "MetaApi API token (MT4/MT5)"),
        CredentialField::text("metaapi_account_id", "MetaApi account ID"),
    ]
}

fn tradovate_fields() -> Vec<CredentialField> {
    vec![
        CredentialField::text("tradovate_username", "Tradovate username"),
        CredentialField::secret("tradovate_password", "Tradovate password"),
        CredentialField::text("tradovate_device_id", "Tradovate device ID used for API auth"),
    ]
}

fn rithmic_fields() -> Vec<CredentialField> {
    vec![
        CredentialField::text("rithmic_username", "Rithmic username"),
        CredentialField::secret("rithmic_password", "Rithmic password"),
    ]
}
