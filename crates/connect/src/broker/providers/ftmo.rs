use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;

use super::{ctrader_fields, metaapi_fields, stored_account_info, unwired_fetch};
use crate::broker::models::{
    is_present, AccountInfo, BrokerCredentials, CredentialField, NormalizedTrade, Platform,
    ProviderDescriptor,
};
use crate::broker::traits::BrokerProvider;
use tradelens_core::connections::ProviderKind;
use tradelens_core::errors::Result;

const PLATFORMS: [Platform; 4] = [
    Platform::Ctrader,
    Platform::Mt4,
    Platform::Mt5,
    Platform::Dxtrade,
];

pub struct FtmoProvider {
    credentials: BrokerCredentials,
}

impl FtmoProvider {
    pub fn new(credentials: BrokerCredentials) -> Self {
        Self { credentials }
    }

    pub fn descriptor() -> ProviderDescriptor {
        let mut credential_fields = vec![CredentialField::select(
            "platform",
            &PLATFORMS,
            "Trading platform used on FTMO",
        )];
        credential_fields.extend(ctrader_fields());
        credential_fields.extend(metaapi_fields());
        credential_fields.push(CredentialField::text(
            "server",
            "Broker server name (e.g. FTMO-Demo)",
        ));
        credential_fields.push(CredentialField::text(
            "account_number",
            "Account number on the platform",
        ));
        ProviderDescriptor {
            provider: ProviderKind::Ftmo,
            display_name: "FTMO".to_string(),
            platforms: PLATFORMS.to_vec(),
            credential_fields,
        }
    }
}

#[async_trait]
impl BrokerProvider for FtmoProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ftmo
    }

    async fn validate_credentials(&self) -> Result<bool> {
        let c = &self.credentials;
        Ok(match c.platform() {
            Some(Platform::Ctrader) => is_present(&c.ctrader_access_token),
            Some(Platform::Mt4 | Platform::Mt5) => {
                is_present(&c.metaapi_token) && is_present(&c.metaapi_account_id)
            }
            Some(Platform::Dxtrade) => is_present(&c.account_number),
            _ => false,
        })
    }

    async fn fetch_trades(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<NormalizedTrade>> {
        let c = &self.credentials;
        info!("FTMO fetch_trades: platform={}", c.platform_name());
        match c.platform() {
            Some(Platform::Ctrader) if is_present(&c.ctrader_access_token) => {
                unwired_fetch("FTMO", "cTrader Open API", from, to)
            }
            Some(Platform::Mt4 | Platform::Mt5) if is_present(&c.metaapi_token) => {
                unwired_fetch("FTMO", "MetaApi", from, to)
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn fetch_account_info(&self) -> Result<Option<AccountInfo>> {
        Ok(Some(stored_account_info(&self.credentials)))
    }

    async fn fetch_open_positions(&self) -> Result<Vec<NormalizedTrade>> {
        info!("FTMO fetch_open_positions: no live position feed");
        Ok(Vec::new())
    }
}
