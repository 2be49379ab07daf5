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

const PLATFORMS: [Platform; 3] = [Platform::Ctrader, Platform::Mt4, Platform::Mt5];

pub struct FintokeiProvider {
    credentials: BrokerCredentials,
}

impl FintokeiProvider {
    pub fn new(credentials: BrokerCredentials) -> Self {
        Self { credentials }
    }

    pub fn descriptor() -> ProviderDescriptor {
        let mut credential_fields = vec![CredentialField::select(
            "platform",
            &PLATFORMS,
            "Trading platform used on Fintokei",
        )];
        credential_fields.extend(ctrader_fields());
        credential_fields.extend(metaapi_fields());
        credential_fields.push(CredentialField::text("server", "Broker server name"));
        credential_fields.push(CredentialField::text(
            "account_number",
            "Account number on the platform",
        ));
        ProviderDescriptor {
            provider: ProviderKind::Fintokei,
            display_name: "Fintokei".to_string(),
            platforms: PLATFORMS.to_vec(),
            credential_fields,
        }
    }
}

#[async_trait]
impl BrokerProvider for FintokeiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Fintokei
    }

    async fn validate_credentials(&self) -> Result<bool> {
        let c = &self.credentials;
        Ok(match c.platform() {
            Some(Platform::Ctrader) => is_present(&c.ctrader_access_token),
            Some(Platform::Mt4 | Platform::Mt5) => {
                is_present(&c.metaapi_token) && is_present(&c.metaapi_account_id)
            }
            _ => false,
        })
    }

    async fn fetch_trades(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<NormalizedTrade>> {
        let c = &self.credentials;
        info!("Fintokei fetch_trades: platform={}", c.platform_name());
        match c.platform() {
            Some(Platform::Ctrader) if is_present(&c.ctrader_access_token) => {
                unwired_fetch("Fintokei", "cTrader Open API", from, to)
            }
            Some(Platform::Mt4 | Platform::Mt5) if is_present(&c.metaapi_token) => {
                unwired_fetch("Fintokei", "MetaApi", from, to)
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn fetch_account_info(&self) -> Result<Option<AccountInfo>> {
        Ok(Some(stored_account_info(&self.credentials)))
    }

    async fn fetch_open_positions(&self) -> Result<Vec<NormalizedTrade>> {
        info!("Fintokei fetch_open_positions: no live position feed");
        Ok(Vec::new())
    }
}
