use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;

use super::{rithmic_fields, stored_account_info, tradovate_fields, unwired_fetch};
use crate::broker::models::{
    is_present, AccountInfo, BrokerCredentials, CredentialField, NormalizedTrade, Platform,
    ProviderDescriptor,
};
use crate::broker::traits::BrokerProvider;
use tradelens_core::connections::ProviderKind;
use tradelens_core::errors::Result;

const PLATFORMS: [Platform; 4] = [
    Platform::Tradovate,
    Platform::Ninjatrader,
    Platform::Rithmic,
    Platform::Quantower,
];

pub struct LucidTradingProvider {
    credentials: BrokerCredentials,
}

impl LucidTradingProvider {
    pub fn new(credentials: BrokerCredentials) -> Self {
        Self { credentials }
    }

    pub fn descriptor() -> ProviderDescriptor {
        let mut credential_fields = vec![CredentialField::select(
            "platform",
            &PLATFORMS,
            "Trading platform used on Lucid Trading",
        )];
        credential_fields.extend(rithmic_fields());
        credential_fields.extend(tradovate_fields());
        credential_fields.push(CredentialField::text(
            "account_number",
            "Lucid Trading account number",
        ));
        ProviderDescriptor {
            provider: ProviderKind::LucidTrading,
            display_name: "Lucid Trading".to_string(),
            platforms: PLATFORMS.to_vec(),
            credential_fields,
        }
    }
}

#[async_trait]
impl BrokerProvider for LucidTradingProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::LucidTrading
    }

    async fn validate_credentials(&self) -> Result<bool> {
        let c = &self.credentials;
        Ok(match c.platform() {
            Some(Platform::Tradovate | Platform::Ninjatrader) => {
                is_present(&c.tradovate_username) && is_present(&c.tradovate_password)
            }
            Some(Platform::Rithmic | Platform::Quantower) => {
                is_present(&c.rithmic_username) && is_present(&c.rithmic_password)
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
        info!("LucidTrading fetch_trades: platform={}", c.platform_name());
        match c.platform() {
            Some(Platform::Tradovate | Platform::Ninjatrader)
                if is_present(&c.tradovate_username) =>
            {
                unwired_fetch("LucidTrading", "Tradovate API", from, to)
            }
            Some(Platform::Rithmic | Platform::Quantower) if is_present(&c.rithmic_username) => {
                unwired_fetch("LucidTrading", "Rithmic API", from, to)
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn fetch_account_info(&self) -> Result<Option<AccountInfo>> {
        Ok(Some(stored_account_info(&self.credentials)))
    }

    async fn fetch_open_positions(&self) -> Result<Vec<NormalizedTrade>> {
        info!("LucidTrading fetch_open_positions: no live position feed");
        Ok(Vec::new())
    }
}
