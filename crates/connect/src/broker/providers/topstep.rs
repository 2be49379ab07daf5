use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;

use super::{stored_account_info, tradovate_fields, unwired_fetch};
use crate::broker::models::{
    is_present, AccountInfo, BrokerCredentials, CredentialField, NormalizedTrade, Platform,
    ProviderDescriptor,
};
use crate::broker::traits::BrokerProvider;
use tradelens_core::connections::ProviderKind;
use tradelens_core::errors::Result;

const PLATFORMS: [Platform; 3] = [
    Platform::Topstepx,
    Platform::Tradovate,
    Platform::Ninjatrader,
];

pub struct TopstepProvider {
    credentials: BrokerCredentials,
}

impl TopstepProvider {
    pub fn new(credentials: BrokerCredentials) -> Self {
        Self { credentials }
    }

    pub fn descriptor() -> ProviderDescriptor {
        let mut credential_fields = vec![
            CredentialField::select("platform", &PLATFORMS, "Trading platform used on TopStep"),
            CredentialField::secret("topstepx_api_key", "TopStepX / ProjectX API key"),
            CredentialField::secret("topstepx_api_secret", "TopStepX / ProjectX API secret"),
        ];
        credential_fields.extend(tradovate_fields());
        credential_fields.push(CredentialField::text("account_number", "TopStep account number"));
        ProviderDescriptor {
            provider: ProviderKind::Topstep,
            display_name: "TopStep".to_string(),
            platforms: PLATFORMS.to_vec(),
            credential_fields,
        }
    }
}

#[async_trait]
impl BrokerProvider for TopstepProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Topstep
    }

    async fn validate_credentials(&self) -> Result<bool> {
        let c = &self.credentials;
        Ok(match c.platform() {
            Some(Platform::Topstepx) => {
                is_present(&c.topstepx_api_key) && is_present(&c.topstepx_api_secret)
            }
            Some(Platform::Tradovate | Platform::Ninjatrader) => {
                is_present(&c.tradovate_username) && is_present(&c.tradovate_password)
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
        info!("TopStep fetch_trades: platform={}", c.platform_name());
        match c.platform() {
            Some(Platform::Topstepx) if is_present(&c.topstepx_api_key) => {
                unwired_fetch("TopStep", "ProjectX API", from, to)
            }
            Some(Platform::Tradovate | Platform::Ninjatrader)
                if is_present(&c.tradovate_username) =>
            {
                unwired_fetch("TopStep", "Tradovate API", from, to)
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn fetch_account_info(&self) -> Result<Option<AccountInfo>> {
        Ok(Some(stored_account_info(&self.credentials)))
    }

    async fn fetch_open_positions(&self) -> Result<Vec<NormalizedTrade>> {
        info!("TopStep fetch_open_positions: no live position feed");
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn credentials(value: serde_json::Value) -> BrokerCredentials {
        BrokerCredentials::from_map(value.as_object().cloned().unwrap_or_default()).unwrap()
    }

    #[tokio::test]
    async fn projectx_needs_key_and_secret() {
        let partial = TopstepProvider::new(credentials(json!({
            "platform": "topstepx",
            "topstepx_api_key": "k"
        })));
        let complete = TopstepProvider::new(credentials(json!({
            "platform": "topstepx",
            "topstepx_api_key": "k",
            "topstepx_api_secret": "s"
        })));
        assert!(!partial.validate_credentials().await.unwrap());
        assert!(complete.validate_credentials().await.unwrap());
    }

    #[tokio::test]
    async fn ninjatrader_uses_tradovate_login() {
        let provider = TopstepProvider::new(credentials(json!({
            "platform": "ninjatrader",
            "tradovate_username": "u",
            "tradovate_password": "  "
        })));
        assert!(!provider.validate_credentials().await.unwrap());
    }
}
