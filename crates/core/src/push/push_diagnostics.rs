use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::connections::{Connection, LastSyncStatus, ProviderKind};
use crate::errors::Result;
use crate::sync::{SyncLog, SyncLogRepositoryTrait};
use crate::trades::{Trade, TradeCounts, TradeRepositoryTrait, TradeSide, TradeSource, TradeStatus};
use crate::utils::text_utils::token_preview;

const LATEST_TRADES_SHOWN: i64 = 3;

/// Route the bridge posts trades to, relative to the public base URL.
pub const PUSH_TRADE_PATH: &str = "/api/v1/push/trade";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDigest {
    pub id: String,
    pub symbol: String,
    pub side: TradeSide,
    pub pnl: Option<Decimal>,
    pub status: TradeStatus,
    pub source: TradeSource,
    pub close_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Trade> for TradeDigest {
    fn from(trade: Trade) -> Self {
        Self {
            id: trade.id,
            symbol: trade.symbol,
            side: trade.side,
            pnl: trade.pnl,
            status: trade.status,
            source: trade.source,
            close_time: trade.close_time,
            created_at: trade.created_at,
        }
    }
}

/// Troubleshooting view of a connection's push ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushDiagnostics {
    pub connection_id: String,
    pub provider: ProviderKind,
    pub account_identifier: String,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub last_sync_status: Option<LastSyncStatus>,
    pub trade_counts: TradeCounts,
    pub latest_trades: Vec<TradeDigest>,
    pub last_sync_log: Option<SyncLog>,
    pub has_push_token: bool,
    pub push_token_preview: Option<String>,
    pub push_url: String,
}

/// Assembles [`PushDiagnostics`] from stored trades and sync logs.
pub struct PushDiagnosticsService {
    trade_repository: Arc<dyn TradeRepositoryTrait>,
    sync_log_repository: Arc<dyn SyncLogRepositoryTrait>,
    public_base_url: String,
}

impl PushDiagnosticsService {
    pub fn new(
        trade_repository: Arc<dyn TradeRepositoryTrait>,
        sync_log_repository: Arc<dyn SyncLogRepositoryTrait>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            trade_repository,
            sync_log_repository,
            public_base_url: public_base_url.into(),
        }
    }

    pub fn push_url(&self) -> String {
        format!(
            "{}{}",
            self.public_base_url.trim_end_matches('/'),
            PUSH_TRADE_PATH
        )
    }

    pub fn diagnose(&self, connection: &Connection) -> Result<PushDiagnostics> {
        let trade_counts = self.trade_repository.count(&connection.id)?;
        let latest_trades = self
            .trade_repository
            .list_latest(&connection.id, LATEST_TRADES_SHOWN)?
            .into_iter()
            .map(TradeDigest::from)
            .collect();
        let last_sync_log = self
            .sync_log_repository
            .list_for_connection(&connection.id, 1)?
            .into_iter()
            .next();

        Ok(PushDiagnostics {
            connection_id: connection.id.clone(),
            provider: connection.provider,
            account_identifier: connection.account_identifier.clone(),
            last_sync_at: connection.last_sync_at,
            last_sync_status: connection.last_sync_status,
            trade_counts,
            latest_trades,
            last_sync_log,
            has_push_token: connection.has_push_token(),
            push_token_preview: connection.push_token.as_deref().map(token_preview),
            push_url: self.push_url(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::SyncLog;
    use crate::testing::{closed_trade, connection_fixture, InMemoryStore};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn reports_counts_latest_trades_and_token_preview() {
        let store = InMemoryStore::new();
        let mut connection = connection_fixture("c-1", "owner-1");
        connection.push_token = Some("abcdefghijklmnopqrstuvwxyz".to_string());
        {
            let mut trades = store.trades.lock().unwrap();
            for hour in 1..=4 {
                let mut trade = closed_trade(
                    "c-1",
                    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                    hour,
                    dec!(10),
                    dec!(0),
                    dec!(0),
                );
                if hour % 2 == 0 {
                    trade.source = TradeSource::Ea;
                }
                trades.push(trade);
            }
        }
        store
            .sync_logs
            .lock()
            .unwrap()
            .push(SyncLog::start("c-1").succeed(4));

        let service = PushDiagnosticsService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            "https://journal.example.com/",
        );
        let report = service.diagnose(&connection).unwrap();

        assert_eq!(report.trade_counts.total, 4);
        assert_eq!(report.trade_counts.pushed, 2);
        assert_eq!(report.latest_trades.len(), 3);
        assert!(report.has_push_token);
        assert_eq!(report.push_token_preview.as_deref(), Some("abcdefgh...wxyz"));
        assert_eq!(
            report.push_url,
            "https://journal.example.com/api/v1/push/trade"
        );
        assert_eq!(report.last_sync_log.map(|log| log.trades_synced), Some(4));
    }

    #[test]
    fn connection_without_token_has_no_preview() {
        let store = InMemoryStore::new();
        let service =
            PushDiagnosticsService::new(Arc::new(store.clone()), Arc::new(store), "http://localhost:8088");
        let report = service
            .diagnose(&connection_fixture("c-2", "owner-1"))
            .unwrap();

        assert!(!report.has_push_token);
        assert_eq!(report.push_token_preview, None);
        assert_eq!(report.trade_counts, TradeCounts::default());
        assert!(report.last_sync_log.is_none());
    }
}
