use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};

use super::push_model::{PushOutcome, PushTradePayload};
use crate::connections::{Connection, ConnectionRepositoryTrait};
use crate::errors::{Error, Result, ValidationError};
use crate::stats::StatsServiceTrait;
use crate::trades::{NewTrade, TradeMetadata, TradeRepositoryTrait, TradeSide, TradeSource};
use crate::utils::time_utils::{parse_utc_datetime, PUSH_DATETIME_FORMATS};

#[async_trait]
pub trait PushIngestionServiceTrait: Send + Sync {
    /// Resolves the connection owning `payload.token`.
    fn authenticate(&self, payload: &PushTradePayload) -> Result<Connection>;

    /// Records one pushed trade unless its ticket is already stored.
    async fn ingest(&self, payload: PushTradePayload) -> Result<PushOutcome>;
}

/// Service ingesting trades pushed by the trading-terminal bridge
pub struct PushIngestionService {
    connection_repository: Arc<dyn ConnectionRepositoryTrait>,
    trade_repository: Arc<dyn TradeRepositoryTrait>,
    stats_service: Arc<dyn StatsServiceTrait>,
}

impl PushIngestionService {
    pub fn new(
        connection_repository: Arc<dyn ConnectionRepositoryTrait>,
        trade_repository: Arc<dyn TradeRepositoryTrait>,
        stats_service: Arc<dyn StatsServiceTrait>,
    ) -> Self {
        Self {
            connection_repository,
            trade_repository,
            stats_service,
        }
    }

    fn build_trade(connection: &Connection, payload: PushTradePayload) -> Result<NewTrade> {
        let open_time = parse_utc_datetime(&payload.open_time, PUSH_DATETIME_FORMATS)
            .ok_or_else(|| {
                Error::Validation(ValidationError::InvalidInput(format!(
                    "Invalid open_time: '{}'",
                    payload.open_time
                )))
            })?;
        let close_time = payload
            .close_time
            .as_deref()
            .and_then(|value| parse_utc_datetime(value, PUSH_DATETIME_FORMATS));

        let comment = Some(payload.comment).filter(|c| !c.trim().is_empty());
        Ok(NewTrade {
            connection_id: connection.id.clone(),
            owner_id: connection.owner_id.clone(),
            provider: connection.provider,
            external_trade_id: Some(payload.ticket.to_string()),
            symbol: payload.symbol.trim().to_string(),
            side: TradeSide::buy_or_sell(&payload.trade_type),
            open_time,
            close_time,
            open_price: payload.open_price,
            close_price: payload.close_price,
            volume: payload.lots,
            pnl: Some(payload.profit),
            commission: payload.commission,
            swap: payload.swap,
            source: TradeSource::Ea,
            metadata: TradeMetadata {
                magic: Some(payload.magic),
                comment,
                ..Default::default()
            },
        })
    }
}

#[async_trait]
impl PushIngestionServiceTrait for PushIngestionService {
    fn authenticate(&self, payload: &PushTradePayload) -> Result<Connection> {
        let token = payload.token.trim();
        let found = if token.is_empty() {
            None
        } else {
            self.connection_repository.find_by_push_token(token)?
        };
        found.ok_or_else(|| {
            warn!(
                "Rejected trade push with unknown token {}...",
                payload.token_prefix()
            );
            Error::Unauthorized("Invalid push token".to_string())
        })
    }

    async fn ingest(&self, payload: PushTradePayload) -> Result<PushOutcome> {
        let connection = self.authenticate(&payload)?;
        let external_trade_id = payload.ticket.to_string();

        if self
            .trade_repository
            .find_by_external_id(&connection.id, &external_trade_id)?
            .is_some()
        {
            info!(
                "Ticket {external_trade_id} already recorded for connection {}",
                connection.id
            );
            return Ok(PushOutcome::Duplicate {
                connection_id: connection.id,
                external_trade_id,
            });
        }

        let new_trade = Self::build_trade(&connection, payload)?;
        let trade = self.trade_repository.create(new_trade).await?;
        info!(
            "Recorded pushed {} {} ticket {} for connection {}",
            trade.side, trade.symbol, external_trade_id, connection.id
        );

        self.stats_service.recalculate_daily_stats(&connection).await?;

        Ok(PushOutcome::Recorded {
            connection_id: connection.id,
            trade_id: trade.id,
            symbol: trade.symbol,
            side: trade.side,
            pnl: trade.pnl.unwrap_or_default(),
        })
    }
}
