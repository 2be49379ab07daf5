//! Binding provider trades to a connection.

use super::models::NormalizedTrade;
use tradelens_core::connections::Connection;
use tradelens_core::trades::{NewTrade, TradeMetadata, TradeSource};

/// Converts a provider trade into a row of `connection`, tagged with the provider as source.
pub fn to_new_trade(connection: &Connection, trade: NormalizedTrade) -> NewTrade {
    let external_trade_id = trade
        .external_trade_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());
    NewTrade {
        connection_id: connection.id.clone(),
        owner_id: connection.owner_id.clone(),
        provider: connection.provider,
        external_trade_id,
        symbol: trade.symbol,
        side: trade.side,
        open_time: trade.open_time,
        close_time: trade.close_time,
        open_price: trade.open_price,
        close_price: trade.close_price,
        volume: trade.volume,
        pnl: trade.pnl,
        commission: trade.commission,
        swap: trade.swap,
        source: TradeSource::Provider(connection.provider),
        metadata: TradeMetadata {
            extra: trade.metadata,
            ..Default::default()
        },
    }
}
