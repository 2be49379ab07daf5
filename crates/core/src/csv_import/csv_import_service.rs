use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::csv_formats::{CsvFormat, CsvTrade};
use super::csv_reader::read_table;
use crate::connections::{Connection, ConnectionRepositoryTrait, SyncStateUpdate};
use crate::errors::Result;
use crate::stats::StatsServiceTrait;
use crate::trades::{NewTrade, TradeMetadata, TradeRepositoryTrait, TradeSource};

/// Result of one CSV upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvImportSummary {
    pub format: CsvFormat,
    pub imported: usize,
    pub skipped: usize,
}

/// Reads a file into canonical trades without persisting anything.
pub fn parse_trades(content: &[u8]) -> Result<(CsvFormat, Vec<CsvTrade>, usize)> {
    let table = read_table(content)?;
    let format = CsvFormat::detect(&table.headers)?;
    let total_rows = table.rows.len();
    let trades: Vec<CsvTrade> = table
        .rows
        .iter()
        .filter_map(|row| format.normalize_row(row))
        .collect();
    let skipped = total_rows - trades.len();
    Ok((format, trades, skipped))
}

fn to_new_trade(connection: &Connection, trade: CsvTrade) -> NewTrade {
    NewTrade {
        connection_id: connection.id.clone(),
        owner_id: connection.owner_id.clone(),
        provider: connection.provider,
        external_trade_id: trade.external_trade_id,
        symbol: trade.symbol,
        side: trade.side,
        open_time: trade.open_time,
        close_time: trade.close_time,
        open_price: trade.open_price,
        close_price: Some(trade.close_price),
        volume: trade.volume,
        pnl: Some(trade.pnl),
        commission: trade.commission,
        swap: trade.swap,
        source: TradeSource::Csv,
        metadata: TradeMetadata::default(),
    }
}

#[async_trait]
pub trait CsvImportServiceTrait: Send + Sync {
    /// Imports every usable row of a broker export into the connection.
    ///
    /// Rows are inserted as-is: re-importing a file adds its trades again.
    async fn import_csv(&self, connection: &Connection, content: &[u8])
        -> Result<CsvImportSummary>;
}

/// Service importing broker CSV exports
pub struct CsvImportService {
    connection_repository: Arc<dyn ConnectionRepositoryTrait>,
    trade_repository: Arc<dyn TradeRepositoryTrait>,
    stats_service: Arc<dyn StatsServiceTrait>,
}

impl CsvImportService {
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
}

#[async_trait]
impl CsvImportServiceTrait for CsvImportService {
    async fn import_csv(
        &self,
        connection: &Connection,
        content: &[u8],
    ) -> Result<CsvImportSummary> {
        let (format, trades, skipped) = parse_trades(content)?;
        if skipped > 0 {
            warn!(
                "Skipped {skipped} unusable {format} rows for connection {}",
                connection.id
            );
        }

        let new_trades: Vec<NewTrade> = trades
            .into_iter()
            .map(|trade| to_new_trade(connection, trade))
            .collect();
        let imported = if new_trades.is_empty() {
            0
        } else {
            self.trade_repository.create_many(new_trades).await?
        };

        if imported > 0 {
            self.connection_repository
                .update_sync_state(&connection.id, SyncStateUpdate::succeeded_at(Utc::now()))
                .await?;
            self.stats_service.recalculate_daily_stats(connection).await?;
        }

        info!(
            "Imported {imported} {format} trades into connection {}",
            connection.id
        );
        Ok(CsvImportSummary {
            format,
            imported,
            skipped,
        })
    }
}
