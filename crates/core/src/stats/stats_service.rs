use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, info, warn};

use super::stats_calculator::{
    aggregate_daily, compute_calendar, compute_daily_pnl, compute_kpi, compute_open_positions,
    compute_performance_score, compute_recent_trades,
};
use super::stats_model::{DailyStat, Dashboard, NewDailyStat, OpenPosition};
use super::stats_traits::{DailyStatRepositoryTrait, StatsServiceTrait};
use crate::connections::Connection;
use crate::constants::{MAX_TRADES_PAGE_SIZE, RECENT_TRADES_LIMIT};
use crate::errors::{Result, ValidationError};
use crate::trades::{TradePage, TradeQuery, TradeRepositoryTrait};

/// Service computing daily aggregates and dashboard analytics
pub struct StatsService {
    trade_repository: Arc<dyn TradeRepositoryTrait>,
    daily_stat_repository: Arc<dyn DailyStatRepositoryTrait>,
}

impl StatsService {
    pub fn new(
        trade_repository: Arc<dyn TradeRepositoryTrait>,
        daily_stat_repository: Arc<dyn DailyStatRepositoryTrait>,
    ) -> Self {
        Self {
            trade_repository,
            daily_stat_repository,
        }
    }
}

#[async_trait::async_trait]
impl StatsServiceTrait for StatsService {
    async fn recalculate_daily_stats(&self, connection: &Connection) -> Result<Vec<DailyStat>> {
        let closed = self.trade_repository.list_closed(&connection.id)?;
        let rows: Vec<NewDailyStat> = aggregate_daily(&closed)
            .into_iter()
            .map(|day| NewDailyStat {
                connection_id: connection.id.clone(),
                owner_id: connection.owner_id.clone(),
                provider: connection.provider,
                date: day.date,
                total_pnl: day.total_pnl,
                trade_count: day.trade_count,
                winning_trades: day.winning_trades,
                losing_trades: day.losing_trades,
                volume: day.volume,
            })
            .collect();

        debug!(
            "Rebuilding {} daily stat rows from {} closed trades for connection {}",
            rows.len(),
            closed.len(),
            connection.id
        );
        self.daily_stat_repository
            .replace_for_connection(&connection.id, rows)
            .await
    }

    fn get_dashboard(&self, connection: &Connection) -> Result<Dashboard> {
        let closed = self.trade_repository.list_closed(&connection.id)?;
        let open = self.trade_repository.list_open(&connection.id)?;
        if closed.is_empty() {
            warn!(
                "No closed trades stored for connection {} ({})",
                connection.id, connection.provider
            );
        }

        let days = aggregate_daily(&closed);
        let dashboard = Dashboard {
            connection_id: connection.id.clone(),
            provider: connection.provider,
            account_identifier: connection.account_identifier.clone(),
            last_sync_at: connection.last_sync_at,
            kpi: compute_kpi(&closed),
            daily_pnl: compute_daily_pnl(&days),
            calendar_data: compute_calendar(&days),
            recent_trades: compute_recent_trades(&closed, RECENT_TRADES_LIMIT),
            open_positions: compute_open_positions(&open),
            performance_score: compute_performance_score(&closed, &days),
        };

        info!(
            "Dashboard for connection {}: total_pnl={} trades={} win_rate={} max_drawdown={}",
            connection.id,
            dashboard.kpi.total_pnl,
            dashboard.kpi.total_trades,
            dashboard.kpi.win_rate,
            dashboard.kpi.max_drawdown
        );
        Ok(dashboard)
    }

    fn list_trades(&self, connection_id: &str, query: TradeQuery) -> Result<TradePage> {
        if !(1..=MAX_TRADES_PAGE_SIZE).contains(&query.limit) {
            return Err(ValidationError::InvalidInput(format!(
                "limit must be between 1 and {MAX_TRADES_PAGE_SIZE}"
            ))
            .into());
        }
        if query.offset < 0 {
            return Err(
                ValidationError::InvalidInput("offset must not be negative".to_string()).into(),
            );
        }

        let (trades, total) = self.trade_repository.list_page(connection_id, &query)?;
        debug!(
            "Listing trades for connection {connection_id}: status={:?} total={total} returned={}",
            query.status,
            trades.len()
        );
        Ok(TradePage::new(trades, total, &query))
    }

    fn get_daily_stats(
        &self,
        connection_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<DailyStat>> {
        self.daily_stat_repository.list(connection_id, from, to)
    }

    fn get_open_positions(&self, connection_id: &str) -> Result<Vec<OpenPosition>> {
        let open = self.trade_repository.list_open(connection_id)?;
        Ok(compute_open_positions(&open))
    }
}
