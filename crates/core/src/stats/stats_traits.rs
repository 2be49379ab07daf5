//! Statistics repository and service traits.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::stats_model::{DailyStat, Dashboard, NewDailyStat, OpenPosition};
use crate::connections::Connection;
use crate::errors::Result;
use crate::trades::{TradePage, TradeQuery};

/// Persistence contract for daily aggregates.
#[async_trait]
pub trait DailyStatRepositoryTrait: Send + Sync {
    /// Deletes every stored row of the connection and inserts `stats`, atomically.
    async fn replace_for_connection(
        &self,
        connection_id: &str,
        stats: Vec<NewDailyStat>,
    ) -> Result<Vec<DailyStat>>;

    /// Rows of the connection within the inclusive date range, oldest first.
    fn list(
        &self,
        connection_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<DailyStat>>;
}

/// Analytics over a connection's trades.
#[async_trait]
pub trait StatsServiceTrait: Send + Sync {
    /// Rebuilds the daily aggregates of a connection from its closed trades.
    async fn recalculate_daily_stats(&self, connection: &Connection) -> Result<Vec<DailyStat>>;

    fn get_dashboard(&self, connection: &Connection) -> Result<Dashboard>;

    fn list_trades(&self, connection_id: &str, query: TradeQuery) -> Result<TradePage>;

    fn get_daily_stats(
        &self,
        connection_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<DailyStat>>;

    fn get_open_positions(&self, connection_id: &str) -> Result<Vec<OpenPosition>>;
}
