//! Trade repository trait.

use async_trait::async_trait;

use super::trades_model::{
    NewTrade, Trade, TradeCounts, TradeQuery, UpsertTradesResult,
};
use crate::errors::Result;

/// Persistence contract for trades.
#[async_trait]
pub trait TradeRepositoryTrait: Send + Sync {
    async fn create(&self, new_trade: NewTrade) -> Result<Trade>;

    /// Inserts every trade as a new row in one transaction.
    async fn create_many(&self, new_trades: Vec<NewTrade>) -> Result<usize>;

    /// Applies trades in order within one transaction. A trade whose external id
    /// matches an existing row of the same connection overwrites that row;
    /// anything else is inserted.
    async fn upsert_by_external_id(&self, new_trades: Vec<NewTrade>)
        -> Result<UpsertTradesResult>;

    fn find_by_external_id(
        &self,
        connection_id: &str,
        external_trade_id: &str,
    ) -> Result<Option<Trade>>;

    /// Closed trades with a close time, ordered by close time ascending.
    fn list_closed(&self, connection_id: &str) -> Result<Vec<Trade>>;

    /// Open trades, newest open time first.
    fn list_open(&self, connection_id: &str) -> Result<Vec<Trade>>;

    /// One page ordered by close time descending (open trades last), then open
    /// time descending, with the total number of matching rows.
    fn list_page(&self, connection_id: &str, query: &TradeQuery) -> Result<(Vec<Trade>, i64)>;

    /// Most recently stored trades.
    fn list_latest(&self, connection_id: &str, limit: i64) -> Result<Vec<Trade>>;

    fn count(&self, connection_id: &str) -> Result<TradeCounts>;
}
