//! Trades module - the canonical trade record and its repository contract.

mod trades_model;
mod trades_traits;


pub use trades_model::{
    NewTrade, Trade, TradeCounts, TradeMetadata, TradePage, TradeQuery, TradeSide, TradeSource,
    TradeStatus, UpsertTradesResult,
};
pub use trades_traits::TradeRepositoryTrait;
