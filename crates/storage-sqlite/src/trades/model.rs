//! Database models for trades.

use std::str::FromStr;

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::utils::{
    from_json_column, parse_decimal_tolerant, parse_optional_decimal, to_json_column, to_utc,
};
use tradelens_core::connections::ProviderKind;
use tradelens_core::errors::Error;
use tradelens_core::trades::{
    NewTrade, Trade, TradeMetadata, TradeSide, TradeSource, TradeStatus,
};

/// Database model for trades
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::broker_trades)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct TradeDB {
    pub id: String,
    pub connection_id: String,
    pub owner_id: String,
    pub provider: String,
    pub external_trade_id: Option<String>,
    pub symbol: String,
    pub side: String,
    pub open_time: NaiveDateTime,
    pub close_time: Option<NaiveDateTime>,
    pub open_price: String,
    pub close_price: Option<String>,
    pub volume: String,
    pub pnl: Option<String>,
    pub commission: String,
    pub swap: String,
    pub status: String,
    pub source: String,
    pub metadata: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TradeDB {
    /// Row for a trade that has not been stored yet.
    pub fn from_new(new_trade: NewTrade) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            status: new_trade.status().as_str().to_string(),
            metadata: to_json_column(&new_trade.metadata, new_trade.metadata.is_empty()),
            provider: new_trade.provider.as_str().to_string(),
            side: new_trade.side.as_str().to_string(),
            source: new_trade.source.as_str().to_string(),
            open_time: new_trade.open_time.naive_utc(),
            close_time: new_trade.close_time.map(|dt| dt.naive_utc()),
            open_price: new_trade.open_price.to_string(),
            close_price: new_trade.close_price.map(|d| d.to_string()),
            volume: new_trade.volume.to_string(),
            pnl: new_trade.pnl.map(|d| d.to_string()),
            commission: new_trade.commission.to_string(),
            swap: new_trade.swap.to_string(),
            connection_id: new_trade.connection_id,
            owner_id: new_trade.owner_id,
            external_trade_id: new_trade.external_trade_id,
            symbol: new_trade.symbol,
            created_at: now,
            updated_at: now,
        }
    }
}

impl TryFrom<TradeDB> for Trade {
    type Error = Error;

    fn try_from(db: TradeDB) -> Result<Self, Self::Error> {
        let close_time = db.close_time.map(to_utc);
        let status = TradeStatus::from_str(&db.status)
            .unwrap_or_else(|_| TradeStatus::for_close_time(close_time.as_ref()));
        Ok(Self {
            provider: ProviderKind::from_str(&db.provider)?,
            source: TradeSource::from_str(&db.source)?,
            side: TradeSide::normalize(&db.side),
            status,
            open_time: to_utc(db.open_time),
            close_time,
            open_price: parse_decimal_tolerant(&db.open_price, "open_price"),
            close_price: parse_optional_decimal(db.close_price.as_deref(), "close_price"),
            volume: parse_decimal_tolerant(&db.volume, "volume"),
            pnl: parse_optional_decimal(db.pnl.as_deref(), "pnl"),
            commission: parse_decimal_tolerant(&db.commission, "commission"),
            swap: parse_decimal_tolerant(&db.swap, "swap"),
            metadata: from_json_column::<TradeMetadata>(db.metadata.as_deref(), "metadata"),
            created_at: to_utc(db.created_at),
            updated_at: to_utc(db.updated_at),
            id: db.id,
            connection_id: db.connection_id,
            owner_id: db.owner_id,
            external_trade_id: db.external_trade_id,
            symbol: db.symbol,
        })
    }
}
