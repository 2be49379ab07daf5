//! Database models for daily aggregates.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::utils::{parse_decimal_tolerant, to_utc};
use tradelens_core::connections::ProviderKind;
use tradelens_core::errors::Error;
use tradelens_core::stats::{DailyStat, NewDailyStat};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::broker_daily_stats)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DailyStatDB {
    pub id: String,
    pub connection_id: String,
    pub owner_id: String,
    pub provider: String,
    pub date: NaiveDate,
    pub total_pnl: String,
    pub trade_count: i64,
    pub winning_trades: i64,
    pub losing_trades: i64,
    pub volume: String,
    pub created_at: NaiveDateTime,
}

impl From<NewDailyStat> for DailyStatDB {
    fn from(stat: NewDailyStat) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            provider: stat.provider.as_str().to_string(),
            total_pnl: stat.total_pnl.to_string(),
            volume: stat.volume.to_string(),
            connection_id: stat.connection_id,
            owner_id: stat.owner_id,
            date: stat.date,
            trade_count: stat.trade_count,
            winning_trades: stat.winning_trades,
            losing_trades: stat.losing_trades,
            created_at: Utc::now().naive_utc(),
        }
    }
}

impl TryFrom<DailyStatDB> for DailyStat {
    type Error = Error;

    fn try_from(db: DailyStatDB) -> Result<Self, Self::Error> {
        Ok(Self {
            provider: ProviderKind::from_str(&db.provider)?,
            total_pnl: parse_decimal_tolerant(&db.total_pnl, "total_pnl"),
            volume: parse_decimal_tolerant(&db.volume, "volume"),
            created_at: to_utc(db.created_at),
            id: db.id,
            connection_id: db.connection_id,
            owner_id: db.owner_id,
            date: db.date,
            trade_count: db.trade_count,
            winning_trades: db.winning_trades,
            losing_trades: db.losing_trades,
        })
    }
}
