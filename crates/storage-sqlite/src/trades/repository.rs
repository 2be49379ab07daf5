use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::broker_trades;

use super::model::TradeDB;
use tradelens_core::errors::Result;
use tradelens_core::trades::{
    NewTrade, Trade, TradeCounts, TradeQuery, TradeRepositoryTrait, TradeSource, TradeStatus,
    UpsertTradesResult,
};

fn into_domain(rows: Vec<TradeDB>) -> Result<Vec<Trade>> {
    rows.into_iter().map(Trade::try_from).collect()
}

fn insert_row(conn: &mut SqliteConnection, row: &TradeDB) -> Result<()> {
    diesel::insert_into(broker_trades::table)
        .values(row)
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(())
}

/// Repository for trades
pub struct TradeRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl TradeRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl TradeRepositoryTrait for TradeRepository {
    async fn create(&self, new_trade: NewTrade) -> Result<Trade> {
        self.writer
            .exec(move |conn| {
                let row = TradeDB::from_new(new_trade);
                insert_row(conn, &row)?;
                Trade::try_from(row)
            })
            .await
    }

    async fn create_many(&self, new_trades: Vec<NewTrade>) -> Result<usize> {
        self.writer
            .exec(move |conn| {
                let count = new_trades.len();
                for new_trade in new_trades {
                    insert_row(conn, &TradeDB::from_new(new_trade))?;
                }
                Ok(count)
            })
            .await
    }

    async fn upsert_by_external_id(
        &self,
        new_trades: Vec<NewTrade>,
    ) -> Result<UpsertTradesResult> {
        self.writer
            .exec(move |conn| {
                let mut result = UpsertTradesResult::default();
                for new_trade in new_trades {
                    let existing = match new_trade.dedup_key() {
                        Some(key) => broker_trades::table
                            .filter(broker_trades::connection_id.eq(&new_trade.connection_id))
                            .filter(broker_trades::external_trade_id.eq(key))
                            .select((broker_trades::id, broker_trades::created_at))
                            .first::<(String, chrono::NaiveDateTime)>(conn)
                            .optional()
                            .map_err(StorageError::from)?,
                        None => None,
                    };

                    let mut row = TradeDB::from_new(new_trade);
                    match existing {
                        Some((id, created_at)) => {
                            row.id = id;
                            row.created_at = created_at;
                            diesel::update(broker_trades::table.find(&row.id))
                                .set(&row)
                                .execute(conn)
                                .map_err(StorageError::from)?;
                            result.updated += 1;
                        }
                        None => {
                            insert_row(conn, &row)?;
                            result.inserted += 1;
                        }
                    }
                }
                Ok(result)
            })
            .await
    }

    fn find_by_external_id(
        &self,
        connection_id: &str,
        external_trade_id: &str,
    ) -> Result<Option<Trade>> {
        let mut conn = get_connection(&self.pool)?;
        broker_trades::table
            .filter(broker_trades::connection_id.eq(connection_id))
            .filter(broker_trades::external_trade_id.eq(external_trade_id))
            .select(TradeDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(Trade::try_from)
            .transpose()
    }

    fn list_closed(&self, connection_id: &str) -> Result<Vec<Trade>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = broker_trades::table
            .filter(broker_trades::connection_id.eq(connection_id))
            .filter(broker_trades::status.eq(TradeStatus::Closed.as_str()))
            .filter(broker_trades::close_time.is_not_null())
            .order(broker_trades::close_time.asc())
            .select(TradeDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        into_domain(rows)
    }

    fn list_open(&self, connection_id: &str) -> Result<Vec<Trade>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = broker_trades::table
            .filter(broker_trades::connection_id.eq(connection_id))
            .filter(broker_trades::status.eq(TradeStatus::Open.as_str()))
            .order(broker_trades::open_time.desc())
            .select(TradeDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        into_domain(rows)
    }

    fn list_page(&self, connection_id: &str, query: &TradeQuery) -> Result<(Vec<Trade>, i64)> {
        let mut conn = get_connection(&self.pool)?;

        let mut count_query = broker_trades::table
            .filter(broker_trades::connection_id.eq(connection_id))
            .into_boxed();
        let mut page_query = broker_trades::table
            .filter(broker_trades::connection_id.eq(connection_id))
            .into_boxed();
        if let Some(status) = query.status {
            count_query = count_query.filter(broker_trades::status.eq(status.as_str()));
            page_query = page_query.filter(broker_trades::status.eq(status.as_str()));
        }

        let total = count_query
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(StorageError::from)?;
        // SQLite sorts NULL close times last in descending order.
        let rows = page_query
            .order((broker_trades::close_time.desc(), broker_trades::open_time.desc()))
            .limit(query.limit)
            .offset(query.offset)
            .select(TradeDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        Ok((into_domain(rows)?, total))
    }

    fn list_latest(&self, connection_id: &str, limit: i64) -> Result<Vec<Trade>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = broker_trades::table
            .filter(broker_trades::connection_id.eq(connection_id))
            .order(broker_trades::created_at.desc())
            .limit(limit)
            .select(TradeDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        into_domain(rows)
    }

    fn count(&self, connection_id: &str) -> Result<TradeCounts> {
        let mut conn = get_connection(&self.pool)?;
        let groups: Vec<(String, String, i64)> = broker_trades::table
            .filter(broker_trades::connection_id.eq(connection_id))
            .group_by((broker_trades::status, broker_trades::source))
            .select((broker_trades::status, broker_trades::source, count_star()))
            .load(&mut conn)
            .map_err(StorageError::from)?;

        let mut counts = TradeCounts::default();
        for (status, source, n) in groups {
            counts.total += n;
            if status == TradeStatus::Closed.as_str() {
                counts.closed += n;
            } else {
                counts.open += n;
            }
            if source == TradeSource::Ea.as_str() {
                counts.pushed += n;
            }
        }
        Ok(counts)
    }
}
