use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::broker_daily_stats;

use super::model::DailyStatDB;
use tradelens_core::errors::Result;
use tradelens_core::stats::{DailyStat, DailyStatRepositoryTrait, NewDailyStat};

fn load_range(
    conn: &mut SqliteConnection,
    connection_id: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<DailyStat>> {
    let mut query = broker_daily_stats::table
        .filter(broker_daily_stats::connection_id.eq(connection_id))
        .into_boxed();
    if let Some(from) = from {
        query = query.filter(broker_daily_stats::date.ge(from));
    }
    if let Some(to) = to {
        query = query.filter(broker_daily_stats::date.le(to));
    }
    query
        .order(broker_daily_stats::date.asc())
        .select(DailyStatDB::as_select())
        .load(conn)
        .map_err(StorageError::from)?
        .into_iter()
        .map(DailyStat::try_from)
        .collect()
}

/// Repository for per-day aggregates
pub struct DailyStatRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl DailyStatRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl DailyStatRepositoryTrait for DailyStatRepository {
    async fn replace_for_connection(
        &self,
        connection_id: &str,
        stats: Vec<NewDailyStat>,
    ) -> Result<Vec<DailyStat>> {
        let id = connection_id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::delete(
                    broker_daily_stats::table.filter(broker_daily_stats::connection_id.eq(&id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;

                let rows: Vec<DailyStatDB> = stats.into_iter().map(DailyStatDB::from).collect();
                for row in &rows {
                    diesel::insert_into(broker_daily_stats::table)
                        .values(row)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                load_range(conn, &id, None, None)
            })
            .await
    }

    fn list(
        &self,
        connection_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<DailyStat>> {
        let mut conn = get_connection(&self.pool)?;
        load_range(&mut conn, connection_id, from, to)
    }
}
