//! In-memory repositories for service tests.

use std::cmp::Reverse;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use crate::connections::{
    Connection, ConnectionChanges, ConnectionRepositoryTrait, ConnectionStatus, ProviderKind,
    SyncStateUpdate,
};
use crate::errors::{Error, Result};
use crate::secrets::{CredentialCipher, CredentialMap};
use crate::stats::{DailyStat, DailyStatRepositoryTrait, NewDailyStat};
use crate::sync::{SyncLog, SyncLogRepositoryTrait, SyncLogStatus};
use crate::trades::{
    NewTrade, Trade, TradeCounts, TradeMetadata, TradeQuery, TradeRepositoryTrait, TradeSide,
    TradeSource, TradeStatus, UpsertTradesResult,
};

#[derive(Clone, Default)]
pub struct InMemoryStore {
    pub connections: Arc<Mutex<Vec<Connection>>>,
    pub trades: Arc<Mutex<Vec<Trade>>>,
    pub daily_stats: Arc<Mutex<Vec<DailyStat>>>,
    pub sync_logs: Arc<Mutex<Vec<SyncLog>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_connection(&self, connection: Connection) {
        self.connections.lock().unwrap().push(connection);
    }

    pub fn connection(&self, id: &str) -> Connection {
        self.connections
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .unwrap()
    }

    pub fn trade_count(&self) -> usize {
        self.trades.lock().unwrap().len()
    }
}

pub fn connection_fixture(id: &str, owner_id: &str) -> Connection {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Connection {
        id: id.to_string(),
        owner_id: owner_id.to_string(),
        provider: ProviderKind::Ftmo,
        account_identifier: format!("acct-{id}"),
        credentials_encrypted: None,
        status: ConnectionStatus::Active,
        last_sync_at: None,
        last_sync_status: None,
        last_sync_error: None,
        push_token: None,
        metadata: Default::default(),
        created_at: created,
        updated_at: created,
    }
}

/// Builds a closed trade on `day` at `hour` with the given raw pnl, commission and swap.
pub fn closed_trade(
    connection_id: &str,
    day: NaiveDate,
    hour: u32,
    pnl: Decimal,
    commission: Decimal,
    swap: Decimal,
) -> Trade {
    let close = day.and_hms_opt(hour, 0, 0).unwrap().and_utc();
    Trade {
        id: Uuid::new_v4().to_string(),
        connection_id: connection_id.to_string(),
        owner_id: "owner-1".to_string(),
        provider: ProviderKind::Ftmo,
        external_trade_id: None,
        symbol: "EURUSD".to_string(),
        side: TradeSide::Buy,
        open_time: close - chrono::Duration::minutes(30),
        close_time: Some(close),
        open_price: Decimal::ONE,
        close_price: Some(Decimal::ONE),
        volume: Decimal::ONE,
        pnl: Some(pnl),
        commission,
        swap,
        status: TradeStatus::Closed,
        source: TradeSource::Csv,
        metadata: TradeMetadata::default(),
        created_at: close,
        updated_at: close,
    }
}

fn materialize(new_trade: NewTrade) -> Trade {
    let now = Utc::now();
    Trade {
        id: Uuid::new_v4().to_string(),
        status: new_trade.status(),
        connection_id: new_trade.connection_id,
        owner_id: new_trade.owner_id,
        provider: new_trade.provider,
        external_trade_id: new_trade.external_trade_id,
        symbol: new_trade.symbol,
        side: new_trade.side,
        open_time: new_trade.open_time,
        close_time: new_trade.close_time,
        open_price: new_trade.open_price,
        close_price: new_trade.close_price,
        volume: new_trade.volume,
        pnl: new_trade.pnl,
        commission: new_trade.commission,
        swap: new_trade.swap,
        source: new_trade.source,
        metadata: new_trade.metadata,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl ConnectionRepositoryTrait for InMemoryStore {
    async fn create(&self, connection: Connection) -> Result<Connection> {
        self.connections.lock().unwrap().push(connection.clone());
        Ok(connection)
    }

    async fn update(&self, connection_id: &str, changes: ConnectionChanges) -> Result<Connection> {
        let mut connections = self.connections.lock().unwrap();
        let slot = connections
            .iter_mut()
            .find(|c| c.id == connection_id)
            .ok_or_else(|| Error::NotFound(connection_id.to_string()))?;
        if let Some(account_identifier) = changes.account_identifier {
            slot.account_identifier = account_identifier;
        }
        if let Some(credentials) = changes.credentials_encrypted {
            slot.credentials_encrypted = Some(credentials);
        }
        if let Some(status) = changes.status {
            slot.status = status;
        }
        if let Some(metadata) = changes.metadata {
            slot.metadata = metadata;
        }
        slot.updated_at = Utc::now();
        Ok(slot.clone())
    }

    async fn delete(&self, connection_id: &str) -> Result<usize> {
        self.trades
            .lock()
            .unwrap()
            .retain(|t| t.connection_id != connection_id);
        self.daily_stats
            .lock()
            .unwrap()
            .retain(|s| s.connection_id != connection_id);
        self.sync_logs
            .lock()
            .unwrap()
            .retain(|l| l.connection_id != connection_id);
        let mut connections = self.connections.lock().unwrap();
        let before = connections.len();
        connections.retain(|c| c.id != connection_id);
        Ok(before - connections.len())
    }

    async fn update_sync_state(
        &self,
        connection_id: &str,
        update: SyncStateUpdate,
    ) -> Result<()> {
        let mut connections = self.connections.lock().unwrap();
        let connection = connections
            .iter_mut()
            .find(|c| c.id == connection_id)
            .ok_or_else(|| Error::NotFound(connection_id.to_string()))?;
        if let Some(at) = update.last_sync_at {
            connection.last_sync_at = Some(at);
        }
        connection.last_sync_status = Some(update.last_sync_status);
        connection.last_sync_error = update.last_sync_error;
        Ok(())
    }

    async fn set_push_token(&self, connection_id: &str, push_token: &str) -> Result<Connection> {
        let mut connections = self.connections.lock().unwrap();
        let connection = connections
            .iter_mut()
            .find(|c| c.id == connection_id)
            .ok_or_else(|| Error::NotFound(connection_id.to_string()))?;
        connection.push_token = Some(push_token.to_string());
        Ok(connection.clone())
    }

    fn get_by_id(&self, connection_id: &str) -> Result<Option<Connection>> {
        Ok(self
            .connections
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == connection_id)
            .cloned())
    }

    fn find_by_account(
        &self,
        owner_id: &str,
        provider: &str,
        account_identifier: &str,
    ) -> Result<Option<Connection>> {
        Ok(self
            .connections
            .lock()
            .unwrap()
            .iter()
            .find(|c| {
                c.owner_id == owner_id
                    && c.provider.as_str() == provider
                    && c.account_identifier == account_identifier
            })
            .cloned())
    }

    fn find_by_push_token(&self, push_token: &str) -> Result<Option<Connection>> {
        Ok(self
            .connections
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.push_token.as_deref() == Some(push_token))
            .cloned())
    }

    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Connection>> {
        let mut found: Vec<Connection> = self
            .connections
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect();
        found.sort_by_key(|c| Reverse(c.created_at));
        Ok(found)
    }

    fn list_all(&self) -> Result<Vec<Connection>> {
        let mut found = self.connections.lock().unwrap().clone();
        found.sort_by_key(|c| Reverse(c.created_at));
        Ok(found)
    }
}

#[async_trait]
impl TradeRepositoryTrait for InMemoryStore {
    async fn create(&self, new_trade: NewTrade) -> Result<Trade> {
        let trade = materialize(new_trade);
        self.trades.lock().unwrap().push(trade.clone());
        Ok(trade)
    }

    async fn create_many(&self, new_trades: Vec<NewTrade>) -> Result<usize> {
        let count = new_trades.len();
        let mut trades = self.trades.lock().unwrap();
        trades.extend(new_trades.into_iter().map(materialize));
        Ok(count)
    }

    async fn upsert_by_external_id(
        &self,
        new_trades: Vec<NewTrade>,
    ) -> Result<UpsertTradesResult> {
        let mut result = UpsertTradesResult::default();
        let mut trades = self.trades.lock().unwrap();
        for new_trade in new_trades {
            let position = new_trade.dedup_key().and_then(|key| {
                trades.iter().position(|t| {
                    t.connection_id == new_trade.connection_id
                        && t.external_trade_id.as_deref() == Some(key)
                })
            });
            match position {
                Some(index) => {
                    let mut replacement = materialize(new_trade);
                    replacement.id = trades[index].id.clone();
                    replacement.created_at = trades[index].created_at;
                    trades[index] = replacement;
                    result.updated += 1;
                }
                None => {
                    trades.push(materialize(new_trade));
                    result.inserted += 1;
                }
            }
        }
        Ok(result)
    }

    fn find_by_external_id(
        &self,
        connection_id: &str,
        external_trade_id: &str,
    ) -> Result<Option<Trade>> {
        Ok(self
            .trades
            .lock()
            .unwrap()
            .iter()
            .find(|t| {
                t.connection_id == connection_id
                    && t.external_trade_id.as_deref() == Some(external_trade_id)
            })
            .cloned())
    }

    fn list_closed(&self, connection_id: &str) -> Result<Vec<Trade>> {
        let mut found: Vec<Trade> = self
            .trades
            .lock()
            .unwrap()
            .iter()
            .filter(|t| {
                t.connection_id == connection_id
                    && t.status == TradeStatus::Closed
                    && t.close_time.is_some()
            })
            .cloned()
            .collect();
        found.sort_by_key(|t| t.close_time);
        Ok(found)
    }

    fn list_open(&self, connection_id: &str) -> Result<Vec<Trade>> {
        let mut found: Vec<Trade> = self
            .trades
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.connection_id == connection_id && t.status == TradeStatus::Open)
            .cloned()
            .collect();
        found.sort_by_key(|t| Reverse(t.open_time));
        Ok(found)
    }

    fn list_page(&self, connection_id: &str, query: &TradeQuery) -> Result<(Vec<Trade>, i64)> {
        let mut found: Vec<Trade> = self
            .trades
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.connection_id == connection_id)
            .filter(|t| query.status.map_or(true, |s| t.status == s))
            .cloned()
            .collect();
        // Closed trades by close time descending, open trades after them.
        found.sort_by_key(|t| (t.close_time.is_none(), Reverse(t.close_time), Reverse(t.open_time)));
        let total = found.len() as i64;
        let page = found
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();
        Ok((page, total))
    }

    fn list_latest(&self, connection_id: &str, limit: i64) -> Result<Vec<Trade>> {
        let mut found: Vec<Trade> = self
            .trades
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.connection_id == connection_id)
            .cloned()
            .collect();
        found.sort_by_key(|t| Reverse(t.created_at));
        found.truncate(limit as usize);
        Ok(found)
    }

    fn count(&self, connection_id: &str) -> Result<TradeCounts> {
        let trades = self.trades.lock().unwrap();
        let mut counts = TradeCounts::default();
        for trade in trades.iter().filter(|t| t.connection_id == connection_id) {
            counts.total += 1;
            match trade.status {
                TradeStatus::Closed => counts.closed += 1,
                TradeStatus::Open => counts.open += 1,
            }
            if trade.source == TradeSource::Ea {
                counts.pushed += 1;
            }
        }
        Ok(counts)
    }
}

#[async_trait]
impl DailyStatRepositoryTrait for InMemoryStore {
    async fn replace_for_connection(
        &self,
        connection_id: &str,
        stats: Vec<NewDailyStat>,
    ) -> Result<Vec<DailyStat>> {
        let mut stored = self.daily_stats.lock().unwrap();
        stored.retain(|s| s.connection_id != connection_id);
        let created: Vec<DailyStat> = stats
            .into_iter()
            .map(|s| DailyStat {
                id: Uuid::new_v4().to_string(),
                connection_id: s.connection_id,
                owner_id: s.owner_id,
                provider: s.provider,
                date: s.date,
                total_pnl: s.total_pnl,
                trade_count: s.trade_count,
                winning_trades: s.winning_trades,
                losing_trades: s.losing_trades,
                volume: s.volume,
                created_at: Utc::now(),
            })
            .collect();
        stored.extend(created.iter().cloned());
        Ok(created)
    }

    fn list(
        &self,
        connection_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<DailyStat>> {
        let mut found: Vec<DailyStat> = self
            .daily_stats
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.connection_id == connection_id)
            .filter(|s| from.map_or(true, |f| s.date >= f))
            .filter(|s| to.map_or(true, |t| s.date <= t))
            .cloned()
            .collect();
        found.sort_by_key(|s| s.date);
        Ok(found)
    }
}

#[async_trait]
impl SyncLogRepositoryTrait for InMemoryStore {
    async fn create(&self, log: SyncLog) -> Result<SyncLog> {
        self.sync_logs.lock().unwrap().push(log.clone());
        Ok(log)
    }

    async fn update(&self, log: SyncLog) -> Result<SyncLog> {
        let mut logs = self.sync_logs.lock().unwrap();
        let slot = logs
            .iter_mut()
            .find(|l| l.id == log.id)
            .ok_or_else(|| Error::NotFound(log.id.clone()))?;
        *slot = log.clone();
        Ok(log)
    }

    fn find_running(&self, connection_id: &str) -> Result<Vec<SyncLog>> {
        Ok(self
            .sync_logs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.connection_id == connection_id && l.status == SyncLogStatus::Running)
            .cloned()
            .collect())
    }

    fn list_for_connection(&self, connection_id: &str, limit: i64) -> Result<Vec<SyncLog>> {
        let mut found: Vec<SyncLog> = self
            .sync_logs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.connection_id == connection_id)
            .cloned()
            .collect();
        found.sort_by_key(|l| Reverse(l.started_at));
        found.truncate(limit as usize);
        Ok(found)
    }

    fn list_failed(&self, limit: i64) -> Result<Vec<SyncLog>> {
        let mut found: Vec<SyncLog> = self
            .sync_logs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.status == SyncLogStatus::Failed)
            .cloned()
            .collect();
        found.sort_by_key(|l| Reverse(l.started_at));
        found.truncate(limit as usize);
        Ok(found)
    }
}

/// Cipher that stores credentials as plain JSON.
pub struct JsonCipher;

impl CredentialCipher for JsonCipher {
    fn encrypt(&self, credentials: &CredentialMap) -> Result<String> {
        Ok(Value::Object(credentials.clone()).to_string())
    }

    fn decrypt(&self, encrypted: &str) -> Result<CredentialMap> {
        match serde_json::from_str::<Value>(encrypted)? {
            Value::Object(map) => Ok(map),
            _ => Err(Error::Secret("credential payload is not an object".to_string())),
        }
    }
}
