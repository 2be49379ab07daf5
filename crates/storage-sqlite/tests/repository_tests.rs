use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;
use serde_json::{json, Map};
use tempfile::TempDir;

use tradelens_core::connections::{
    Connection, ConnectionChanges, ConnectionRepositoryTrait, ConnectionStatus, LastSyncStatus,
    ProviderKind, SyncStateUpdate,
};
use tradelens_core::errors::Error;
use tradelens_core::stats::{DailyStatRepositoryTrait, NewDailyStat};
use tradelens_core::sync::{SyncLog, SyncLogRepositoryTrait, SyncLogStatus};
use tradelens_core::trades::{
    NewTrade, TradeMetadata, TradeQuery, TradeRepositoryTrait, TradeSide, TradeSource,
    TradeStatus,
};
use tradelens_storage_sqlite::{
    create_pool, init, run_migrations, spawn_writer, ConnectionRepository, DailyStatRepository,
    SyncLogRepository, TradeRepository,
};

struct Store {
    _dir: TempDir,
    connections: ConnectionRepository,
    trades: TradeRepository,
    stats: DailyStatRepository,
    sync_logs: SyncLogRepository,
}

fn open_store() -> Store {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("db").join("tradelens.db");
    let db_path = init(db_path.to_str().unwrap()).unwrap();
    let pool = create_pool(&db_path).unwrap();
    run_migrations(&pool).unwrap();
    let writer = spawn_writer(pool.as_ref().clone());
    Store {
        _dir: dir,
        connections: ConnectionRepository::new(Arc::clone(&pool), writer.clone()),
        trades: TradeRepository::new(Arc::clone(&pool), writer.clone()),
        stats: DailyStatRepository::new(Arc::clone(&pool), writer.clone()),
        sync_logs: SyncLogRepository::new(pool, writer),
    }
}

fn connection(id: &str, owner_id: &str, account: &str, created_offset_mins: i64) -> Connection {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        + Duration::minutes(created_offset_mins);
    Connection {
        id: id.to_string(),
        owner_id: owner_id.to_string(),
        provider: ProviderKind::Ftmo,
        account_identifier: account.to_string(),
        credentials_encrypted: Some("sealed".to_string()),
        status: ConnectionStatus::Active,
        last_sync_at: None,
        last_sync_status: None,
        last_sync_error: None,
        push_token: None,
        metadata: Map::new(),
        created_at: created,
        updated_at: created,
    }
}

fn trade(connection_id: &str, ticket: Option<&str>, close_hour: Option<u32>) -> NewTrade {
    let day = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
    NewTrade {
        connection_id: connection_id.to_string(),
        owner_id: "owner-1".to_string(),
        provider: ProviderKind::Ftmo,
        external_trade_id: ticket.map(str::to_string),
        symbol: "EURUSD".to_string(),
        side: TradeSide::Buy,
        open_time: day + Duration::hours(1),
        close_time: close_hour.map(|h| day + Duration::hours(h as i64)),
        open_price: dec!(1.08512),
        close_price: close_hour.map(|_| dec!(1.08733)),
        volume: dec!(0.5),
        pnl: close_hour.map(|_| dec!(110.50)),
        commission: dec!(-3.5),
        swap: dec!(-0.25),
        source: TradeSource::Ea,
        metadata: TradeMetadata {
            magic: Some(1001),
            comment: Some("bridge".to_string()),
            extra: Map::new(),
        },
    }
}

#[tokio::test]
async fn connections_round_trip_and_enforce_uniqueness() {
    let store = open_store();
    let mut first = connection("c-1", "owner-1", "1000123", 0);
    first.metadata.insert("label".to_string(), json!("main"));
    store.connections.create(first).await.unwrap();
    store
        .connections
        .create(connection("c-2", "owner-1", "1000456", 10))
        .await
        .unwrap();

    let duplicate = store
        .connections
        .create(connection("c-3", "owner-1", "1000123", 20))
        .await;
    assert!(matches!(duplicate, Err(Error::Conflict(_))));

    let loaded = store.connections.get_by_id("c-1").unwrap().unwrap();
    assert_eq!(loaded.provider, ProviderKind::Ftmo);
    assert_eq!(loaded.credentials_encrypted.as_deref(), Some("sealed"));
    assert_eq!(loaded.metadata.get("label"), Some(&json!("main")));

    let found = store
        .connections
        .find_by_account("owner-1", "ftmo", "1000123")
        .unwrap();
    assert_eq!(found.map(|c| c.id), Some("c-1".to_string()));

    let listed: Vec<String> = store
        .connections
        .list_by_owner("owner-1")
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(listed, vec!["c-2", "c-1"]);
    assert!(store.connections.list_by_owner("owner-2").unwrap().is_empty());
    assert!(store.connections.get_by_id("missing").unwrap().is_none());
}

#[tokio::test]
async fn push_tokens_are_looked_up_exactly() {
    let store = open_store();
    store
        .connections
        .create(connection("c-1", "owner-1", "1000123", 0))
        .await
        .unwrap();

    let updated = store.connections.set_push_token("c-1", "tok-abc").await.unwrap();
    assert_eq!(updated.push_token.as_deref(), Some("tok-abc"));

    assert!(store.connections.find_by_push_token("tok-abc").unwrap().is_some());
    assert!(store.connections.find_by_push_token("tok-ab").unwrap().is_none());

    let missing = store.connections.set_push_token("nope", "tok-x").await;
    assert!(matches!(missing, Err(e) if e.is_not_found()));
}

#[tokio::test]
async fn sync_state_updates_keep_timestamp_unless_given() {
    let store = open_store();
    store
        .connections
        .create(connection("c-1", "owner-1", "1000123", 0))
        .await
        .unwrap();
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    store
        .connections
        .update_sync_state("c-1", SyncStateUpdate::succeeded_at(at))
        .await
        .unwrap();
    store
        .connections
        .update_sync_state("c-1", SyncStateUpdate::failed(Some("boom".to_string())))
        .await
        .unwrap();

    let loaded = store.connections.get_by_id("c-1").unwrap().unwrap();
    assert_eq!(loaded.last_sync_at, Some(at));
    assert_eq!(loaded.last_sync_status, Some(LastSyncStatus::Failed));
    assert_eq!(loaded.last_sync_error.as_deref(), Some("boom"));

    let missing = store
        .connections
        .update_sync_state("nope", SyncStateUpdate::in_progress())
        .await;
    assert!(matches!(missing, Err(e) if e.is_not_found()));
}

#[tokio::test]
async fn settings_update_leaves_sync_state_and_push_token_alone() {
    let store = open_store();
    let mut created = connection("c-1", "owner-1", "1000123", 0);
    created.metadata.insert("label".to_string(), json!("main"));
    store.connections.create(created).await.unwrap();
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    store
        .connections
        .update_sync_state("c-1", SyncStateUpdate::succeeded_at(at))
        .await
        .unwrap();
    store.connections.set_push_token("c-1", "tok-1").await.unwrap();

    let updated = store
        .connections
        .update(
            "c-1",
            ConnectionChanges {
                status: Some(ConnectionStatus::Disabled),
                metadata: Some(Map::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, ConnectionStatus::Disabled);
    assert!(updated.metadata.is_empty());
    assert_eq!(updated.account_identifier, "1000123");
    assert_eq!(updated.credentials_encrypted.as_deref(), Some("sealed"));
    assert_eq!(updated.push_token.as_deref(), Some("tok-1"));
    assert_eq!(updated.last_sync_at, Some(at));
    assert_eq!(updated.last_sync_status, Some(LastSyncStatus::Success));

    let missing = store
        .connections
        .update("nope", ConnectionChanges::default())
        .await;
    assert!(matches!(missing, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn upsert_overwrites_matching_external_ids() {
    let store = open_store();
    store
        .connections
        .create(connection("c-1", "owner-1", "1000123", 0))
        .await
        .unwrap();

    let first = store
        .trades
        .upsert_by_external_id(vec![trade("c-1", Some("T-1"), None), trade("c-1", None, Some(5))])
        .await
        .unwrap();
    assert_eq!((first.inserted, first.updated), (2, 0));

    let second = store
        .trades
        .upsert_by_external_id(vec![trade("c-1", Some("T-1"), Some(6)), trade("c-1", None, Some(7))])
        .await
        .unwrap();
    assert_eq!((second.inserted, second.updated), (1, 1));

    let closed_now = store.trades.find_by_external_id("c-1", "T-1").unwrap().unwrap();
    assert_eq!(closed_now.status, TradeStatus::Closed);
    assert_eq!(closed_now.pnl, Some(dec!(110.50)));
    assert_eq!(closed_now.commission, dec!(-3.5));
    assert_eq!(closed_now.metadata.magic, Some(1001));
    assert_eq!(closed_now.source, TradeSource::Ea);

    let counts = store.trades.count("c-1").unwrap();
    assert_eq!((counts.total, counts.closed, counts.open, counts.pushed), (3, 3, 0, 3));
}

#[tokio::test]
async fn trade_listings_follow_their_orderings() {
    let store = open_store();
    store
        .connections
        .create(connection("c-1", "owner-1", "1000123", 0))
        .await
        .unwrap();
    store
        .trades
        .create_many(vec![
            trade("c-1", Some("late"), Some(9)),
            trade("c-1", Some("open"), None),
            trade("c-1", Some("early"), Some(3)),
        ])
        .await
        .unwrap();

    let closed: Vec<String> = store
        .trades
        .list_closed("c-1")
        .unwrap()
        .into_iter()
        .filter_map(|t| t.external_trade_id)
        .collect();
    assert_eq!(closed, vec!["early", "late"]);
    assert_eq!(store.trades.list_open("c-1").unwrap().len(), 1);

    let (page, total) = store
        .trades
        .list_page(
            "c-1",
            &TradeQuery {
                status: None,
                limit: 2,
                offset: 0,
            },
        )
        .unwrap();
    assert_eq!(total, 3);
    let ids: Vec<String> = page.into_iter().filter_map(|t| t.external_trade_id).collect();
    assert_eq!(ids, vec!["late", "early"]);

    let (open_page, open_total) = store
        .trades
        .list_page(
            "c-1",
            &TradeQuery {
                status: Some(TradeStatus::Open),
                ..TradeQuery::default()
            },
        )
        .unwrap();
    assert_eq!(open_total, 1);
    assert_eq!(open_page[0].external_trade_id.as_deref(), Some("open"));
}

#[tokio::test]
async fn daily_stats_are_replaced_wholesale() {
    let store = open_store();
    store
        .connections
        .create(connection("c-1", "owner-1", "1000123", 0))
        .await
        .unwrap();
    let day = |d: u32| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
    let stat = |date: NaiveDate, pnl| NewDailyStat {
        connection_id: "c-1".to_string(),
        owner_id: "owner-1".to_string(),
        provider: ProviderKind::Ftmo,
        date,
        total_pnl: pnl,
        trade_count: 2,
        winning_trades: 1,
        losing_trades: 1,
        volume: dec!(1.5),
    };

    store
        .stats
        .replace_for_connection("c-1", vec![stat(day(5), dec!(10)), stat(day(4), dec!(-3))])
        .await
        .unwrap();
    let rebuilt = store
        .stats
        .replace_for_connection("c-1", vec![stat(day(4), dec!(-3)), stat(day(6), dec!(7.25))])
        .await
        .unwrap();

    let dates: Vec<NaiveDate> = rebuilt.iter().map(|s| s.date).collect();
    assert_eq!(dates, vec![day(4), day(6)]);
    assert_eq!(rebuilt[1].total_pnl, dec!(7.25));

    let ranged = store.stats.list("c-1", Some(day(5)), Some(day(6))).unwrap();
    assert_eq!(ranged.len(), 1);
    assert_eq!(ranged[0].date, day(6));
}

#[tokio::test]
async fn sync_logs_track_state_transitions() {
    let store = open_store();
    store
        .connections
        .create(connection("c-1", "owner-1", "1000123", 0))
        .await
        .unwrap();

    let mut older = SyncLog::start("c-1");
    older.started_at = Utc::now() - Duration::minutes(5);
    let older = store.sync_logs.create(older).await.unwrap();
    let newer = store.sync_logs.create(SyncLog::start("c-1")).await.unwrap();
    assert_eq!(store.sync_logs.find_running("c-1").unwrap().len(), 2);

    store.sync_logs.update(older.clone().fail("timeout")).await.unwrap();
    store.sync_logs.update(newer.clone().succeed(4)).await.unwrap();

    assert!(store.sync_logs.find_running("c-1").unwrap().is_empty());
    let logs = store.sync_logs.list_for_connection("c-1", 20).unwrap();
    assert_eq!(logs[0].id, newer.id);
    assert_eq!(logs[0].trades_synced, 4);
    assert_eq!(logs[1].status, SyncLogStatus::Failed);

    let failed = store.sync_logs.list_failed(50).unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].error_message.as_deref(), Some("timeout"));
}

#[tokio::test]
async fn deleting_a_connection_removes_its_data() {
    let store = open_store();
    store
        .connections
        .create(connection("c-1", "owner-1", "1000123", 0))
        .await
        .unwrap();
    store
        .connections
        .create(connection("c-2", "owner-1", "1000456", 5))
        .await
        .unwrap();
    for id in ["c-1", "c-2"] {
        store.trades.create(trade(id, Some("T-1"), Some(4))).await.unwrap();
        store.sync_logs.create(SyncLog::start(id)).await.unwrap();
    }

    assert_eq!(store.connections.delete("c-1").await.unwrap(), 1);
    assert_eq!(store.connections.delete("c-1").await.unwrap(), 0);

    assert!(store.connections.get_by_id("c-1").unwrap().is_none());
    assert_eq!(store.trades.count("c-1").unwrap().total, 0);
    assert!(store.sync_logs.list_for_connection("c-1", 20).unwrap().is_empty());
    assert_eq!(store.trades.count("c-2").unwrap().total, 1);
    assert_eq!(store.connections.list_all().unwrap().len(), 1);
}
