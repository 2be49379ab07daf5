use std::sync::Arc;

use super::*;
use crate::errors::{Error, ValidationError};
use crate::testing::{closed_trade, connection_fixture, InMemoryStore};
use crate::trades::{TradeQuery, TradeStatus};
use chrono::NaiveDate;
use rust_decimal_macros::dec;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

fn setup() -> (InMemoryStore, StatsService) {
    let store = InMemoryStore::new();
    store.add_connection(connection_fixture("c-1", "owner-1"));
    {
        let mut trades = store.trades.lock().unwrap();
        trades.push(closed_trade("c-1", day(1), 9, dec!(100), dec!(-2), dec!(0)));
        trades.push(closed_trade("c-1", day(1), 15, dec!(-30), dec!(0), dec!(-1)));
        trades.push(closed_trade("c-1", day(3), 11, dec!(20), dec!(0), dec!(0)));
        // Another connection's trade never leaks into c-1 figures.
        trades.push(closed_trade("c-2", day(1), 9, dec!(1000), dec!(0), dec!(0)));
        let mut open = closed_trade("c-1", day(4), 10, dec!(5), dec!(0), dec!(0));
        open.close_time = None;
        open.status = TradeStatus::Open;
        trades.push(open);
    }
    let service = StatsService::new(Arc::new(store.clone()), Arc::new(store.clone()));
    (store, service)
}

#[tokio::test]
async fn recalculation_rebuilds_daily_rows() {
    let (store, service) = setup();
    let connection = store.connection("c-1");

    let rows = service.recalculate_daily_stats(&connection).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, day(1));
    assert_eq!(rows[0].total_pnl, dec!(67));
    assert_eq!(rows[0].trade_count, 2);
    assert_eq!(rows[1].date, day(3));
    assert_eq!(rows[1].total_pnl, dec!(20));
    assert_eq!(rows[0].owner_id, "owner-1");
}

#[tokio::test]
async fn recalculation_is_idempotent() {
    let (store, service) = setup();
    let connection = store.connection("c-1");

    service.recalculate_daily_stats(&connection).await.unwrap();
    service.recalculate_daily_stats(&connection).await.unwrap();

    let stored = service.get_daily_stats("c-1", None, None).unwrap();
    assert_eq!(stored.len(), 2);
    let totals: Vec<_> = stored.iter().map(|s| s.total_pnl).collect();
    assert_eq!(totals, vec![dec!(67), dec!(20)]);
}

#[tokio::test]
async fn daily_stats_honour_date_range() {
    let (store, service) = setup();
    service
        .recalculate_daily_stats(&store.connection("c-1"))
        .await
        .unwrap();

    let from_second = service.get_daily_stats("c-1", Some(day(2)), None).unwrap();
    assert_eq!(from_second.len(), 1);
    assert_eq!(from_second[0].date, day(3));

    let until_first = service.get_daily_stats("c-1", None, Some(day(1))).unwrap();
    assert_eq!(until_first.len(), 1);
}

#[test]
fn dashboard_combines_all_sections() {
    let (store, service) = setup();
    let dashboard = service.get_dashboard(&store.connection("c-1")).unwrap();

    assert_eq!(dashboard.connection_id, "c-1");
    assert_eq!(dashboard.account_identifier, "acct-c-1");
    assert_eq!(dashboard.kpi.total_trades, 3);
    assert_eq!(dashboard.kpi.total_pnl, dec!(87));
    assert_eq!(dashboard.daily_pnl.len(), 2);
    assert_eq!(dashboard.daily_pnl[1].cumulative_pnl, dec!(87));
    assert_eq!(dashboard.calendar_data.len(), 2);
    assert_eq!(dashboard.recent_trades.len(), 3);
    assert_eq!(dashboard.open_positions.len(), 1);
    assert_eq!(dashboard.open_positions[0].current_pnl, Some(dec!(5)));
}

#[test]
fn dashboard_without_trades_is_empty() {
    let store = InMemoryStore::new();
    store.add_connection(connection_fixture("c-9", "owner-1"));
    let service = StatsService::new(Arc::new(store.clone()), Arc::new(store.clone()));

    let dashboard = service.get_dashboard(&store.connection("c-9")).unwrap();
    assert_eq!(dashboard.kpi, KpiSummary::default());
    assert_eq!(dashboard.performance_score, PerformanceScore::default());
    assert!(dashboard.daily_pnl.is_empty());
    assert!(dashboard.recent_trades.is_empty());
}

#[test]
fn trade_pages_report_has_more() {
    let (_store, service) = setup();

    let first = service
        .list_trades(
            "c-1",
            TradeQuery {
                limit: 2,
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(first.total, 4);
    assert_eq!(first.trades.len(), 2);
    assert!(first.has_more);

    let last = service
        .list_trades(
            "c-1",
            TradeQuery {
                limit: 2,
                offset: 2,
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(last.trades.len(), 2);
    assert!(!last.has_more);

    let closed = service
        .list_trades(
            "c-1",
            TradeQuery {
                status: Some(TradeStatus::Closed),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(closed.total, 3);
}

#[test]
fn trade_pages_reject_out_of_range_limits() {
    let (_store, service) = setup();
    for limit in [0, 201] {
        let result = service.list_trades(
            "c-1",
            TradeQuery {
                limit,
                ..Default::default()
            },
        );
        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::InvalidInput(_)))
        ));
    }
}
