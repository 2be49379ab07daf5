use super::*;
use crate::testing::closed_trade;
use crate::trades::{Trade, TradeStatus};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn open_trade(pnl: Option<Decimal>) -> Trade {
    let mut trade = closed_trade("c-1", day(5), 9, Decimal::ZERO, dec!(0), dec!(0));
    trade.close_time = None;
    trade.close_price = None;
    trade.status = TradeStatus::Open;
    trade.pnl = pnl;
    trade
}

/// Day one nets -50 across two trades, day two nets +40.
fn sample_trades() -> Vec<Trade> {
    vec![
        closed_trade("c-1", day(1), 10, dec!(110), dec!(-7), dec!(-3)),
        closed_trade("c-1", day(1), 12, dec!(-150), dec!(0), dec!(0)),
        closed_trade("c-1", day(2), 9, dec!(40), dec!(0), dec!(0)),
    ]
}

#[test]
fn drawdown_measures_peak_to_trough() {
    assert_eq!(max_drawdown([dec!(100), dec!(-150), dec!(40)]), dec!(150));
    assert_eq!(max_drawdown([dec!(10), dec!(20)]), Decimal::ZERO);
    assert_eq!(max_drawdown(Vec::<Decimal>::new()), Decimal::ZERO);
}

#[test]
fn drawdown_counts_decline_from_zero() {
    assert_eq!(max_drawdown([dec!(-30), dec!(-20), dec!(10)]), dec!(50));
}

#[test]
fn daily_aggregates_use_net_pnl() {
    let mut trades = sample_trades();
    // Raw pnl is positive, but fees make it a break-even trade.
    trades.push(closed_trade("c-1", day(2), 11, dec!(5), dec!(-5), dec!(0)));
    trades.push(open_trade(Some(dec!(999))));

    let days = aggregate_daily(&trades);
    assert_eq!(days.len(), 2);

    assert_eq!(days[0].date, day(1));
    assert_eq!(days[0].total_pnl, dec!(-50));
    assert_eq!(days[0].trade_count, 2);
    assert_eq!(days[0].winning_trades, 1);
    assert_eq!(days[0].losing_trades, 1);
    assert_eq!(days[0].volume, dec!(2));

    assert_eq!(days[1].total_pnl, dec!(40));
    assert_eq!(days[1].trade_count, 2);
    assert_eq!(days[1].winning_trades, 1);
    assert_eq!(days[1].losing_trades, 0);
}

#[test]
fn kpi_over_sample_trades() {
    let kpi = compute_kpi(&sample_trades());

    assert_eq!(kpi.total_pnl, dec!(-10));
    assert_eq!(kpi.total_trades, 3);
    assert_eq!(kpi.win_rate, dec!(66.67));
    assert_eq!(kpi.profit_factor, dec!(0.93));
    assert_eq!(kpi.max_drawdown, dec!(150));
    assert_eq!(kpi.average_win, dec!(70));
    assert_eq!(kpi.average_loss, dec!(150));
    assert_eq!(kpi.avg_win_loss_ratio, dec!(0.47));
    assert_eq!(kpi.day_win_rate, dec!(50));
}

#[test]
fn kpi_walks_trades_in_close_order() {
    // Stored out of order: the loss closes last.
    let trades = vec![
        closed_trade("c-1", day(3), 10, dec!(-80), dec!(0), dec!(0)),
        closed_trade("c-1", day(1), 10, dec!(100), dec!(0), dec!(0)),
    ];
    assert_eq!(compute_kpi(&trades).max_drawdown, dec!(80));
}

#[test]
fn kpi_without_trades_is_zeroed() {
    assert_eq!(compute_kpi(&[]), KpiSummary::default());
}

#[test]
fn equity_curve_accumulates() {
    let days = aggregate_daily(&sample_trades());
    let curve = compute_daily_pnl(&days);

    assert_eq!(curve.len(), 2);
    assert_eq!(curve[0].total_pnl, dec!(-50));
    assert_eq!(curve[0].cumulative_pnl, dec!(-50));
    assert_eq!(curve[1].total_pnl, dec!(40));
    assert_eq!(curve[1].cumulative_pnl, dec!(-10));

    let calendar = compute_calendar(&days);
    assert_eq!(calendar[0].date, day(1));
    assert_eq!(calendar[0].pnl, dec!(-50));
    assert_eq!(calendar[0].trade_count, 2);
}

#[test]
fn recent_trades_are_latest_first_and_capped() {
    let trades = sample_trades();
    let recent = compute_recent_trades(&trades, 2);

    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].id, trades[2].id);
    assert_eq!(recent[1].id, trades[1].id);
    assert_eq!(recent[0].pnl, dec!(40));
}

#[test]
fn open_positions_keep_stored_pnl() {
    let positions = compute_open_positions(&[open_trade(Some(dec!(12.346))), open_trade(None)]);

    assert_eq!(positions[0].current_pnl, Some(dec!(12.35)));
    assert_eq!(positions[1].current_pnl, None);
}

#[test]
fn performance_score_without_trades_is_zeroed() {
    assert_eq!(compute_performance_score(&[], &[]), PerformanceScore::default());
}

#[test]
fn performance_score_over_sample_trades() {
    let trades = sample_trades();
    let days = aggregate_daily(&trades);
    let score = compute_performance_score(&trades, &days);

    assert_eq!(score.win_rate, dec!(66.67));
    assert_eq!(score.profit_factor, dec!(18.67));
    // Daily returns -50 and 40 have a standard deviation of 45.
    assert_eq!(score.consistency, dec!(95.5));
    // Daily equity curve falls 50 below its zero peak.
    assert_eq!(score.max_drawdown, dec!(99.5));
    assert_eq!(score.avg_win_loss, dec!(11.67));
    // Net loss over a drawdown of 50 gives a negative recovery.
    assert_eq!(score.recovery_factor, dec!(-4));
    assert_eq!(score.overall_score, dec!(48));
}

#[test]
fn performance_score_caps_sub_scores() {
    let trades = vec![
        closed_trade("c-1", day(1), 10, dec!(500), dec!(0), dec!(0)),
        closed_trade("c-1", day(1), 11, dec!(-10), dec!(0), dec!(0)),
    ];
    let days = aggregate_daily(&trades);
    let score = compute_performance_score(&trades, &days);

    assert_eq!(score.profit_factor, dec!(100));
    assert_eq!(score.avg_win_loss, dec!(100));
    // A single trading day has no spread.
    assert_eq!(score.consistency, dec!(100));
    // The only day is a winning one, so the daily curve never falls.
    assert_eq!(score.max_drawdown, dec!(100));
    assert_eq!(score.recovery_factor, Decimal::ZERO);
}

#[test]
fn performance_score_saturates_on_extreme_pnl() {
    let trades = vec![
        closed_trade("c-1", day(1), 10, dec!(0), dec!(0), dec!(0)),
        closed_trade("c-1", day(2), 10, dec!(1000000000000000), dec!(0), dec!(0)),
    ];
    let days = aggregate_daily(&trades);
    let score = compute_performance_score(&trades, &days);

    assert_eq!(score.win_rate, dec!(50));
    assert_eq!(score.consistency, Decimal::ZERO);
    assert_eq!(score.max_drawdown, dec!(100));
    assert_eq!(score.overall_score, dec!(25));
}

#[test]
fn aggregates_and_kpi_clamp_at_decimal_bounds() {
    let trades = vec![
        closed_trade("c-1", day(1), 10, Decimal::MAX, dec!(0), dec!(0)),
        closed_trade("c-1", day(1), 11, Decimal::MAX, dec!(5), dec!(0)),
        closed_trade("c-1", day(2), 10, dec!(-0.01), dec!(0), dec!(0)),
        closed_trade("c-1", day(3), 10, Decimal::MIN, dec!(0), dec!(0)),
    ];
    let days = aggregate_daily(&trades);
    assert_eq!(days[0].total_pnl, Decimal::MAX);

    let kpi = compute_kpi(&trades);
    assert_eq!(kpi.total_trades, 4);
    assert_eq!(kpi.max_drawdown, Decimal::MAX);

    let curve = compute_daily_pnl(&days);
    assert_eq!(curve[0].cumulative_pnl, Decimal::MAX);

    let score = compute_performance_score(&trades, &days);
    assert_eq!(score.consistency, Decimal::ZERO);
    assert_eq!(score.max_drawdown, Decimal::ZERO);
    assert!(score.overall_score <= dec!(100));
}

#[test]
fn oversized_profit_factor_is_capped() {
    let trades = vec![
        closed_trade("c-1", day(1), 10, Decimal::MAX, dec!(0), dec!(0)),
        closed_trade("c-1", day(2), 10, dec!(-0.01), dec!(0), dec!(0)),
    ];
    let days = aggregate_daily(&trades);

    let kpi = compute_kpi(&trades);
    assert_eq!(kpi.profit_factor, Decimal::MAX);

    let score = compute_performance_score(&trades, &days);
    assert_eq!(score.profit_factor, dec!(100));
    assert_eq!(score.avg_win_loss, dec!(100));
}
