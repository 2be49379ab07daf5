//! Pure analytics over a connection's trades.
//!
//! Every figure is derived from net P&L (`pnl + commission + swap`), never raw
//! `pnl`. Inputs are unrounded; the public `compute_*` functions round
//! monetary output to two decimals. Arithmetic saturates at the `Decimal`
//! bounds instead of overflowing.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::{Decimal, MathematicalOps};

use super::stats_model::{
    CalendarDay, DailyPnlPoint, KpiSummary, OpenPosition, PerformanceScore, RecentTrade,
};
use crate::trades::Trade;
use crate::utils::decimal_utils::round_money;

/// Unrounded totals for one calendar day of closed trades.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub total_pnl: Decimal,
    pub trade_count: i64,
    pub winning_trades: i64,
    pub losing_trades: i64,
    pub volume: Decimal,
}

/// Groups closed trades by the UTC date of their close time, in date order.
///
/// Trades without a close time are ignored.
pub fn aggregate_daily(trades: &[Trade]) -> Vec<DailyAggregate> {
    let mut days: BTreeMap<NaiveDate, DailyAggregate> = BTreeMap::new();
    for trade in trades {
        let Some(close_time) = trade.close_time else {
            continue;
        };
        let date = close_time.date_naive();
        let net = trade.net_pnl();
        let day = days.entry(date).or_insert_with(|| DailyAggregate {
            date,
            total_pnl: Decimal::ZERO,
            trade_count: 0,
            winning_trades: 0,
            losing_trades: 0,
            volume: Decimal::ZERO,
        });
        day.total_pnl = day.total_pnl.saturating_add(net);
        day.trade_count += 1;
        day.volume = day.volume.saturating_add(trade.volume);
        if net > Decimal::ZERO {
            day.winning_trades += 1;
        } else if net < Decimal::ZERO {
            day.losing_trades += 1;
        }
    }
    days.into_values().collect()
}

/// Largest peak-to-trough decline of the running sum of `changes`.
///
/// The peak starts at zero, so an equity curve that only falls still
/// registers its full decline.
pub fn max_drawdown<I>(changes: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    let mut cumulative = Decimal::ZERO;
    let mut peak = Decimal::ZERO;
    let mut worst = Decimal::ZERO;
    for change in changes {
        cumulative = cumulative.saturating_add(change);
        if cumulative > peak {
            peak = cumulative;
        }
        let drawdown = peak.saturating_sub(cumulative);
        if drawdown > worst {
            worst = drawdown;
        }
    }
    worst
}

/// Win/loss split of a trade set.
struct Outcomes {
    total: usize,
    wins: usize,
    losses: usize,
    gross_profit: Decimal,
    /// Absolute value of the summed losses.
    gross_loss: Decimal,
    net: Decimal,
}

impl Outcomes {
    fn of(trades: &[Trade]) -> Self {
        let mut outcomes = Outcomes {
            total: trades.len(),
            wins: 0,
            losses: 0,
            gross_profit: Decimal::ZERO,
            gross_loss: Decimal::ZERO,
            net: Decimal::ZERO,
        };
        for trade in trades {
            let net = trade.net_pnl();
            outcomes.net = outcomes.net.saturating_add(net);
            if net > Decimal::ZERO {
                outcomes.wins += 1;
                outcomes.gross_profit = outcomes.gross_profit.saturating_add(net);
            } else if net < Decimal::ZERO {
                outcomes.losses += 1;
                outcomes.gross_loss = outcomes.gross_loss.saturating_add(net.abs());
            }
        }
        outcomes
    }

    fn win_rate(&self) -> Decimal {
        percentage(self.wins, self.total)
    }

    fn profit_factor(&self) -> Decimal {
        ratio(self.gross_profit, self.gross_loss)
    }

    fn average_win(&self) -> Decimal {
        ratio(self.gross_profit, Decimal::from(self.wins))
    }

    fn average_loss(&self) -> Decimal {
        ratio(self.gross_loss, Decimal::from(self.losses))
    }

    fn avg_win_loss_ratio(&self) -> Decimal {
        ratio(self.average_win(), self.average_loss())
    }
}

fn percentage(part: usize, whole: usize) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(part) / Decimal::from(whole) * Decimal::ONE_HUNDRED
}

/// `numerator / denominator`, or zero when the denominator is not positive.
///
/// A quotient past the `Decimal` range saturates toward the numerator's sign.
fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or(if numerator.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}

fn sum(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values
        .into_iter()
        .fold(Decimal::ZERO, |acc, value| acc.saturating_add(value))
}

/// KPI block over closed trades.
pub fn compute_kpi(closed: &[Trade]) -> KpiSummary {
    if closed.is_empty() {
        return KpiSummary::default();
    }
    let outcomes = Outcomes::of(closed);

    let days = aggregate_daily(closed);
    let winning_days = days
        .iter()
        .filter(|day| day.total_pnl > Decimal::ZERO)
        .count();

    let mut ordered: Vec<&Trade> = closed.iter().collect();
    ordered.sort_by_key(|trade| trade.effective_time());
    let drawdown = max_drawdown(ordered.iter().map(|trade| trade.net_pnl()));

    KpiSummary {
        total_pnl: round_money(outcomes.net),
        total_trades: outcomes.total as i64,
        win_rate: round_money(outcomes.win_rate()),
        profit_factor: round_money(outcomes.profit_factor()),
        max_drawdown: round_money(drawdown),
        average_win: round_money(outcomes.average_win()),
        average_loss: round_money(outcomes.average_loss()),
        avg_win_loss_ratio: round_money(outcomes.avg_win_loss_ratio()),
        day_win_rate: round_money(percentage(winning_days, days.len())),
    }
}

/// Equity curve: one point per day with the running total.
pub fn compute_daily_pnl(days: &[DailyAggregate]) -> Vec<DailyPnlPoint> {
    let mut cumulative = Decimal::ZERO;
    days.iter()
        .map(|day| {
            cumulative = cumulative.saturating_add(day.total_pnl);
            DailyPnlPoint {
                date: day.date,
                total_pnl: round_money(day.total_pnl),
                cumulative_pnl: round_money(cumulative),
            }
        })
        .collect()
}

pub fn compute_calendar(days: &[DailyAggregate]) -> Vec<CalendarDay> {
    days.iter()
        .map(|day| CalendarDay {
            date: day.date,
            pnl: round_money(day.total_pnl),
            trade_count: day.trade_count,
        })
        .collect()
}

/// Closed trades, latest close (or open) first, capped at `limit`.
pub fn compute_recent_trades(closed: &[Trade], limit: usize) -> Vec<RecentTrade> {
    let mut ordered: Vec<&Trade> = closed.iter().collect();
    ordered.sort_by_key(|trade| std::cmp::Reverse(trade.effective_time()));
    ordered
        .into_iter()
        .take(limit)
        .map(|trade| RecentTrade {
            id: trade.id.clone(),
            symbol: trade.symbol.clone(),
            side: trade.side.clone(),
            volume: round_money(trade.volume),
            pnl: round_money(trade.net_pnl()),
            close_time: trade.close_time,
        })
        .collect()
}

/// Open trades with their stored P&L, without re-pricing.
pub fn compute_open_positions(open: &[Trade]) -> Vec<OpenPosition> {
    open.iter()
        .map(|trade| OpenPosition {
            id: trade.id.clone(),
            symbol: trade.symbol.clone(),
            side: trade.side.clone(),
            open_time: trade.open_time,
            open_price: trade.open_price,
            volume: trade.volume,
            current_pnl: trade.pnl.map(round_money),
        })
        .collect()
}

/// Population standard deviation.
fn std_dev(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let count = Decimal::from(values.len());
    let mean = sum(values.iter().copied()) / count;
    let variance = sum(values.iter().map(|value| {
        let delta = value.saturating_sub(mean);
        delta.saturating_mul(delta)
    })) / count;
    variance.sqrt().unwrap_or(Decimal::ZERO)
}

/// Composite score over closed trades and their daily aggregates.
///
/// The drawdown used here is measured on the daily equity curve, not on the
/// per-trade walk used by the KPI block.
pub fn compute_performance_score(closed: &[Trade], days: &[DailyAggregate]) -> PerformanceScore {
    if closed.is_empty() {
        return PerformanceScore::default();
    }
    let hundred = Decimal::ONE_HUNDRED;
    let outcomes = Outcomes::of(closed);

    let daily_drawdown = max_drawdown(days.iter().map(|day| day.total_pnl));
    let recovery_factor = ratio(outcomes.net, daily_drawdown);

    let daily_returns: Vec<Decimal> = days.iter().map(|day| day.total_pnl).collect();
    let deviation = std_dev(&daily_returns);
    let consistency = if deviation > Decimal::ZERO {
        (hundred - deviation * Decimal::new(1, 1)).max(Decimal::ZERO)
    } else {
        hundred
    };

    let win_rate = outcomes.win_rate().min(hundred);
    let profit_factor = outcomes
        .profit_factor()
        .saturating_mul(Decimal::from(20))
        .min(hundred);
    let consistency = consistency.min(hundred);
    let drawdown = (hundred - daily_drawdown * Decimal::new(1, 2)).max(Decimal::ZERO);
    let avg_win_loss = outcomes
        .avg_win_loss_ratio()
        .saturating_mul(Decimal::from(25))
        .min(hundred);
    let recovery = recovery_factor.saturating_mul(Decimal::from(20)).min(hundred);

    let overall = sum([
        win_rate,
        profit_factor,
        consistency,
        drawdown,
        avg_win_loss,
        recovery,
    ]) / Decimal::from(6);

    PerformanceScore {
        win_rate: round_money(win_rate),
        profit_factor: round_money(profit_factor),
        consistency: round_money(consistency),
        max_drawdown: round_money(drawdown),
        avg_win_loss: round_money(avg_win_loss),
        recovery_factor: round_money(recovery),
        overall_score: round_money(overall),
    }
}
