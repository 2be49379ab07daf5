//! Daily aggregates and dashboard payloads.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::connections::ProviderKind;
use crate::trades::TradeSide;

/// Per-day aggregation of closed trades. Derived data, rebuilt wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStat {
    pub id: String,
    pub connection_id: String,
    pub owner_id: String,
    pub provider: ProviderKind,
    pub date: NaiveDate,
    pub total_pnl: Decimal,
    pub trade_count: i64,
    pub winning_trades: i64,
    pub losing_trades: i64,
    pub volume: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDailyStat {
    pub connection_id: String,
    pub owner_id: String,
    pub provider: ProviderKind,
    pub date: NaiveDate,
    pub total_pnl: Decimal,
    pub trade_count: i64,
    pub winning_trades: i64,
    pub losing_trades: i64,
    pub volume: Decimal,
}

/// Headline figures of the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub total_pnl: Decimal,
    pub total_trades: i64,
    pub win_rate: Decimal,
    pub profit_factor: Decimal,
    pub max_drawdown: Decimal,
    pub average_win: Decimal,
    pub average_loss: Decimal,
    pub avg_win_loss_ratio: Decimal,
    pub day_win_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPnlPoint {
    pub date: NaiveDate,
    pub total_pnl: Decimal,
    pub cumulative_pnl: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub pnl: Decimal,
    pub trade_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentTrade {
    pub id: String,
    pub symbol: String,
    pub side: TradeSide,
    pub volume: Decimal,
    /// Net P&L.
    pub pnl: Decimal,
    pub close_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub id: String,
    pub symbol: String,
    pub side: TradeSide,
    pub open_time: DateTime<Utc>,
    pub open_price: Decimal,
    pub volume: Decimal,
    pub current_pnl: Option<Decimal>,
}

/// Composite 0-100 score made of six sub-scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceScore {
    pub win_rate: Decimal,
    pub profit_factor: Decimal,
    pub consistency: Decimal,
    pub max_drawdown: Decimal,
    pub avg_win_loss: Decimal,
    pub recovery_factor: Decimal,
    pub overall_score: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub connection_id: String,
    pub provider: ProviderKind,
    pub account_identifier: String,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub kpi: KpiSummary,
    pub daily_pnl: Vec<DailyPnlPoint>,
    pub calendar_data: Vec<CalendarDay>,
    pub recent_trades: Vec<RecentTrade>,
    pub open_positions: Vec<OpenPosition>,
    pub performance_score: PerformanceScore,
}
