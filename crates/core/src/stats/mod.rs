//! Statistics module - daily aggregates, dashboard KPIs and the performance score.

mod stats_calculator;
mod stats_model;
mod stats_service;
mod stats_traits;

#[cfg(test)]
mod stats_calculator_tests;

#[cfg(test)]
mod stats_service_tests;

pub use stats_calculator::{
    aggregate_daily, compute_calendar, compute_daily_pnl, compute_kpi, compute_open_positions,
    compute_performance_score, compute_recent_trades, max_drawdown, DailyAggregate,
};
pub use stats_model::{
    CalendarDay, DailyPnlPoint, DailyStat, Dashboard, KpiSummary, NewDailyStat, OpenPosition,
    PerformanceScore, RecentTrade,
};
pub use stats_service::StatsService;
pub use stats_traits::{DailyStatRepositoryTrait, StatsServiceTrait};
