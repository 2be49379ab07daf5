use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tradelens_core::{
    connections::Connection,
    constants::{DEFAULT_TRADES_PAGE_SIZE, MAX_TRADES_PAGE_SIZE},
    csv_import::CsvImportSummary,
    push::PushDiagnostics,
    stats::{DailyStat, Dashboard, OpenPosition},
    trades::{TradePage, TradeQuery, TradeStatus},
};

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

#[derive(Deserialize)]
struct TradesQuery {
    status: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl TradesQuery {
    fn into_trade_query(self) -> ApiResult<TradeQuery> {
        let limit = self.limit.unwrap_or(DEFAULT_TRADES_PAGE_SIZE);
        if !(1..=MAX_TRADES_PAGE_SIZE).contains(&limit) {
            return Err(ApiError::BadRequest(format!(
                "limit must be between 1 and {MAX_TRADES_PAGE_SIZE}"
            )));
        }
        let offset = self.offset.unwrap_or(0);
        if offset < 0 {
            return Err(ApiError::BadRequest("offset must not be negative".into()));
        }
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<TradeStatus>)
            .transpose()?;
        Ok(TradeQuery {
            status,
            limit,
            offset,
        })
    }
}

#[derive(Deserialize)]
struct DateRangeQuery {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

fn load(state: &AppState, id: &str, caller: &AuthUser) -> ApiResult<Connection> {
    Ok(state.connection_service.get_authorized(id, &caller.0)?)
}

async fn get_dashboard(
    caller: AuthUser,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Dashboard>> {
    let connection = load(&state, &id, &caller)?;
    Ok(Json(state.stats_service.get_dashboard(&connection)?))
}

async fn list_trades(
    caller: AuthUser,
    Path(id): Path<String>,
    Query(query): Query<TradesQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<TradePage>> {
    let connection = load(&state, &id, &caller)?;
    let page = state
        .stats_service
        .list_trades(&connection.id, query.into_trade_query()?)?;
    Ok(Json(page))
}

async fn get_daily_stats(
    caller: AuthUser,
    Path(id): Path<String>,
    Query(range): Query<DateRangeQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<DailyStat>>> {
    let connection = load(&state, &id, &caller)?;
    let stats = state
        .stats_service
        .get_daily_stats(&connection.id, range.from, range.to)?;
    Ok(Json(stats))
}

async fn get_open_positions(
    caller: AuthUser,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<OpenPosition>>> {
    let connection = load(&state, &id, &caller)?;
    Ok(Json(state.stats_service.get_open_positions(&connection.id)?))
}

async fn import_csv(
    caller: AuthUser,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<CsvImportSummary>> {
    let connection = load(&state, &id, &caller)?;

    let mut content: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart field: {e}")))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {e}")))?;
            content = Some(bytes.to_vec());
        }
    }
    let content =
        content.ok_or_else(|| ApiError::BadRequest("Missing 'file' field".to_string()))?;

    let summary = state
        .csv_import_service
        .import_csv(&connection, &content)
        .await?;
    Ok(Json(summary))
}

async fn get_diagnostics(
    caller: AuthUser,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<PushDiagnostics>> {
    let connection = load(&state, &id, &caller)?;
    Ok(Json(state.diagnostics_service.diagnose(&connection)?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/connections/{id}/dashboard", get(get_dashboard))
        .route("/connections/{id}/trades", get(list_trades))
        .route("/connections/{id}/daily-stats", get(get_daily_stats))
        .route("/connections/{id}/open-positions", get(get_open_positions))
        .route("/connections/{id}/import-csv", post(import_csv))
        .route("/connections/{id}/diagnostics", get(get_diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(status: Option<&str>, limit: Option<i64>, offset: Option<i64>) -> TradesQuery {
        TradesQuery {
            status: status.map(str::to_string),
            limit,
            offset,
        }
    }

    #[test]
    fn trade_query_defaults_and_bounds() {
        let defaults = query(None, None, None).into_trade_query().unwrap();
        assert_eq!(defaults, TradeQuery::default());

        let open = query(Some("open"), Some(200), Some(10))
            .into_trade_query()
            .unwrap();
        assert_eq!(open.status, Some(TradeStatus::Open));
        assert_eq!(open.limit, 200);

        assert!(query(None, Some(0), None).into_trade_query().is_err());
        assert!(query(None, Some(201), None).into_trade_query().is_err());
        assert!(query(None, None, Some(-1)).into_trade_query().is_err());
        assert!(query(Some("pending"), None, None).into_trade_query().is_err());
    }
}
