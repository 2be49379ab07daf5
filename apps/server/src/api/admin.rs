use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tradelens_core::{
    connections::{Connection, OwnerSummary},
    constants::DEFAULT_FAILED_SYNC_LOGS_LIMIT,
    stats::Dashboard,
    sync::SyncLog,
};

use crate::{
    auth::AdminUser,
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<i64>,
}

async fn list_users(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<OwnerSummary>>> {
    Ok(Json(state.connection_service.list_owner_summaries()?))
}

async fn list_user_connections(
    _admin: AdminUser,
    Path(owner_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Connection>>> {
    Ok(Json(state.connection_service.list_connections(&owner_id)?))
}

async fn get_connection_dashboard(
    _admin: AdminUser,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Dashboard>> {
    let connection = state.connection_service.get_connection(&id)?;
    Ok(Json(state.stats_service.get_dashboard(&connection)?))
}

async fn list_failed_sync_logs(
    _admin: AdminUser,
    Query(query): Query<LimitQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<SyncLog>>> {
    let limit = query.limit.unwrap_or(DEFAULT_FAILED_SYNC_LOGS_LIMIT);
    if limit < 1 {
        return Err(ApiError::BadRequest("limit must be positive".into()));
    }
    Ok(Json(state.sync_service.list_failed_sync_logs(limit)?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/{owner_id}/connections", get(list_user_connections))
        .route(
            "/admin/connections/{id}/dashboard",
            get(get_connection_dashboard),
        )
        .route("/admin/sync-logs/failed", get(list_failed_sync_logs))
}
