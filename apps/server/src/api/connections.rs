use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tradelens_core::{
    connections::{Connection, ConnectionUpdate, NewConnection, PushTokenGrant},
    constants::DEFAULT_SYNC_LOGS_LIMIT,
    sync::{SyncLog, SyncResetResult, SyncStatusSummary},
};

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct ResetQuery {
    /// Only running logs at least this old are reset; all of them when absent.
    older_than_secs: Option<i64>,
}

fn load(state: &AppState, id: &str, caller: &AuthUser) -> ApiResult<Connection> {
    Ok(state.connection_service.get_authorized(id, &caller.0)?)
}

async fn list_connections(
    caller: AuthUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Connection>>> {
    let connections = state.connection_service.list_connections(&caller.0.owner_id)?;
    Ok(Json(connections))
}

async fn create_connection(
    caller: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(mut new_connection): Json<NewConnection>,
) -> ApiResult<(StatusCode, Json<Connection>)> {
    new_connection.owner_id = caller.0.owner_id;
    let connection = state
        .connection_service
        .create_connection(new_connection)
        .await?;
    Ok((StatusCode::CREATED, Json(connection)))
}

async fn get_connection(
    caller: AuthUser,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Connection>> {
    Ok(Json(load(&state, &id, &caller)?))
}

async fn update_connection(
    caller: AuthUser,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(update): Json<ConnectionUpdate>,
) -> ApiResult<Json<Connection>> {
    let connection = load(&state, &id, &caller)?;
    let updated = state
        .connection_service
        .update_connection(&connection.id, update)
        .await?;
    Ok(Json(updated))
}

async fn delete_connection(
    caller: AuthUser,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    let connection = load(&state, &id, &caller)?;
    state
        .connection_service
        .delete_connection(&connection.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn rotate_push_token(
    caller: AuthUser,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<PushTokenGrant>> {
    let connection = load(&state, &id, &caller)?;
    let grant = state
        .connection_service
        .rotate_push_token(&connection.id)
        .await?;
    Ok(Json(grant))
}

async fn trigger_sync(
    caller: AuthUser,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<SyncLog>> {
    let connection = load(&state, &id, &caller)?;
    let log = state.sync_service.trigger_sync(&connection).await?;
    Ok(Json(log))
}

async fn get_sync_status(
    caller: AuthUser,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<SyncStatusSummary>> {
    let connection = load(&state, &id, &caller)?;
    Ok(Json(state.sync_service.get_sync_status(&connection)?))
}

async fn list_sync_logs(
    caller: AuthUser,
    Path(id): Path<String>,
    Query(query): Query<LimitQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<SyncLog>>> {
    let connection = load(&state, &id, &caller)?;
    let limit = query.limit.unwrap_or(DEFAULT_SYNC_LOGS_LIMIT);
    if limit < 1 {
        return Err(ApiError::BadRequest("limit must be positive".into()));
    }
    let logs = state.sync_service.list_sync_logs(&connection.id, limit)?;
    Ok(Json(logs))
}

async fn reset_stuck_syncs(
    caller: AuthUser,
    Path(id): Path<String>,
    Query(query): Query<ResetQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<SyncResetResult>> {
    let connection = load(&state, &id, &caller)?;
    let older_than = match query.older_than_secs {
        Some(secs) if secs < 0 => {
            return Err(ApiError::BadRequest("older_than_secs must not be negative".into()))
        }
        Some(secs) => Some(chrono::Duration::seconds(secs)),
        None => None,
    };
    let result = state
        .sync_service
        .reset_stuck_syncs(&connection, older_than)
        .await?;
    Ok(Json(result))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/connections", get(list_connections).post(create_connection))
        .route(
            "/connections/{id}",
            get(get_connection)
                .patch(update_connection)
                .delete(delete_connection),
        )
        .route("/connections/{id}/push-token", post(rotate_push_token))
        .route("/connections/{id}/sync", post(trigger_sync))
        .route("/connections/{id}/sync-status", get(get_sync_status))
        .route("/connections/{id}/sync-logs", get(list_sync_logs))
        .route("/connections/{id}/sync/reset", post(reset_stuck_syncs))
}
