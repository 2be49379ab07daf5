use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use tradelens_core::{
    errors::Error as CoreError,
    push::{PushOutcome, PushTradePayload},
};

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

/// Token-authenticated endpoint for the trading-terminal bridge. No caller JWT.
async fn push_trade(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PushTradePayload>,
) -> ApiResult<Json<PushOutcome>> {
    tracing::debug!("Trade push received: {:?}", payload);
    match state.push_service.ingest(payload).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(CoreError::Validation(e)) => Err(ApiError::Unprocessable(e.to_string())),
        Err(e) => Err(e.into()),
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/push/trade", post(push_trade))
}
