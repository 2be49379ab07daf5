use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use tradelens_connect::ProviderDescriptor;

use crate::{auth::AuthUser, error::ApiResult, main_lib::AppState};

async fn list_providers(
    _caller: AuthUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<ProviderDescriptor>>> {
    Ok(Json(state.provider_registry.descriptors()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/providers", get(list_providers))
}
