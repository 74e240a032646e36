//! Provider API Handlers

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Provider, ProviderCreate, ProviderFilter, ProviderUpdate, filter_providers,
    validate_provider, validate_provider_update,
};
use shared::util::{new_id, now_millis};

use crate::auth::CurrentUser;
use crate::error::ServiceResult;
use crate::state::AppState;

fn not_found(id: &str) -> AppError {
    AppError::new(ErrorCode::ProviderNotFound).with_detail("id", id)
}

/// GET /api/providers
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ProviderFilter>,
) -> ServiceResult<Json<Vec<Provider>>> {
    let providers = state.storage.list_providers()?;
    if filter.is_empty() {
        return Ok(Json(providers));
    }
    Ok(Json(filter_providers(&providers, &filter)))
}

/// GET /api/providers/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServiceResult<Json<Provider>> {
    let provider = state
        .storage
        .get_provider(&id)?
        .ok_or_else(|| not_found(&id))?;
    Ok(Json(provider))
}

/// POST /api/providers
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ProviderCreate>,
) -> ServiceResult<Json<Provider>> {
    validate_provider(&payload)?;

    let provider = Provider::from_create(new_id(), payload, now_millis());
    state.storage.insert_provider(&provider)?;

    tracing::info!(provider_id = %provider.id, user = %user.id, "Provider created");
    Ok(Json(provider))
}

/// PUT /api/providers/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<ProviderUpdate>,
) -> ServiceResult<Json<Provider>> {
    validate_provider_update(&payload)?;

    let provider = state
        .storage
        .update_provider(&id, payload, now_millis())?
        .ok_or_else(|| not_found(&id))?;

    tracing::info!(provider_id = %id, user = %user.id, "Provider updated");
    Ok(Json(provider))
}

/// DELETE /api/providers/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ServiceResult<Json<bool>> {
    if !state.storage.delete_provider(&id)? {
        return Err(not_found(&id).into());
    }
    tracing::info!(provider_id = %id, user = %user.id, "Provider deleted");
    Ok(Json(true))
}
