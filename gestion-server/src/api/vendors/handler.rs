//! Vendor API Handlers

use axum::{Json, extract::State};
use shared::error::{AppError, ErrorCode};
use shared::models::{Vendor, VendorCreate, VendorSelect};
use shared::util::new_id;

use crate::error::ServiceResult;
use crate::state::AppState;

/// GET /api/vendors
pub async fn list(State(state): State<AppState>) -> ServiceResult<Json<Vec<Vendor>>> {
    Ok(Json(state.storage.list_vendors()?))
}

/// POST /api/vendors
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<VendorCreate>,
) -> ServiceResult<Json<Vendor>> {
    if payload.name.is_empty() {
        return Err(AppError::new(ErrorCode::VendorNameRequired)
            .with_detail("field", "name")
            .into());
    }

    let vendor = Vendor {
        id: new_id(),
        name: payload.name,
    };
    state.storage.insert_vendor(&vendor)?;
    tracing::info!(vendor_id = %vendor.id, "Vendor created");
    Ok(Json(vendor))
}

/// GET /api/vendors/selected
///
/// `null` when nothing is selected or the selected vendor no longer exists.
pub async fn selected(State(state): State<AppState>) -> ServiceResult<Json<Option<Vendor>>> {
    let vendor = match state.storage.selected_vendor_id()? {
        Some(id) => state.storage.get_vendor(&id)?,
        None => None,
    };
    Ok(Json(vendor))
}

/// PUT /api/vendors/selected
pub async fn select(
    State(state): State<AppState>,
    Json(payload): Json<VendorSelect>,
) -> ServiceResult<Json<Option<Vendor>>> {
    let vendor = match payload.vendor_id.as_deref() {
        Some(id) => Some(state.storage.get_vendor(id)?.ok_or_else(|| {
            AppError::new(ErrorCode::VendorNotFound).with_detail("id", id)
        })?),
        None => None,
    };

    state
        .storage
        .set_selected_vendor(vendor.as_ref().map(|v| v.id.as_str()))?;
    tracing::info!(vendor_id = ?vendor.as_ref().map(|v| &v.id), "Vendor selected");
    Ok(Json(vendor))
}
