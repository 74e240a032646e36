//! Invoice API Handlers

use std::sync::Arc;

use afip_client::{ServerStatus, Wsfe};
use axum::{
    Json,
    extract::{Extension, Query, State},
};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{InvoiceRecord, InvoiceRequest};
use shared::util::{new_id, now_millis};

use crate::auth::CurrentUser;
use crate::error::ServiceResult;
use crate::state::AppState;

fn afip(state: &AppState) -> Result<Arc<Wsfe>, AppError> {
    state.afip.clone().ok_or_else(|| {
        AppError::with_message(
            ErrorCode::AfipNotConfigured,
            "AFIP credentials are not configured (set AFIP_CUIT, certificate and key)",
        )
    })
}

/// POST /api/invoices
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<InvoiceRequest>,
) -> ServiceResult<Json<InvoiceRecord>> {
    let wsfe = afip(&state)?;

    // Numbering is "last authorised + 1": one submission at a time
    let _guard = state.invoice_lock.lock().await;

    tracing::info!(
        point_of_sale = request.point_of_sale,
        invoice_type = request.invoice_type,
        user = %user.id,
        "Creating invoice"
    );
    let result = wsfe.create_next_voucher(&request).await?;

    let record = InvoiceRecord {
        id: new_id(),
        request,
        result,
        created_at: now_millis(),
    };
    if let Err(e) = state.storage.insert_invoice(&record) {
        // The CAE is already granted; keep it in the log if it cannot be stored
        tracing::error!(
            voucher_number = record.result.voucher_number,
            cae = %record.result.cae,
            error = %e,
            "Authorised invoice could not be stored"
        );
        return Err(e.into());
    }
    Ok(Json(record))
}

/// GET /api/invoices
pub async fn list(State(state): State<AppState>) -> ServiceResult<Json<Vec<InvoiceRecord>>> {
    Ok(Json(state.storage.list_invoices()?))
}

#[derive(Debug, Deserialize)]
pub struct LastVoucherQuery {
    #[serde(alias = "PtoVta")]
    pub point_of_sale: u32,
    #[serde(alias = "CbteTipo")]
    pub invoice_type: u16,
}

#[derive(Debug, Serialize)]
pub struct LastVoucher {
    pub point_of_sale: u32,
    pub invoice_type: u16,
    pub voucher_number: u64,
}

/// GET /api/invoices/last
pub async fn last(
    State(state): State<AppState>,
    Query(query): Query<LastVoucherQuery>,
) -> ServiceResult<Json<LastVoucher>> {
    let wsfe = afip(&state)?;
    let voucher_number = wsfe
        .last_voucher(query.point_of_sale, query.invoice_type)
        .await?;
    Ok(Json(LastVoucher {
        point_of_sale: query.point_of_sale,
        invoice_type: query.invoice_type,
        voucher_number,
    }))
}

/// GET /api/invoices/status
pub async fn status(State(state): State<AppState>) -> ServiceResult<Json<ServerStatus>> {
    let wsfe = afip(&state)?;
    Ok(Json(wsfe.server_status().await?))
}
