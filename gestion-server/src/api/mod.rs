//! HTTP routes
//!
//! | prefix | module | auth |
//! |--------|--------|------|
//! | `/health` | [`health`] | public |
//! | `/api/providers` | [`providers`] | bearer |
//! | `/api/vendors` | [`vendors`] | bearer |
//! | `/api/invoices`, `/api/createInvoice` | [`invoices`] | bearer |
//! | `/api/gemini` | [`gemini`] | bearer |

pub mod gemini;
pub mod health;
pub mod invoices;
pub mod providers;
pub mod vendors;

use std::time::Duration;

use axum::response::{IntoResponse, Response};
use axum::{Router, middleware};
use http::StatusCode;
use shared::error::{AppError, ErrorCode};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::state::AppState;

/// Covers a WSAA login plus both WSFE calls at their own timeouts
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Build the full router
pub fn create_router(state: AppState) -> Router {
    router_with_timeout(state, REQUEST_TIMEOUT)
}

/// Full router with a custom request deadline
pub fn router_with_timeout(state: AppState, timeout: Duration) -> Router {
    let api = Router::new()
        .merge(providers::router())
        .merge(vendors::router())
        .merge(invoices::router())
        .merge(gemini::router())
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(health::router())
        .merge(api)
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(middleware::map_response(timeout_body))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `TimeoutLayer` answers with an empty body; give it the usual error body
async fn timeout_body(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        return AppError::new(ErrorCode::TimeoutError).into_response();
    }
    response
}
