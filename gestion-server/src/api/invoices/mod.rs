//! Electronic invoice API (AFIP WSFE)
//!
//! | path | method | |
//! |------|--------|--|
//! | /api/invoices | POST | authorise the next voucher and store it |
//! | /api/createInvoice | POST | same as above |
//! | /api/invoices | GET | stored invoices, newest first |
//! | /api/invoices/last | GET | last authorised number for `point_of_sale` + `invoice_type` |
//! | /api/invoices/status | GET | WSFE `FEDummy` |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/api/invoices", routes())
        .route("/api/createInvoice", post(handler::create))
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/last", get(handler::last))
        .route("/status", get(handler::status))
}
