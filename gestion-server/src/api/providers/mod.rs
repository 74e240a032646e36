//! Provider API
//!
//! | path | method | |
//! |------|--------|--|
//! | /api/providers | GET | list, filtered by `search`, `zona`, `rubro`, `marca` |
//! | /api/providers | POST | create |
//! | /api/providers/{id} | GET / PUT / DELETE | fetch, update, delete |

mod handler;

use axum::{Router, routing::get};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/providers", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
}
