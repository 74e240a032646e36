//! gestion-server: provider/vendor management, AFIP invoicing and a
//! Gemini proxy over HTTP
//!
//! ```text
//! gestion-server/src/
//! ├── config.rs    # environment configuration
//! ├── state.rs     # AppState, integration wiring
//! ├── storage.rs   # redb tables
//! ├── auth.rs      # bearer JWT middleware
//! ├── error.rs     # ServiceError -> AppError
//! ├── gemini.rs    # Gemini client
//! └── api/         # routes and handlers
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod gemini;
pub mod state;
pub mod storage;

pub use api::create_router;
pub use auth::{CurrentUser, create_token};
pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;
pub use storage::{Storage, StorageError};
