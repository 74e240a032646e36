//! Shared types for the gestion backend
//!
//! Domain models, provider validation and filtering, and the unified
//! error / response types used by every crate.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, ErrorBody, ErrorCode};
