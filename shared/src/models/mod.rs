//! Domain models
//!
//! Shared between gestion-server and afip-client. IDs are UUID v4
//! strings, timestamps are Unix millis.

pub mod filter;
pub mod invoice;
pub mod provider;
pub mod vendor;

// Re-exports
pub use filter::*;
pub use invoice::*;
pub use provider::*;
pub use vendor::*;
