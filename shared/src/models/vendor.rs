//! Vendor (salesperson) Model

use serde::{Deserialize, Serialize};

/// Vendor entity, only used for selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: String,
    #[serde(alias = "nombre")]
    pub name: String,
}

/// Create vendor payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorCreate {
    #[serde(default, alias = "nombre")]
    pub name: String,
}

/// Select vendor payload; `None` clears the selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorSelect {
    pub vendor_id: Option<String>,
}
