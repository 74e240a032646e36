//! Error category, from the thousands digit of the code

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// 0xxx
    Request,
    /// 1xxx
    Auth,
    /// 3xxx
    Catalog,
    /// 4xxx
    Invoicing,
    /// 5xxx
    Integration,
    /// 9xxx and anything unassigned
    System,
}

impl ErrorCategory {
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::Request,
            1000..2000 => Self::Auth,
            3000..4000 => Self::Catalog,
            4000..5000 => Self::Invoicing,
            5000..6000 => Self::Integration,
            _ => Self::System,
        }
    }
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
