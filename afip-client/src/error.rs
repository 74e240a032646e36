//! AFIP client error types

use shared::models::AfipMessage;
use thiserror::Error;

/// Token / sign rejections reported by WSFE
pub const TICKET_ERROR_CODES: [i64; 3] = [600, 601, 602];

#[derive(Debug, Error)]
pub enum AfipError {
    /// Transport failure (connect, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status without a SOAP fault
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Certificate error: {0}")]
    Cert(#[from] gestion_cert::CertError),

    /// SOAP fault (WSAA reports its errors this way)
    #[error("SOAP fault {code}: {message}")]
    Fault { code: String, message: String },

    /// Errors block returned by WSFE
    #[error("AFIP error: {}", format_messages(.0))]
    Service(Vec<AfipMessage>),

    /// Voucher rejected (`Resultado = R`)
    #[error("Invoice rejected: {}", format_messages(.observations))]
    Rejected {
        observations: Vec<AfipMessage>,
        errors: Vec<AfipMessage>,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Ticket store error: {0}")]
    Store(String),
}

impl AfipError {
    /// Expired or invalid access ticket
    pub fn is_ticket_error(&self) -> bool {
        match self {
            Self::Service(errors) => errors
                .iter()
                .any(|e| TICKET_ERROR_CODES.contains(&e.code)),
            _ => false,
        }
    }

    /// Worth retrying for an idempotent call
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub(crate) fn format_messages(messages: &[AfipMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.code, m.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<std::io::Error> for AfipError {
    fn from(e: std::io::Error) -> Self {
        Self::Store(e.to_string())
    }
}

impl From<serde_json::Error> for AfipError {
    fn from(e: serde_json::Error) -> Self {
        Self::Store(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AfipError>;
