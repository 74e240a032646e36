//! Error codes returned in the `code` field of every error body
//!
//! - 0xxx: Request errors
//! - 1xxx: Authentication
//! - 3xxx: Providers and vendors
//! - 4xxx: AFIP invoicing
//! - 5xxx: Gemini proxy
//! - 9xxx: Server-side failures

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // 0xxx
    RequiredField = 7,

    // 1xxx
    NotAuthenticated = 1001,
    TokenExpired = 1003,
    TokenInvalid = 1004,

    // 3xxx
    ProviderNotFound = 3001,
    ProviderNameRequired = 3002,
    VendorNotFound = 3101,
    VendorNameRequired = 3102,

    // 4xxx
    AfipNotConfigured = 4001,
    /// WSAA refused the login or WSFE refused the ticket
    AfipAuthFailed = 4002,
    /// `Resultado = R`; observations travel in the details
    InvoiceRejected = 4003,
    AfipServiceError = 4004,
    /// Transport failure after retries
    AfipUnavailable = 4005,
    CertificateInvalid = 4006,

    // 5xxx
    GeminiNotConfigured = 5001,
    GeminiRequestFailed = 5002,

    // 9xxx
    InternalError = 9001,
    DatabaseError = 9002,
    /// Request exceeded the server-side deadline
    TimeoutError = 9004,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Default message when the caller supplies none
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::NotAuthenticated => "Caller is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::ProviderNotFound => "Provider not found",
            ErrorCode::ProviderNameRequired => "Provider name is required",
            ErrorCode::VendorNotFound => "Vendor not found",
            ErrorCode::VendorNameRequired => "Vendor name is required",
            ErrorCode::AfipNotConfigured => "AFIP credentials are not configured",
            ErrorCode::AfipAuthFailed => "AFIP authentication failed",
            ErrorCode::InvoiceRejected => "Invoice rejected by AFIP",
            ErrorCode::AfipServiceError => "AFIP service error",
            ErrorCode::AfipUnavailable => "AFIP service unavailable",
            ErrorCode::CertificateInvalid => "Certificate or private key is invalid",
            ErrorCode::GeminiNotConfigured => "Gemini API key is not configured",
            ErrorCode::GeminiRequestFailed => "Gemini request failed",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::TimeoutError => "Request timed out",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            7 => ErrorCode::RequiredField,
            1001 => ErrorCode::NotAuthenticated,
            1003 => ErrorCode::TokenExpired,
            1004 => ErrorCode::TokenInvalid,
            3001 => ErrorCode::ProviderNotFound,
            3002 => ErrorCode::ProviderNameRequired,
            3101 => ErrorCode::VendorNotFound,
            3102 => ErrorCode::VendorNameRequired,
            4001 => ErrorCode::AfipNotConfigured,
            4002 => ErrorCode::AfipAuthFailed,
            4003 => ErrorCode::InvoiceRejected,
            4004 => ErrorCode::AfipServiceError,
            4005 => ErrorCode::AfipUnavailable,
            4006 => ErrorCode::CertificateInvalid,
            5001 => ErrorCode::GeminiNotConfigured,
            5002 => ErrorCode::GeminiRequestFailed,
            9001 => ErrorCode::InternalError,
            9002 => ErrorCode::DatabaseError,
            9004 => ErrorCode::TimeoutError,
            _ => return Err(InvalidErrorCode(value)),
        };
        Ok(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
