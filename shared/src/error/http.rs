//! HTTP status for each error code

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::RequiredField | Self::ProviderNameRequired | Self::VendorNameRequired => {
                StatusCode::BAD_REQUEST
            }

            Self::NotAuthenticated | Self::TokenExpired | Self::TokenInvalid => {
                StatusCode::UNAUTHORIZED
            }

            Self::ProviderNotFound | Self::VendorNotFound => StatusCode::NOT_FOUND,

            Self::TimeoutError => StatusCode::REQUEST_TIMEOUT,

            // AFIP answered but refused the voucher
            Self::InvoiceRejected => StatusCode::UNPROCESSABLE_ENTITY,

            // Upstream answered with an error
            Self::AfipAuthFailed | Self::AfipServiceError | Self::GeminiRequestFailed => {
                StatusCode::BAD_GATEWAY
            }

            // Transient or not configured; the client may retry later
            Self::AfipUnavailable | Self::AfipNotConfigured | Self::GeminiNotConfigured => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            Self::InternalError | Self::DatabaseError | Self::CertificateInvalid => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert_eq!(ErrorCode::ProviderNameRequired.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::TokenExpired.http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::VendorNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::TimeoutError.http_status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[test]
    fn test_afip_status() {
        assert_eq!(
            ErrorCode::InvoiceRejected.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ErrorCode::AfipAuthFailed.http_status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ErrorCode::AfipUnavailable.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ErrorCode::AfipNotConfigured.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
