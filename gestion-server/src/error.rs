//! Service-layer error type
//!
//! `ServiceError` lets handlers use `?` on storage and AFIP calls; the
//! conversion to `AppError` (and the logging of infrastructure failures)
//! happens here, once.

use afip_client::AfipError;
use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::gemini::GeminiError;
use crate::storage::StorageError;

#[derive(Debug)]
pub enum ServiceError {
    /// redb or serialization failure (logged, mapped to DatabaseError)
    Storage(StorageError),
    /// AFIP web service failure
    Afip(AfipError),
    /// Gemini proxy failure
    Gemini(GeminiError),
    /// Business-rule error, passed through unchanged
    App(AppError),
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        ServiceError::Storage(e)
    }
}

impl From<AfipError> for ServiceError {
    fn from(e: AfipError) -> Self {
        ServiceError::Afip(e)
    }
}

impl From<GeminiError> for ServiceError {
    fn from(e: GeminiError) -> Self {
        ServiceError::Gemini(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Storage(db_err) => {
                tracing::error!(error = %db_err, "Storage error");
                AppError::new(ErrorCode::DatabaseError)
            }
            ServiceError::Afip(afip_err) => afip_to_app(afip_err),
            ServiceError::Gemini(gemini_err) => {
                tracing::error!(error = %gemini_err, "Gemini proxy error");
                AppError::with_message(ErrorCode::GeminiRequestFailed, gemini_err.to_string())
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

fn afip_to_app(e: AfipError) -> AppError {
    if e.is_ticket_error() {
        tracing::warn!(error = %e, "AFIP rejected the access ticket");
        return AppError::with_message(ErrorCode::AfipAuthFailed, e.to_string());
    }
    match e {
        AfipError::Rejected {
            observations,
            errors,
        } => {
            tracing::warn!(observations = observations.len(), errors = errors.len(), "Invoice rejected");
            AppError::new(ErrorCode::InvoiceRejected)
                .with_detail("observations", serde_json::json!(observations))
                .with_detail("errors", serde_json::json!(errors))
        }
        AfipError::Fault { code, message } => {
            tracing::warn!(%code, %message, "AFIP SOAP fault");
            AppError::with_message(ErrorCode::AfipAuthFailed, message).with_detail("fault", code)
        }
        AfipError::Service(errors) => {
            tracing::warn!(errors = errors.len(), "AFIP service error");
            let message = errors
                .first()
                .map(|m| m.message.clone())
                .unwrap_or_else(|| ErrorCode::AfipServiceError.message().to_string());
            AppError::with_message(ErrorCode::AfipServiceError, message)
                .with_detail("errors", serde_json::json!(errors))
        }
        AfipError::InvalidResponse(reason) => {
            tracing::error!(%reason, "Unexpected AFIP response");
            AppError::with_message(ErrorCode::AfipServiceError, reason)
        }
        e @ (AfipError::Http(_) | AfipError::HttpStatus { .. }) => {
            tracing::error!(error = %e, "AFIP unreachable");
            AppError::new(ErrorCode::AfipUnavailable)
        }
        AfipError::Cert(e) => {
            tracing::error!(error = %e, "AFIP certificate error");
            AppError::with_message(ErrorCode::CertificateInvalid, e.to_string())
        }
        AfipError::Store(e) => {
            tracing::error!(error = %e, "Ticket store error");
            AppError::new(ErrorCode::InternalError)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::AfipMessage;

    fn msg(code: i64, message: &str) -> AfipMessage {
        AfipMessage {
            code,
            message: message.into(),
        }
    }

    fn map(e: AfipError) -> AppError {
        ServiceError::from(e).into()
    }

    #[test]
    fn test_rejection_carries_observations() {
        let err = map(AfipError::Rejected {
            observations: vec![msg(10016, "Fecha invalida")],
            errors: vec![],
        });
        assert_eq!(err.code, ErrorCode::InvoiceRejected);
        let details = err.details.unwrap();
        assert_eq!(details["observations"][0]["code"], 10016);
    }

    #[test]
    fn test_ticket_error_is_auth_failure() {
        let err = map(AfipError::Service(vec![msg(600, "ValidacionDeToken")]));
        assert_eq!(err.code, ErrorCode::AfipAuthFailed);
    }

    #[test]
    fn test_service_error_uses_first_message() {
        let err = map(AfipError::Service(vec![msg(10015, "Campo DocNro invalido")]));
        assert_eq!(err.code, ErrorCode::AfipServiceError);
        assert_eq!(err.message, "Campo DocNro invalido");
    }

    #[test]
    fn test_transport_errors_are_unavailable() {
        let err = map(AfipError::HttpStatus {
            status: 503,
            body: String::new(),
        });
        assert_eq!(err.code, ErrorCode::AfipUnavailable);
    }

    #[test]
    fn test_app_error_passes_through() {
        let original = AppError::new(ErrorCode::ProviderNotFound).with_detail("id", "x");
        let err: AppError = ServiceError::from(original).into();
        assert_eq!(err.code, ErrorCode::ProviderNotFound);
        assert_eq!(err.details.unwrap()["id"], "x");
    }
}
