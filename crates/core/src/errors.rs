use thiserror::Error;

use crate::domain::period::BillingPeriod;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid billing period `{0}` (expected YYYY-MM)")]
    InvalidPeriod(String),
}

/// Failure taxonomy shared by the resolver, the orchestrator, and the dispatcher.
///
/// Every variant is absorbed at one of those boundaries and turned into a
/// user-facing message; none of them tears down a connection.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OperationFailure {
    #[error("language model unavailable: {0}")]
    LlmUnavailable(String),
    #[error("billing backend authentication failed")]
    AuthFailure,
    #[error("billing backend session expired")]
    SessionExpired,
    #[error("no bill found for {period}")]
    NotFound { period: BillingPeriod },
    #[error("billing backend error: {detail}")]
    Upstream { detail: String },
    #[error("internal error: {0}")]
    Internal(String),
}

pub const GENERIC_ERROR_MESSAGE: &str = "Sorry, an error occurred. Please try again.";

impl OperationFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LlmUnavailable(_) => "llm_unavailable",
            Self::AuthFailure => "auth_failure",
            Self::SessionExpired => "session_expired",
            Self::NotFound { .. } => "not_found",
            Self::Upstream { .. } => "upstream_error",
            Self::Internal(_) => "internal_error",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::LlmUnavailable(_) | Self::Internal(_) => GENERIC_ERROR_MESSAGE.to_string(),
            Self::AuthFailure => {
                "Kimlik doğrulama hatası. Lütfen biraz sonra tekrar deneyin.".to_string()
            }
            Self::SessionExpired => "Oturum süresi doldu. Lütfen işlemi tekrar deneyin.".to_string(),
            Self::NotFound { period } => format!(
                "{period} ayı için fatura bulunamadı. Lütfen farklı bir ay deneyin veya fatura oluşturulduğundan emin olun."
            ),
            Self::Upstream { detail } => format!("Error: {detail}"),
        }
    }
}
