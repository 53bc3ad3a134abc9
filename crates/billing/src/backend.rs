use async_trait::async_trait;
use billchat_core::{BillingPeriod, OperationDescriptor};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("billing backend rejected the bearer token")]
    Unauthorized,
    #[error("billing backend reported not found: {detail}")]
    NotFound { detail: String },
    #[error("billing backend returned status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("billing backend request failed: {0}")]
    Transport(String),
    #[error("billing backend response could not be decoded: {0}")]
    Decode(String),
}

impl BackendError {
    /// Classifies a non-success HTTP status together with the upstream error text.
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        let detail = detail.unwrap_or_else(|| format!("HTTP {status}"));
        match status {
            401 => Self::Unauthorized,
            404 => Self::NotFound { detail },
            _ if detail.to_lowercase().contains("not found") => Self::NotFound { detail },
            _ => Self::Status { status, detail },
        }
    }

    pub fn detail(&self) -> String {
        match self {
            Self::Unauthorized => "unauthorized".to_string(),
            Self::NotFound { detail } | Self::Status { detail, .. } => detail.clone(),
            Self::Transport(detail) | Self::Decode(detail) => detail.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetailPage {
    pub page_number: u32,
    pub page_size: u32,
}

impl DetailPage {
    pub fn first(page_size: u32) -> Self {
        Self { page_number: 1, page_size }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub subscriber_no: String,
    pub month: BillingPeriod,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub amount: Option<Decimal>,
}

impl PaymentRequest {
    /// An absent amount asks the backend to settle the full outstanding balance.
    pub fn for_descriptor(descriptor: &OperationDescriptor) -> Self {
        Self {
            subscriber_no: descriptor.subscriber_no().to_string(),
            month: descriptor.period(),
            amount: descriptor.amount().filter(|amount| *amount > Decimal::ZERO),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// The four billing backend operations the gateway consumes.
///
/// Read operations return `Ok(None)` when the backend answers successfully but
/// carries no bill data.
#[async_trait]
pub trait BillingBackend: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<String, BackendError>;

    async fn query_bill(
        &self,
        token: &str,
        subscriber_no: &str,
        period: BillingPeriod,
    ) -> Result<Option<Value>, BackendError>;

    async fn query_bill_detailed(
        &self,
        token: &str,
        subscriber_no: &str,
        period: BillingPeriod,
        page: DetailPage,
    ) -> Result<Option<Value>, BackendError>;

    async fn pay_bill(&self, token: &str, request: &PaymentRequest) -> Result<Value, BackendError>;
}
