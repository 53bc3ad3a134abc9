use std::sync::Arc;

use billchat_core::{
    BillingOperationResult, BillingPeriod, Intent, OperationDescriptor, OperationFailure,
};
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::AuthSession;
use crate::backend::{BackendError, BillingBackend, DetailPage, PaymentRequest};
use crate::cache::{CachedPayment, PaymentCache, PaymentKey};
use crate::payloads::{has_line_items, BillSummary, DetailedBill, PaymentReceipt};
use crate::render;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("malformed {operation} payload from billing backend: {reason}")]
    MalformedPayload { operation: &'static str, reason: String },
}

impl From<OrchestratorError> for OperationFailure {
    fn from(error: OrchestratorError) -> Self {
        OperationFailure::Internal(error.to_string())
    }
}

enum CallError {
    Backend(BackendError),
    Malformed(OrchestratorError),
}

impl From<BackendError> for CallError {
    fn from(error: BackendError) -> Self {
        Self::Backend(error)
    }
}

impl From<OrchestratorError> for CallError {
    fn from(error: OrchestratorError) -> Self {
        Self::Malformed(error)
    }
}

/// Maps a resolved descriptor onto one backend call and turns the outcome into
/// a [`BillingOperationResult`].
///
/// Backend failures are classified into user-facing results here. Only a
/// success payload that cannot be decoded escapes as an error.
pub struct BillingOrchestrator {
    backend: Arc<dyn BillingBackend>,
    auth: Arc<AuthSession>,
    cache: PaymentCache,
    detail_page: DetailPage,
}

impl BillingOrchestrator {
    pub fn new(
        backend: Arc<dyn BillingBackend>,
        auth: Arc<AuthSession>,
        cache: PaymentCache,
        detail_page: DetailPage,
    ) -> Self {
        Self { backend, auth, cache, detail_page }
    }

    pub fn auth(&self) -> &Arc<AuthSession> {
        &self.auth
    }

    pub fn cache(&self) -> &PaymentCache {
        &self.cache
    }

    pub async fn execute(
        &self,
        descriptor: &OperationDescriptor,
    ) -> Result<BillingOperationResult, OrchestratorError> {
        let intent = descriptor.intent();
        if !intent.reaches_backend() {
            return Ok(match intent {
                Intent::Greeting => BillingOperationResult::notice(render::HELP_MESSAGE),
                _ => BillingOperationResult::failed(render::UNKNOWN_MESSAGE),
            });
        }

        let Some(token) = self.auth.ensure_token().await else {
            warn!(
                event_name = "billing.execute.unauthenticated",
                intent = %intent,
                "no billing token available, skipping backend call"
            );
            return Ok(BillingOperationResult::from_failure(&OperationFailure::AuthFailure));
        };

        debug!(
            event_name = "billing.execute.start",
            intent = %intent,
            period = %descriptor.period(),
            "dispatching billing operation"
        );

        // The chat client's "query bill" shows line items and its "detailed"
        // action shows the status summary, so the backend reads are crossed.
        let outcome = match intent {
            Intent::QueryBill => self.line_item_listing(&token, descriptor).await,
            Intent::QueryBillDetailed => self.status_summary(&token, descriptor).await,
            _ => self.pay(&token, descriptor).await,
        };

        match outcome {
            Ok(result) => {
                info!(
                    event_name = "billing.execute.completed",
                    intent = %intent,
                    success = result.success,
                    "billing operation completed"
                );
                Ok(result)
            }
            Err(CallError::Backend(error)) => {
                let failure = self.classify_failure(error, descriptor.period()).await;
                warn!(
                    event_name = "billing.execute.failed",
                    intent = %intent,
                    failure_kind = failure.kind(),
                    error = %failure,
                    "billing operation failed"
                );
                Ok(BillingOperationResult::from_failure(&failure))
            }
            Err(CallError::Malformed(error)) => Err(error),
        }
    }

    /// Maps a backend error onto the failure taxonomy.
    ///
    /// An unauthorized response triggers exactly one re-login; the failed
    /// call is not retried.
    pub async fn classify_failure(
        &self,
        error: BackendError,
        period: BillingPeriod,
    ) -> OperationFailure {
        match error {
            BackendError::Unauthorized => {
                info!(event_name = "billing.auth.refresh", "bearer token rejected, logging in again");
                if self.auth.login().await {
                    OperationFailure::SessionExpired
                } else {
                    OperationFailure::AuthFailure
                }
            }
            BackendError::NotFound { .. } => OperationFailure::NotFound { period },
            other => OperationFailure::Upstream { detail: other.detail() },
        }
    }

    async fn line_item_listing(
        &self,
        token: &str,
        descriptor: &OperationDescriptor,
    ) -> Result<BillingOperationResult, CallError> {
        let period = descriptor.period();
        let payload = self
            .backend
            .query_bill_detailed(token, descriptor.subscriber_no(), period, self.detail_page)
            .await?;

        let Some(payload) = payload.filter(has_line_items) else {
            return Ok(BillingOperationResult::failed(render::detailed_not_found(period)));
        };

        let bill: DetailedBill = decode("detailed bill", &payload)?;
        Ok(BillingOperationResult::succeeded(payload, render::line_items(period, &bill)))
    }

    async fn status_summary(
        &self,
        token: &str,
        descriptor: &OperationDescriptor,
    ) -> Result<BillingOperationResult, CallError> {
        let period = descriptor.period();
        let Some(payload) =
            self.backend.query_bill(token, descriptor.subscriber_no(), period).await?
        else {
            return Ok(BillingOperationResult::failed(render::summary_not_found(period)));
        };

        let summary: BillSummary = decode("bill summary", &payload)?;
        let recent = self.cache.fresh(&PaymentKey::new(descriptor.subscriber_no(), period)).await;
        let message = render::status_summary(period, &summary, recent.as_ref());

        let data = match recent {
            Some(payment) => overlay_payment(payload, &payment),
            None => payload,
        };
        Ok(BillingOperationResult::succeeded(data, message))
    }

    async fn pay(
        &self,
        token: &str,
        descriptor: &OperationDescriptor,
    ) -> Result<BillingOperationResult, CallError> {
        let request = PaymentRequest::for_descriptor(descriptor);
        let payload = self.backend.pay_bill(token, &request).await?;
        let receipt: PaymentReceipt = decode("payment", &payload)?;

        if receipt.is_successful() {
            self.remember_payment(descriptor, &receipt).await;
        }

        Ok(BillingOperationResult::with_data(
            receipt.is_successful(),
            payload,
            render::payment_outcome(&receipt),
        ))
    }

    async fn remember_payment(&self, descriptor: &OperationDescriptor, receipt: &PaymentReceipt) {
        let (Some(paid_amount), Some(remaining_amount)) =
            (receipt.paid_amount, receipt.remaining_amount)
        else {
            warn!(
                event_name = "billing.cache.skipped",
                period = %descriptor.period(),
                "successful payment carried no amounts, not caching"
            );
            return;
        };

        self.cache
            .record(CachedPayment {
                subscriber_no: descriptor.subscriber_no().to_string(),
                period: descriptor.period(),
                paid_amount,
                remaining_amount,
                recorded_at: Utc::now(),
            })
            .await;
        debug!(
            event_name = "billing.cache.recorded",
            period = %descriptor.period(),
            remaining = %remaining_amount,
            "recent payment cached"
        );
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    operation: &'static str,
    payload: &Value,
) -> Result<T, OrchestratorError> {
    T::deserialize(payload).map_err(|error| OrchestratorError::MalformedPayload {
        operation,
        reason: error.to_string(),
    })
}

fn overlay_payment(payload: Value, payment: &CachedPayment) -> Value {
    let Value::Object(mut fields) = payload else {
        return payload;
    };
    fields.insert("remainingAmount".to_string(), decimal_value(payment.remaining_amount));
    fields.insert("paidAmount".to_string(), decimal_value(payment.paid_amount));
    fields.insert("hasRecentPayment".to_string(), Value::Bool(true));
    if payment.remaining_amount > Decimal::ZERO {
        fields.insert("paidStatus".to_string(), Value::Bool(false));
    }
    Value::Object(fields)
}

fn decimal_value(value: Decimal) -> Value {
    value.to_f64().map(Value::from).unwrap_or(Value::Null)
}
