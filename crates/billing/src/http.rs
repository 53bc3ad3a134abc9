use std::time::Duration;

use async_trait::async_trait;
use billchat_core::config::BillingConfig;
use billchat_core::BillingPeriod;
use reqwest::{Client, Response};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::backend::{BackendError, BillingBackend, Credentials, DetailPage, PaymentRequest};

/// reqwest-backed client for the billing REST API.
pub struct HttpBillingBackend {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

impl HttpBillingBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| BackendError::Transport(error.to_string()))?;
        Ok(Self { client, base_url: base_url.into() })
    }

    pub fn from_config(config: &BillingConfig) -> Result<Self, BackendError> {
        Self::new(config.base_url.clone(), Duration::from_secs(config.timeout_secs))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

#[async_trait]
impl BillingBackend for HttpBillingBackend {
    async fn login(&self, credentials: &Credentials) -> Result<String, BackendError> {
        let response = self
            .client
            .post(self.endpoint("authentication/login"))
            .json(&json!({
                "username": credentials.username,
                "password": credentials.password.expose_secret(),
            }))
            .send()
            .await
            .map_err(transport_error)?;

        let body = read_body(response).await?.ok_or_else(|| {
            BackendError::Decode("login response did not contain a body".to_string())
        })?;
        let login: LoginResponse =
            serde_json::from_value(body).map_err(|error| BackendError::Decode(error.to_string()))?;

        login
            .token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| BackendError::Decode("login response did not contain a token".to_string()))
    }

    async fn query_bill(
        &self,
        token: &str,
        subscriber_no: &str,
        period: BillingPeriod,
    ) -> Result<Option<Value>, BackendError> {
        debug!(event_name = "billing.http.query_bill", %period, "requesting bill summary");
        let month = period.to_string();
        let response = self
            .client
            .get(self.endpoint("mobileapp/querybill"))
            .bearer_auth(token)
            .query(&[("subscriberNo", subscriber_no), ("month", month.as_str())])
            .send()
            .await
            .map_err(transport_error)?;

        read_body(response).await
    }

    async fn query_bill_detailed(
        &self,
        token: &str,
        subscriber_no: &str,
        period: BillingPeriod,
        page: DetailPage,
    ) -> Result<Option<Value>, BackendError> {
        debug!(event_name = "billing.http.query_bill_detailed", %period, "requesting bill line items");
        let month = period.to_string();
        let page_number = page.page_number.to_string();
        let page_size = page.page_size.to_string();
        let response = self
            .client
            .get(self.endpoint("mobileapp/querybilldetailed"))
            .bearer_auth(token)
            .query(&[
                ("subscriberNo", subscriber_no),
                ("month", month.as_str()),
                ("pageNumber", page_number.as_str()),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        read_body(response).await
    }

    async fn pay_bill(&self, token: &str, request: &PaymentRequest) -> Result<Value, BackendError> {
        debug!(
            event_name = "billing.http.pay_bill",
            period = %request.month,
            full_payment = request.amount.is_none(),
            "submitting bill payment"
        );
        let response = self
            .client
            .post(self.endpoint("website/paybill"))
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        read_body(response).await?.ok_or_else(|| {
            BackendError::Decode("payment response did not contain a body".to_string())
        })
    }
}

fn transport_error(error: reqwest::Error) -> BackendError {
    BackendError::Transport(error.to_string())
}

async fn read_body(response: Response) -> Result<Option<Value>, BackendError> {
    let status = response.status();
    let text = response.text().await.map_err(transport_error)?;

    if !status.is_success() {
        let detail = error_detail(&text)
            .or_else(|| status.canonical_reason().map(str::to_string));
        return Err(BackendError::from_status(status.as_u16(), detail));
    }

    if text.trim().is_empty() {
        return Ok(None);
    }

    let value: Value =
        serde_json::from_str(&text).map_err(|error| BackendError::Decode(error.to_string()))?;
    Ok((!value.is_null()).then_some(value))
}

/// Pulls the human-readable message out of an upstream error body.
fn error_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return Some(trimmed.to_string());
    };

    ["message", "errorMessage", "title", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
