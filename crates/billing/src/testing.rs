use std::collections::VecDeque;

use async_trait::async_trait;
use billchat_core::BillingPeriod;
use secrecy::SecretString;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::backend::{BackendError, BillingBackend, Credentials, DetailPage, PaymentRequest};

pub fn credentials() -> Credentials {
    Credentials {
        username: "mobileapp".to_string(),
        password: SecretString::from("mobile123".to_string()),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendCall {
    Login,
    QueryBill { token: String, subscriber_no: String, period: BillingPeriod },
    QueryBillDetailed { token: String, subscriber_no: String, period: BillingPeriod, page: DetailPage },
    PayBill { token: String, request: PaymentRequest },
}

#[derive(Default)]
struct ScriptState {
    logins: VecDeque<Result<String, BackendError>>,
    summaries: VecDeque<Result<Option<Value>, BackendError>>,
    details: VecDeque<Result<Option<Value>, BackendError>>,
    payments: VecDeque<Result<Value, BackendError>>,
    calls: Vec<BackendCall>,
}

/// Backend fake that replays queued responses and records every call.
///
/// An exhausted login queue hands out sequential tokens; exhausted read queues
/// answer with no data.
#[derive(Default)]
pub struct ScriptedBackend {
    state: Mutex<ScriptState>,
}

impl ScriptedBackend {
    pub async fn push_login(&self, response: Result<String, BackendError>) {
        self.state.lock().await.logins.push_back(response);
    }

    pub async fn push_summary(&self, response: Result<Option<Value>, BackendError>) {
        self.state.lock().await.summaries.push_back(response);
    }

    pub async fn push_details(&self, response: Result<Option<Value>, BackendError>) {
        self.state.lock().await.details.push_back(response);
    }

    pub async fn push_payment(&self, response: Result<Value, BackendError>) {
        self.state.lock().await.payments.push_back(response);
    }

    pub async fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn login_calls(&self) -> usize {
        self.state.lock().await.calls.iter().filter(|call| **call == BackendCall::Login).count()
    }
}

#[async_trait]
impl BillingBackend for ScriptedBackend {
    async fn login(&self, _credentials: &Credentials) -> Result<String, BackendError> {
        let mut state = self.state.lock().await;
        state.calls.push(BackendCall::Login);
        let issued = state.calls.iter().filter(|call| **call == BackendCall::Login).count();
        state.logins.pop_front().unwrap_or_else(|| Ok(format!("token-{issued}")))
    }

    async fn query_bill(
        &self,
        token: &str,
        subscriber_no: &str,
        period: BillingPeriod,
    ) -> Result<Option<Value>, BackendError> {
        let mut state = self.state.lock().await;
        state.calls.push(BackendCall::QueryBill {
            token: token.to_string(),
            subscriber_no: subscriber_no.to_string(),
            period,
        });
        state.summaries.pop_front().unwrap_or(Ok(None))
    }

    async fn query_bill_detailed(
        &self,
        token: &str,
        subscriber_no: &str,
        period: BillingPeriod,
        page: DetailPage,
    ) -> Result<Option<Value>, BackendError> {
        let mut state = self.state.lock().await;
        state.calls.push(BackendCall::QueryBillDetailed {
            token: token.to_string(),
            subscriber_no: subscriber_no.to_string(),
            period,
            page,
        });
        state.details.pop_front().unwrap_or(Ok(None))
    }

    async fn pay_bill(&self, token: &str, request: &PaymentRequest) -> Result<Value, BackendError> {
        let mut state = self.state.lock().await;
        state.calls.push(BackendCall::PayBill { token: token.to_string(), request: request.clone() });
        state
            .payments
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Transport("no scripted payment".to_string())))
    }
}
