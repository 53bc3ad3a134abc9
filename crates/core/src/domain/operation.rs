use serde::Serialize;
use serde_json::Value;

use crate::errors::OperationFailure;

/// Uniform outcome of every billing orchestrator call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BillingOperationResult {
    pub success: bool,
    pub data: Option<Value>,
    pub message: String,
}

impl BillingOperationResult {
    pub fn succeeded(data: Value, message: impl Into<String>) -> Self {
        Self { success: true, data: Some(data), message: message.into() }
    }

    /// A successful result that carries text only.
    pub fn notice(message: impl Into<String>) -> Self {
        Self { success: true, data: None, message: message.into() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, data: None, message: message.into() }
    }

    pub fn with_data(success: bool, data: Value, message: impl Into<String>) -> Self {
        Self { success, data: Some(data), message: message.into() }
    }

    pub fn from_failure(failure: &OperationFailure) -> Self {
        Self::failed(failure.user_message())
    }
}
