//! Typed views over the backend's success payloads.
//!
//! The orchestrator still hands the raw JSON back to the chat client; these
//! structs only pull out the fields the reply text is built from.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

pub const SUCCESSFUL_PAYMENT_STATUS: &str = "Successful";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetailedBill {
    pub bill_total: Decimal,
    pub bill_details: Vec<BillLine>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BillLine {
    pub description: String,
    pub amount: Decimal,
    #[serde(default)]
    pub category: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BillSummary {
    pub bill_total: Decimal,
    #[serde(default)]
    pub paid_status: bool,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub paid_amount: Option<Decimal>,
    #[serde(default)]
    pub remaining_amount: Option<Decimal>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl PaymentReceipt {
    pub fn is_successful(&self) -> bool {
        self.payment_status.as_deref() == Some(SUCCESSFUL_PAYMENT_STATUS)
    }
}

/// A detailed payload without a `billDetails` array means there is no bill.
pub fn has_line_items(payload: &Value) -> bool {
    payload.get("billDetails").is_some_and(|details| !details.is_null())
}
