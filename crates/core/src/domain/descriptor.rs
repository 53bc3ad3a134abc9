use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::intent::Intent;
use crate::domain::period::BillingPeriod;

/// Normalized result of intent resolution, consumed once by the billing orchestrator.
///
/// Construction enforces the descriptor invariants: the amount survives only for
/// [`Intent::PayBill`] and only when strictly positive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDescriptor {
    intent: Intent,
    subscriber_no: String,
    period: BillingPeriod,
    #[serde(with = "rust_decimal::serde::float_option")]
    amount: Option<Decimal>,
}

impl OperationDescriptor {
    pub fn new(
        intent: Intent,
        subscriber_no: impl Into<String>,
        period: BillingPeriod,
        amount: Option<Decimal>,
    ) -> Self {
        let amount =
            amount.filter(|value| intent == Intent::PayBill && *value > Decimal::ZERO);
        Self { intent, subscriber_no: subscriber_no.into(), period, amount }
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }

    pub fn subscriber_no(&self) -> &str {
        &self.subscriber_no
    }

    pub fn period(&self) -> BillingPeriod {
        self.period
    }

    pub fn amount(&self) -> Option<Decimal> {
        self.amount
    }
}

/// Values substituted for fields the user did not mention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolutionDefaults {
    pub default_subscriber_no: String,
}

impl ResolutionDefaults {
    pub fn new(default_subscriber_no: impl Into<String>) -> Self {
        Self { default_subscriber_no: default_subscriber_no.into() }
    }

    pub fn subscriber_or_default(&self, candidate: Option<&str>) -> String {
        candidate
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(&self.default_subscriber_no)
            .to_string()
    }
}
