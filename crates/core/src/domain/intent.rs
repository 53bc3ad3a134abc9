use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of purposes a chat message can be classified into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    QueryBill,
    QueryBillDetailed,
    PayBill,
    Greeting,
    #[serde(other)]
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QueryBill => "query_bill",
            Self::QueryBillDetailed => "query_bill_detailed",
            Self::PayBill => "pay_bill",
            Self::Greeting => "greeting",
            Self::Unknown => "unknown",
        }
    }

    /// Whether handling this intent requires a billing backend call.
    pub fn reaches_backend(&self) -> bool {
        matches!(self, Self::QueryBill | Self::QueryBillDetailed | Self::PayBill)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
