use billchat_core::BillingPeriod;
use rust_decimal::Decimal;

use crate::cache::CachedPayment;
use crate::payloads::{BillSummary, DetailedBill, PaymentReceipt};

pub const HELP_MESSAGE: &str = "Hello! I can help you with:\n- Querying your bills\n- Getting detailed bill information\n- Paying bills\n\nWhat would you like to do?";

pub const UNKNOWN_MESSAGE: &str = "I didn't understand. Please ask about bill operations.";

pub fn line_items(period: BillingPeriod, bill: &DetailedBill) -> String {
    let details = bill
        .bill_details
        .iter()
        .map(|line| {
            format!("{}: {} TL ({})", line.description, plain(line.amount), line.category)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("Detailed bill for {period} (Total: {} TL):\n{details}", plain(bill.bill_total))
}

pub fn detailed_not_found(period: BillingPeriod) -> String {
    format!("Detailed bill not found for {period}.")
}

pub fn summary_not_found(period: BillingPeriod) -> String {
    format!("Bill not found for {period}. Please try a different month or ensure the bill exists.")
}

/// Status text for a bill, letting a fresh cached payment override the
/// backend's paid flag.
pub fn status_summary(
    period: BillingPeriod,
    summary: &BillSummary,
    recent: Option<&CachedPayment>,
) -> String {
    let mut message = format!(
        "Bill information for {period}:\nTotal Amount: {} TL\n",
        plain(summary.bill_total)
    );

    match recent {
        Some(payment) if payment.remaining_amount <= Decimal::ZERO => {
            message.push_str("Status: Paid ✓");
        }
        Some(payment) => {
            message.push_str("Status: Unpaid");
            message.push_str(&format!(
                "\nRemaining Balance: {} TL\nPaid Amount: {} TL",
                money(payment.remaining_amount),
                money(payment.paid_amount)
            ));
        }
        None if summary.paid_status => message.push_str("Status: Paid ✓"),
        None => message.push_str("Status: Unpaid"),
    }

    message
}

pub fn payment_outcome(receipt: &PaymentReceipt) -> String {
    if receipt.is_successful() {
        "Payment successful!".to_string()
    } else {
        let reason = receipt
            .error_message
            .as_deref()
            .filter(|reason| !reason.trim().is_empty())
            .unwrap_or("Unknown error");
        format!("Payment failed: {reason}")
    }
}

fn plain(value: Decimal) -> String {
    value.normalize().to_string()
}

fn money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

#[cfg(test)]
mod tests {
    use billchat_core::BillingPeriod;
    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::cache::CachedPayment;
    use crate::payloads::{BillLine, BillSummary, DetailedBill, PaymentReceipt};

    use super::{line_items, payment_outcome, status_summary};

    fn period() -> BillingPeriod {
        BillingPeriod::new(2025, 1).expect("period")
    }

    fn cached(paid: i64, remaining: i64) -> CachedPayment {
        CachedPayment {
            subscriber_no: "1234567890".to_string(),
            period: period(),
            paid_amount: Decimal::from(paid),
            remaining_amount: Decimal::from(remaining),
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn line_items_list_every_detail() {
        let bill = DetailedBill {
            bill_total: Decimal::new(1505, 1),
            bill_details: vec![
                BillLine {
                    description: "Internet".to_string(),
                    amount: Decimal::from(100),
                    category: "Data".to_string(),
                },
                BillLine {
                    description: "Calls".to_string(),
                    amount: Decimal::new(505, 1),
                    category: "Voice".to_string(),
                },
            ],
        };

        assert_eq!(
            line_items(period(), &bill),
            "Detailed bill for 2025-01 (Total: 150.5 TL):\nInternet: 100 TL (Data)\nCalls: 50.5 TL (Voice)"
        );
    }

    #[test]
    fn status_reports_backend_flag_without_recent_payment() {
        let paid = BillSummary { bill_total: Decimal::from(150), paid_status: true };
        assert_eq!(
            status_summary(period(), &paid, None),
            "Bill information for 2025-01:\nTotal Amount: 150 TL\nStatus: Paid ✓"
        );
    }

    #[test]
    fn status_prefers_recent_partial_payment() {
        let summary = BillSummary { bill_total: Decimal::from(150), paid_status: true };
        let text = status_summary(period(), &summary, Some(&cached(100, 50)));
        assert!(text.ends_with("Status: Unpaid\nRemaining Balance: 50.00 TL\nPaid Amount: 100.00 TL"));

        let settled = status_summary(period(), &summary, Some(&cached(150, 0)));
        assert!(settled.ends_with("Status: Paid ✓"));
    }

    #[test]
    fn payment_failure_falls_back_to_unknown_error() {
        let receipt = PaymentReceipt {
            payment_status: Some("Failed".to_string()),
            ..PaymentReceipt::default()
        };
        assert_eq!(payment_outcome(&receipt), "Payment failed: Unknown error");
    }
}
