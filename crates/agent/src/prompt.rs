use billchat_core::{BillingPeriod, ResolutionDefaults};

/// Builds the single-shot instruction prompt for intent extraction.
///
/// The model is asked for one JSON object carrying exactly the four descriptor
/// fields; anything it prepends is tolerated by the reply parser.
pub fn intent_prompt(message: &str, defaults: &ResolutionDefaults, today: BillingPeriod) -> String {
    let subscriber = &defaults.default_subscriber_no;
    let year = today.year();

    format!(
        r#"You are an AI assistant that helps users with billing operations.
Analyze the user's message and determine their intent. The user may write in Turkish or English. Respond ONLY with a JSON object in this exact format:
{{
  "intent": "query_bill" | "query_bill_detailed" | "pay_bill" | "greeting" | "unknown",
  "subscriberNo": "subscriber number if mentioned, otherwise {subscriber}",
  "period": "month in format YYYY-MM if mentioned, otherwise {today}",
  "amount": number if a payment amount is mentioned, otherwise null
}}

Available intents:
- "query_bill": the user wants to check a bill (e.g. "check my bill", "faturamı sorgula", "show me my bill for January", "Ocak faturamı sorgula", "Ocak borcum ne?")
- "query_bill_detailed": the user wants the bill status or a breakdown (e.g. "detailed bill", "bill breakdown", "detaylı fatura", "fatura detayı", "tüm borçlarımı göster")
- "pay_bill": the user wants to pay (e.g. "pay my bill", "I want to pay", "faturamı öde", "ödeme yap", "200TL öde")
- "greeting": greetings (e.g. "hello", "hi", "hey", "merhaba", "selam")
- "unknown": the intent cannot be determined

Month translations (Turkish to English):
- Ocak = January (01), Şubat = February (02), Mart = March (03), Nisan = April (04)
- Mayıs = May (05), Haziran = June (06), Temmuz = July (07), Ağustos = August (08)
- Eylül = September (09), Ekim = October (10), Kasım = November (11), Aralık = December (12)

Rules for "period":
- Always use YYYY-MM (e.g. 2025-01 for January 2025).
- If a year is mentioned, use it. If only a month is mentioned, use the year {year}.
- If no month is mentioned, use {today}.

Rules for "amount" (pay_bill only):
- Extract the numeric value and strip currency suffixes ("200TL" -> 200, "200 TL" -> 200, "200.50" -> 200.50, "150 lira" -> 150, "₺75" -> 75).
- Return a JSON number, not a string.
- If no amount is mentioned, return null so the full balance is paid.
- When both an amount and a month are given ("pay 100TL for 2025-01"), extract both: amount 100, period 2025-01.

User message: "{message}"

Respond with ONLY the JSON object, no additional text:"#,
        message = message.replace('"', "'"),
    )
}
