use std::str::FromStr;
use std::sync::OnceLock;

use async_trait::async_trait;
use billchat_core::{BillingPeriod, Intent, OperationDescriptor, ResolutionDefaults};
use chrono::{Datelike, Local, NaiveDate};
use regex::{Captures, Regex};
use rust_decimal::Decimal;

use crate::resolver::{IntentResolver, ResolveError};

// Whole-word only: "hi" and "hey" hide inside too many ordinary words.
const SHORT_GREETINGS: [&str; 2] = ["hi", "hey"];
const GREETING_KEYWORDS: [&str; 4] = ["hello", "greeting", "merhaba", "selam"];
const DETAILED_KEYWORDS: [&str; 5] = ["detailed", "breakdown", "detail", "detaylı", "detay"];
const PAY_KEYWORDS: [&str; 4] = ["pay", "payment", "öde", "ödeme"];
const QUERY_KEYWORDS: [&str; 8] =
    ["bill", "invoice", "check", "fatura", "sorgula", "sorgulama", "borç", "borc"];

/// First match wins, English names before Turkish.
const MONTH_NAMES: [(&str, u32); 24] = [
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
    ("ocak", 1),
    ("şubat", 2),
    ("mart", 3),
    ("nisan", 4),
    ("mayıs", 5),
    ("haziran", 6),
    ("temmuz", 7),
    ("ağustos", 8),
    ("eylül", 9),
    ("ekim", 10),
    ("kasım", 11),
    ("aralık", 12),
];

/// Deterministic bilingual matcher used when the language model cannot be used.
#[derive(Clone, Debug)]
pub struct KeywordIntentResolver {
    defaults: ResolutionDefaults,
}

impl KeywordIntentResolver {
    pub fn new(defaults: ResolutionDefaults) -> Self {
        Self { defaults }
    }

    pub fn resolve_now(&self, text: &str) -> OperationDescriptor {
        self.resolve_on(text, Local::now().date_naive())
    }

    pub fn resolve_on(&self, text: &str, today: NaiveDate) -> OperationDescriptor {
        let normalized = normalize_text(text);
        let intent = classify(&normalized);
        let period = extract_period(&normalized, today);
        let subscriber = subscriber_regex().find(&normalized).map(|found| found.as_str());
        let subscriber_no = self.defaults.subscriber_or_default(subscriber);
        let amount = if intent == Intent::PayBill { extract_amount(&normalized) } else { None };

        OperationDescriptor::new(intent, subscriber_no, period, amount)
    }
}

#[async_trait]
impl IntentResolver for KeywordIntentResolver {
    async fn resolve(&self, text: &str) -> Result<OperationDescriptor, ResolveError> {
        Ok(self.resolve_now(text))
    }
}

fn normalize_text(text: &str) -> String {
    text.to_lowercase()
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|character: char| !character.is_alphanumeric()).filter(|word| !word.is_empty())
}

fn classify(normalized: &str) -> Intent {
    let contains_any = |keywords: &[&str]| keywords.iter().any(|keyword| normalized.contains(keyword));

    if words(normalized).any(|word| SHORT_GREETINGS.contains(&word))
        || contains_any(&GREETING_KEYWORDS)
    {
        Intent::Greeting
    } else if contains_any(&DETAILED_KEYWORDS) {
        Intent::QueryBillDetailed
    } else if contains_any(&PAY_KEYWORDS) {
        Intent::PayBill
    } else if contains_any(&QUERY_KEYWORDS) {
        Intent::QueryBill
    } else {
        Intent::Unknown
    }
}

fn extract_period(normalized: &str, today: NaiveDate) -> BillingPeriod {
    let explicit = explicit_period_regex().captures(normalized).and_then(|captures| {
        let year = captures[1].parse().ok()?;
        let month = captures[2].parse().ok()?;
        BillingPeriod::new(year, month).ok()
    });
    if let Some(period) = explicit {
        return period;
    }

    let year = year_regex()
        .captures(normalized)
        .and_then(|captures| captures[1].parse().ok())
        .unwrap_or_else(|| today.year());

    MONTH_NAMES
        .iter()
        .find(|(name, _)| normalized.contains(name))
        .and_then(|(_, month)| BillingPeriod::new(year, *month).ok())
        .unwrap_or_else(|| BillingPeriod::containing(today))
}

fn extract_amount(normalized: &str) -> Option<Decimal> {
    // Period and subscriber digits must not be read as an amount.
    let scrubbed = explicit_period_regex().replace_all(normalized, " ");
    let scrubbed = subscriber_regex().replace_all(&scrubbed, " ");
    let scrubbed = bare_year_regex().replace_all(&scrubbed, |captures: &Captures| {
        if captures.get(1).is_some() {
            captures[0].to_string()
        } else {
            " ".to_string()
        }
    });

    let before_separator = separator_regex().split(&scrubbed).next().unwrap_or_default();
    amount_regex()
        .captures(before_separator)
        .or_else(|| currency_amount_regex().captures(&scrubbed))
        .and_then(|captures| Decimal::from_str(&captures[1]).ok())
        .filter(|amount| *amount > Decimal::ZERO)
}

fn explicit_period_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| compile(r"\b(20[0-9]{2})-(0[1-9]|1[0-2])\b"))
}

fn year_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| compile(r"\b(20[0-9]{2})\b"))
}

/// A year token; group 1 is set when a currency suffix makes it an amount.
fn bare_year_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| compile(r"\b20[0-9]{2}\b(\s*(?:tl|lira|₺))?"))
}

fn subscriber_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| compile(r"[0-9]{10,}"))
}

fn separator_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| compile(r"\s+for\s+"))
}

fn amount_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| compile(r"([0-9]+(?:\.[0-9]+)?)\s*(?:tl|lira|₺)?"))
}

fn currency_amount_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| compile(r"([0-9]+(?:\.[0-9]+)?)\s*(?:tl|lira|₺)"))
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static keyword pattern compiles")
}

#[cfg(test)]
mod tests {
    use billchat_core::{BillingPeriod, Intent, ResolutionDefaults};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::KeywordIntentResolver;

    fn resolver() -> KeywordIntentResolver {
        KeywordIntentResolver::new(ResolutionDefaults::new("1234567890"))
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).expect("date")
    }

    fn period(year: i32, month: u32) -> BillingPeriod {
        BillingPeriod::new(year, month).expect("period")
    }

    #[test]
    fn greetings_in_both_languages() {
        for text in ["merhaba", "Hello there", "hi!", "Selam, nasılsın?"] {
            assert_eq!(resolver().resolve_on(text, today()).intent(), Intent::Greeting, "{text}");
        }
    }

    #[test]
    fn short_greetings_do_not_match_inside_words() {
        let descriptor = resolver().resolve_on("which bill is this", today());
        assert_eq!(descriptor.intent(), Intent::QueryBill);
    }

    #[test]
    fn turkish_debt_question_queries_january_of_current_year() {
        let descriptor = resolver().resolve_on("Ocak borcum ne?", today());
        assert_eq!(descriptor.intent(), Intent::QueryBill);
        assert_eq!(descriptor.period(), period(2025, 1));
        assert_eq!(descriptor.subscriber_no(), "1234567890");
        assert_eq!(descriptor.amount(), None);
    }

    #[test]
    fn payment_with_amount_and_explicit_period() {
        let descriptor = resolver().resolve_on("pay 100TL for 2025-01", today());
        assert_eq!(descriptor.intent(), Intent::PayBill);
        assert_eq!(descriptor.amount(), Some(Decimal::from(100)));
        assert_eq!(descriptor.period(), period(2025, 1));
    }

    #[test]
    fn turkish_payment_uses_current_period() {
        let descriptor = resolver().resolve_on("200TL öde", today());
        assert_eq!(descriptor.intent(), Intent::PayBill);
        assert_eq!(descriptor.amount(), Some(Decimal::from(200)));
        assert_eq!(descriptor.period(), period(2025, 6));
    }

    #[test]
    fn payment_without_amount_pays_in_full() {
        let descriptor = resolver().resolve_on("faturamı öde", today());
        assert_eq!(descriptor.intent(), Intent::PayBill);
        assert_eq!(descriptor.amount(), None);
    }

    #[test]
    fn amount_after_separator_requires_currency() {
        let descriptor = resolver().resolve_on("payment for march 2024 of 75.50 lira", today());
        assert_eq!(descriptor.intent(), Intent::PayBill);
        assert_eq!(descriptor.period(), period(2024, 3));
        assert_eq!(descriptor.amount(), Some(Decimal::new(7550, 2)));
    }

    #[test]
    fn year_next_to_month_is_never_an_amount() {
        let quick_action = resolver().resolve_on("Pay my bill January 2025 for 200TL", today());
        assert_eq!(quick_action.intent(), Intent::PayBill);
        assert_eq!(quick_action.period(), period(2025, 1));
        assert_eq!(quick_action.amount(), Some(Decimal::from(200)));

        let english = resolver().resolve_on("pay my march 2024 bill", today());
        assert_eq!(english.period(), period(2024, 3));
        assert_eq!(english.amount(), None);

        let turkish = resolver().resolve_on("mart 2024 faturamı öde", today());
        assert_eq!(turkish.intent(), Intent::PayBill);
        assert_eq!(turkish.period(), period(2024, 3));
        assert_eq!(turkish.amount(), None);
    }

    #[test]
    fn year_shaped_amount_with_currency_is_kept() {
        let descriptor = resolver().resolve_on("pay 2000 tl", today());
        assert_eq!(descriptor.amount(), Some(Decimal::from(2000)));
    }

    #[test]
    fn detailed_keywords_win_over_pay_and_query() {
        let descriptor = resolver().resolve_on("detaylı fatura şubat 2024", today());
        assert_eq!(descriptor.intent(), Intent::QueryBillDetailed);
        assert_eq!(descriptor.period(), period(2024, 2));
    }

    #[test]
    fn subscriber_number_is_taken_from_long_digit_run() {
        let descriptor = resolver().resolve_on("check bill for 5551234567 in april", today());
        assert_eq!(descriptor.subscriber_no(), "5551234567");
        assert_eq!(descriptor.period(), period(2025, 4));
    }

    #[test]
    fn subscriber_digits_are_not_read_as_amount() {
        let descriptor = resolver().resolve_on("pay 5551234567 50 tl", today());
        assert_eq!(descriptor.subscriber_no(), "5551234567");
        assert_eq!(descriptor.amount(), Some(Decimal::from(50)));
    }

    #[test]
    fn unrelated_text_is_unknown_with_defaults() {
        let descriptor = resolver().resolve_on("what's the weather like", today());
        assert_eq!(descriptor.intent(), Intent::Unknown);
        assert_eq!(descriptor.period(), period(2025, 6));
        assert!(!descriptor.subscriber_no().is_empty());
    }

    #[test]
    fn resolution_is_idempotent() {
        let resolver = resolver();
        for text in ["pay 100TL for 2025-01", "Ocak borcum ne?", "merhaba", "", "🙂🙂"] {
            assert_eq!(resolver.resolve_on(text, today()), resolver.resolve_on(text, today()));
        }
    }
}
