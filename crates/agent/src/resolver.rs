use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use billchat_core::{BillingPeriod, Intent, OperationDescriptor, ResolutionDefaults};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::keywords::KeywordIntentResolver;
use crate::llm::{LlmClient, LlmError};
use crate::prompt::intent_prompt;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("model reply contained no JSON object")]
    NoJsonObject,
}

/// Turns a raw chat message into an operation descriptor.
#[async_trait]
pub trait IntentResolver: Send + Sync {
    async fn resolve(&self, text: &str) -> Result<OperationDescriptor, ResolveError>;
}

/// Primary resolver: asks the language model for a JSON descriptor.
pub struct LlmIntentResolver {
    client: Arc<dyn LlmClient>,
    defaults: ResolutionDefaults,
}

impl LlmIntentResolver {
    pub fn new(client: Arc<dyn LlmClient>, defaults: ResolutionDefaults) -> Self {
        Self { client, defaults }
    }
}

#[async_trait]
impl IntentResolver for LlmIntentResolver {
    async fn resolve(&self, text: &str) -> Result<OperationDescriptor, ResolveError> {
        let today = Local::now().date_naive();
        let prompt = intent_prompt(text, &self.defaults, BillingPeriod::containing(today));
        let reply = self.client.complete(&prompt).await?;
        normalize_reply(&reply, &self.defaults, today)
    }
}

/// Parses the first JSON object found in a model reply and normalizes it into
/// a descriptor.
///
/// Missing or malformed fields fall back to defaults: the configured
/// subscriber, the period containing `today`, and no amount.
pub fn normalize_reply(
    reply: &str,
    defaults: &ResolutionDefaults,
    today: NaiveDate,
) -> Result<OperationDescriptor, ResolveError> {
    let object = first_json_object(reply).ok_or(ResolveError::NoJsonObject)?;

    let intent = object
        .get("intent")
        .and_then(Value::as_str)
        .map(parse_intent)
        .unwrap_or(Intent::Unknown);

    let subscriber = match object.get("subscriberNo") {
        Some(Value::String(value)) => Some(value.clone()),
        Some(Value::Number(value)) => Some(value.to_string()),
        _ => None,
    };
    let subscriber_no = defaults.subscriber_or_default(subscriber.as_deref());

    let period = object
        .get("period")
        .or_else(|| object.get("month"))
        .and_then(Value::as_str)
        .and_then(|value| BillingPeriod::from_str(value).ok())
        .unwrap_or_else(|| BillingPeriod::containing(today));

    let amount = object.get("amount").and_then(coerce_amount);

    Ok(OperationDescriptor::new(intent, subscriber_no, period, amount))
}

fn first_json_object(reply: &str) -> Option<Map<String, Value>> {
    reply.match_indices('{').find_map(|(start, _)| {
        let mut stream = serde_json::Deserializer::from_str(&reply[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(object))) => Some(object),
            _ => None,
        }
    })
}

fn parse_intent(raw: &str) -> Intent {
    let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
    serde_json::from_value(Value::String(normalized)).unwrap_or(Intent::Unknown)
}

/// Numbers pass through; strings contribute their leading numeric run
/// ("200TL" is 200). Anything else is no amount.
fn coerce_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => Decimal::from_str(&number.to_string())
            .ok()
            .or_else(|| number.as_f64().and_then(|float| Decimal::try_from(float).ok())),
        Value::String(text) => leading_number(text),
        _ => None,
    }
}

fn leading_number(text: &str) -> Option<Decimal> {
    let start = text.find(|character: char| character.is_ascii_digit())?;
    let rest = &text[start..];
    let mut end = rest.find(|character: char| !character.is_ascii_digit()).unwrap_or(rest.len());
    if rest[end..].starts_with('.') {
        let fraction = &rest[end + 1..];
        let digits =
            fraction.find(|character: char| !character.is_ascii_digit()).unwrap_or(fraction.len());
        if digits > 0 {
            end += 1 + digits;
        }
    }
    Decimal::from_str(&rest[..end]).ok()
}

/// Tries the primary resolver and falls back to keyword matching on any error.
///
/// [`ResolverChain::resolve`] never fails.
pub struct ResolverChain {
    primary: Arc<dyn IntentResolver>,
    fallback: KeywordIntentResolver,
}

impl ResolverChain {
    pub fn new(primary: Arc<dyn IntentResolver>, fallback: KeywordIntentResolver) -> Self {
        Self { primary, fallback }
    }

    /// A chain that skips the model entirely.
    pub fn keyword_only(defaults: ResolutionDefaults) -> Self {
        let fallback = KeywordIntentResolver::new(defaults);
        Self { primary: Arc::new(fallback.clone()), fallback }
    }

    pub async fn resolve(&self, text: &str) -> OperationDescriptor {
        match self.primary.resolve(text).await {
            Ok(descriptor) => {
                debug!(
                    event_name = "agent.resolve.primary",
                    intent = %descriptor.intent(),
                    period = %descriptor.period(),
                    "intent resolved by language model"
                );
                descriptor
            }
            Err(error) => {
                let descriptor = self.fallback.resolve_now(text);
                warn!(
                    event_name = "agent.resolve.fallback",
                    error = %error,
                    intent = %descriptor.intent(),
                    "language model resolution failed, using keyword fallback"
                );
                descriptor
            }
        }
    }
}

#[async_trait]
impl IntentResolver for ResolverChain {
    async fn resolve(&self, text: &str) -> Result<OperationDescriptor, ResolveError> {
        Ok(ResolverChain::resolve(self, text).await)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use async_trait::async_trait;
    use billchat_core::{BillingPeriod, Intent, ResolutionDefaults};
    use chrono::{Local, NaiveDate};
    use rust_decimal::Decimal;
    use tokio::sync::Mutex;

    use super::{normalize_reply, LlmIntentResolver, ResolveError, ResolverChain};
    use crate::keywords::KeywordIntentResolver;
    use crate::llm::{LlmClient, LlmError};

    #[derive(Default)]
    struct ScriptedLlm {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn with_replies(replies: Vec<Result<String, LlmError>>) -> Self {
            Self { replies: Mutex::new(replies.into()), prompts: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().await.push(prompt.to_owned());
            self.replies
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::Transport("script exhausted".to_owned())))
        }
    }

    fn defaults() -> ResolutionDefaults {
        ResolutionDefaults::new("1234567890")
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).expect("date")
    }

    fn chain(llm: ScriptedLlm) -> ResolverChain {
        let primary = LlmIntentResolver::new(Arc::new(llm), defaults());
        ResolverChain::new(Arc::new(primary), KeywordIntentResolver::new(defaults()))
    }

    #[test]
    fn parses_object_after_prose() {
        let reply = "Sure! Here is the JSON:\n{\"intent\": \"pay_bill\", \"subscriberNo\": \"5551234567\", \"period\": \"2025-01\", \"amount\": 100}\nThanks.";
        let descriptor = normalize_reply(reply, &defaults(), today()).expect("descriptor");

        assert_eq!(descriptor.intent(), Intent::PayBill);
        assert_eq!(descriptor.subscriber_no(), "5551234567");
        assert_eq!(descriptor.period(), BillingPeriod::new(2025, 1).expect("period"));
        assert_eq!(descriptor.amount(), Some(Decimal::from(100)));
    }

    #[test]
    fn month_alias_and_invalid_period_handling() {
        let aliased = normalize_reply(
            r#"{"intent":"query_bill","month":"2024-11","amount":null}"#,
            &defaults(),
            today(),
        )
        .expect("descriptor");
        assert_eq!(aliased.period(), BillingPeriod::new(2024, 11).expect("period"));
        assert_eq!(aliased.subscriber_no(), "1234567890");

        let invalid = normalize_reply(
            r#"{"intent":"query_bill","period":"January","subscriberNo":""}"#,
            &defaults(),
            today(),
        )
        .expect("descriptor");
        assert_eq!(invalid.period(), BillingPeriod::new(2025, 6).expect("period"));
        assert_eq!(invalid.subscriber_no(), "1234567890");
    }

    #[test]
    fn amount_strings_are_coerced_and_non_positive_dropped() {
        let parse = |amount: &str| {
            let reply = format!(r#"{{"intent":"pay_bill","period":"2025-01","amount":{amount}}}"#);
            normalize_reply(&reply, &defaults(), today()).expect("descriptor").amount()
        };

        assert_eq!(parse(r#""200TL""#), Some(Decimal::from(200)));
        assert_eq!(parse(r#""200.50 TL""#), Some(Decimal::new(20050, 2)));
        assert_eq!(parse(r#""full amount""#), None);
        assert_eq!(parse("0"), None);
        assert_eq!(parse("-5"), None);
        assert_eq!(parse("75.5"), Some(Decimal::new(755, 1)));
    }

    #[test]
    fn amount_is_dropped_for_non_payment_intents() {
        let descriptor = normalize_reply(
            r#"{"intent":"query_bill_detailed","period":"2025-01","amount":50}"#,
            &defaults(),
            today(),
        )
        .expect("descriptor");
        assert_eq!(descriptor.amount(), None);
    }

    #[test]
    fn unexpected_intent_names_become_unknown() {
        let descriptor =
            normalize_reply(r#"{"intent":"cancel_line"}"#, &defaults(), today()).expect("descriptor");
        assert_eq!(descriptor.intent(), Intent::Unknown);

        let spaced =
            normalize_reply(r#"{"intent":"Pay Bill"}"#, &defaults(), today()).expect("descriptor");
        assert_eq!(spaced.intent(), Intent::PayBill);
    }

    #[test]
    fn reply_without_object_is_an_error() {
        assert_eq!(
            normalize_reply("I cannot help with that.", &defaults(), today()),
            Err(ResolveError::NoJsonObject)
        );
        assert_eq!(
            normalize_reply("{not json at all", &defaults(), today()),
            Err(ResolveError::NoJsonObject)
        );
    }

    #[tokio::test]
    async fn chain_uses_model_reply_when_valid() {
        let llm = ScriptedLlm::with_replies(vec![Ok(
            r#"{"intent":"query_bill_detailed","subscriberNo":null,"period":"2025-02","amount":null}"#
                .to_owned(),
        )]);
        let descriptor = chain(llm).resolve("fatura detayı şubat").await;

        assert_eq!(descriptor.intent(), Intent::QueryBillDetailed);
        assert_eq!(descriptor.period(), BillingPeriod::new(2025, 2).expect("period"));
    }

    #[tokio::test]
    async fn chain_falls_back_when_model_is_unreachable() {
        let llm = ScriptedLlm::with_replies(vec![Err(LlmError::Transport("refused".to_owned()))]);
        let descriptor = chain(llm).resolve("pay 100TL for 2025-01").await;

        assert_eq!(descriptor.intent(), Intent::PayBill);
        assert_eq!(descriptor.amount(), Some(Decimal::from(100)));
        assert_eq!(descriptor.period(), BillingPeriod::new(2025, 1).expect("period"));
    }

    #[tokio::test]
    async fn chain_falls_back_on_malformed_reply() {
        let llm = ScriptedLlm::with_replies(vec![Ok("merhaba! nasıl yardımcı olabilirim?".to_owned())]);
        let descriptor = chain(llm).resolve("merhaba").await;

        assert_eq!(descriptor.intent(), Intent::Greeting);
        assert_eq!(descriptor.subscriber_no(), "1234567890");
        assert_eq!(descriptor.period(), BillingPeriod::containing(Local::now().date_naive()));
    }

    #[tokio::test]
    async fn prompt_carries_the_user_message() {
        let llm = Arc::new(ScriptedLlm::with_replies(vec![Ok(r#"{"intent":"greeting"}"#.to_owned())]));
        let resolver = LlmIntentResolver::new(llm.clone(), defaults());

        let descriptor = super::IntentResolver::resolve(&resolver, "selam").await.expect("descriptor");

        assert_eq!(descriptor.intent(), Intent::Greeting);
        let prompts = llm.prompts.lock().await;
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("User message: \"selam\""));
    }
}
