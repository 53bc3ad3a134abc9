use std::env;
use std::fs;
use std::path::Path;

use billchat_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, env_key, value) in effective_values(&config) {
        let source =
            field_source(key, env_key, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key, &value, source));
    }

    lines.join("\n")
}

fn effective_values(config: &AppConfig) -> Vec<Entry> {
    vec![
        entry("llm.base_url", &["BILLCHAT_LLM_BASE_URL"], config.llm.base_url.clone()),
        entry("llm.model", &["BILLCHAT_LLM_MODEL"], config.llm.model.clone()),
        entry("llm.timeout_secs", &["BILLCHAT_LLM_TIMEOUT_SECS"], config.llm.timeout_secs.to_string()),
        entry("llm.temperature", &["BILLCHAT_LLM_TEMPERATURE"], config.llm.temperature.to_string()),
        entry("llm.top_p", &["BILLCHAT_LLM_TOP_P"], config.llm.top_p.to_string()),
        entry("billing.base_url", &["BILLCHAT_BILLING_BASE_URL"], config.billing.base_url.clone()),
        entry("billing.username", &["BILLCHAT_BILLING_USERNAME"], config.billing.username.clone()),
        entry(
            "billing.password",
            &["BILLCHAT_BILLING_PASSWORD"],
            redact_secret(config.billing.password.expose_secret()),
        ),
        entry(
            "billing.default_subscriber_no",
            &["BILLCHAT_BILLING_DEFAULT_SUBSCRIBER_NO"],
            config.billing.default_subscriber_no.clone(),
        ),
        entry(
            "billing.timeout_secs",
            &["BILLCHAT_BILLING_TIMEOUT_SECS"],
            config.billing.timeout_secs.to_string(),
        ),
        entry(
            "billing.detail_page_size",
            &["BILLCHAT_BILLING_DETAIL_PAGE_SIZE"],
            config.billing.detail_page_size.to_string(),
        ),
        entry(
            "billing.payment_cache_ttl_secs",
            &["BILLCHAT_BILLING_PAYMENT_CACHE_TTL_SECS"],
            config.billing.payment_cache_ttl_secs.to_string(),
        ),
        entry(
            "server.bind_address",
            &["BILLCHAT_SERVER_BIND_ADDRESS"],
            config.server.bind_address.clone(),
        ),
        entry("server.port", &["BILLCHAT_SERVER_PORT"], config.server.port.to_string()),
        entry(
            "server.allowed_origin",
            &["BILLCHAT_SERVER_ALLOWED_ORIGIN"],
            config.server.allowed_origin.clone(),
        ),
        entry(
            "server.graceful_shutdown_secs",
            &["BILLCHAT_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            config.server.graceful_shutdown_secs.to_string(),
        ),
        entry(
            "logging.level",
            &["BILLCHAT_LOGGING_LEVEL", "BILLCHAT_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        entry(
            "logging.format",
            &["BILLCHAT_LOGGING_FORMAT", "BILLCHAT_LOG_FORMAT"],
            format!("{:?}", config.logging.format),
        ),
    ]
}

type Entry = (&'static str, &'static [&'static str], String);

fn entry(key: &'static str, env_keys: &'static [&'static str], value: String) -> Entry {
    (key, env_keys, value)
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: &str) -> String {
    if secret.trim().is_empty() {
        "<empty>".to_string()
    } else {
        "<redacted>".to_string()
    }
}
