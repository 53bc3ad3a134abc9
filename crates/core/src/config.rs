use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub billing: BillingConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub top_p: f32,
}

#[derive(Clone, Debug)]
pub struct BillingConfig {
    pub base_url: String,
    pub username: String,
    pub password: SecretString,
    pub default_subscriber_no: String,
    pub timeout_secs: u64,
    pub detail_page_size: u32,
    pub payment_cache_ttl_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub allowed_origin: String,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub billing_base_url: Option<String>,
    pub billing_username: Option<String>,
    pub billing_password: Option<String>,
    pub default_subscriber_no: Option<String>,
    pub server_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["billchat.toml", "config/billchat.toml"];

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                base_url: "http://localhost:11434".to_string(),
                model: "llama3:latest".to_string(),
                timeout_secs: 30,
                temperature: 0.3,
                top_p: 0.9,
            },
            billing: BillingConfig {
                base_url: "http://localhost:5196/api".to_string(),
                username: "mobileapp".to_string(),
                password: secret_value("mobile123".to_string()),
                default_subscriber_no: "1234567890".to_string(),
                timeout_secs: 30,
                detail_page_size: 10,
                payment_cache_ttl_secs: 300,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 3001,
                allowed_origin: "http://localhost:3000".to_string(),
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }
            if let Some(top_p) = llm.top_p {
                self.llm.top_p = top_p;
            }
        }

        if let Some(billing) = patch.billing {
            if let Some(base_url) = billing.base_url {
                self.billing.base_url = base_url;
            }
            if let Some(username) = billing.username {
                self.billing.username = username;
            }
            if let Some(billing_password_value) = billing.password {
                self.billing.password = secret_value(billing_password_value);
            }
            if let Some(default_subscriber_no) = billing.default_subscriber_no {
                self.billing.default_subscriber_no = default_subscriber_no;
            }
            if let Some(timeout_secs) = billing.timeout_secs {
                self.billing.timeout_secs = timeout_secs;
            }
            if let Some(detail_page_size) = billing.detail_page_size {
                self.billing.detail_page_size = detail_page_size;
            }
            if let Some(payment_cache_ttl_secs) = billing.payment_cache_ttl_secs {
                self.billing.payment_cache_ttl_secs = payment_cache_ttl_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(allowed_origin) = server.allowed_origin {
                self.server.allowed_origin = allowed_origin;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("BILLCHAT_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("BILLCHAT_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("BILLCHAT_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("BILLCHAT_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("BILLCHAT_LLM_TEMPERATURE") {
            self.llm.temperature = parse_f32("BILLCHAT_LLM_TEMPERATURE", &value)?;
        }
        if let Some(value) = read_env("BILLCHAT_LLM_TOP_P") {
            self.llm.top_p = parse_f32("BILLCHAT_LLM_TOP_P", &value)?;
        }

        if let Some(value) = read_env("BILLCHAT_BILLING_BASE_URL") {
            self.billing.base_url = value;
        }
        if let Some(value) = read_env("BILLCHAT_BILLING_USERNAME") {
            self.billing.username = value;
        }
        if let Some(value) = read_env("BILLCHAT_BILLING_PASSWORD") {
            self.billing.password = secret_value(value);
        }
        if let Some(value) = read_env("BILLCHAT_BILLING_DEFAULT_SUBSCRIBER_NO") {
            self.billing.default_subscriber_no = value;
        }
        if let Some(value) = read_env("BILLCHAT_BILLING_TIMEOUT_SECS") {
            self.billing.timeout_secs = parse_u64("BILLCHAT_BILLING_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("BILLCHAT_BILLING_DETAIL_PAGE_SIZE") {
            self.billing.detail_page_size =
                parse_u32("BILLCHAT_BILLING_DETAIL_PAGE_SIZE", &value)?;
        }
        if let Some(value) = read_env("BILLCHAT_BILLING_PAYMENT_CACHE_TTL_SECS") {
            self.billing.payment_cache_ttl_secs =
                parse_u64("BILLCHAT_BILLING_PAYMENT_CACHE_TTL_SECS", &value)?;
        }

        if let Some(value) = read_env("BILLCHAT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("BILLCHAT_SERVER_PORT") {
            self.server.port = parse_u16("BILLCHAT_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("BILLCHAT_SERVER_ALLOWED_ORIGIN") {
            self.server.allowed_origin = value;
        }
        if let Some(value) = read_env("BILLCHAT_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("BILLCHAT_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("BILLCHAT_LOGGING_LEVEL").or_else(|| read_env("BILLCHAT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("BILLCHAT_LOGGING_FORMAT").or_else(|| read_env("BILLCHAT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_base_url) = overrides.llm_base_url {
            self.llm.base_url = llm_base_url;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(billing_base_url) = overrides.billing_base_url {
            self.billing.base_url = billing_base_url;
        }
        if let Some(billing_username) = overrides.billing_username {
            self.billing.username = billing_username;
        }
        if let Some(billing_password) = overrides.billing_password {
            self.billing.password = secret_value(billing_password);
        }
        if let Some(default_subscriber_no) = overrides.default_subscriber_no {
            self.billing.default_subscriber_no = default_subscriber_no;
        }
        if let Some(server_port) = overrides.server_port {
            self.server.port = server_port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_billing(&self.billing)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let value = value.trim();
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }
    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    validate_http_url("llm.base_url", &llm.base_url)?;

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "llm.model is required (for example `llama3:latest`)".to_string(),
        ));
    }

    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::Validation(
            "llm.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    if !(llm.top_p > 0.0 && llm.top_p <= 1.0) {
        return Err(ConfigError::Validation("llm.top_p must be in range (0.0, 1.0]".to_string()));
    }

    Ok(())
}

fn validate_billing(billing: &BillingConfig) -> Result<(), ConfigError> {
    validate_http_url("billing.base_url", &billing.base_url)?;

    if billing.username.trim().is_empty() {
        return Err(ConfigError::Validation("billing.username is required".to_string()));
    }
    if billing.password.expose_secret().is_empty() {
        return Err(ConfigError::Validation(
            "billing.password is required (set BILLCHAT_BILLING_PASSWORD)".to_string(),
        ));
    }

    let subscriber = billing.default_subscriber_no.trim();
    if subscriber.is_empty() || !subscriber.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ConfigError::Validation(
            "billing.default_subscriber_no must be a non-empty string of digits".to_string(),
        ));
    }

    if billing.timeout_secs == 0 || billing.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "billing.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if billing.detail_page_size == 0 || billing.detail_page_size > 100 {
        return Err(ConfigError::Validation(
            "billing.detail_page_size must be in range 1..=100".to_string(),
        ));
    }

    if billing.payment_cache_ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "billing.payment_cache_ttl_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.allowed_origin.trim().is_empty() {
        return Err(ConfigError::Validation(
            "server.allowed_origin is required (use `*` to allow any origin)".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| invalid_override(key, value))
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| invalid_override(key, value))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    billing: Option<BillingPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    temperature: Option<f32>,
    top_p: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct BillingPatch {
    base_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    default_subscriber_no: Option<String>,
    timeout_secs: Option<u64>,
    detail_page_size: Option<u32>,
    payment_cache_ttl_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    allowed_origin: Option<String>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid_without_any_sources() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.llm.model == "llama3:latest", "default model should be llama3")?;
        ensure(
            config.billing.default_subscriber_no == "1234567890",
            "default subscriber should be set",
        )?;
        ensure(config.billing.payment_cache_ttl_secs == 300, "cache window defaults to 5 minutes")?;
        ensure(config.server.port == 3001, "default port should be 3001")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_BILLING_PASSWORD", "from-env-secret");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("billchat.toml");
            fs::write(
                &path,
                r#"
[billing]
username = "gateway"
password = "${TEST_BILLING_PASSWORD}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.billing.username == "gateway", "username should come from file")?;
            ensure(
                config.billing.password.expose_secret() == "from-env-secret",
                "password should be interpolated from environment",
            )
        })();

        clear_vars(&["TEST_BILLING_PASSWORD"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("BILLCHAT_LLM_MODEL", "mistral:env");
        env::set_var("BILLCHAT_BILLING_DEFAULT_SUBSCRIBER_NO", "5550001111");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("billchat.toml");
            fs::write(
                &path,
                r#"
[llm]
model = "llama3:file"
base_url = "http://ollama.internal:11434"

[billing]
default_subscriber_no = "9990001111"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.llm.model == "mistral:env", "env model should win over file")?;
            ensure(
                config.llm.base_url == "http://ollama.internal:11434",
                "file base url should win over default",
            )?;
            ensure(
                config.billing.default_subscriber_no == "5550001111",
                "env subscriber should win over file",
            )?;
            ensure(config.logging.level == "debug", "override log level should win")
        })();

        clear_vars(&["BILLCHAT_LLM_MODEL", "BILLCHAT_BILLING_DEFAULT_SUBSCRIBER_NO"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("BILLCHAT_LOG_LEVEL", "warn");
        env::set_var("BILLCHAT_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "log level should be set from alias")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json format should be set from alias",
            )
        })();

        clear_vars(&["BILLCHAT_LOG_LEVEL", "BILLCHAT_LOG_FORMAT"]);
        result
    }

    #[test]
    fn invalid_numeric_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("BILLCHAT_SERVER_PORT", "not-a-port");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected invalid override error".to_string()),
            Err(ConfigError::InvalidEnvOverride { key, .. }) => {
                ensure(key == "BILLCHAT_SERVER_PORT", "error should name the offending key")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
        };

        clear_vars(&["BILLCHAT_SERVER_PORT"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let error = match AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                default_subscriber_no: Some("abc".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }) {
            Ok(_) => return Err("expected validation failure but config load succeeded".to_string()),
            Err(error) => error,
        };

        let has_message = matches!(
            error,
            ConfigError::Validation(ref message) if message.contains("billing.default_subscriber_no")
        );
        ensure(has_message, "validation failure should mention billing.default_subscriber_no")
    }

    #[test]
    fn billing_base_url_must_be_http() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                billing_base_url: Some("localhost:5196/api".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        let has_message = matches!(
            result,
            Err(ConfigError::Validation(ref message)) if message.contains("billing.base_url")
        );
        ensure(has_message, "validation failure should mention billing.base_url")
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("BILLCHAT_BILLING_PASSWORD", "super-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("super-secret-value"), "debug output should not contain password")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )
        })();

        clear_vars(&["BILLCHAT_BILLING_PASSWORD"]);
        result
    }
}
