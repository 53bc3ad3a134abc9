use std::sync::Arc;

use billchat_agent::{KeywordIntentResolver, LlmIntentResolver, OllamaClient, ResolverChain};
use billchat_core::config::{AppConfig, LoadOptions};
use billchat_core::{OperationDescriptor, ResolutionDefaults};
use serde_json::json;

use crate::commands::{current_thread_runtime, CommandResult};

const COMMAND: &str = "resolve";

/// Resolves `text` offline by keywords, or through the language model chain
/// when `use_llm` is set.
pub fn run(text: &str, use_llm: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2);
        }
    };
    let defaults = ResolutionDefaults::new(config.billing.default_subscriber_no.clone());

    let (path, descriptor) = if use_llm {
        match resolve_with_llm(&config, defaults, text) {
            Ok(descriptor) => ("llm_chain", descriptor),
            Err(error) => return CommandResult::failure(COMMAND, "llm_client", error, 4),
        }
    } else {
        ("keyword", KeywordIntentResolver::new(defaults).resolve_now(text))
    };

    let message = format!(
        "{} for {} in {}",
        descriptor.intent(),
        descriptor.subscriber_no(),
        descriptor.period()
    );
    CommandResult::success(
        COMMAND,
        message,
        Some(json!({ "path": path, "descriptor": descriptor })),
    )
}

fn resolve_with_llm(
    config: &AppConfig,
    defaults: ResolutionDefaults,
    text: &str,
) -> Result<OperationDescriptor, String> {
    let client = OllamaClient::from_config(&config.llm).map_err(|error| error.to_string())?;
    let chain = ResolverChain::new(
        Arc::new(LlmIntentResolver::new(Arc::new(client), defaults.clone())),
        KeywordIntentResolver::new(defaults),
    );

    let runtime = current_thread_runtime()?;
    Ok(runtime.block_on(chain.resolve(text)))
}
