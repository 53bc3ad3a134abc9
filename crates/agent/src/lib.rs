//! Intent side of the gateway.
//!
//! A chat message is resolved into an [`billchat_core::OperationDescriptor`]
//! by asking the language model first (`resolver::LlmIntentResolver`) and
//! falling back to deterministic bilingual keyword matching
//! (`keywords::KeywordIntentResolver`) whenever the model is unreachable or
//! its reply is unusable. `runtime::AgentRuntime` then hands the descriptor to
//! the billing orchestrator.
//!
//! The model only translates text into a descriptor. It never decides what a
//! billing call returns.

pub mod keywords;
pub mod llm;
pub mod prompt;
pub mod resolver;
pub mod runtime;

pub use keywords::KeywordIntentResolver;
pub use llm::{LlmClient, LlmError, OllamaClient, SamplingOptions};
pub use resolver::{normalize_reply, IntentResolver, LlmIntentResolver, ResolveError, ResolverChain};
pub use runtime::{AgentOutcome, AgentRuntime};
