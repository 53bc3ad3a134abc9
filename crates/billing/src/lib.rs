//! Billing side of the gateway: the backend client, the shared auth session,
//! the recent-payment overlay, and the orchestrator that ties them together.

pub mod auth;
pub mod backend;
pub mod cache;
pub mod http;
pub mod orchestrator;
pub mod payloads;
pub mod render;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use auth::AuthSession;
pub use backend::{BackendError, BillingBackend, Credentials, DetailPage, PaymentRequest};
pub use cache::{CachedPayment, PaymentCache, PaymentKey};
pub use http::HttpBillingBackend;
pub use orchestrator::{BillingOrchestrator, OrchestratorError};
