//! Shared building blocks for the billchat gateway: configuration, the failure
//! taxonomy, and the domain types that flow between intent resolution and
//! billing orchestration.

pub mod config;
pub mod domain;
pub mod errors;

pub use domain::descriptor::{OperationDescriptor, ResolutionDefaults};
pub use domain::intent::Intent;
pub use domain::operation::BillingOperationResult;
pub use domain::period::BillingPeriod;
pub use errors::{DomainError, OperationFailure, GENERIC_ERROR_MESSAGE};
