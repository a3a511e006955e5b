//! Capability layer: the opaque "ask a language model" service.
//!
//! Everything above this crate talks to a single [`LlmClient`] facade backed
//! by one [`LlmProvider`] implementation. Provider failures are reported as
//! typed [`LlmError`] values; no retries happen here, retry policy belongs
//! to whoever hosts the provider endpoint.

mod client;
mod config;
mod error;
pub mod providers;

pub use client::LlmClient;
pub use config::LlmConfig;
pub use error::LlmError;
pub use providers::{
    AzureProvider, LlmProvider, LlmRequest, LlmResponse, OpenAiProvider, ProviderId, ProviderKind,
    ScriptedFailure, ScriptedProvider, TokenUsage,
};

/// Result alias used throughout the capability layer.
pub type LlmResult<T> = Result<T, LlmError>;
