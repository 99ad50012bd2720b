//! LLM integration module.
//!
//! Provides an OpenAI-compatible client for LLM API calls, the retry
//! policy wrapped around it, and the built-in prompts.

mod client;
mod prompts;
mod retry;

pub use client::{LlmClient, LlmResponse, Message, Role, TokenUsage};
pub use prompts::Prompts;
pub use retry::RetryPolicy;
