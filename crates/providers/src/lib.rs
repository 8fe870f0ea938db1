//! Completion provider gateways for Tripsmith.
//!
//! Implementations of the core `ModelGateway` trait. Currently one:
//! an OpenAI-compatible HTTP client, which covers the vast majority of
//! hosted and local providers.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatGateway;
