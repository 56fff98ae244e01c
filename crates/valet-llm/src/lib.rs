//! # valet-llm
//!
//! Provider adapters behind the narrow [`LlmClient`] trait.
//!
//! ## Overview
//!
//! The rest of VALET speaks only
//! [`LlmResponse`](valet_contracts::llm::LlmResponse) and
//! [`ChatTurn`](valet_contracts::session::ChatTurn); this crate owns every
//! provider-specific detail — wire formats, auth headers, temperatures, and
//! the `.`↔`-` tool-name translation providers force on qualified names.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use valet_llm::{create_client, LlmConfig};
//!
//! let client = create_client(&LlmConfig {
//!     provider: "anthropic".to_string(),
//!     api_key: std::env::var("ANTHROPIC_API_KEY")?,
//!     model: "claude-sonnet-4-20250514".to_string(),
//!     max_tokens: 1024,
//!     base_url: None,
//!     timeout_secs: 60,
//! })?;
//! ```

pub mod anthropic;
pub mod client;
pub mod config;
pub mod names;
pub mod openai;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use config::{create_client, LlmConfig};
pub use openai::OpenAiClient;

// ── Tests ─────────────────────────────────────────────────────────────────────
