//! Outbound LLM integration: prompt construction, the Gemini HTTP client,
//! and defensive normalization of the JSON-ish text the model returns.

pub mod client;
pub mod parse;
pub mod prompt;

pub use client::{GeminiClient, LlmClient};
pub use parse::parse_plan;
pub use prompt::build_plan_prompt;
