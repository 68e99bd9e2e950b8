//! Chat-completions extraction providers.
//!
//! Every supported vendor speaks the same OpenAI-compatible protocol, so a
//! single [`ChatCompletionsExtractor`] covers them with per-vendor presets.

mod client;
mod prompt;
mod types;

pub use client::ChatCompletionsExtractor;
pub use prompt::system_prompt;
