//! LLM 模块
//!
//! 提供 Gemini generateContent 客户端。

mod client;
mod format;
mod types;

pub use client::GeminiClient;
pub use types::{GenerationOptions, LlmError};
