//! Language model collaborator.
//!
//! The pipeline only needs "prompt in, text out"; provider specifics live in
//! the implementations.

pub mod gemini;

use crate::error::LlmError;
use async_trait::async_trait;

pub use gemini::GeminiClient;

/// A text-completion model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete a prompt, returning the model's text
    ///
    /// Implementations handle their own retry budget; an `Err` means the
    /// model could not be reached or produced nothing usable.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}
