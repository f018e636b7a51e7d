//! Generative text integration
//!
//! Provides the [`TextGenerator`] seam with a Gemini-backed dispatcher and an
//! in-memory mock for tests.

pub mod gemini;
pub mod mock;

pub use gemini::GeminiDispatcher;
pub use mock::MockTextGenerator;

use crate::document::Document;
use crate::models::PromptPart;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send one ordered prompt and return the extracted reply text.
    async fn generate(&self, parts: &[PromptPart]) -> Result<String>;

    /// Send an instruction with an inline document. `None` when the reply
    /// carries no text at the primary location.
    async fn generate_with_document(
        &self,
        instruction: &str,
        document: &Document,
    ) -> Result<Option<String>>;
}
