use super::TextGenerator;
use crate::document::Document;
use crate::models::PromptPart;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Scripted [`TextGenerator`] that records every prompt it receives.
pub struct MockTextGenerator {
    responses: Arc<Mutex<Vec<String>>>,
    failure: Arc<Mutex<Option<(u16, String)>>>,
    prompts: Arc<Mutex<Vec<Vec<PromptPart>>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockTextGenerator {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
            prompts: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push(response.into());
        self
    }

    /// Every call fails with an API error carrying `status` and `body`.
    pub fn with_api_error(self, status: u16, body: impl Into<String>) -> Self {
        *self.failure.lock().unwrap() = Some((status, body.into()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Prompts received so far, one entry per call.
    pub fn prompts(&self) -> Vec<Vec<PromptPart>> {
        self.prompts.lock().unwrap().clone()
    }

    fn next_response(&self, parts: Vec<PromptPart>) -> Result<String> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;
        self.prompts.lock().unwrap().push(parts);

        if let Some((status, body)) = self.failure.lock().unwrap().clone() {
            return Err(Error::Api { status, body });
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok("Mock reply".to_string())
        } else {
            let index = (*count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}

impl Default for MockTextGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, parts: &[PromptPart]) -> Result<String> {
        self.next_response(parts.to_vec())
    }

    async fn generate_with_document(
        &self,
        instruction: &str,
        document: &Document,
    ) -> Result<Option<String>> {
        let parts = vec![
            PromptPart::user(instruction),
            PromptPart::user(format!("[document {} ({})]", document.name, document.mime_type)),
        ];
        self.next_response(parts).map(Some)
    }
}
