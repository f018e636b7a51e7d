use super::client::{GeminiHttpClient, KeyPlacement};
use super::types::{Content, GenerateContentRequest, InlineData, Part};
use crate::ai::TextGenerator;
use crate::document::Document;
use crate::models::{Config, PromptPart, Role};
use crate::Result;
use async_trait::async_trait;

/// Prompt dispatcher backed by Gemini `generateContent`.
pub struct GeminiDispatcher {
    http: GeminiHttpClient,
    document_key_placement: KeyPlacement,
}

impl GeminiDispatcher {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, model, None, client),
            document_key_placement: KeyPlacement::Header,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let http = GeminiHttpClient::new(
            config.api_key.clone(),
            config.model.clone(),
            config.timeout,
        )
        .with_base_url(config.base_url.clone());

        let document_key_placement = if config.document_key_in_query {
            KeyPlacement::Query
        } else {
            KeyPlacement::Header
        };

        Self {
            http,
            document_key_placement,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    /// Send document requests with the key as a `?key=` query parameter.
    pub fn with_document_key_placement(mut self, placement: KeyPlacement) -> Self {
        self.document_key_placement = placement;
        self
    }

    pub fn model(&self) -> &str {
        self.http.model()
    }
}

#[async_trait]
impl TextGenerator for GeminiDispatcher {
    async fn generate(&self, parts: &[PromptPart]) -> Result<String> {
        if parts.is_empty() {
            tracing::warn!("Dispatching an empty prompt");
        }

        let request = GenerateContentRequest::from_parts(parts);
        let extraction = self
            .http
            .generate_content(&request, KeyPlacement::Header)
            .await?;

        Ok(extraction.into_text())
    }

    async fn generate_with_document(
        &self,
        instruction: &str,
        document: &Document,
    ) -> Result<Option<String>> {
        tracing::debug!(
            "Attaching document {} ({}, {} bytes)",
            document.name,
            document.mime_type,
            document.data.len()
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Role::User.as_str().to_string(),
                parts: vec![
                    Part::Text {
                        text: instruction.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: document.mime_type.clone(),
                            data: document.to_base64(),
                        },
                    },
                ],
            }],
        };

        let extraction = self
            .http
            .generate_content(&request, self.document_key_placement)
            .await?;

        Ok(extraction.primary())
    }
}
