use super::extract::Extraction;
use crate::models::DEFAULT_BASE_URL;
use crate::{Error, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// Where the API key travels on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPlacement {
    /// `x-goog-api-key` header.
    #[default]
    Header,
    /// `?key=` query parameter.
    Query,
}

/// Lightweight Gemini REST client issuing one `generateContent` call per request.
pub struct GeminiHttpClient {
    pub(crate) client: Client,
    pub(crate) api_key: String,
    model: String,
    pub(crate) base_url: String,
    timeout: Option<Duration>,
}

impl GeminiHttpClient {
    /// Construct a Gemini client.
    ///
    /// `model` should be the bare model ID (for example `gemini-2.5-flash`),
    /// not a `models/...`-prefixed path segment. No timeout is applied unless
    /// one is given.
    pub fn new(api_key: String, model: String, timeout: Option<Duration>) -> Self {
        Self::new_with_client(api_key, model, timeout, Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        timeout: Option<Duration>,
        client: Client,
    ) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();

        Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Returns the configured model ID without the `models/` prefix.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn generate_content_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Calls `generateContent` and extracts the reply text.
    ///
    /// Transport failures and non-success statuses are errors; an unexpected
    /// envelope is not.
    pub async fn generate_content<Req: Serialize>(
        &self,
        request: &Req,
        placement: KeyPlacement,
    ) -> Result<Extraction> {
        let url = self.generate_content_url();

        tracing::info!("Sending request to Gemini (model: {})", self.model);
        tracing::debug!("URL: {}", url);
        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!("Prompt: {}", serde_json::to_string_pretty(request)?);
        }

        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");

        builder = match placement {
            KeyPlacement::Header => builder.header("x-goog-api-key", &self.api_key),
            KeyPlacement::Query => builder.query(&[("key", self.api_key.as_str())]),
        };

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.json(request).send().await.map_err(|e| {
            tracing::error!("Failed to send request to Gemini: {}", e);
            e
        })?;

        let status = response.status();
        tracing::info!("Gemini response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await?;
            tracing::error!("Gemini API error (status {}): {}", status, error_text);
            return Err(Error::Api {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let body = response.text().await?;
        tracing::debug!("Raw Gemini response: {}", body);

        let extraction = Extraction::from_body(&body);
        tracing::debug!("Extracted output: {}", extraction.text());

        Ok(extraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gemini::types::GenerateContentRequest;
    use crate::ai::gemini::test_support;
    use crate::models::PromptPart;
    use wiremock::matchers::{header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_client(server: &MockServer, model: &str) -> GeminiHttpClient {
        GeminiHttpClient::new("test-key".to_string(), model.to_string(), None)
            .with_base_url(server.uri())
    }

    #[test]
    fn test_strips_models_prefix() {
        let client = GeminiHttpClient::new(
            "k".to_string(),
            "models/gemini-2.5-flash".to_string(),
            None,
        );
        assert_eq!(client.model(), "gemini-2.5-flash");
        assert_eq!(
            client.generate_content_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_is_dropped() {
        let client = GeminiHttpClient::new("k".to_string(), "m".to_string(), None)
            .with_base_url("http://localhost:8080/".to_string());
        assert_eq!(
            client.generate_content_url(),
            "http://localhost:8080/v1beta/models/m:generateContent"
        );
    }

    #[tokio::test]
    async fn test_header_placement_sends_api_key_header() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(header("content-type", "application/json"))
            .respond_with(test_support::text_response("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "gemini-2.5-flash");
        let request = GenerateContentRequest::from_parts(&[PromptPart::user("Hi")]);
        let extraction = client
            .generate_content(&request, KeyPlacement::Header)
            .await
            .unwrap();
        assert_eq!(extraction, Extraction::Parts("ok".to_string()));
    }

    #[tokio::test]
    async fn test_query_placement_sends_key_parameter() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(query_param("key", "test-key"))
            .respond_with(test_support::text_response("ok"))
            .expect(1)
            .mount(&server)
            .await;

        // Header-keyed requests must not reach the query matcher.
        Mock::given(method("POST"))
            .and(header_exists("x-goog-api-key"))
            .respond_with(ResponseTemplate::new(400))
            .expect(0)
            .mount(&server)
            .await;

        let client = make_client(&server, "gemini-2.5-flash");
        let request = GenerateContentRequest::from_parts(&[PromptPart::user("Hi")]);
        client
            .generate_content(&request, KeyPlacement::Query)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_error_status_carries_status_and_body() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(500).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let client = make_client(&server, "gemini-2.5-flash");
        let err = client
            .generate_content(&GenerateContentRequest::from_parts(&[]), KeyPlacement::Header)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Api { status: 500, .. }));
        let msg = err.to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_connection_failure_is_http_error() {
        // Nothing listens on the discard port.
        let client = GeminiHttpClient::new("k".to_string(), "m".to_string(), None)
            .with_base_url("http://127.0.0.1:9".to_string());

        let err = client
            .generate_content(&GenerateContentRequest::from_parts(&[]), KeyPlacement::Header)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }

    #[tokio::test]
    async fn test_timeout_applies_when_configured() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(
                test_support::text_response("slow").set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = GeminiHttpClient::new(
            "k".to_string(),
            "m".to_string(),
            Some(Duration::from_millis(50)),
        )
        .with_base_url(server.uri());

        let err = client
            .generate_content(&GenerateContentRequest::from_parts(&[]), KeyPlacement::Header)
            .await
            .unwrap_err();
        match err {
            Error::Http(e) => assert!(e.is_timeout()),
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
