//! Gemini `generateContent` request payload types.
//!
//! Responses are deliberately not typed here; see [`super::extract`].

use crate::models::PromptPart;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// One content entry per prompt part, in order.
    pub fn from_parts(parts: &[PromptPart]) -> Self {
        Self {
            contents: parts
                .iter()
                .map(|p| Content {
                    role: p.role.as_str().to_string(),
                    parts: vec![Part::Text {
                        text: p.text.clone(),
                    }],
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

/// Untagged union of text and inline media content parts.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

/// Base64 inline payload used for document requests.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}
