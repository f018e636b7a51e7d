//! Text extraction from `generateContent` response envelopes.
//!
//! The envelope shape has been observed to drift, so extraction walks a fixed
//! list of locations and falls back to the serialized payload. It never fails.

use serde_json::Value;

const PARTS_TEXT: &str = "/candidates/0/content/parts/0/text";
const CONTENT_LIST_TEXT: &str = "/candidates/0/content/0/text";

/// Generated text tagged with the envelope location it was found at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// `candidates[0].content.parts[0].text`
    Parts(String),
    /// `candidates[0].content[0].text`
    ContentList(String),
    /// Neither location held text; the whole payload serialized.
    Raw(String),
}

impl Extraction {
    /// First non-empty match wins.
    pub fn from_payload(payload: &Value) -> Self {
        if let Some(text) = text_at(payload, PARTS_TEXT) {
            return Extraction::Parts(text.to_string());
        }
        if let Some(text) = text_at(payload, CONTENT_LIST_TEXT) {
            return Extraction::ContentList(text.to_string());
        }
        Extraction::Raw(payload.to_string())
    }

    /// Extraction for a body that was not JSON at all.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(payload) => Self::from_payload(&payload),
            Err(e) => {
                tracing::warn!("Gemini response body is not JSON: {}", e);
                Extraction::Raw(body.to_string())
            }
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Extraction::Parts(t) | Extraction::ContentList(t) | Extraction::Raw(t) => t,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Extraction::Parts(t) | Extraction::ContentList(t) | Extraction::Raw(t) => t,
        }
    }

    /// Text from the documented location only.
    pub fn primary(self) -> Option<String> {
        match self {
            Extraction::Parts(t) => Some(t),
            _ => None,
        }
    }
}

fn text_at<'a>(payload: &'a Value, pointer: &str) -> Option<&'a str> {
    payload
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracts_parts_text() {
        let payload = json!({ "candidates": [{ "content": { "parts": [{ "text": "X" }] } }] });
        assert_eq!(
            Extraction::from_payload(&payload),
            Extraction::Parts("X".to_string())
        );
    }

    #[test]
    fn test_extracts_content_list_text() {
        let payload = json!({ "candidates": [{ "content": [{ "text": "Y" }] }] });
        assert_eq!(
            Extraction::from_payload(&payload),
            Extraction::ContentList("Y".to_string())
        );
    }

    #[test]
    fn test_unknown_shape_serializes_payload() {
        let payload = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let extraction = Extraction::from_payload(&payload);
        assert_eq!(extraction, Extraction::Raw(payload.to_string()));
        assert!(extraction.text().contains("SAFETY"));
    }

    #[test]
    fn test_empty_text_falls_through() {
        let payload = json!({
            "candidates": [{ "content": { "parts": [{ "text": "" }] } }]
        });
        assert!(matches!(
            Extraction::from_payload(&payload),
            Extraction::Raw(_)
        ));
    }

    #[test]
    fn test_non_text_part_falls_through() {
        let payload = json!({
            "candidates": [{ "content": { "parts": [{ "inlineData": { "data": "AA==" } }] } }]
        });
        assert!(matches!(
            Extraction::from_payload(&payload),
            Extraction::Raw(_)
        ));
    }

    #[test]
    fn test_empty_candidates_serializes_payload() {
        let payload = json!({ "candidates": [] });
        assert_eq!(
            Extraction::from_payload(&payload).into_text(),
            r#"{"candidates":[]}"#
        );
    }

    #[test]
    fn test_non_json_body_is_returned_verbatim() {
        let extraction = Extraction::from_body("<html>gateway</html>");
        assert_eq!(extraction, Extraction::Raw("<html>gateway</html>".to_string()));
        assert_eq!(extraction.primary(), None);
    }

    #[test]
    fn test_primary_only_accepts_parts_location() {
        let payload = json!({ "candidates": [{ "content": [{ "text": "Y" }] }] });
        assert_eq!(Extraction::from_payload(&payload).primary(), None);

        let payload = json!({ "candidates": [{ "content": { "parts": [{ "text": "X" }] } }] });
        assert_eq!(
            Extraction::from_payload(&payload).primary(),
            Some("X".to_string())
        );
    }
}
