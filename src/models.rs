//! Data models and structures
//!
//! Defines prompt parts, the structured results decoded from model replies,
//! the chat/profile shapes shared with the hosted database, and configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
        }
    }
}

/// One role-tagged unit of prompt text. Position in the sequence is the turn order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptPart {
    #[serde(default)]
    pub role: Role,
    pub text: String,
}

impl PromptPart {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }
}

/// Render any JSON scalar as text; `null` becomes empty.
fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_text(Value::deserialize(deserializer)?))
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().map(value_to_text).collect(),
        Value::Null => Vec::new(),
        other => vec![value_to_text(other)],
    })
}

/// Model-generated records carry no guaranteed schema: string fields accept
/// any scalar and unknown keys are kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flashcard {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub detail: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Flashcard {
    pub fn new(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail: detail.into(),
            extra: Map::new(),
        }
    }

    /// Decode one array element. Non-object elements become the card detail.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(_) => serde_json::from_value(value.clone())
                .unwrap_or_else(|_| Self::new("", value.to_string())),
            other => Self::new("", value_to_text(other)),
        }
    }

    /// Card shown when the reply could not be decoded as a flashcard array.
    pub fn info(detail: impl Into<String>) -> Self {
        Self::new("Info", detail)
    }

    /// Card shown when the request itself failed.
    pub fn error(detail: impl Into<String>) -> Self {
        Self::new("Error", detail)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizQuestion {
    #[serde(default, deserialize_with = "lenient_string")]
    pub question: String,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub options: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub answer: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QuizQuestion {
    /// Placeholder question used when the model reply is not a valid quiz.
    pub fn placeholder() -> Self {
        let options: Vec<String> = ["Option A", "Option B", "Option C", "Option D"]
            .iter()
            .map(|o| o.to_string())
            .collect();

        Self {
            question: "Fallback Question: Gemini did not return valid JSON.".to_string(),
            answer: options[0].clone(),
            options,
            extra: Map::new(),
        }
    }

    /// Decode one array element. Non-object elements become the question text.
    pub fn from_value(value: Value) -> Self {
        let fallback = |text: String| Self {
            question: text,
            options: Vec::new(),
            answer: String::new(),
            extra: Map::new(),
        };
        match value {
            Value::Object(_) => serde_json::from_value(value.clone())
                .unwrap_or_else(|_| fallback(value.to_string())),
            other => fallback(value_to_text(other)),
        }
    }

    /// An option is correct when it starts with the answer (`"A) ..."` vs `"A"`).
    pub fn is_correct(&self, option: &str) -> bool {
        !self.answer.is_empty() && option.trim().starts_with(self.answer.as_str())
    }
}

/// Running tally for a quiz session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QuizScore {
    pub correct: usize,
    pub wrong: usize,
}

impl QuizScore {
    pub fn record(&mut self, question: &QuizQuestion, option: &str) -> bool {
        let correct = question.is_correct(option);
        if correct {
            self.correct += 1;
        } else {
            self.wrong += 1;
        }
        correct
    }

    pub fn answered(&self) -> usize {
        self.correct + self.wrong
    }
}

/// Decoded structured reply.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "items", rename_all = "lowercase")]
pub enum StructuredResult {
    Quiz(Vec<QuizQuestion>),
    Flashcards(Vec<Flashcard>),
}

impl StructuredResult {
    pub fn len(&self) -> usize {
        match self {
            StructuredResult::Quiz(q) => q.len(),
            StructuredResult::Flashcards(f) => f.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    User,
    Ai,
}

/// Chat message as stored under `users/{uid}/chats/{chat}/messages`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub from: MessageSender,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            from: MessageSender::User,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            from: MessageSender::Ai,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    /// Failed requests are rendered inline as an AI message.
    pub fn error(err: &crate::Error) -> Self {
        Self::ai(format!("Error: {}", err))
    }
}

/// One chat turn: the user's message and the reply, plus the title the chat
/// gets when this turn opens it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatExchange {
    pub title: String,
    pub messages: Vec<ChatMessage>,
}

/// Title for a new chat: the first 20 characters of its opening message.
pub fn chat_title(first_message: &str) -> String {
    let prefix: String = first_message.chars().take(20).collect();
    format!("{}...", prefix)
}

/// Profile document as stored under `users/{uid}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub interests: Vec<String>,
}

impl UserProfile {
    pub fn has_interests(&self) -> bool {
        !self.interests.is_empty()
    }

    pub fn interests_text(&self) -> String {
        self.interests.join(", ")
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub oauth_client_id: Option<String>,
    pub push_app_id: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Option<Duration>,
    pub document_key_in_query: bool,
}

impl Config {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            oauth_client_id: None,
            push_app_id: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            document_key_in_query: false,
        }
    }

    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load variables from `path` instead of the default `.env` lookup.
    pub fn from_env_file(path: &std::path::Path) -> crate::Result<Self> {
        dotenvy::from_path(path)?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_empty("GEMINI_API_KEY")
            .ok_or_else(|| crate::Error::Config("GEMINI_API_KEY not set".to_string()))?;

        let timeout = match non_empty("GEMINI_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    crate::Error::Config(format!("Invalid GEMINI_TIMEOUT_SECS '{}'", raw))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let document_key_in_query = match non_empty("GEMINI_DOCUMENT_KEY_IN_QUERY") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                crate::Error::Config(format!("Invalid GEMINI_DOCUMENT_KEY_IN_QUERY '{}'", raw))
            })?,
            None => false,
        };

        Ok(Self {
            api_key,
            oauth_client_id: non_empty("GOOGLE_OAUTH_CLIENT_ID"),
            push_app_id: non_empty("PUSH_APP_ID"),
            model: non_empty("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: non_empty("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout,
            document_key_in_query,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
